/*!
`troupe` is the dispatch core of an actor runtime.

Processes are addressed by a location-transparent [`Pid`]. The [`Engine`] decides for every
message whether the target lives on the same engine, in which case it's delivered through the
[`Registry`], or somewhere else, in which case it's handed to a [`Remoter`]. Nothing on the
sending side ever fails. If a message can't be delivered, an event is published on the event
stream instead, and everyone who cares can [`subscribe`](Engine::subscribe) to it.

## Core Concepts

* [`Engine`] - spawns processes and routes messages. Created from an [`EngineConfig`].

* [`Receiver`] - the logic of an actor. It's run by a local process, one message at a time, and
  gets a [`Context`] for every message.

* [`Response`] - a reply that will arrive in the future, created with [`Engine::request`].

* [`SendRepeater`] - re-sends a message on an interval, created with [`Engine::send_repeat`].

* [`PoisonPill`] - stops a process, either right away ([`Engine::stop`]) or after it handled
  everything in its mailbox ([`Engine::poison`]).

## Example

```no_run
use std::time::Duration;
use troupe::{Engine, EngineConfig};

# async fn run() -> anyhow::Result<()> {
let engine = Engine::new(EngineConfig::new())?;
let echo = engine.spawn_func(
    |ctx| {
        if let Some(text) = ctx.message().downcast_ref::<String>() {
            ctx.respond(text.to_uppercase());
        }
    },
    "echo",
);
let reply = engine
    .request(&echo, "hello".to_string(), Duration::from_secs(1))
    .result()
    .await?;
assert_eq!(reply.downcast_ref::<String>().map(String::as_str), Some("HELLO"));
# Ok(())
# }
```
*/

pub mod config;
pub mod context;
pub mod engine;
pub mod event_stream;
pub mod events;
pub mod poison;
mod process;
pub mod receiver;
pub mod remote;
pub mod repeater;
pub mod response;

pub use config::{EngineConfig, SpawnOptions};
pub use context::Context;
pub use engine::Engine;
pub use poison::PoisonPill;
pub use receiver::{Initialized, Producer, Receiver, Started, Stopped};
pub use remote::Remoter;
pub use repeater::SendRepeater;
pub use response::{RequestError, Response};
pub use troupe_process::{Message, Pid, Process, Registry, LOCAL_ADDRESS};
