use std::{
    any::Any,
    sync::{Arc, Weak},
};

use anyhow::{Context as _, Result};
use log::{debug, trace};
use once_cell::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    config::{EngineConfig, SpawnOptions},
    context::Context,
    event_stream::{EventStream, Subscribe, Unsubscribe, EVENT_STREAM_ID, EVENT_STREAM_KIND},
    events::{ActorDuplicateIdEvent, DeadLetterEvent, RemoteMissingEvent},
    process::new_process,
    receiver::{func_producer, producer, Producer, Receiver},
    remote::Remoter,
    Message, Pid, Process, Registry, LOCAL_ADDRESS,
};

/// The engine spawns processes and routes messages between them.
///
/// It's a cheap handle that can be cloned and passed around freely. Every engine owns its own
/// registry and event stream, so any number of them can live inside one program.
///
/// Delivery is at-most-once and never fails on the sending side. A message that can't be
/// delivered is published on the event stream as a [`DeadLetterEvent`] or a
/// [`RemoteMissingEvent`] instead.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<InnerEngine>,
}

struct InnerEngine {
    address: String,
    registry: Registry,
    event_stream: OnceCell<Pid>,
    config: EngineConfig,
    // Parent of every repeater token.
    root: CancellationToken,
}

impl Engine {
    /// Creates a new engine from a configuration.
    ///
    /// If a remote is configured it's started here and the engine takes over its address. Must
    /// be called from inside a tokio runtime.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let address = match config.remote() {
            Some(remote) => remote.address().to_string(),
            None => LOCAL_ADDRESS.to_string(),
        };
        let engine = Engine {
            inner: Arc::new(InnerEngine {
                address,
                registry: Registry::new(),
                event_stream: OnceCell::new(),
                config,
                root: CancellationToken::new(),
            }),
        };
        if let Some(remote) = engine.remote() {
            remote.start(&engine).context("failed to start remote")?;
        }
        let event_stream = engine.spawn_with_opts(
            EventStream::default,
            EVENT_STREAM_KIND,
            SpawnOptions::new().with_id(EVENT_STREAM_ID),
        );
        let _ = engine.inner.event_stream.set(event_stream);
        debug!("Engine started on {}", engine.address());
        Ok(engine)
    }

    /// Address of the engine. It's the address of the remote, or [`LOCAL_ADDRESS`] if there is
    /// none.
    pub fn address(&self) -> &str {
        &self.inner.address
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn has_remote(&self) -> bool {
        self.remote().is_some()
    }

    fn remote(&self) -> Option<&Arc<dyn Remoter>> {
        self.inner.config.remote()
    }

    pub(crate) fn downgrade(&self) -> WeakEngine {
        WeakEngine(Arc::downgrade(&self.inner))
    }

    /// Returns `true` if the pid belongs to a process of this engine.
    pub fn is_local(&self, pid: &Pid) -> bool {
        pid.address() == self.inner.address
    }

    pub fn event_stream(&self) -> Option<&Pid> {
        self.inner.event_stream.get()
    }

    /// Spawns a process running receivers created by `producer`, with a generated id.
    pub fn spawn<P, R>(&self, producer: P, kind: &str) -> Pid
    where
        P: Fn() -> R + Send + Sync + 'static,
        R: Receiver,
    {
        self.spawn_with_opts(producer, kind, SpawnOptions::new())
    }

    /// Spawns a process registered as `kind/id`.
    ///
    /// The process is registered before the pid is returned, so the pid can be used right away.
    /// If the pid is already taken, the new process is discarded, an [`ActorDuplicateIdEvent`]
    /// is published and the pid of the existing process is returned.
    pub fn spawn_with_opts<P, R>(&self, producer_fn: P, kind: &str, options: SpawnOptions) -> Pid
    where
        P: Fn() -> R + Send + Sync + 'static,
        R: Receiver,
    {
        self.spawn_producer(producer(producer_fn), kind, options)
    }

    /// Spawns a plain function as a stateless receiver.
    pub fn spawn_func<F>(&self, f: F, kind: &str) -> Pid
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.spawn_producer(func_producer(f), kind, SpawnOptions::new())
    }

    pub fn spawn_producer(&self, producer: Producer, kind: &str, options: SpawnOptions) -> Pid {
        let id = match options.id() {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().simple().to_string(),
        };
        let pid = Pid::new(self.address(), format!("{kind}/{id}"));
        let (process, runner) = new_process(
            self.clone(),
            pid.clone(),
            producer,
            options.max_restarts_or(self.inner.config.max_restarts()),
            options.restart_delay_or(self.inner.config.restart_delay()),
        );
        if self.registry().add(process) {
            #[cfg(feature = "metrics")]
            metrics::increment_counter!("troupe.process.spawned");
            tokio::spawn(runner.run());
        } else {
            self.broadcast_event(ActorDuplicateIdEvent { pid: pid.clone() });
        }
        pid
    }

    /// Registers a custom process.
    pub fn spawn_proc(&self, process: Arc<dyn Process>) -> Pid {
        let pid = process.pid().clone();
        if !self.registry().add(process) {
            self.broadcast_event(ActorDuplicateIdEvent { pid: pid.clone() });
        }
        pid
    }

    /// Sends a message without a sender. A missing target is ignored.
    pub fn send<'a, M>(&self, target: impl Into<Option<&'a Pid>>, message: M)
    where
        M: Any + Send + Sync,
    {
        self.route(target.into(), Message::new(message), None);
    }

    /// Sends a message that the receiver can answer through [`Context::respond`].
    pub fn send_with_sender<'a, M>(
        &self,
        target: impl Into<Option<&'a Pid>>,
        message: M,
        sender: Option<Pid>,
    ) where
        M: Any + Send + Sync,
    {
        self.route(target.into(), Message::new(message), sender);
    }

    fn route(&self, target: Option<&Pid>, message: Message, sender: Option<Pid>) {
        let target = match target {
            Some(target) => target,
            None => return,
        };
        if self.is_local(target) {
            self.send_local(target, message, sender);
            return;
        }
        match self.remote() {
            Some(remote) => remote.send(target, message, sender),
            None => {
                trace!("No remote to deliver to {}", target);
                #[cfg(feature = "metrics")]
                metrics::increment_counter!("troupe.engine.remote_missing");
                self.broadcast_event(RemoteMissingEvent {
                    target: target.clone(),
                    sender,
                    message,
                });
            }
        }
    }

    /// Delivers a message to a process of this engine. If the process isn't registered, a
    /// [`DeadLetterEvent`] is published instead.
    pub fn send_local(&self, target: &Pid, message: Message, sender: Option<Pid>) {
        match self.registry().get(target) {
            Some(process) => process.send(target, message, sender),
            None => {
                trace!("Dead letter for {}", target);
                #[cfg(feature = "metrics")]
                metrics::increment_counter!("troupe.engine.dead_letters");
                self.broadcast_event(DeadLetterEvent {
                    target: target.clone(),
                    sender,
                    message,
                });
            }
        }
    }

    /// Publishes a message to every process subscribed to the event stream.
    pub fn broadcast_event<M: Any + Send + Sync>(&self, event: M) {
        let Some(event_stream) = self.event_stream() else {
            return;
        };
        // Not going through `send_local`, a missing stream would turn every event into a dead
        // letter event for the same stream.
        match self.registry().get(event_stream) {
            Some(process) => process.send(event_stream, Message::new(event), None),
            None => debug!("Event stream is gone, dropping event"),
        }
    }

    pub fn subscribe(&self, pid: &Pid) {
        self.send(self.event_stream(), Subscribe(pid.clone()));
    }

    pub fn unsubscribe(&self, pid: &Pid) {
        self.send(self.event_stream(), Unsubscribe(pid.clone()));
    }

    pub(crate) fn root_token(&self) -> &CancellationToken {
        &self.inner.root
    }

    /// Stops all repeaters and the remote. The returned handle finishes once the remote is down.
    ///
    /// Processes are not stopped. Every running process holds a clone of the engine, so an engine
    /// with live processes (the event stream included) is never freed. Poison the processes that
    /// should end and keep the engine around for the lifetime of the program.
    pub fn shutdown(&self) -> Option<JoinHandle<()>> {
        debug!("Engine {} shutting down", self.address());
        self.inner.root.cancel();
        self.remote().map(|remote| remote.stop())
    }
}

/// Engine handle that doesn't keep the engine alive. Held by the processes the engine registers.
#[derive(Clone)]
pub(crate) struct WeakEngine(Weak<InnerEngine>);

impl WeakEngine {
    pub(crate) fn upgrade(&self) -> Option<Engine> {
        self.0.upgrade().map(|inner| Engine { inner })
    }
}
