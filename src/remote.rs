use anyhow::Result;
use tokio::task::JoinHandle;

use crate::{Engine, Message, Pid};

/// A `Remoter` connects an engine to other engines over the network.
///
/// The engine hands every message addressed to a foreign [`Pid`] to its remote. How the message
/// is encoded and transported is completely up to the implementation. Messages arriving from
/// the network should be delivered with [`Engine::send_local`].
pub trait Remoter: Send + Sync {
    /// Address other engines use to reach this one. It becomes the address of the engine.
    fn address(&self) -> &str;

    fn send(&self, target: &Pid, message: Message, sender: Option<Pid>);

    /// Called exactly once while the engine is being constructed. Returning an error aborts the
    /// construction of the engine.
    fn start(&self, engine: &Engine) -> Result<()>;

    /// Stops the remote. The returned handle finishes once the shutdown is complete.
    fn stop(&self) -> JoinHandle<()>;
}
