use std::{
    any::Any,
    sync::{Arc, Mutex},
    time::Duration,
};

use log::trace;
use thiserror::Error;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::{poison::PoisonPill, Engine, Message, Pid, Process};

/// Kind under which pending responses are registered.
pub const RESPONSE_KIND: &str = "response";

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no response within {0:?}")]
    Timeout(Duration),
    #[error("response was closed without a reply")]
    Closed,
}

/// A reply that will arrive in the future, created by [`Engine::request`].
///
/// While it exists, the response is registered as a process of its own and the request was sent
/// with its pid as the sender, so the receiver answers it like any other process. It's removed
/// from the registry when the `Response` is dropped, whether the reply was awaited or not.
pub struct Response {
    engine: Engine,
    pid: Pid,
    timeout: Duration,
    reply: Option<oneshot::Receiver<Message>>,
}

impl Response {
    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    /// Waits for the reply.
    ///
    /// Fails with [`RequestError::Timeout`] if nothing arrives within the timeout given to the
    /// request. Consumes the response, a reply can only be taken once.
    pub async fn result(mut self) -> Result<Message, RequestError> {
        let reply = self.reply.take().ok_or(RequestError::Closed)?;
        match tokio::time::timeout(self.timeout, reply).await {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(_)) => Err(RequestError::Closed),
            Err(_) => {
                trace!("Response {} timed out", self.pid);
                #[cfg(feature = "metrics")]
                metrics::increment_counter!("troupe.requests.timeout");
                Err(RequestError::Timeout(self.timeout))
            }
        }
    }
}

impl Drop for Response {
    fn drop(&mut self) {
        self.engine.registry().remove(&self.pid);
    }
}

// The registered half of a response. Resolves with the first message it receives.
struct Resolver {
    pid: Pid,
    slot: Mutex<Option<oneshot::Sender<Message>>>,
}

impl Process for Resolver {
    fn pid(&self) -> &Pid {
        &self.pid
    }

    fn send(&self, _target: &Pid, message: Message, _sender: Option<Pid>) {
        let resolve = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        // A poisoned response closes without a reply, dropping `resolve` does that.
        if let Some(pill) = message.downcast_ref::<PoisonPill>() {
            pill.done();
            return;
        }
        match resolve {
            Some(resolve) => {
                let _ = resolve.send(message);
            }
            None => trace!("Response {} already resolved, dropping message", self.pid),
        }
    }
}

impl Engine {
    /// Sends a message that expects a reply.
    ///
    /// Returns right away, the reply is awaited with [`Response::result`].
    pub fn request<M: Any + Send + Sync>(
        &self,
        target: &Pid,
        message: M,
        timeout: Duration,
    ) -> Response {
        let pid = Pid::new(
            self.address(),
            format!("{}/{}", RESPONSE_KIND, Uuid::new_v4().simple()),
        );
        let (resolve, reply) = oneshot::channel();
        self.spawn_proc(Arc::new(Resolver {
            pid: pid.clone(),
            slot: Mutex::new(Some(resolve)),
        }));
        let response = Response {
            engine: self.clone(),
            pid,
            timeout,
            reply: Some(reply),
        };
        self.send_with_sender(target, message, Some(response.pid.clone()));
        response
    }
}
