use std::{any::Any, time::Duration};

use log::{trace, warn};
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

use crate::{Engine, Message, Pid};

/// Handle to a message that is re-sent on a fixed interval, created by [`Engine::send_repeat`].
///
/// Useful for actors that need to wake up periodically. The repeating keeps going until
/// [`SendRepeater::stop`] is called or the engine shuts down, dropping the handle doesn't stop it.
#[must_use = "the repeater keeps sending until stopped"]
#[derive(Debug, Clone)]
pub struct SendRepeater {
    target: Pid,
    token: CancellationToken,
}

impl SendRepeater {
    pub fn target(&self) -> &Pid {
        &self.target
    }

    /// Stops the repeating. Calling it more than once has no effect.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Engine {
    /// Sends `message` to `target` every `interval`, starting one interval from now.
    ///
    /// A zero `interval` is rejected, the returned repeater is already stopped and never sends.
    pub fn send_repeat<M: Any + Send + Sync>(
        &self,
        target: &Pid,
        message: M,
        interval: Duration,
    ) -> SendRepeater {
        self.send_repeat_with_sender(target, message, interval, None)
    }

    pub(crate) fn send_repeat_with_sender<M: Any + Send + Sync>(
        &self,
        target: &Pid,
        message: M,
        interval: Duration,
        sender: Option<Pid>,
    ) -> SendRepeater {
        let repeater = SendRepeater {
            target: target.clone(),
            token: self.root_token().child_token(),
        };
        if interval.is_zero() {
            warn!("Refusing to repeat a message to {} with a zero interval", target);
            repeater.stop();
            return repeater;
        }
        let engine = self.clone();
        let target = target.clone();
        let message = Message::new(message);
        let token = repeater.token.clone();
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        engine.send_with_sender(&target, message.clone(), sender.clone());
                    }
                }
            }
            trace!("Repeater to {} stopped", target);
        });
        repeater
    }
}
