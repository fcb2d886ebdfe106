use std::{any::Any, time::Duration};

use crate::{repeater::SendRepeater, response::Response, Engine, Message, Pid};

/// Everything a [`Receiver`](crate::Receiver) needs to know about the message it's handling.
pub struct Context {
    engine: Engine,
    pid: Pid,
    sender: Option<Pid>,
    message: Message,
}

impl Context {
    pub(crate) fn new(engine: Engine, pid: Pid, sender: Option<Pid>, message: Message) -> Self {
        Self {
            engine,
            pid,
            sender,
            message,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Pid of the process running this receiver.
    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    /// Pid of whoever sent the current message, if they declared it.
    pub fn sender(&self) -> Option<&Pid> {
        self.sender.as_ref()
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Replies to the sender of the current message. Does nothing if there is no sender.
    pub fn respond<M: Any + Send + Sync>(&self, message: M) {
        self.engine
            .send_with_sender(self.sender.as_ref(), message, Some(self.pid.clone()));
    }

    /// Sends a message with this process as the sender.
    pub fn send<M: Any + Send + Sync>(&self, target: &Pid, message: M) {
        self.engine
            .send_with_sender(target, message, Some(self.pid.clone()));
    }

    /// Passes the current message on to `target`, keeping the original sender.
    pub fn forward(&self, target: &Pid) {
        self.engine
            .send_with_sender(target, self.message.clone(), self.sender.clone());
    }

    pub fn request<M: Any + Send + Sync>(
        &self,
        target: &Pid,
        message: M,
        timeout: Duration,
    ) -> Response {
        self.engine.request(target, message, timeout)
    }

    /// Like [`Engine::send_repeat`], but the messages carry this process as the sender.
    pub fn send_repeat<M: Any + Send + Sync>(
        &self,
        target: &Pid,
        message: M,
        interval: Duration,
    ) -> SendRepeater {
        self.engine
            .send_repeat_with_sender(target, message, interval, Some(self.pid.clone()))
    }
}
