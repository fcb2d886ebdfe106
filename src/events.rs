/*!
System events published on the event stream.

Failed deliveries never surface as errors to the sender. Instead they are turned into one of the
events below and broadcast to everyone subscribed with [`Engine::subscribe`](crate::Engine::subscribe).
*/

use crate::{Message, Pid};

/// A message addressed to a local pid that has no registered process.
#[derive(Debug, Clone)]
pub struct DeadLetterEvent {
    pub target: Pid,
    pub sender: Option<Pid>,
    pub message: Message,
}

/// A message addressed to a foreign pid while the engine has no remote configured.
#[derive(Debug, Clone)]
pub struct RemoteMissingEvent {
    pub target: Pid,
    pub sender: Option<Pid>,
    pub message: Message,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorStartedEvent {
    pub pid: Pid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorStoppedEvent {
    pub pid: Pid,
}

/// A spawn was rejected because its pid is already taken. The existing process is untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorDuplicateIdEvent {
    pub pid: Pid,
}

/// The receiver of a process panicked and was recreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRestartedEvent {
    pub pid: Pid,
    pub reason: String,
    pub restarts: u32,
}

/// The receiver of a process kept panicking and the process was stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorMaxRestartsExceededEvent {
    pub pid: Pid,
}
