pub mod message;
pub mod pid;
pub mod registry;

use std::fmt::Debug;

pub use message::Message;
pub use pid::{Pid, LOCAL_ADDRESS};
pub use registry::Registry;

/// The `Process` is the minimal capability of anything that can be addressed by a [`Pid`].
///
/// A process is usually a receiver running on its own task and draining a mailbox, but it could
/// also be something short lived, like a pending response waiting on a single reply. The engine
/// never looks inside of a process, it only needs to know under which pid it's registered and
/// how to hand it a message.
pub trait Process: Send + Sync {
    fn pid(&self) -> &Pid;

    /// Hands a message to the process.
    ///
    /// Implementations must not block. There is no way to report a failed delivery back to the
    /// caller, a process that can't accept the message anymore should just drop it.
    fn send(&self, target: &Pid, message: Message, sender: Option<Pid>);
}

impl Debug for dyn Process {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Process").field("pid", self.pid()).finish()
    }
}

impl PartialEq<dyn Process> for dyn Process {
    fn eq(&self, other: &dyn Process) -> bool {
        self.pid() == other.pid()
    }
}

impl Eq for dyn Process {}
