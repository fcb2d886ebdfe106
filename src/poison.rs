use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{events::DeadLetterEvent, Engine, Message, Pid};

/// Control message asking a process to terminate.
///
/// It's delivered like any other message. The receiving process is in charge of honoring it and
/// must call [`PoisonPill::done`] once it has shut down, so that whoever sent the pill can stop
/// waiting on the token returned by [`Engine::stop`] or [`Engine::poison`].
#[derive(Debug, Clone)]
pub struct PoisonPill {
    token: CancellationToken,
    graceful: bool,
}

impl PoisonPill {
    /// A graceful pill lets the process handle all messages already in its mailbox first.
    pub fn graceful(&self) -> bool {
        self.graceful
    }

    pub fn done(&self) {
        self.token.cancel();
    }
}

impl Engine {
    /// Stops the process immediately. Messages still waiting in its mailbox are turned into dead
    /// letters.
    ///
    /// The returned token is cancelled once the process is gone.
    pub fn stop(&self, pid: &Pid) -> CancellationToken {
        self.send_poison_pill(&CancellationToken::new(), false, pid)
    }

    /// Stops the process after it has handled every message already in its mailbox.
    ///
    /// The returned token is cancelled once the process is gone.
    pub fn poison(&self, pid: &Pid) -> CancellationToken {
        self.send_poison_pill(&CancellationToken::new(), true, pid)
    }

    /// Same as [`Engine::poison`], but the returned token is a child of `parent`. Cancelling the
    /// parent stops the waiting early, e.g. to implement a timeout.
    pub fn poison_ctx(&self, parent: &CancellationToken, pid: &Pid) -> CancellationToken {
        self.send_poison_pill(parent, true, pid)
    }

    fn send_poison_pill(
        &self,
        parent: &CancellationToken,
        graceful: bool,
        pid: &Pid,
    ) -> CancellationToken {
        let token = parent.child_token();
        let pill = PoisonPill {
            token: token.clone(),
            graceful,
        };
        match self.registry().get(pid) {
            Some(process) => process.send(pid, Message::new(pill), None),
            None => {
                debug!("Poison pill for unknown process {}", pid);
                self.broadcast_event(DeadLetterEvent {
                    target: pid.clone(),
                    sender: None,
                    message: Message::new(pill),
                });
                // Nobody is left to call `done`, don't let the caller wait forever.
                token.cancel();
            }
        }
        token
    }
}
