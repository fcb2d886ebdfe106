use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};

use log::{debug, trace, warn};
use tokio::sync::mpsc::{error::SendError, unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{
    context::Context,
    events::{
        ActorMaxRestartsExceededEvent, ActorRestartedEvent, ActorStartedEvent, ActorStoppedEvent,
        DeadLetterEvent,
    },
    engine::WeakEngine,
    poison::PoisonPill,
    receiver::{Initialized, Producer, Receiver, Started, Stopped},
    Engine, Message, Pid, Process,
};

struct Envelope {
    message: Message,
    sender: Option<Pid>,
}

/// The registered half of a process spawned from a [`Producer`].
///
/// Sending only pushes the message into the mailbox, the receiver itself runs on the task driven
/// by the matching [`ProcessRunner`].
pub(crate) struct LocalProcess {
    pid: Pid,
    engine: WeakEngine,
    signals: UnboundedSender<PoisonPill>,
    mailbox: UnboundedSender<Envelope>,
}

impl Process for LocalProcess {
    fn pid(&self) -> &Pid {
        &self.pid
    }

    fn send(&self, _target: &Pid, message: Message, sender: Option<Pid>) {
        // Poison pills skip the queue of regular messages.
        let rejected = match message.downcast_ref::<PoisonPill>() {
            Some(pill) => match self.signals.send(pill.clone()) {
                Ok(()) => None,
                Err(SendError(pill)) => {
                    // The process is already gone, nobody else will complete the pill.
                    pill.done();
                    Some((message, sender))
                }
            },
            None => match self.mailbox.send(Envelope { message, sender }) {
                Ok(()) => None,
                Err(SendError(Envelope { message, sender })) => Some((message, sender)),
            },
        };
        // The channels are only closed once the process left the registry, so this can only
        // happen to callers holding on to a stale handle.
        if let Some((message, sender)) = rejected {
            trace!("Process {} is gone, turning message into a dead letter", self.pid);
            if let Some(engine) = self.engine.upgrade() {
                engine.broadcast_event(DeadLetterEvent {
                    target: self.pid.clone(),
                    sender,
                    message,
                });
            }
        }
    }
}

// Why the message loop of a process ended.
enum Exit {
    Poisoned(PoisonPill),
    Crashed,
    Detached,
}

pub(crate) struct ProcessRunner {
    engine: Engine,
    pid: Pid,
    producer: Producer,
    signals: UnboundedReceiver<PoisonPill>,
    mailbox: UnboundedReceiver<Envelope>,
    max_restarts: u32,
    restart_delay: Duration,
    restarts: u32,
}

pub(crate) fn new_process(
    engine: Engine,
    pid: Pid,
    producer: Producer,
    max_restarts: u32,
    restart_delay: Duration,
) -> (Arc<LocalProcess>, ProcessRunner) {
    let (signal_sender, signals) = unbounded_channel();
    let (message_sender, mailbox) = unbounded_channel();
    let process = Arc::new(LocalProcess {
        pid: pid.clone(),
        engine: engine.downgrade(),
        signals: signal_sender,
        mailbox: message_sender,
    });
    let runner = ProcessRunner {
        engine,
        pid,
        producer,
        signals,
        mailbox,
        max_restarts,
        restart_delay,
        restarts: 0,
    };
    (process, runner)
}

impl ProcessRunner {
    /// The execution loop of a local process:
    ///
    /// 1. A receiver is created and handed [`Initialized`] and [`Started`].
    /// 2. Pending poison pills are checked first. If there are none, the next message is taken
    ///    from the mailbox and handed to the receiver.
    /// 3. A [`PoisonPill`] ends the loop. A graceful pill first lets the receiver handle all
    ///    messages that are still queued, an immediate one turns them into dead letters.
    ///
    /// A panicking receiver is replaced by a fresh one from the producer, until `max_restarts`
    /// is exceeded.
    pub(crate) async fn run(mut self) {
        trace!("Process {} spawned", self.pid);
        let mut receiver = (self.producer)();
        let outcome = self.boot(&mut receiver);
        let exit = if self.recover(&mut receiver, outcome).await {
            self.engine.broadcast_event(ActorStartedEvent {
                pid: self.pid.clone(),
            });
            self.serve(&mut receiver).await
        } else {
            Exit::Crashed
        };

        // Leave the registry first, so no new messages can reach the mailbox while it's drained.
        // A detached process was already removed and its pid may have been taken again since.
        if !matches!(exit, Exit::Detached) {
            self.engine.registry().remove(&self.pid);
        }
        self.signals.close();
        self.mailbox.close();

        let mut pills = Vec::new();
        while let Ok(pill) = self.signals.try_recv() {
            pills.push(pill);
        }
        let graceful = match &exit {
            Exit::Poisoned(pill) => pill.graceful(),
            _ => false,
        };
        while let Ok(Envelope { message, sender }) = self.mailbox.try_recv() {
            if graceful {
                let outcome = self.call(&mut receiver, message, sender);
                if let Err(reason) = outcome {
                    warn!("Process {} panicked while draining: {}", self.pid, reason);
                }
            } else {
                self.engine.broadcast_event(DeadLetterEvent {
                    target: self.pid.clone(),
                    sender,
                    message,
                });
            }
        }

        match &exit {
            Exit::Crashed => (),
            Exit::Poisoned(_) | Exit::Detached => {
                if let Err(reason) = self.call(&mut receiver, Message::new(Stopped), None) {
                    warn!("Process {} panicked while stopping: {}", self.pid, reason);
                }
            }
        }
        debug!("Process {} stopped", self.pid);
        self.engine.broadcast_event(ActorStoppedEvent {
            pid: self.pid.clone(),
        });

        if let Exit::Poisoned(pill) = exit {
            pill.done();
        }
        pills.iter().for_each(PoisonPill::done);
    }

    async fn serve(&mut self, receiver: &mut Box<dyn Receiver>) -> Exit {
        loop {
            tokio::select! {
                biased;
                // Handle signals first
                Some(pill) = self.signals.recv() => return Exit::Poisoned(pill),
                envelope = self.mailbox.recv() => {
                    let Some(Envelope { message, sender }) = envelope else {
                        // Every sender is gone, which means the process was removed from the
                        // registry by someone else.
                        return Exit::Detached;
                    };
                    let outcome = self.call(receiver, message, sender);
                    if !self.recover(receiver, outcome).await {
                        return Exit::Crashed;
                    }
                }
            }
        }
    }

    fn boot(&self, receiver: &mut Box<dyn Receiver>) -> Result<(), String> {
        self.call(receiver, Message::new(Initialized), None)?;
        self.call(receiver, Message::new(Started), None)
    }

    fn call(
        &self,
        receiver: &mut Box<dyn Receiver>,
        message: Message,
        sender: Option<Pid>,
    ) -> Result<(), String> {
        let mut ctx = Context::new(self.engine.clone(), self.pid.clone(), sender, message);
        panic::catch_unwind(AssertUnwindSafe(|| receiver.receive(&mut ctx))).map_err(panic_reason)
    }

    // Replaces a receiver that panicked with a new one. Returns `false` if the process ran out
    // of restarts.
    async fn recover(
        &mut self,
        receiver: &mut Box<dyn Receiver>,
        mut outcome: Result<(), String>,
    ) -> bool {
        while let Err(reason) = outcome {
            self.restarts += 1;
            if self.restarts > self.max_restarts {
                warn!(
                    "Process {} exceeded {} restarts, stopping: {}",
                    self.pid, self.max_restarts, reason
                );
                self.engine
                    .broadcast_event(ActorMaxRestartsExceededEvent {
                        pid: self.pid.clone(),
                    });
                return false;
            }
            warn!(
                "Process {} panicked, restarting ({}/{}): {}",
                self.pid, self.restarts, self.max_restarts, reason
            );
            #[cfg(feature = "metrics")]
            metrics::increment_counter!("troupe.process.restarts");
            self.engine.broadcast_event(ActorRestartedEvent {
                pid: self.pid.clone(),
                reason,
                restarts: self.restarts,
            });
            tokio::time::sleep(self.restart_delay).await;
            *receiver = (self.producer)();
            outcome = self.boot(receiver);
        }
        true
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        reason.to_string()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "unknown panic".to_string()
    }
}
