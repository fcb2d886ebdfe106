use std::collections::HashSet;

use log::{debug, trace};

use crate::{
    context::Context,
    receiver::{Initialized, Receiver, Started, Stopped},
    Pid,
};

/// Kind of the built-in event stream process.
pub const EVENT_STREAM_KIND: &str = "eventstream";
/// Id of the built-in event stream process.
pub const EVENT_STREAM_ID: &str = "root";

pub(crate) struct Subscribe(pub Pid);

pub(crate) struct Unsubscribe(pub Pid);

/// Publish/subscribe hub for system events.
///
/// The subscriber set is owned by the receiver and only changed from inside its own message
/// loop. Concurrent subscribes, unsubscribes and broadcasts are ordered by the mailbox.
#[derive(Default)]
pub(crate) struct EventStream {
    subscribers: HashSet<Pid>,
}

impl Receiver for EventStream {
    fn receive(&mut self, ctx: &mut Context) {
        let message = ctx.message();
        if let Some(Subscribe(pid)) = message.downcast_ref::<Subscribe>() {
            debug!("{} subscribed to the event stream", pid);
            self.subscribers.insert(pid.clone());
        } else if let Some(Unsubscribe(pid)) = message.downcast_ref::<Unsubscribe>() {
            debug!("{} unsubscribed from the event stream", pid);
            self.subscribers.remove(pid);
        } else if message.is::<Initialized>() || message.is::<Started>() || message.is::<Stopped>()
        {
            // Lifecycle of the stream itself, not an event.
        } else {
            let engine = ctx.engine();
            for pid in self.subscribers.iter() {
                // Delivering to a subscriber that can't be reached would produce another event,
                // which would be broadcast to the same subscriber again. The subscription is
                // kept, the pid may still be spawned later.
                let reachable = if engine.is_local(pid) {
                    engine.registry().contains(pid)
                } else {
                    engine.has_remote()
                };
                if reachable {
                    engine.send(pid, message.clone());
                } else {
                    trace!("Skipping unreachable subscriber {}", pid);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc::unbounded_channel;

    use tokio::sync::mpsc::UnboundedSender;

    use crate::{Context, Engine, EngineConfig, Message, Pid, Receiver, SpawnOptions};

    #[derive(Debug, PartialEq)]
    struct Tick(u32);

    #[tokio::test]
    async fn subscribing_twice_delivers_once() {
        let engine = Engine::new(EngineConfig::new()).unwrap();
        let (tx, mut rx) = unbounded_channel();
        let pid = engine.spawn_func(
            move |ctx| {
                if let Some(tick) = ctx.message().downcast_ref::<Tick>() {
                    let _ = tx.send(tick.0);
                }
            },
            "listener",
        );
        engine.subscribe(&pid);
        engine.subscribe(&pid);
        engine.broadcast_event(Tick(1));

        assert_eq!(rx.recv().await, Some(1));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unreachable_subscribers_are_skipped() {
        let engine = Engine::new(EngineConfig::new()).unwrap();
        let (tx, mut rx) = unbounded_channel::<Message>();
        let listener = engine.spawn_func(
            move |ctx| {
                if ctx.message().is::<Tick>() {
                    let _ = tx.send(ctx.message().clone());
                }
            },
            "listener",
        );
        // Neither of these can ever be reached
        engine.subscribe(&Pid::local("ghost/1"));
        engine.subscribe(&Pid::new("10.0.0.1:4000", "ghost/2"));
        engine.subscribe(&listener);

        engine.broadcast_event(Tick(1));
        engine.broadcast_event(Tick(2));

        assert_eq!(rx.recv().await.unwrap().downcast_ref::<Tick>(), Some(&Tick(1)));
        assert_eq!(rx.recv().await.unwrap().downcast_ref::<Tick>(), Some(&Tick(2)));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }

    struct Listener(UnboundedSender<u32>);

    impl Receiver for Listener {
        fn receive(&mut self, ctx: &mut Context) {
            if let Some(tick) = ctx.message().downcast_ref::<Tick>() {
                let _ = self.0.send(tick.0);
            }
        }
    }

    #[tokio::test]
    async fn subscription_outlives_a_not_yet_spawned_pid() {
        let engine = Engine::new(EngineConfig::new()).unwrap();
        let late = Pid::new(engine.address(), "listener/late");
        engine.subscribe(&late);
        engine.broadcast_event(Tick(1));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (tx, mut rx) = unbounded_channel();
        let pid = engine.spawn_with_opts(
            move || Listener(tx.clone()),
            "listener",
            SpawnOptions::new().with_id("late"),
        );
        assert_eq!(pid, late);
        engine.broadcast_event(Tick(2));

        assert_eq!(rx.recv().await, Some(2));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }
}
