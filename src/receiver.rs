use std::sync::Arc;

use crate::context::Context;

/// Actor logic that is run by a local process.
///
/// A receiver is only ever driven by the task of its own process, one message at a time, so it
/// can keep mutable state without any synchronisation. Besides regular messages it's handed the
/// lifecycle messages [`Initialized`], [`Started`] and [`Stopped`].
pub trait Receiver: Send + 'static {
    fn receive(&mut self, ctx: &mut Context);
}

/// Creates a fresh receiver. Called once per spawn and again on every restart.
pub type Producer = Arc<dyn Fn() -> Box<dyn Receiver> + Send + Sync>;

/// First message handed to a newly created receiver, before it's reachable by anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Initialized;

/// Handed to a receiver right after [`Initialized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started;

/// Last message a receiver gets before its process is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped;

pub(crate) fn producer<P, R>(produce: P) -> Producer
where
    P: Fn() -> R + Send + Sync + 'static,
    R: Receiver,
{
    Arc::new(move || Box::new(produce()) as Box<dyn Receiver>)
}

// Stateless receiver wrapping a plain function.
struct FuncReceiver<F> {
    f: Arc<F>,
}

impl<F> Receiver for FuncReceiver<F>
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    fn receive(&mut self, ctx: &mut Context) {
        (self.f)(ctx)
    }
}

pub(crate) fn func_producer<F>(f: F) -> Producer
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    let f = Arc::new(f);
    producer(move || FuncReceiver { f: f.clone() })
}
