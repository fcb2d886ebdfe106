/*!
A [`Message`] is the opaque value that travels between processes.

It can hold any `Send + Sync + 'static` value. The value is reference counted, so broadcasting
the same message to many receivers or re-sending it on an interval never copies it. Receivers
inspect messages by downcasting them to the concrete types they understand.
*/

use std::{
    any::{type_name, Any},
    fmt::Debug,
    sync::Arc,
};

pub type Payload = dyn Any + Send + Sync;

#[derive(Clone)]
pub struct Message {
    payload: Arc<Payload>,
    type_name: &'static str,
}

impl Message {
    /// Wraps `value` into a message.
    ///
    /// Passing a value that already is a `Message` returns it unchanged instead of nesting it.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        let boxed: Box<Payload> = Box::new(value);
        match boxed.downcast::<Message>() {
            Ok(message) => *message,
            Err(boxed) => Self {
                payload: Arc::from(boxed),
                type_name: type_name::<T>(),
            },
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.payload.is::<T>()
    }

    /// Name of the type carried by this message.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if both messages share the same payload allocation.
    pub fn ptr_eq(&self, other: &Message) -> bool {
        Arc::ptr_eq(&self.payload, &other.payload)
    }
}

impl Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("type", &self.type_name)
            .finish()
    }
}
