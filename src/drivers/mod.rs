pub mod sim;
#[cfg(windows)]
pub mod win32;

pub use sim::SimQueue;
#[cfg(windows)]
pub use win32::Win32Queue;

use std::rc::Rc;
use std::time::Duration;

use thiserror::Error;

use crate::message::Message;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("native queue error: {0}")]
    Native(#[from] std::io::Error),
}

/// Abstraction over the thread's native message queue.
///
/// An implementation resolves each message's text encoding when the message
/// is pulled off the queue, so `translate_and_dispatch` can pick the matching
/// wide or narrow primitive without re-querying the window.
///
/// Methods take `&self`; a driver keeps its own bookkeeping behind interior
/// mutability and must not hold any of it across `translate_and_dispatch`.
/// Dispatch runs arbitrary window procedures, and a window procedure is
/// allowed to call back into the manager that owns this queue, including
/// pushing a nested message loop that uses the queue again.
pub trait MessageQueue {
    /// Non-destructive check for a pending message.
    fn peek(&self) -> Option<Message>;

    /// Removes and returns the next message, or `None` when the queue is
    /// empty.
    fn take(&self) -> Option<Message>;

    /// Keyboard accelerator normalization followed by the normal windowing
    /// dispatch path, honoring the encoding carried on the message.
    fn translate_and_dispatch(&self, msg: &Message);

    /// Posts the quit signal so enclosing loops observe it.
    fn post_quit(&self, exit_code: i32);

    /// Blocks until a message arrives or `timeout` elapses. `None` waits
    /// without a deadline.
    fn wait(&self, timeout: Option<Duration>) -> Result<(), QueueError>;

    /// Thread-local window cleanup performed when the quit signal is
    /// consumed.
    fn quit_cleanup(&self) {}
}

impl<T: MessageQueue + ?Sized> MessageQueue for &T {
    fn peek(&self) -> Option<Message> {
        (**self).peek()
    }

    fn take(&self) -> Option<Message> {
        (**self).take()
    }

    fn translate_and_dispatch(&self, msg: &Message) {
        (**self).translate_and_dispatch(msg)
    }

    fn post_quit(&self, exit_code: i32) {
        (**self).post_quit(exit_code)
    }

    fn wait(&self, timeout: Option<Duration>) -> Result<(), QueueError> {
        (**self).wait(timeout)
    }

    fn quit_cleanup(&self) {
        (**self).quit_cleanup()
    }
}

/// Shared-handle impl so a test or component callback can hold a second
/// handle to the queue the manager owns.
impl<T: MessageQueue + ?Sized> MessageQueue for Rc<T> {
    fn peek(&self) -> Option<Message> {
        (**self).peek()
    }

    fn take(&self) -> Option<Message> {
        (**self).take()
    }

    fn translate_and_dispatch(&self, msg: &Message) {
        (**self).translate_and_dispatch(msg)
    }

    fn post_quit(&self, exit_code: i32) {
        (**self).post_quit(exit_code)
    }

    fn wait(&self, timeout: Option<Duration>) -> Result<(), QueueError> {
        (**self).wait(timeout)
    }

    fn quit_cleanup(&self) {
        (**self).quit_cleanup()
    }
}
