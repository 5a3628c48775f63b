//! Scripted in-memory queue for tests and demos.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use super::{MessageQueue, QueueError};
use crate::message::Message;

/// In-memory [`MessageQueue`] with a scripted message sequence.
///
/// Messages pushed with [`push`](SimQueue::push) are immediately pending.
/// Messages added with [`defer`](SimQueue::defer) become pending only after
/// the pump blocks in `wait`, which models a message arriving while the
/// thread sleeps. `wait` itself never blocks, so tests run at full speed.
///
/// The queue records what the pump did to it (dispatches, waits, quit
/// cleanups) for assertions. A dispatch hook can be installed to stand in
/// for a window procedure; it runs after the dispatch is recorded, with no
/// internal borrow held, so the hook may call back into the manager that
/// owns this queue, including pushing a nested message loop.
#[derive(Default)]
pub struct SimQueue {
    inner: RefCell<Inner>,
    dispatch_hook: RefCell<Option<Rc<dyn Fn(&Message)>>>,
}

#[derive(Default)]
struct Inner {
    pending: VecDeque<Message>,
    deferred: VecDeque<Message>,
    dispatched: Vec<Message>,
    waits: Vec<Option<Duration>>,
    quit_cleanups: u32,
}

impl SimQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message that is pending right away.
    pub fn push(&self, msg: Message) {
        self.inner.borrow_mut().pending.push_back(msg);
    }

    /// Appends a message that arrives on the next `wait`.
    pub fn defer(&self, msg: Message) {
        self.inner.borrow_mut().deferred.push_back(msg);
    }

    /// Installs the stand-in window procedure run for each dispatched
    /// message.
    pub fn set_dispatch_hook(&self, hook: impl Fn(&Message) + 'static) {
        *self.dispatch_hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Messages the pump routed through translate-and-dispatch, in order.
    pub fn dispatched(&self) -> Vec<Message> {
        self.inner.borrow().dispatched.clone()
    }

    /// Timeouts the pump waited with, in order.
    pub fn waits(&self) -> Vec<Option<Duration>> {
        self.inner.borrow().waits.clone()
    }

    pub fn quit_cleanups(&self) -> u32 {
        self.inner.borrow().quit_cleanups
    }

    pub fn pending_len(&self) -> usize {
        self.inner.borrow().pending.len()
    }
}

impl MessageQueue for SimQueue {
    fn peek(&self) -> Option<Message> {
        self.inner.borrow().pending.front().copied()
    }

    fn take(&self) -> Option<Message> {
        self.inner.borrow_mut().pending.pop_front()
    }

    fn translate_and_dispatch(&self, msg: &Message) {
        self.inner.borrow_mut().dispatched.push(*msg);
        // Borrows are released before the hook runs so it can use the queue.
        let hook = self.dispatch_hook.borrow().clone();
        if let Some(hook) = hook {
            hook(msg);
        }
    }

    fn post_quit(&self, exit_code: i32) {
        self.push(Message::quit(exit_code));
    }

    fn wait(&self, timeout: Option<Duration>) -> Result<(), QueueError> {
        let mut inner = self.inner.borrow_mut();
        inner.waits.push(timeout);
        if let Some(msg) = inner.deferred.pop_front() {
            inner.pending.push_back(msg);
        }
        Ok(())
    }

    fn quit_cleanup(&self) {
        self.inner.borrow_mut().quit_cleanups += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::WindowHandle;

    #[test]
    fn peek_is_non_destructive() {
        let q = SimQueue::new();
        q.push(Message::new(WindowHandle(7), 0x0100, 1, 2));
        assert_eq!(q.peek(), q.peek());
        assert_eq!(q.pending_len(), 1);
        assert!(q.take().is_some());
        assert!(q.peek().is_none());
    }

    #[test]
    fn deferred_messages_arrive_after_wait() {
        let q = SimQueue::new();
        q.defer(Message::new(WindowHandle(1), 0x0200, 0, 0));
        assert!(q.peek().is_none());
        q.wait(Some(Duration::from_millis(100))).unwrap();
        assert!(q.peek().is_some());
        assert_eq!(q.waits(), vec![Some(Duration::from_millis(100))]);
    }

    #[test]
    fn post_quit_enqueues_a_quit_message() {
        let q = SimQueue::new();
        q.post_quit(0);
        assert!(q.take().map(|m| m.is_quit()).unwrap_or(false));
    }

    #[test]
    fn dispatch_hook_can_use_the_queue() {
        let q = Rc::new(SimQueue::new());
        q.push(Message::new(WindowHandle::NULL, 0x0300, 0, 0));
        let handle = Rc::clone(&q);
        q.set_dispatch_hook(move |msg| {
            // re-entering the queue from the hook must not conflict with
            // the dispatch bookkeeping
            assert!(handle.peek().is_none());
            assert_eq!(handle.dispatched().len(), 1);
            assert_eq!(handle.dispatched()[0].id, msg.id);
        });
        let msg = q.take().expect("scripted message");
        q.translate_and_dispatch(&msg);
        assert_eq!(q.dispatched().len(), 1);
    }
}
