//! Component capability contract.
//!
//! A registrant implements [`Component`] and hands the manager a shared
//! handle to it. The manager calls back through this trait while pumping
//! messages: once per loop iteration to ask whether to continue, once per
//! message for first-chance interception, during idle time, and whenever a
//! global state bit is entered or exited.

use std::any::Any;
use std::time::Duration;

use crate::message::{LoopReason, Message};
use crate::state::StateId;

/// Idle-time interest flags carried in a component's registration info.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdleInterest {
    /// Component wants idle time whenever the queue goes empty.
    pub needs_idle: bool,
    /// Component wants to be ticked every `idle_interval` during idle phases.
    pub needs_periodic_idle: bool,
}

impl IdleInterest {
    pub const fn any(self) -> bool {
        self.needs_idle || self.needs_periodic_idle
    }
}

/// Registration data supplied when a component registers. Replaceable later
/// through `update_registration`; typically that is done to change the idle
/// interest flags.
///
/// The manager stores this blob and hands it back from `get_active`, but its
/// own scheduling ignores the flags: idle time is offered to every registered
/// component whenever the queue goes empty, and the loop recipient is always
/// offered pre-translate. The fields exist for hosts that route messages or
/// timers themselves and want the component's declared interest on record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistrationInfo {
    pub idle: IdleInterest,
    /// Periodic idle tick interval. Meaningful when `needs_periodic_idle` is
    /// set.
    pub idle_interval: Duration,
    /// Component wants a look at every message during pre-translate, not just
    /// keyboard input.
    pub pre_translate_all: bool,
}

/// Callback contract between the manager and a registered component.
///
/// All methods take `&self`: the manager is reentrant, and a callback is
/// allowed to call back into the manager (including pushing a nested message
/// loop). Components needing mutable state use interior mutability.
pub trait Component {
    /// Asked once per pump iteration whether the loop pushed for `reason`
    /// should keep running. `loop_data` is the opaque payload the loop's
    /// requester passed to `push_message_loop`. When a message is pending it
    /// is provided un-consumed in `peeked`; during idle iterations `peeked`
    /// is `None`.
    ///
    /// Returning `false` terminates the loop without consuming a pending
    /// message.
    fn continue_message_loop(
        &self,
        reason: LoopReason,
        loop_data: Option<&dyn Any>,
        peeked: Option<&Message>,
    ) -> bool {
        let _ = (reason, loop_data, peeked);
        true
    }

    /// First-chance interception before a message is translated and
    /// dispatched. Return `true` to consume the message.
    fn pre_translate_message(&self, msg: &Message) -> bool {
        let _ = msg;
        false
    }

    /// Called while the queue is empty. Return `true` to be offered more idle
    /// time on the next empty iteration.
    fn do_idle(&self) -> bool {
        false
    }

    /// Notification that a global state bit was entered (`entering`) or
    /// exited. Exits can outnumber enters; components keeping their own
    /// counter should not decrement below zero.
    fn on_enter_state(&self, state: StateId, entering: bool) {
        let _ = (state, entering);
    }
}
