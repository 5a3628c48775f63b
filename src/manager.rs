//! Component manager: registration, message-routing arbitration, and the
//! reentrant cooperative message pump.
//!
//! One manager exists per thread that owns a native message queue. It is
//! thread-affine by construction (`Rc` handles and `Cell`/`RefCell` internals
//! make it neither `Send` nor `Sync`); "concurrency" here means reentrancy,
//! nested pump invocations on the same call stack, not parallel threads.
//!
//! All contract operations take `&self` so a component callback may call back
//! into the manager, including pushing a nested message loop. Nested loops
//! form a strict LIFO: each level snapshots the arbitration state on entry
//! and restores exactly what it captured on every exit path.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::component::{Component, RegistrationInfo};
use crate::drivers::MessageQueue;
use crate::message::LoopReason;
use crate::registry::{ComponentId, ComponentRegistry};
use crate::state::{StateAccounting, StateBits, StateId, StateScope};

/// Selector for [`ComponentManager::get_active`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveSelector {
    Active,
    Tracking,
    /// The tracking component when one exists, else the active component.
    /// This is the resolution order the pump itself uses.
    TrackingOrActive,
}

/// Pump tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Ceiling on the block-wait taken after components requested idle time.
    /// A component that never stops asking for idle time therefore cannot
    /// pin a core.
    pub idle_wait_ceiling: Duration,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            idle_wait_ceiling: Duration::from_millis(100),
        }
    }
}

/// Cooperative message-loop arbiter over a native queue `Q`.
///
/// The queue is held directly and its methods take `&self`, so no borrow of
/// manager state is live while a message is dispatched. That is what makes
/// dispatch a safe nesting point: a window procedure may call back in and
/// push a nested message loop.
pub struct ComponentManager<Q> {
    queue: Q,
    registry: RefCell<ComponentRegistry>,
    active: Cell<Option<ComponentId>>,
    tracking: Cell<Option<ComponentId>>,
    states: RefCell<StateBits>,
    config: PumpConfig,
}

impl<Q: MessageQueue> ComponentManager<Q> {
    pub fn new(queue: Q) -> Self {
        Self::with_config(queue, PumpConfig::default(), StateAccounting::default())
    }

    pub fn with_config(queue: Q, config: PumpConfig, accounting: StateAccounting) -> Self {
        Self {
            queue,
            registry: RefCell::new(ComponentRegistry::new()),
            active: Cell::new(None),
            tracking: Cell::new(None),
            states: RefCell::new(StateBits::new(accounting)),
            config,
        }
    }

    /// Registers `component` and returns its cookie. Never fails.
    pub fn register(&self, component: Rc<dyn Component>, info: RegistrationInfo) -> ComponentId {
        let id = self.registry.borrow_mut().insert(component, info);
        tracing::debug!(id = id.raw(), "registered component");
        id
    }

    /// Removes the registration for `id`. Clears the active or tracking slot
    /// if it pointed at the revoked component. Returns false for an unknown
    /// cookie.
    pub fn revoke(&self, id: ComponentId) -> bool {
        if !self.registry.borrow_mut().remove(id) {
            return false;
        }
        if self.active.get() == Some(id) {
            self.active.set(None);
        }
        if self.tracking.get() == Some(id) {
            self.tracking.set(None);
        }
        tracing::debug!(id = id.raw(), "revoked component");
        true
    }

    /// Replaces the registration info for `id`. Returns false for an unknown
    /// cookie.
    pub fn update_registration(&self, id: ComponentId, info: RegistrationInfo) -> bool {
        self.registry.borrow_mut().update(id, info)
    }

    /// Makes `id` the active component. Single-slot overwrite; exclusive
    /// activation is not tracked, so this never fails for a known cookie.
    pub fn activate(&self, id: ComponentId) -> bool {
        if !self.registry.borrow().contains(id) {
            return false;
        }
        self.active.set(Some(id));
        tracing::debug!(id = id.raw(), "activated component");
        true
    }

    /// Begins (`enable`) or ends a tracking operation for `id`. At most one
    /// component tracks at a time, and the call must actually change this
    /// component's tracking state: enabling while already the tracker fails
    /// the same way enabling while another component tracks does, and
    /// disabling when not the tracker fails.
    pub fn set_tracking(&self, id: ComponentId, enable: bool) -> bool {
        if !self.registry.borrow().contains(id) {
            return false;
        }
        let currently = self.tracking.get() == Some(id);
        if currently == enable {
            return false;
        }
        if enable {
            if self.tracking.get().is_some() {
                return false;
            }
            self.tracking.set(Some(id));
        } else {
            self.tracking.set(None);
        }
        tracing::debug!(id = id.raw(), tracking = enable, "tracking changed");
        true
    }

    /// Whether `state` is currently in effect.
    pub fn query_state(&self, state: StateId) -> bool {
        self.states.borrow().contains(state)
    }

    /// Enters `state`, notifying every registered component when `scope` is
    /// [`StateScope::All`].
    pub fn enter_state(&self, state: StateId, scope: StateScope) {
        self.states.borrow_mut().enter(state);
        tracing::debug!(?state, ?scope, "entered state");
        if scope == StateScope::All {
            self.notify_state(state, true);
        }
    }

    /// Exits `state` with the same fan-out as [`enter_state`]. Returns
    /// whether the bit is still in effect afterwards, which under the default
    /// flat accounting is always false.
    ///
    /// [`enter_state`]: ComponentManager::enter_state
    pub fn exit_state(&self, state: StateId, scope: StateScope) -> bool {
        let still_set = self.states.borrow_mut().exit(state);
        tracing::debug!(?state, ?scope, still_set, "exited state");
        if scope == StateScope::All {
            self.notify_state(state, false);
        }
        still_set
    }

    /// The component selected by `selector` and its registration info, or
    /// `None` when the slot is empty.
    pub fn get_active(
        &self,
        selector: ActiveSelector,
    ) -> Option<(Rc<dyn Component>, RegistrationInfo)> {
        let id = match selector {
            ActiveSelector::Active => self.active.get(),
            ActiveSelector::Tracking => self.tracking.get(),
            ActiveSelector::TrackingOrActive => self.tracking.get().or(self.active.get()),
        }?;
        let registry = self.registry.borrow();
        Some((registry.component(id)?, registry.info(id)?))
    }

    /// Called by a component from inside `do_idle`. Returns false as soon as
    /// a message is pending, telling the component to wind down its idle
    /// work.
    pub fn continue_idle(&self) -> bool {
        self.queue.peek().is_none()
    }

    /// Sub-manager hierarchies are permanently unsupported; this manager is
    /// a single flat arbiter. Always `None`.
    pub fn create_sub_manager(&self) -> Option<Rc<Self>> {
        None
    }

    /// Always `None`; see [`create_sub_manager`](Self::create_sub_manager).
    pub fn parent_manager(&self) -> Option<Rc<Self>> {
        None
    }

    pub fn active_id(&self) -> Option<ComponentId> {
        self.active.get()
    }

    pub fn tracking_id(&self) -> Option<ComponentId> {
        self.tracking.get()
    }

    /// Raw bitmask of currently-entered states.
    pub fn state_mask(&self) -> u32 {
        self.states.borrow().mask()
    }

    /// Runs the message loop on behalf of the component registered as `id`.
    ///
    /// The requester temporarily becomes the active component for the
    /// duration of the loop; the previous active component and state bits are
    /// restored when the loop exits, however it exits. Fails fast (returns
    /// false without entering the loop) for an unknown cookie.
    ///
    /// Returns true when the loop ended because the recipient's
    /// continue-check said stop, false for every other termination (quit
    /// signal, drained transient loop, queue failure).
    pub fn push_message_loop(
        &self,
        id: ComponentId,
        reason: LoopReason,
        loop_data: Option<&dyn Any>,
    ) -> bool {
        let Some(requester) = self.registry.borrow().component(id) else {
            tracing::warn!(id = id.raw(), "message loop pushed with unknown cookie");
            return false;
        };
        tracing::debug!(id = id.raw(), ?reason, "entering message loop");
        let _guard = ArbitrationGuard::capture(self);
        self.active.set(Some(id));
        let stopped = self.pump(&requester, reason, loop_data);
        tracing::debug!(
            id = id.raw(),
            ?reason,
            stopped_by_component = stopped,
            "leaving message loop"
        );
        stopped
    }

    /// The component entitled to this iteration's routing decisions: the
    /// tracking component, else the active component, else the loop's
    /// requester. Resolved fresh every iteration because nested calls may
    /// change the slots mid-loop.
    fn recipient(&self, requester: &Rc<dyn Component>) -> Rc<dyn Component> {
        let registry = self.registry.borrow();
        self.tracking
            .get()
            .and_then(|id| registry.component(id))
            .or_else(|| self.active.get().and_then(|id| registry.component(id)))
            .unwrap_or_else(|| Rc::clone(requester))
    }

    fn pump(
        &self,
        requester: &Rc<dyn Component>,
        reason: LoopReason,
        loop_data: Option<&dyn Any>,
    ) -> bool {
        loop {
            let recipient = self.recipient(requester);
            match self.queue.peek() {
                Some(msg) => {
                    if !recipient.continue_message_loop(reason, loop_data, Some(&msg)) {
                        // Stop requested before consumption; the message
                        // stays queued for an enclosing loop.
                        return true;
                    }
                    let Some(msg) = self.queue.take() else {
                        continue;
                    };
                    if msg.is_quit() {
                        self.queue.quit_cleanup();
                        if !reason.is_main() {
                            // Repost so enclosing loops observe the quit and
                            // unwind too.
                            self.queue.post_quit(msg.wparam as i32);
                        }
                        return false;
                    }
                    if !recipient.pre_translate_message(&msg) {
                        self.queue.translate_and_dispatch(&msg);
                    }
                }
                None => {
                    if reason.is_transient() {
                        // Drain-and-return loop; nothing left to do.
                        return false;
                    }
                    let wants_idle = self.run_idle();
                    if !recipient.continue_message_loop(reason, loop_data, None) {
                        return true;
                    }
                    let wait_result = if wants_idle {
                        self.queue.wait(Some(self.config.idle_wait_ceiling))
                    } else if self.queue.peek().is_none() {
                        // A message may have arrived between the idle pass
                        // and now; only block when the queue is still empty.
                        self.queue.wait(None)
                    } else {
                        Ok(())
                    };
                    if let Err(err) = wait_result {
                        tracing::warn!(%err, "queue wait failed, terminating loop");
                        return false;
                    }
                }
            }
        }
    }

    /// Offers idle time to every registered component, OR-ing their "wants
    /// more" answers. The interest flags in the registration info do not gate
    /// the offer; a component that wants no idle time returns false from
    /// `do_idle`.
    fn run_idle(&self) -> bool {
        let components = self.registry.borrow().components();
        let mut wants_more = false;
        for component in components {
            wants_more |= component.do_idle();
        }
        wants_more
    }

    fn notify_state(&self, state: StateId, entering: bool) {
        // Iterate a snapshot of the handles; a callback that registers or
        // revokes components cannot invalidate the walk.
        let components = self.registry.borrow().components();
        for component in components {
            component.on_enter_state(state, entering);
        }
    }
}

/// Restores the arbitration snapshot taken when a pump level was entered.
///
/// Held for the duration of one `push_message_loop` invocation. Nested
/// invocations stack these guards, and each restores exactly the state it
/// captured, on every exit path.
struct ArbitrationGuard<'a, Q> {
    manager: &'a ComponentManager<Q>,
    active: Option<ComponentId>,
    states: StateBits,
}

impl<'a, Q> ArbitrationGuard<'a, Q> {
    fn capture(manager: &'a ComponentManager<Q>) -> Self {
        Self {
            manager,
            active: manager.active.get(),
            states: manager.states.borrow().clone(),
        }
    }
}

impl<Q> Drop for ArbitrationGuard<'_, Q> {
    fn drop(&mut self) {
        self.manager.active.set(self.active);
        *self.manager.states.borrow_mut() = self.states.clone();
    }
}
