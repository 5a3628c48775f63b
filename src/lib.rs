//! A cooperative message-loop arbiter for component-based UI hosts.
//!
//! `loopmux` implements the component-manager protocol used by hosts that
//! share ownership of a thread's native message loop: components register for
//! an opaque cookie, one of them may be active and at most one may be
//! tracking, global state bits fan out to everyone, and any registered
//! component can push a cooperative message loop that yields per-message
//! control decisions back to the arbitration layer. Nested loops are the
//! normal case (a modal dialog opened from inside dispatch) and unwind in
//! strict LIFO order.
//!
//! The native queue sits behind the [`drivers::MessageQueue`] trait. The
//! [`drivers::SimQueue`] backend scripts a queue in memory for tests and
//! demos; on Windows, [`drivers::Win32Queue`] binds the manager to the real
//! thread queue.

pub mod component;
pub mod drivers;
pub mod manager;
pub mod message;
pub mod registry;
pub mod state;
pub mod tracing_sub;

pub use component::{Component, IdleInterest, RegistrationInfo};
pub use manager::{ActiveSelector, ComponentManager, PumpConfig};
pub use message::{LoopReason, Message, TextEncoding, WM_QUIT, WindowHandle};
pub use registry::ComponentId;
pub use state::{StateAccounting, StateId, StateScope};
