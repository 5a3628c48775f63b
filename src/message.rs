//! Native message primitives shared by the pump and the queue drivers.

/// Opaque handle to the native window a message targets. Zero means the
/// message is addressed to the thread rather than a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub usize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Text encoding of the window a message targets.
///
/// Resolved once when the message is pulled off the queue and carried
/// alongside it, so the consume/dispatch primitives can be paired correctly
/// without re-querying the window. Mixing the pair up corrupts text message
/// decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Wide,
    Narrow,
}

/// The native quit signal. Always terminates the current pump level; it is
/// reposted so enclosing levels observe it too.
pub const WM_QUIT: u32 = 0x0012;

/// A single message as delivered by the native queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub hwnd: WindowHandle,
    pub id: u32,
    pub wparam: usize,
    pub lparam: isize,
    pub encoding: TextEncoding,
}

impl Message {
    pub const fn new(hwnd: WindowHandle, id: u32, wparam: usize, lparam: isize) -> Self {
        Self {
            hwnd,
            id,
            wparam,
            lparam,
            encoding: TextEncoding::Wide,
        }
    }

    pub const fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// A quit message addressed to the thread. `exit_code` travels in
    /// `wparam` as it does natively.
    pub const fn quit(exit_code: i32) -> Self {
        Self::new(WindowHandle::NULL, WM_QUIT, exit_code as usize, 0)
    }

    pub const fn is_quit(&self) -> bool {
        self.id == WM_QUIT
    }
}

/// Why a component pushed a message loop.
///
/// The numbering follows the host contract: `DoEventsModal` and `Main` are
/// not official host loop reasons but must stay distinct from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopReason {
    DoEventsModal,
    Main,
    FocusWait,
    DoEvents,
    Debug,
    ModalForm,
    ModalAlert,
}

impl LoopReason {
    /// Transient loops drain whatever is queued and return instead of idling.
    pub const fn is_transient(self) -> bool {
        matches!(self, LoopReason::DoEvents | LoopReason::DoEventsModal)
    }

    /// The top-level loop. The only level that does not repost a consumed
    /// quit signal.
    pub const fn is_main(self) -> bool {
        matches!(self, LoopReason::Main)
    }

    /// Raw reason code as passed across the host contract boundary.
    pub const fn code(self) -> i32 {
        match self {
            LoopReason::DoEventsModal => -2,
            LoopReason::Main => -1,
            LoopReason::FocusWait => 1,
            LoopReason::DoEvents => 2,
            LoopReason::Debug => 3,
            LoopReason::ModalForm => 4,
            LoopReason::ModalAlert => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_message_carries_exit_code() {
        let msg = Message::quit(7);
        assert!(msg.is_quit());
        assert_eq!(msg.wparam, 7);
        assert!(msg.hwnd.is_null());
    }

    #[test]
    fn transient_reasons() {
        assert!(LoopReason::DoEvents.is_transient());
        assert!(LoopReason::DoEventsModal.is_transient());
        assert!(!LoopReason::ModalForm.is_transient());
        assert!(!LoopReason::Main.is_transient());
        assert!(LoopReason::Main.is_main());
    }

    #[test]
    fn reason_codes_are_distinct() {
        let all = [
            LoopReason::DoEventsModal,
            LoopReason::Main,
            LoopReason::FocusWait,
            LoopReason::DoEvents,
            LoopReason::Debug,
            LoopReason::ModalForm,
            LoopReason::ModalAlert,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }
}
