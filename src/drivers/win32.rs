//! Win32 message-queue backend.

use std::cell::{Cell, RefCell};
use std::io;
use std::mem;
use std::ptr;
use std::time::Duration;

use windows_sys::Win32::Foundation::{HWND, WAIT_FAILED};
use windows_sys::Win32::UI::WindowsAndMessaging::{
    DispatchMessageA, DispatchMessageW, IsWindowUnicode, MSG, MsgWaitForMultipleObjects,
    PM_NOREMOVE, PM_REMOVE, PeekMessageA, PeekMessageW, PostQuitMessage, QS_ALLINPUT,
    TranslateMessage, WaitMessage,
};

use super::{MessageQueue, QueueError};
use crate::message::{Message, TextEncoding, WindowHandle};

/// [`MessageQueue`] bound to the calling thread's real Win32 queue.
///
/// Thread-affine like everything else in this crate: construct and use it on
/// the thread that owns the queue.
///
/// The raw `MSG` of the most recently removed message is retained so dispatch
/// can hand the OS the original time and cursor-position fields, which the
/// portable [`Message`] does not carry. It lives in a `Cell` and is taken out
/// before `DispatchMessageW/A` runs; a window procedure that reenters the
/// manager (nested message loop) finds the queue with no state borrowed.
#[derive(Default)]
pub struct Win32Queue {
    last_removed: Cell<Option<MSG>>,
    quit_cleanup: RefCell<Option<Box<dyn FnMut()>>>,
}

impl Win32Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the thread-local window cleanup run when a quit message is
    /// consumed.
    pub fn set_quit_cleanup(&self, cleanup: impl FnMut() + 'static) {
        *self.quit_cleanup.borrow_mut() = Some(Box::new(cleanup));
    }
}

fn encoding_for(hwnd: HWND) -> TextEncoding {
    // Thread messages have no window; wide is the native default.
    if hwnd.is_null() {
        return TextEncoding::Wide;
    }
    if unsafe { IsWindowUnicode(hwnd) } != 0 {
        TextEncoding::Wide
    } else {
        TextEncoding::Narrow
    }
}

fn convert(raw: &MSG, encoding: TextEncoding) -> Message {
    Message {
        hwnd: WindowHandle(raw.hwnd as usize),
        id: raw.message,
        wparam: raw.wParam,
        lparam: raw.lParam,
        encoding,
    }
}

impl MessageQueue for Win32Queue {
    fn peek(&self) -> Option<Message> {
        let mut raw: MSG = unsafe { mem::zeroed() };
        if unsafe { PeekMessageW(&mut raw, ptr::null_mut(), 0, 0, PM_NOREMOVE) } == 0 {
            return None;
        }
        Some(convert(&raw, encoding_for(raw.hwnd)))
    }

    fn take(&self) -> Option<Message> {
        // Learn the target window first so the removal primitive matches its
        // encoding.
        let mut raw: MSG = unsafe { mem::zeroed() };
        if unsafe { PeekMessageW(&mut raw, ptr::null_mut(), 0, 0, PM_NOREMOVE) } == 0 {
            return None;
        }
        let encoding = encoding_for(raw.hwnd);
        let removed = match encoding {
            TextEncoding::Wide => unsafe {
                PeekMessageW(&mut raw, ptr::null_mut(), 0, 0, PM_REMOVE)
            },
            TextEncoding::Narrow => unsafe {
                PeekMessageA(&mut raw, ptr::null_mut(), 0, 0, PM_REMOVE)
            },
        };
        if removed == 0 {
            return None;
        }
        self.last_removed.set(Some(raw));
        Some(convert(&raw, encoding))
    }

    fn translate_and_dispatch(&self, msg: &Message) {
        let raw = match self.last_removed.take() {
            Some(raw) if raw.hwnd as usize == msg.hwnd.0 && raw.message == msg.id => raw,
            _ => {
                // Synthesized message (not one we removed); time and pt are
                // unknown, zero is what PostMessage-delivered storms get too.
                let mut raw: MSG = unsafe { mem::zeroed() };
                raw.hwnd = msg.hwnd.0 as HWND;
                raw.message = msg.id;
                raw.wParam = msg.wparam;
                raw.lParam = msg.lparam;
                raw
            }
        };
        unsafe {
            TranslateMessage(&raw);
            match msg.encoding {
                TextEncoding::Wide => DispatchMessageW(&raw),
                TextEncoding::Narrow => DispatchMessageA(&raw),
            };
        }
    }

    fn post_quit(&self, exit_code: i32) {
        unsafe { PostQuitMessage(exit_code) };
    }

    fn wait(&self, timeout: Option<Duration>) -> Result<(), QueueError> {
        match timeout {
            Some(timeout) => {
                let millis = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
                let result =
                    unsafe { MsgWaitForMultipleObjects(0, ptr::null(), 0, millis, QS_ALLINPUT) };
                if result == WAIT_FAILED {
                    return Err(QueueError::Native(io::Error::last_os_error()));
                }
            }
            None => {
                if unsafe { WaitMessage() } == 0 {
                    return Err(QueueError::Native(io::Error::last_os_error()));
                }
            }
        }
        Ok(())
    }

    fn quit_cleanup(&self) {
        // Taken out while it runs; the cleanup may touch the queue.
        if let Some(mut cleanup) = self.quit_cleanup.take() {
            cleanup();
            self.quit_cleanup.replace(Some(cleanup));
        }
    }
}
