use std::cell::Cell;
use std::rc::Rc;

use clap::Parser;

use loopmux::drivers::SimQueue;
use loopmux::{
    Component, ComponentManager, LoopReason, Message, RegistrationInfo, WindowHandle,
};

/// Feed a scripted message sequence through the cooperative pump and report
/// what the registered component saw.
#[derive(Parser)]
#[command(name = "loopmux", version, about)]
struct Args {
    /// Number of scripted messages to enqueue.
    #[arg(long, default_value_t = 8)]
    messages: u32,

    /// Post a quit signal after the scripted messages and run a modal loop
    /// instead of a drain-and-return loop.
    #[arg(long)]
    post_quit: bool,
}

const DEMO_MSG: u32 = 0x0400; // WM_USER

struct EchoComponent {
    seen: Cell<u32>,
}

impl Component for EchoComponent {
    fn pre_translate_message(&self, msg: &Message) -> bool {
        self.seen.set(self.seen.get() + 1);
        tracing::info!(id = msg.id, wparam = msg.wparam, "message offered for pre-translate");
        false
    }
}

fn main() {
    loopmux::tracing_sub::init_default();
    let args = Args::parse();

    let queue = Rc::new(SimQueue::new());
    for n in 0..args.messages {
        queue.push(Message::new(WindowHandle::NULL, DEMO_MSG, n as usize, 0));
    }
    if args.post_quit {
        queue.push(Message::quit(0));
    }

    let manager = ComponentManager::new(Rc::clone(&queue));
    let echo = Rc::new(EchoComponent { seen: Cell::new(0) });
    let id = manager.register(
        Rc::clone(&echo) as Rc<dyn Component>,
        RegistrationInfo::default(),
    );
    manager.activate(id);

    let reason = if args.post_quit {
        LoopReason::ModalForm
    } else {
        LoopReason::DoEvents
    };
    let stopped = manager.push_message_loop(id, reason, None);

    tracing::info!(
        seen = echo.seen.get(),
        dispatched = queue.dispatched().len(),
        stopped_by_component = stopped,
        "pump finished"
    );
}
