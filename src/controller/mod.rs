pub mod engine;
pub mod panel;
pub mod session;
pub mod timers;
pub mod watch;

pub use engine::*;
pub use panel::*;
pub use session::*;
pub use timers::TimerSlots;
pub use watch::*;
