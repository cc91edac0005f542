pub mod display;
pub mod guard;

pub use display::{DisplayBackend, DryRunDisplay, X11Display};
pub use guard::WindowGuard;
