//! Display backends: responsibility and boundaries
//!
//! This module and its submodules only read facts from the windowing system
//! (outputs, client list, window properties, pointer) and carry out the
//! mutations they are told to. They MUST NOT decide anything about placement;
//! all decisions live in `crate::policy` and are driven by `WindowGuard`.

mod dry_run;
mod r#trait;
mod x11;

pub use self::dry_run::DryRunDisplay;
#[cfg(test)]
pub use self::dry_run::{FakeWindow, Mutation};
pub use self::r#trait::DisplayBackend;
pub use self::x11::X11Display;
