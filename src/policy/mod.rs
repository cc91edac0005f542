//! Pure placement policy: no X11 calls, no state kept between ticks.
//!
//! Everything here is derived from a single tick's topology and window
//! snapshots, which is what lets the guard heal after outside interference.

pub mod placement;
pub mod pointer;

pub use placement::{CorrectiveAction, PlacementContext};
pub use pointer::confine_pointer;
