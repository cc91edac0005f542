pub mod monitor;
pub mod window;

pub use monitor::{OutputInfo, Point, Rect, Topology};
pub use window::{WindowHandle, WindowKind, WindowKinds, WindowSnapshot};
