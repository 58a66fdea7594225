// Presentation layer: console menus that call into the core.

pub mod screen;
pub mod session;

pub use session::{Session, SessionOptions};
