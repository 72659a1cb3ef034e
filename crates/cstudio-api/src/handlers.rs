//! Request handlers.

pub mod health;
pub mod images;
pub mod sessions;
pub mod video;

pub use health::*;
pub use sessions::*;
