//! Request handlers.

pub mod download;
pub mod feeds;
pub mod health;

pub use download::*;
pub use feeds::*;
pub use health::*;
