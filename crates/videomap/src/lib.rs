//! VideoMap - projection mapping compositor
//!
//! The [`Stage`] ties a project to decoder sessions, layer rendering and the
//! scene timeline. The `videomap` binary drives it headlessly.

pub mod logging_setup;
pub mod stage;

pub use stage::{Stage, StageOptions, VideoStatus};
