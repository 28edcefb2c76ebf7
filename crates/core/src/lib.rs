//! Domain model for the Daily English studio client.
//!
//! Pure logic only: wire types for the backend's HTTP+JSON contract,
//! submission and editor validation, timeline arithmetic, the task
//! polling state machine, and the thumbnail studio form. Nothing here
//! performs I/O.

pub mod editor;
pub mod error;
pub mod generation;
pub mod task;
pub mod thumbnail;
pub mod timeline;
pub mod types;
pub mod validation;
