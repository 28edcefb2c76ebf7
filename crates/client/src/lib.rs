//! Client library for the Daily English studio backend.
//!
//! Provides the REST API wrapper, a cancellable task-status poller,
//! view models for progress and results, and the session controllers
//! behind the generation page, the video editor and the thumbnail studio.

pub mod api;
pub mod backend;
pub mod bindings;
pub mod config;
pub mod events;
pub mod poller;
pub mod projection;
pub mod session;
pub mod thumbnail;

#[cfg(test)]
mod testing;
