//! `mecca` command-line front end for the Daily English studio.
//!
//! [`args`] holds the clap definitions, [`commands`] drives the client
//! sessions, and [`render`] turns view models into terminal lines.

pub mod args;
pub mod commands;
pub mod render;
