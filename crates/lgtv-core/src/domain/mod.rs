//! Domain types for the LG TV remote.
//!
//! This module contains plain data with no infrastructure dependencies.
//!
//! # What lives here? (for beginners)
//!
//! - [`command`] – the closed set of requests a user can make of the TV, and
//!   the shape of the answers.
//! - [`catalog`] – one installed application as reported by the TV.
//! - [`session`] – the connection state machine and the snapshot of it that
//!   callers outside the worker are allowed to see.
//!
//! None of these types perform I/O.  They are created by the front end,
//! carried across the command queue, and interpreted by the device session
//! in `lgtv-remote`.

pub mod catalog;
pub mod command;
pub mod session;
