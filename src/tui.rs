//! Terminal front end.
//!
//! The round runs on its own thread behind channel-backed collaborators;
//! the TUI owns the terminal, mirrors the table from [`HostEvent`]s and
//! sends the human seat's decisions back.
//!
//! [`HostEvent`]: crate::agents::HostEvent

pub mod app;
pub mod controller;
mod ui;
