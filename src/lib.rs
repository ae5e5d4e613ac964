//! binokel: a turn-driven round engine for the Binokel card game
//!
//! Goals:
//! - One round from the deal to the last trick, driven by triggers
//! - Deterministic: the same round record replays the same round
//! - No panics for illegal input; illegal triggers are ignored, bad
//!   collaborator answers surface as `RoundError`
//!
//! The [`round`] module holds the state machine, [`bridge`] connects it to
//! notification handlers, and [`controller`] answers every notification
//! with humans, bots and a presentation sink from [`agents`].
//!
//! ## Quick start: play a round with bots
//! ```
//! use binokel::agents::{ScriptedHuman, TracingSink};
//! use binokel::bridge::RoundBridge;
//! use binokel::controller::RoundController;
//! use binokel::round::State;
//! use binokel::settings::{RoundRecord, RoundSettings};
//!
//! let record = RoundRecord::new(RoundSettings::default(), 3, 2024);
//! let controller = RoundController::new(record, ScriptedHuman::default(), TracingSink).unwrap();
//! let mut bridge = RoundBridge::new();
//! let summary = controller.play(&mut bridge).unwrap();
//! assert_eq!(summary.final_state, State::End);
//! ```
//!
//! ## TUI
//! Play a round from the terminal with:
//! ```sh
//! cargo run --bin binokel -- --players 4 --human 0
//! ```

pub mod agents;
pub mod bridge;
pub mod cards;
pub mod controller;
pub mod deck;
pub mod protocol;
pub mod round;
pub mod settings;
pub mod tricks;
pub mod tui;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
