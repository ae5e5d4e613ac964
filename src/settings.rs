//! Round configuration and the round creation record.
//!
//! `RoundSettings` holds the rule knobs for one round. `RoundRecord` bundles
//! the settings with the dealer, the dealing seed and the per-seat
//! human/automated assignment; it is everything needed to replay a round and
//! is serializable so a hosting layer can persist it in whatever format it
//! likes.

use serde::{Deserialize, Serialize};

/// Which physical deck is in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DeckVariant {
    /// Two copies of J Q K T A in four suits.
    #[default]
    Short40,
    /// Two copies of 7 J Q K T A in four suits.
    Full48,
}

impl DeckVariant {
    pub const fn size(self) -> usize {
        match self {
            DeckVariant::Short40 => 40,
            DeckVariant::Full48 => 48,
        }
    }
}

/// Who answers the decisions of a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SeatKind {
    Human,
    Bot,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("player count must be 3 or 4, got {0}")]
    PlayerCount(usize),
    #[error("dealer {dealer} out of range for {players} players")]
    Dealer { dealer: usize, players: usize },
    #[error("seat assignment covers {got} seats, expected {expected}")]
    Seats { expected: usize, got: usize },
    #[error("bid step must be positive")]
    BidStep,
}

/// Rule settings for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct RoundSettings {
    pub player_count: usize,
    pub deck: DeckVariant,
    pub opening_bid: u32,
    pub bid_step: u32,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self { player_count: 4, deck: DeckVariant::Short40, opening_bid: 150, bid_step: 10 }
    }
}

impl RoundSettings {
    pub fn with_players(mut self, player_count: usize) -> Self {
        self.player_count = player_count;
        self
    }

    pub fn with_deck(mut self, deck: DeckVariant) -> Self {
        self.deck = deck;
        self
    }

    pub fn with_bidding(mut self, opening_bid: u32, bid_step: u32) -> Self {
        self.opening_bid = opening_bid;
        self.bid_step = bid_step;
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(3..=4).contains(&self.player_count) {
            return Err(SettingsError::PlayerCount(self.player_count));
        }
        if self.bid_step == 0 {
            return Err(SettingsError::BidStep);
        }
        Ok(())
    }

    /// Cards laid aside face down for the bid winner.
    pub fn dabb_size(&self) -> usize {
        match (self.deck, self.player_count) {
            (DeckVariant::Full48, 3) => 6,
            _ => 4,
        }
    }

    pub fn hand_size(&self) -> usize {
        (self.deck.size() - self.dabb_size()) / self.player_count.max(1)
    }

    /// Cards that will be played into tricks over the whole round.
    pub fn playable_cards(&self) -> usize {
        self.hand_size() * self.player_count
    }
}

/// Everything needed to create, and later reproduce, one round.
///
/// ```
/// use binokel::settings::{RoundRecord, RoundSettings, SeatKind};
///
/// let record = RoundRecord::new(RoundSettings::default(), 2, 7)
///     .with_seat(0, SeatKind::Human);
/// assert!(record.validate().is_ok());
/// assert_eq!(record.seats[0], SeatKind::Human);
/// assert_eq!(record.seats[3], SeatKind::Bot);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct RoundRecord {
    pub settings: RoundSettings,
    pub dealer: usize,
    pub seed: u64,
    pub seats: Vec<SeatKind>,
}

impl RoundRecord {
    /// All seats start as bots.
    pub fn new(settings: RoundSettings, dealer: usize, seed: u64) -> Self {
        let seats = vec![SeatKind::Bot; settings.player_count];
        Self { settings, dealer, seed, seats }
    }

    pub fn with_seat(mut self, seat: usize, kind: SeatKind) -> Self {
        if seat >= self.seats.len() {
            self.seats.resize(seat + 1, SeatKind::Bot);
        }
        self.seats[seat] = kind;
        self
    }

    /// Hand every seat to a bot, keeping the seat count.
    pub fn all_bots(mut self) -> Self {
        self.seats.fill(SeatKind::Bot);
        self
    }

    pub fn seat_kind(&self, seat: usize) -> SeatKind {
        self.seats.get(seat).copied().unwrap_or(SeatKind::Bot)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        self.settings.validate()?;
        let players = self.settings.player_count;
        if self.dealer >= players {
            return Err(SettingsError::Dealer { dealer: self.dealer, players });
        }
        if self.seats.len() != players {
            return Err(SettingsError::Seats { expected: players, got: self.seats.len() });
        }
        Ok(())
    }
}
