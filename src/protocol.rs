//! Trigger and notification vocabulary of a round.
//!
//! Triggers are the inputs the round machine accepts; notifications are what
//! it announces when it enters a state that waits for somebody. Neither carries
//! card or bid data: payloads travel next to the trigger in a [`Decision`] and
//! are the controller's business, not the machine's.

use crate::cards::{Card, Suit};
use crate::round::State;

/// A completed unit of work reported to the round machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    GameStarted,
    DealingFinished,
    BidPlaced,
    BidCountered,
    Passed,
    PlayerSwitched,
    GoingOut,
    DurchAnnounced,
    BettelAnnounced,
    TrumpSelected,
    MeldsSeenByAllPlayers,
    CardPlaced,
    InvalidCardPlaced,
    WinningCardPlaced,
    LosingCardPlaced,
    RevertingFinished,
    NewRoundStarted,
    ScoreCalculationFinished,
}

impl Trigger {
    pub const ALL: [Trigger; 18] = [
        Trigger::GameStarted,
        Trigger::DealingFinished,
        Trigger::BidPlaced,
        Trigger::BidCountered,
        Trigger::Passed,
        Trigger::PlayerSwitched,
        Trigger::GoingOut,
        Trigger::DurchAnnounced,
        Trigger::BettelAnnounced,
        Trigger::TrumpSelected,
        Trigger::MeldsSeenByAllPlayers,
        Trigger::CardPlaced,
        Trigger::InvalidCardPlaced,
        Trigger::WinningCardPlaced,
        Trigger::LosingCardPlaced,
        Trigger::RevertingFinished,
        Trigger::NewRoundStarted,
        Trigger::ScoreCalculationFinished,
    ];
}

/// Discriminant of a [`Notification`], used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    DealingStarted,
    WaitingForFirstBid,
    FirstBidPlayerSwitched,
    WaitingForCounterBid,
    WaitingForBidAnswer,
    CurrentBidderSwitched,
    CounterBidderSwitched,
    ExchangingWithBlind,
    CountingGoingOutScore,
    MeldingStarted,
    WaitingForCard,
    ValidatingCard,
    TrickPlayerSwitched,
    RevertingInvalidMove,
    NewTrickStarted,
    CountingGameScore,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 16] = [
        NotificationKind::DealingStarted,
        NotificationKind::WaitingForFirstBid,
        NotificationKind::FirstBidPlayerSwitched,
        NotificationKind::WaitingForCounterBid,
        NotificationKind::WaitingForBidAnswer,
        NotificationKind::CurrentBidderSwitched,
        NotificationKind::CounterBidderSwitched,
        NotificationKind::ExchangingWithBlind,
        NotificationKind::CountingGoingOutScore,
        NotificationKind::MeldingStarted,
        NotificationKind::WaitingForCard,
        NotificationKind::ValidatingCard,
        NotificationKind::TrickPlayerSwitched,
        NotificationKind::RevertingInvalidMove,
        NotificationKind::NewTrickStarted,
        NotificationKind::CountingGameScore,
    ];

    /// The waiting state that raises this notification.
    pub const fn raised_in(self) -> State {
        use crate::round::{BiddingState as B, TrickState as T};
        match self {
            NotificationKind::DealingStarted => State::Dealing,
            NotificationKind::WaitingForFirstBid => State::Bidding(B::WaitingForFirstBid),
            NotificationKind::FirstBidPlayerSwitched => State::Bidding(B::SwitchingFirstBidPlayer),
            NotificationKind::WaitingForCounterBid => State::Bidding(B::WaitingForNextPlayer),
            NotificationKind::WaitingForBidAnswer => State::Bidding(B::WaitingForCurrentPlayer),
            NotificationKind::CurrentBidderSwitched => State::Bidding(B::SwitchingCurrentPlayer),
            NotificationKind::CounterBidderSwitched => State::Bidding(B::SwitchingNextPlayer),
            NotificationKind::ExchangingWithBlind => State::ExchangingWithBlind,
            NotificationKind::CountingGoingOutScore => State::CountingGoingOutScore,
            NotificationKind::MeldingStarted => State::Melding,
            NotificationKind::WaitingForCard => State::TrickTaking(T::WaitingForCurrentPlayer),
            NotificationKind::ValidatingCard => State::TrickTaking(T::ValidatingCard),
            NotificationKind::TrickPlayerSwitched => State::TrickTaking(T::SwitchingToNextPlayer),
            NotificationKind::RevertingInvalidMove => State::TrickTaking(T::RevertingInvalidMove),
            NotificationKind::NewTrickStarted => State::TrickTaking(T::StartingNewRound),
            NotificationKind::CountingGameScore => State::CountingGameScore,
        }
    }

    /// Triggers that may answer this notification.
    pub fn legal_triggers(self) -> Vec<Trigger> {
        self.raised_in().legal_triggers()
    }

    /// Notifications that need a seat (human or automated) to decide.
    pub const fn is_decision(self) -> bool {
        matches!(
            self,
            NotificationKind::WaitingForFirstBid
                | NotificationKind::WaitingForCounterBid
                | NotificationKind::WaitingForBidAnswer
                | NotificationKind::ExchangingWithBlind
                | NotificationKind::WaitingForCard
        )
    }

    /// The single trigger that acknowledges a presentation-only notification.
    pub fn completion_trigger(self) -> Option<Trigger> {
        match self.legal_triggers().as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

/// Announcement made by the machine when it enters a waiting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    DealingStarted { dealer: usize },
    WaitingForFirstBid { seat: usize },
    FirstBidPlayerSwitched { current: usize, next: usize },
    WaitingForCounterBid { seat: usize },
    WaitingForBidAnswer { seat: usize },
    CurrentBidderSwitched { current: usize, next: usize },
    CounterBidderSwitched { current: usize, next: usize },
    ExchangingWithBlind { seat: usize },
    CountingGoingOutScore { seat: usize },
    MeldingStarted,
    WaitingForCard { seat: usize },
    ValidatingCard { seat: usize },
    TrickPlayerSwitched { seat: usize },
    RevertingInvalidMove { seat: usize },
    NewTrickStarted { leader: usize },
    CountingGameScore,
}

impl Notification {
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Notification::DealingStarted { .. } => NotificationKind::DealingStarted,
            Notification::WaitingForFirstBid { .. } => NotificationKind::WaitingForFirstBid,
            Notification::FirstBidPlayerSwitched { .. } => NotificationKind::FirstBidPlayerSwitched,
            Notification::WaitingForCounterBid { .. } => NotificationKind::WaitingForCounterBid,
            Notification::WaitingForBidAnswer { .. } => NotificationKind::WaitingForBidAnswer,
            Notification::CurrentBidderSwitched { .. } => NotificationKind::CurrentBidderSwitched,
            Notification::CounterBidderSwitched { .. } => NotificationKind::CounterBidderSwitched,
            Notification::ExchangingWithBlind { .. } => NotificationKind::ExchangingWithBlind,
            Notification::CountingGoingOutScore { .. } => NotificationKind::CountingGoingOutScore,
            Notification::MeldingStarted => NotificationKind::MeldingStarted,
            Notification::WaitingForCard { .. } => NotificationKind::WaitingForCard,
            Notification::ValidatingCard { .. } => NotificationKind::ValidatingCard,
            Notification::TrickPlayerSwitched { .. } => NotificationKind::TrickPlayerSwitched,
            Notification::RevertingInvalidMove { .. } => NotificationKind::RevertingInvalidMove,
            Notification::NewTrickStarted { .. } => NotificationKind::NewTrickStarted,
            Notification::CountingGameScore => NotificationKind::CountingGameScore,
        }
    }

    /// Seat addressed by the notification, if any. Switch notifications
    /// address the seat that now holds the turn.
    pub const fn seat(&self) -> Option<usize> {
        match *self {
            Notification::DealingStarted { dealer } => Some(dealer),
            Notification::WaitingForFirstBid { seat }
            | Notification::WaitingForBidAnswer { seat }
            | Notification::ExchangingWithBlind { seat }
            | Notification::CountingGoingOutScore { seat }
            | Notification::WaitingForCard { seat }
            | Notification::ValidatingCard { seat }
            | Notification::TrickPlayerSwitched { seat }
            | Notification::RevertingInvalidMove { seat }
            | Notification::WaitingForCounterBid { seat } => Some(seat),
            Notification::FirstBidPlayerSwitched { current, .. } => Some(current),
            Notification::CurrentBidderSwitched { current, .. } => Some(current),
            Notification::CounterBidderSwitched { next, .. } => Some(next),
            Notification::NewTrickStarted { leader } => Some(leader),
            Notification::MeldingStarted | Notification::CountingGameScore => None,
        }
    }

    pub fn legal_triggers(&self) -> Vec<Trigger> {
        self.kind().legal_triggers()
    }
}

/// Data that travels next to a trigger but never enters the machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    #[default]
    None,
    Bid(u32),
    Card(Card),
    Exchange { discard: Vec<Card>, trump: Option<Suit> },
}

/// A seat's answer to a decision notification.
///
/// ```
/// use binokel::protocol::{Decision, Payload, Trigger};
///
/// let d = Decision::counter(170);
/// assert_eq!(d.trigger, Trigger::BidCountered);
/// assert_eq!(d.payload, Payload::Bid(170));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub trigger: Trigger,
    pub payload: Payload,
}

impl Decision {
    pub fn new(trigger: Trigger, payload: Payload) -> Self {
        Self { trigger, payload }
    }

    pub fn pass() -> Self {
        Self::new(Trigger::Passed, Payload::None)
    }

    /// An opening bid, or holding/raising as the current bidder.
    pub fn bid(amount: u32) -> Self {
        Self::new(Trigger::BidPlaced, Payload::Bid(amount))
    }

    pub fn counter(amount: u32) -> Self {
        Self::new(Trigger::BidCountered, Payload::Bid(amount))
    }

    pub fn card(card: Card) -> Self {
        Self::new(Trigger::CardPlaced, Payload::Card(card))
    }

    pub fn trump(trump: Suit, discard: Vec<Card>) -> Self {
        Self::new(Trigger::TrumpSelected, Payload::Exchange { discard, trump: Some(trump) })
    }

    pub fn go_out() -> Self {
        Self::new(Trigger::GoingOut, Payload::None)
    }
}
