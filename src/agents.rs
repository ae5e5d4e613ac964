//! Agents: the collaborators that answer a round's decisions.
//!
//! A seat is either driven by a [`HumanInterface`] (blocking, validated by
//! the controller) or by a [`SeatStrategy`] (non-blocking, trusted).
//! Everything that only needs to be shown goes to a [`PresentationSink`].
//! All of them receive owned snapshots, so they can live on other threads
//! behind a channel.

use crate::cards::{Card, Suit};
use crate::controller::Table;
use crate::protocol::{Decision, Notification, NotificationKind, Trigger};
use crate::round::RoundError;
use std::collections::VecDeque;
use tracing::info;

mod bots;
mod channel;

pub use bots::{BotAgent, BotProfile, Difficulty};
pub use channel::{ChannelHuman, ChannelSink, HostEvent};

/// The five kinds of decisions a seat can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionPoint {
    FirstBid,
    CounterBid,
    BidAnswer,
    Exchange,
    Card,
}

impl DecisionPoint {
    pub const fn for_kind(kind: NotificationKind) -> Option<Self> {
        match kind {
            NotificationKind::WaitingForFirstBid => Some(DecisionPoint::FirstBid),
            NotificationKind::WaitingForCounterBid => Some(DecisionPoint::CounterBid),
            NotificationKind::WaitingForBidAnswer => Some(DecisionPoint::BidAnswer),
            NotificationKind::ExchangingWithBlind => Some(DecisionPoint::Exchange),
            NotificationKind::WaitingForCard => Some(DecisionPoint::Card),
            _ => None,
        }
    }

    pub fn ask(
        self,
        human: &mut dyn HumanInterface,
        view: &SeatView,
    ) -> Result<Decision, AgentError> {
        match self {
            DecisionPoint::FirstBid => human.ask_bid(view),
            DecisionPoint::CounterBid => human.ask_counter_bid(view),
            DecisionPoint::BidAnswer => human.ask_bid_answer(view),
            DecisionPoint::Exchange => human.ask_exchange(view),
            DecisionPoint::Card => human.ask_card(view),
        }
    }

    pub fn choose(self, strategy: &mut dyn SeatStrategy, view: &SeatView) -> Decision {
        match self {
            DecisionPoint::FirstBid => strategy.choose_bid(view),
            DecisionPoint::CounterBid => strategy.choose_counter_bid(view),
            DecisionPoint::BidAnswer => strategy.choose_bid_answer(view),
            DecisionPoint::Exchange => strategy.choose_exchange(view),
            DecisionPoint::Card => strategy.choose_card(view),
        }
    }
}

/// What a seat sees when it is asked to decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatView {
    pub point: DecisionPoint,
    pub seat: usize,
    pub dealer: usize,
    pub players: usize,
    pub hand: Vec<Card>,
    /// Highest bid so far, 0 before the first bid.
    pub bid: u32,
    pub bidder: Option<usize>,
    pub opening_bid: u32,
    /// Smallest amount the seat may name with a bid or counter.
    pub min_bid: u32,
    pub bid_step: u32,
    pub trump: Option<Suit>,
    pub trick: Vec<(usize, Card)>,
    pub legal_cards: Vec<Card>,
    /// Cards the declarer has to lay away after picking up the dabb.
    pub dabb_size: usize,
    pub options: Vec<Trigger>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AgentError {
    #[error("human interface disconnected")]
    Disconnected,
    #[error("{0}")]
    Internal(String),
}

impl From<AgentError> for RoundError {
    fn from(err: AgentError) -> Self {
        RoundError::Collaborator(err.to_string())
    }
}

/// A blocking source of human decisions.
pub trait HumanInterface {
    fn ask_bid(&mut self, view: &SeatView) -> Result<Decision, AgentError>;
    fn ask_counter_bid(&mut self, view: &SeatView) -> Result<Decision, AgentError>;
    fn ask_bid_answer(&mut self, view: &SeatView) -> Result<Decision, AgentError>;
    fn ask_exchange(&mut self, view: &SeatView) -> Result<Decision, AgentError>;
    fn ask_card(&mut self, view: &SeatView) -> Result<Decision, AgentError>;
}

/// An automated seat. Answers immediately and is trusted to answer legally.
pub trait SeatStrategy {
    fn choose_bid(&mut self, view: &SeatView) -> Decision;
    fn choose_counter_bid(&mut self, view: &SeatView) -> Decision;
    fn choose_bid_answer(&mut self, view: &SeatView) -> Decision;
    fn choose_exchange(&mut self, view: &SeatView) -> Decision;
    fn choose_card(&mut self, view: &SeatView) -> Decision;
}

/// Whether a presentation finished or will be acknowledged later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presented {
    Done,
    Pending,
}

/// Receives every notification that needs no decision.
pub trait PresentationSink {
    fn present(&mut self, notification: &Notification, table: &Table) -> Presented;

    /// Called after a seat's decision has been applied to the table.
    fn decided(&mut self, _seat: usize, _decision: &Decision, _table: &Table) {}
}

/// Human interface fed from a queue of prepared decisions.
#[derive(Debug, Default)]
pub struct ScriptedHuman {
    script: VecDeque<Decision>,
    asked: Vec<SeatView>,
}

impl ScriptedHuman {
    pub fn new(script: impl IntoIterator<Item = Decision>) -> Self {
        Self { script: script.into_iter().collect(), asked: Vec::new() }
    }

    /// Views passed to the interface so far, oldest first.
    pub fn asked(&self) -> &[SeatView] {
        &self.asked
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    fn next(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.asked.push(view.clone());
        self.script.pop_front().ok_or(AgentError::Disconnected)
    }
}

impl HumanInterface for ScriptedHuman {
    fn ask_bid(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.next(view)
    }
    fn ask_counter_bid(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.next(view)
    }
    fn ask_bid_answer(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.next(view)
    }
    fn ask_exchange(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.next(view)
    }
    fn ask_card(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.next(view)
    }
}

impl<H: HumanInterface + ?Sized> HumanInterface for &mut H {
    fn ask_bid(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        (**self).ask_bid(view)
    }
    fn ask_counter_bid(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        (**self).ask_counter_bid(view)
    }
    fn ask_bid_answer(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        (**self).ask_bid_answer(view)
    }
    fn ask_exchange(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        (**self).ask_exchange(view)
    }
    fn ask_card(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        (**self).ask_card(view)
    }
}

impl<P: PresentationSink + ?Sized> PresentationSink for &mut P {
    fn present(&mut self, notification: &Notification, table: &Table) -> Presented {
        (**self).present(notification, table)
    }

    fn decided(&mut self, seat: usize, decision: &Decision, table: &Table) {
        (**self).decided(seat, decision, table)
    }
}

/// Presentation sink that logs each notification and completes at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PresentationSink for TracingSink {
    fn decided(&mut self, seat: usize, decision: &Decision, _table: &Table) {
        tracing::debug!(seat, trigger = ?decision.trigger, payload = ?decision.payload, "decision");
    }

    fn present(&mut self, notification: &Notification, table: &Table) -> Presented {
        match notification {
            Notification::NewTrickStarted { leader } => {
                info!(leader, tricks = table.trick_winners.len(), "trick complete");
            }
            Notification::CountingGoingOutScore { seat } => {
                info!(seat, bid = table.bid, "declarer went out");
            }
            Notification::CountingGameScore => {
                info!(tricks_won = ?table.tricks_won, "all tricks played");
            }
            other => tracing::debug!(notification = ?other, "presented"),
        }
        Presented::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(point: DecisionPoint) -> SeatView {
        SeatView {
            point,
            seat: 1,
            dealer: 0,
            players: 4,
            hand: Vec::new(),
            bid: 0,
            bidder: None,
            opening_bid: 150,
            min_bid: 150,
            bid_step: 10,
            trump: None,
            trick: Vec::new(),
            legal_cards: Vec::new(),
            dabb_size: 4,
            options: vec![Trigger::BidPlaced, Trigger::Passed],
        }
    }

    #[test]
    fn scripted_human_replays_in_order() {
        let mut human = ScriptedHuman::new([Decision::bid(150), Decision::pass()]);
        let v = view(DecisionPoint::FirstBid);
        assert_eq!(DecisionPoint::FirstBid.ask(&mut human, &v), Ok(Decision::bid(150)));
        assert_eq!(DecisionPoint::BidAnswer.ask(&mut human, &v), Ok(Decision::pass()));
        assert_eq!(DecisionPoint::Card.ask(&mut human, &v), Err(AgentError::Disconnected));
        assert_eq!(human.asked().len(), 3);
    }

    #[test]
    fn decision_points_match_decision_kinds() {
        for kind in NotificationKind::ALL {
            assert_eq!(DecisionPoint::for_kind(kind).is_some(), kind.is_decision(), "{kind:?}");
        }
    }

    #[test]
    fn agent_errors_become_collaborator_errors() {
        let err: RoundError = AgentError::Disconnected.into();
        assert_eq!(err, RoundError::Collaborator("human interface disconnected".into()));
    }
}
