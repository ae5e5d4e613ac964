//! The round state machine.
//!
//! A round moves through a fixed set of phases. Bidding and trick-taking are
//! split into sub-states that either wait for an outside actor or only do
//! seat bookkeeping. The transition table ([`transition`]) maps a legal
//! `(state, trigger)` pair to exactly one successor; entering a state runs its
//! entry action against [`RoundProperties`], which either announces a
//! [`Notification`] and waits, or names an automatic successor that is entered
//! immediately within the same [`RoundMachine::fire`] call.
//!
//! Triggers that are not legal in the current state are ignored. The
//! controller validates decisions before they get here.

use crate::protocol::{Notification, NotificationKind, Trigger};
use crate::settings::{RoundSettings, SettingsError};
use tracing::{debug, info, trace, warn};

/// Top-level phases of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Initial,
    Dealing,
    Bidding,
    ExchangingWithBlind,
    Durch,
    Bettel,
    CountingGoingOutScore,
    Melding,
    TrickTaking,
    CountingGameScore,
    End,
}

/// Sub-states of [`Phase::Bidding`].
///
/// `current_player` holds the bid, `next_player` is the seat that may
/// counter it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BiddingState {
    WaitingForFirstBid,
    SwitchingFirstBidPlayer,
    WaitingForNextPlayer,
    WaitingForCurrentPlayer,
    SwitchingCurrentPlayer,
    SwitchingNextPlayer,
}

/// Sub-states of [`Phase::TrickTaking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrickState {
    WaitingForCurrentPlayer,
    ValidatingCard,
    RememberingWinningPlayer,
    SwitchingToNextPlayer,
    RevertingInvalidMove,
    StartingNewRound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Initial,
    Dealing,
    Bidding(BiddingState),
    ExchangingWithBlind,
    Durch,
    Bettel,
    CountingGoingOutScore,
    Melding,
    TrickTaking(TrickState),
    CountingGameScore,
    End,
}

impl State {
    pub const ALL: [State; 21] = [
        State::Initial,
        State::Dealing,
        State::Bidding(BiddingState::WaitingForFirstBid),
        State::Bidding(BiddingState::SwitchingFirstBidPlayer),
        State::Bidding(BiddingState::WaitingForNextPlayer),
        State::Bidding(BiddingState::WaitingForCurrentPlayer),
        State::Bidding(BiddingState::SwitchingCurrentPlayer),
        State::Bidding(BiddingState::SwitchingNextPlayer),
        State::ExchangingWithBlind,
        State::Durch,
        State::Bettel,
        State::CountingGoingOutScore,
        State::Melding,
        State::TrickTaking(TrickState::WaitingForCurrentPlayer),
        State::TrickTaking(TrickState::ValidatingCard),
        State::TrickTaking(TrickState::RememberingWinningPlayer),
        State::TrickTaking(TrickState::SwitchingToNextPlayer),
        State::TrickTaking(TrickState::RevertingInvalidMove),
        State::TrickTaking(TrickState::StartingNewRound),
        State::CountingGameScore,
        State::End,
    ];

    pub const fn phase(self) -> Phase {
        match self {
            State::Initial => Phase::Initial,
            State::Dealing => Phase::Dealing,
            State::Bidding(_) => Phase::Bidding,
            State::ExchangingWithBlind => Phase::ExchangingWithBlind,
            State::Durch => Phase::Durch,
            State::Bettel => Phase::Bettel,
            State::CountingGoingOutScore => Phase::CountingGoingOutScore,
            State::Melding => Phase::Melding,
            State::TrickTaking(_) => Phase::TrickTaking,
            State::CountingGameScore => Phase::CountingGameScore,
            State::End => Phase::End,
        }
    }

    /// Triggers with an entry in the transition table for this state.
    pub fn legal_triggers(self) -> Vec<Trigger> {
        Trigger::ALL.into_iter().filter(|&t| transition(self, t).is_some()).collect()
    }

    pub fn accepts(self, trigger: Trigger) -> bool {
        transition(self, trigger).is_some()
    }
}

/// The transition table. `None` means the trigger is not legal in `state`.
pub const fn transition(state: State, trigger: Trigger) -> Option<State> {
    use BiddingState as B;
    use State as S;
    use TrickState as T;
    use Trigger as Tr;
    let next = match (state, trigger) {
        (S::Initial, Tr::GameStarted) => S::Dealing,
        (S::Dealing, Tr::DealingFinished) => S::Bidding(B::WaitingForFirstBid),

        (S::Bidding(B::WaitingForFirstBid), Tr::BidPlaced) => S::Bidding(B::WaitingForNextPlayer),
        (S::Bidding(B::WaitingForFirstBid), Tr::Passed) => S::Bidding(B::SwitchingFirstBidPlayer),
        (S::Bidding(B::SwitchingFirstBidPlayer), Tr::PlayerSwitched) => {
            S::Bidding(B::WaitingForFirstBid)
        }
        (S::Bidding(B::WaitingForNextPlayer), Tr::BidCountered) => {
            S::Bidding(B::WaitingForCurrentPlayer)
        }
        (S::Bidding(B::WaitingForNextPlayer), Tr::Passed) => S::Bidding(B::SwitchingNextPlayer),
        (S::Bidding(B::WaitingForCurrentPlayer), Tr::BidPlaced) => {
            S::Bidding(B::WaitingForNextPlayer)
        }
        (S::Bidding(B::WaitingForCurrentPlayer), Tr::Passed) => {
            S::Bidding(B::SwitchingCurrentPlayer)
        }
        (S::Bidding(B::SwitchingCurrentPlayer), Tr::PlayerSwitched) => {
            S::Bidding(B::WaitingForNextPlayer)
        }
        (S::Bidding(B::SwitchingNextPlayer), Tr::PlayerSwitched) => {
            S::Bidding(B::WaitingForNextPlayer)
        }

        (S::ExchangingWithBlind, Tr::TrumpSelected) => S::Melding,
        (S::ExchangingWithBlind, Tr::GoingOut) => S::CountingGoingOutScore,
        (S::ExchangingWithBlind, Tr::DurchAnnounced) => S::Durch,
        (S::ExchangingWithBlind, Tr::BettelAnnounced) => S::Bettel,
        (S::CountingGoingOutScore, Tr::ScoreCalculationFinished) => S::End,
        (S::Melding, Tr::MeldsSeenByAllPlayers) => S::TrickTaking(T::WaitingForCurrentPlayer),

        (S::TrickTaking(T::WaitingForCurrentPlayer), Tr::CardPlaced) => {
            S::TrickTaking(T::ValidatingCard)
        }
        (S::TrickTaking(T::ValidatingCard), Tr::WinningCardPlaced) => {
            S::TrickTaking(T::RememberingWinningPlayer)
        }
        (S::TrickTaking(T::ValidatingCard), Tr::LosingCardPlaced) => {
            S::TrickTaking(T::SwitchingToNextPlayer)
        }
        (S::TrickTaking(T::ValidatingCard), Tr::InvalidCardPlaced) => {
            S::TrickTaking(T::RevertingInvalidMove)
        }
        (S::TrickTaking(T::SwitchingToNextPlayer), Tr::PlayerSwitched) => {
            S::TrickTaking(T::WaitingForCurrentPlayer)
        }
        (S::TrickTaking(T::RevertingInvalidMove), Tr::RevertingFinished) => {
            S::TrickTaking(T::WaitingForCurrentPlayer)
        }
        (S::TrickTaking(T::StartingNewRound), Tr::NewRoundStarted) => {
            S::TrickTaking(T::WaitingForCurrentPlayer)
        }
        (S::CountingGameScore, Tr::ScoreCalculationFinished) => S::End,
        _ => return None,
    };
    Some(next)
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RoundError {
    #[error("notification {kind:?} raised in {state:?} has no subscribed handler")]
    Unconnected { kind: NotificationKind, state: State },
    #[error("notification {kind:?} was never answered")]
    Unanswered { kind: NotificationKind },
    #[error("seat {seat} answered {kind:?} with {trigger:?}, which is not legal there")]
    IllegalTrigger { seat: usize, kind: NotificationKind, trigger: Trigger },
    #[error("seat {seat} made an invalid decision: {reason}")]
    InvalidDecision { seat: usize, reason: String },
    #[error("phase {0:?} is not implemented")]
    Unimplemented(Phase),
    #[error("round has not been prepared")]
    NotPrepared,
    #[error("a handler for {0:?} is already subscribed")]
    AlreadySubscribed(NotificationKind),
    #[error("collaborator failed: {0}")]
    Collaborator(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Seat bookkeeping of one round. Written only by state entry actions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RoundProperties {
    pub(crate) player_count: usize,
    pub(crate) dealer: usize,
    pub(crate) current_player: usize,
    pub(crate) next_player: usize,
    pub(crate) remaining_cards: i32,
    pub(crate) trick_winner: Option<usize>,
    pub(crate) trick_winners: Vec<usize>,
}

impl RoundProperties {
    pub fn new(settings: &RoundSettings, dealer: usize) -> Result<Self, SettingsError> {
        settings.validate()?;
        let player_count = settings.player_count;
        if dealer >= player_count {
            return Err(SettingsError::Dealer { dealer, players: player_count });
        }
        Ok(Self {
            player_count,
            dealer,
            current_player: dealer,
            next_player: dealer,
            remaining_cards: settings.playable_cards() as i32,
            trick_winner: None,
            trick_winners: Vec::new(),
        })
    }

    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn dealer(&self) -> usize {
        self.dealer
    }

    pub fn current_player(&self) -> usize {
        self.current_player
    }

    pub fn next_player(&self) -> usize {
        self.next_player
    }

    pub fn remaining_cards(&self) -> i32 {
        self.remaining_cards
    }

    pub fn trick_winner(&self) -> Option<usize> {
        self.trick_winner
    }

    /// Winners of completed tricks in play order.
    pub fn trick_winners(&self) -> &[usize] {
        &self.trick_winners
    }

    fn seat_after(&self, seat: usize) -> usize {
        (seat + 1) % self.player_count
    }

    fn left_of_dealer(&self) -> usize {
        self.seat_after(self.dealer)
    }
}

/// What entering a state asks the dispatcher to do next.
enum Entry {
    Notify(Notification),
    Auto(State),
    Rest,
    Unimplemented(Phase),
}

fn enter(state: State, p: &mut RoundProperties) -> Entry {
    use BiddingState as B;
    use TrickState as T;
    match state {
        State::Initial | State::End => Entry::Rest,
        State::Dealing => {
            p.current_player = p.left_of_dealer();
            p.next_player = p.seat_after(p.current_player);
            Entry::Notify(Notification::DealingStarted { dealer: p.dealer })
        }
        State::Bidding(B::WaitingForFirstBid) => {
            Entry::Notify(Notification::WaitingForFirstBid { seat: p.current_player })
        }
        State::Bidding(B::SwitchingFirstBidPlayer) => {
            p.current_player = p.seat_after(p.current_player);
            p.next_player = p.seat_after(p.next_player);
            // Nobody opened: the dealer takes the game at the opening bid.
            if p.current_player == p.dealer {
                Entry::Auto(State::ExchangingWithBlind)
            } else {
                Entry::Notify(Notification::FirstBidPlayerSwitched {
                    current: p.current_player,
                    next: p.next_player,
                })
            }
        }
        State::Bidding(B::WaitingForNextPlayer) => {
            Entry::Notify(Notification::WaitingForCounterBid { seat: p.next_player })
        }
        State::Bidding(B::WaitingForCurrentPlayer) => {
            Entry::Notify(Notification::WaitingForBidAnswer { seat: p.current_player })
        }
        State::Bidding(B::SwitchingCurrentPlayer) => {
            p.current_player = p.next_player;
            p.next_player = p.seat_after(p.current_player);
            if p.current_player == p.dealer {
                Entry::Auto(State::ExchangingWithBlind)
            } else {
                Entry::Notify(Notification::CurrentBidderSwitched {
                    current: p.current_player,
                    next: p.next_player,
                })
            }
        }
        State::Bidding(B::SwitchingNextPlayer) => {
            p.next_player = p.seat_after(p.next_player);
            if p.next_player == p.left_of_dealer() {
                Entry::Auto(State::ExchangingWithBlind)
            } else {
                Entry::Notify(Notification::CounterBidderSwitched {
                    current: p.current_player,
                    next: p.next_player,
                })
            }
        }
        State::ExchangingWithBlind => {
            Entry::Notify(Notification::ExchangingWithBlind { seat: p.current_player })
        }
        State::Durch => Entry::Unimplemented(Phase::Durch),
        State::Bettel => Entry::Unimplemented(Phase::Bettel),
        State::CountingGoingOutScore => {
            Entry::Notify(Notification::CountingGoingOutScore { seat: p.current_player })
        }
        State::Melding => {
            p.current_player = p.left_of_dealer();
            Entry::Notify(Notification::MeldingStarted)
        }
        State::TrickTaking(T::WaitingForCurrentPlayer) => {
            Entry::Notify(Notification::WaitingForCard { seat: p.current_player })
        }
        State::TrickTaking(T::ValidatingCard) => {
            Entry::Notify(Notification::ValidatingCard { seat: p.current_player })
        }
        State::TrickTaking(T::RememberingWinningPlayer) => {
            p.trick_winner = Some(p.current_player);
            Entry::Auto(State::TrickTaking(T::SwitchingToNextPlayer))
        }
        State::TrickTaking(T::SwitchingToNextPlayer) => {
            p.current_player = p.seat_after(p.current_player);
            p.remaining_cards -= 1;
            if p.remaining_cards % p.player_count as i32 == 0 {
                Entry::Auto(State::TrickTaking(T::StartingNewRound))
            } else {
                Entry::Notify(Notification::TrickPlayerSwitched { seat: p.current_player })
            }
        }
        State::TrickTaking(T::RevertingInvalidMove) => {
            Entry::Notify(Notification::RevertingInvalidMove { seat: p.current_player })
        }
        State::TrickTaking(T::StartingNewRound) => {
            match p.trick_winner.take() {
                Some(winner) => {
                    p.current_player = winner;
                    p.trick_winners.push(winner);
                }
                None => warn!(seat = p.current_player, "trick finished without a winning card"),
            }
            // The counter lands on exactly zero after the last card.
            if p.remaining_cards <= 0 {
                Entry::Auto(State::CountingGameScore)
            } else {
                Entry::Notify(Notification::NewTrickStarted { leader: p.current_player })
            }
        }
        State::CountingGameScore => Entry::Notify(Notification::CountingGameScore),
    }
}

/// Result of firing one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not legal in the current state; nothing changed.
    Ignored,
    /// The machine stopped in a waiting state and announced it.
    Waiting(Notification),
    /// The machine reached a state with nothing to announce.
    Finished,
}

/// One round's state machine.
///
/// ```
/// use binokel::protocol::{Notification, Trigger};
/// use binokel::round::{Outcome, RoundMachine};
/// use binokel::settings::RoundSettings;
///
/// let mut m = RoundMachine::new(&RoundSettings::default(), 0).unwrap();
/// let out = m.fire(Trigger::GameStarted).unwrap();
/// assert_eq!(out, Outcome::Waiting(Notification::DealingStarted { dealer: 0 }));
/// assert_eq!(m.properties().current_player(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RoundMachine {
    state: State,
    props: RoundProperties,
    visited: Vec<State>,
}

impl RoundMachine {
    pub fn new(settings: &RoundSettings, dealer: usize) -> Result<Self, RoundError> {
        let props = RoundProperties::new(settings, dealer)?;
        Ok(Self { state: State::Initial, props, visited: vec![State::Initial] })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn properties(&self) -> &RoundProperties {
        &self.props
    }

    /// Every state entered so far, automatic steps included.
    pub fn visited(&self) -> &[State] {
        &self.visited
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::End
    }

    pub fn accepts(&self, trigger: Trigger) -> bool {
        self.state.accepts(trigger)
    }

    /// Apply `trigger`, then follow automatic exits until a state announces
    /// itself or rests.
    pub fn fire(&mut self, trigger: Trigger) -> Result<Outcome, RoundError> {
        let Some(mut next) = transition(self.state, trigger) else {
            debug!(state = ?self.state, ?trigger, "ignoring trigger not legal in current state");
            return Ok(Outcome::Ignored);
        };
        trace!(from = ?self.state, ?trigger, to = ?next, "transition");
        loop {
            if next.phase() != self.state.phase() {
                info!(phase = ?next.phase(), "entering phase");
            }
            self.state = next;
            self.visited.push(next);
            match enter(next, &mut self.props) {
                Entry::Notify(n) => return Ok(Outcome::Waiting(n)),
                Entry::Rest => return Ok(Outcome::Finished),
                Entry::Unimplemented(phase) => return Err(RoundError::Unimplemented(phase)),
                Entry::Auto(state) => {
                    trace!(from = ?next, to = ?state, "automatic transition");
                    next = state;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashSet, VecDeque};

    fn machine(n: usize, dealer: usize) -> RoundMachine {
        RoundMachine::new(&RoundSettings::default().with_players(n), dealer).unwrap()
    }

    fn waiting(out: Outcome) -> Notification {
        match out {
            Outcome::Waiting(n) => n,
            other => panic!("expected a notification, got {other:?}"),
        }
    }

    #[test]
    fn dealing_seats_left_of_dealer() {
        let mut m = machine(3, 2);
        waiting(m.fire(Trigger::GameStarted).unwrap());
        assert_eq!(m.properties().current_player(), 0);
        assert_eq!(m.properties().next_player(), 1);
        let n = waiting(m.fire(Trigger::DealingFinished).unwrap());
        assert_eq!(n, Notification::WaitingForFirstBid { seat: 0 });
    }

    #[test]
    fn illegal_trigger_is_ignored() {
        let mut m = machine(4, 0);
        assert_eq!(m.fire(Trigger::CardPlaced).unwrap(), Outcome::Ignored);
        assert_eq!(m.state(), State::Initial);
        assert_eq!(m.visited(), &[State::Initial]);
    }

    #[test]
    fn winning_card_is_remembered_then_switched() {
        let mut m = machine(4, 0);
        for t in [Trigger::GameStarted, Trigger::DealingFinished] {
            m.fire(t).unwrap();
        }
        for _ in 0..3 {
            m.fire(Trigger::Passed).unwrap();
            m.fire(Trigger::PlayerSwitched).unwrap();
        }
        // The third pass lands on the dealer and skips the switch notification.
        assert_eq!(m.state(), State::ExchangingWithBlind);
        m.fire(Trigger::TrumpSelected).unwrap();
        m.fire(Trigger::MeldsSeenByAllPlayers).unwrap();
        m.fire(Trigger::CardPlaced).unwrap();
        let n = waiting(m.fire(Trigger::WinningCardPlaced).unwrap());
        assert_eq!(n, Notification::TrickPlayerSwitched { seat: 2 });
        assert_eq!(m.properties().trick_winner(), Some(1));
        assert_eq!(m.properties().remaining_cards(), 35);
        assert!(m.visited().contains(&State::TrickTaking(TrickState::RememberingWinningPlayer)));
    }

    #[test]
    fn durch_and_bettel_are_unimplemented() {
        for (announce, phase) in
            [(Trigger::DurchAnnounced, Phase::Durch), (Trigger::BettelAnnounced, Phase::Bettel)]
        {
            let mut m = machine(3, 0);
            m.fire(Trigger::GameStarted).unwrap();
            m.fire(Trigger::DealingFinished).unwrap();
            m.fire(Trigger::Passed).unwrap();
            m.fire(Trigger::PlayerSwitched).unwrap();
            m.fire(Trigger::Passed).unwrap();
            assert_eq!(m.state(), State::ExchangingWithBlind);
            assert_eq!(m.fire(announce), Err(RoundError::Unimplemented(phase)));
        }
    }

    #[test]
    fn waiting_states_have_answers_and_the_rest_move_on() {
        let waiting: HashSet<State> =
            NotificationKind::ALL.iter().map(|k| k.raised_in()).collect();
        assert_eq!(waiting.len(), NotificationKind::ALL.len());
        for kind in NotificationKind::ALL {
            assert!(!kind.legal_triggers().is_empty(), "{kind:?} cannot be answered");
        }
        for state in State::ALL.into_iter().filter(|s| !waiting.contains(s)) {
            let legal = state.legal_triggers();
            match state {
                State::Initial => assert_eq!(legal, vec![Trigger::GameStarted]),
                State::End | State::Durch | State::Bettel => assert!(legal.is_empty(), "{state:?}"),
                _ => {
                    assert!(legal.is_empty(), "{state:?}");
                    assert!(!auto_exits(state).is_empty(), "{state:?} is stuck");
                }
            }
        }
    }

    fn auto_exits(state: State) -> Vec<State> {
        use BiddingState as B;
        use TrickState as T;
        match state {
            State::Bidding(B::SwitchingFirstBidPlayer)
            | State::Bidding(B::SwitchingCurrentPlayer)
            | State::Bidding(B::SwitchingNextPlayer) => vec![State::ExchangingWithBlind],
            State::TrickTaking(T::RememberingWinningPlayer) => {
                vec![State::TrickTaking(T::SwitchingToNextPlayer)]
            }
            State::TrickTaking(T::SwitchingToNextPlayer) => {
                vec![State::TrickTaking(T::StartingNewRound)]
            }
            State::TrickTaking(T::StartingNewRound) => vec![State::CountingGameScore],
            _ => Vec::new(),
        }
    }

    fn successors(state: State) -> Vec<State> {
        let mut out: Vec<State> =
            Trigger::ALL.into_iter().filter_map(|t| transition(state, t)).collect();
        out.extend(auto_exits(state));
        out
    }

    #[test]
    fn every_reachable_state_can_reach_end() {
        let mut reachable = HashSet::new();
        let mut queue = VecDeque::from([State::Initial]);
        while let Some(s) = queue.pop_front() {
            if reachable.insert(s) {
                queue.extend(successors(s));
            }
        }
        assert_eq!(reachable.len(), State::ALL.len());
        for s in reachable {
            // Placeholder contracts have no exits yet.
            if matches!(s, State::Durch | State::Bettel) {
                continue;
            }
            let mut seen = HashSet::new();
            let mut queue = VecDeque::from([s]);
            let mut found = false;
            while let Some(x) = queue.pop_front() {
                if x == State::End {
                    found = true;
                    break;
                }
                if seen.insert(x) {
                    queue.extend(successors(x));
                }
            }
            assert!(found, "{s:?} cannot reach End");
        }
    }
}
