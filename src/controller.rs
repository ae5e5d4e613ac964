//! The round controller resolves every notification into exactly one trigger.
//!
//! Decisions go to the seat's human interface or strategy, card validation
//! is answered by the trick referee, and everything else is handed to the
//! presentation sink. The controller keeps the table bookkeeping (hands,
//! bids, trump, the trick in progress); the machine never sees cards.

use crate::agents::{
    BotAgent, BotProfile, DecisionPoint, HumanInterface, PresentationSink, Presented, SeatStrategy,
    SeatView,
};
use crate::bridge::{NotificationSource, Reply, RoundBridge, TriggerSender};
use crate::cards::{Card, Suit};
use crate::deck::Deck;
use crate::protocol::{Decision, Notification, NotificationKind, Payload, Trigger};
use crate::round::{RoundError, State};
use crate::settings::{RoundRecord, SeatKind};
use crate::tricks;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// The declarer's choice after picking up the dabb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Announcement {
    Trump(Suit),
    GoingOut,
    Durch,
    Bettel,
}

/// Snapshot of the table as the controller tracks it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub struct Table {
    pub players: usize,
    pub dealer: usize,
    pub seats: Vec<SeatKind>,
    pub hands: Vec<Vec<Card>>,
    /// Face-down cards until the declarer picks them up.
    pub dabb: Vec<Card>,
    pub discards: Vec<Card>,
    pub bid: u32,
    pub bidder: Option<usize>,
    pub declarer: Option<usize>,
    pub announcement: Option<Announcement>,
    pub trump: Option<Suit>,
    pub trick: Vec<(usize, Card)>,
    pub last_trick: Vec<(usize, Card)>,
    /// Card played and waiting for the referee.
    pub pending: Option<(usize, Card)>,
    pub rejected: Option<(usize, Card)>,
    pub tricks_won: Vec<usize>,
    pub trick_winners: Vec<usize>,
    /// Seat addressed by the latest notification.
    pub turn: Option<usize>,
}

impl Table {
    fn new(record: &RoundRecord) -> Self {
        let players = record.settings.player_count;
        Self {
            players,
            dealer: record.dealer,
            seats: record.seats.clone(),
            hands: vec![Vec::new(); players],
            tricks_won: vec![0; players],
            ..Self::default()
        }
    }

    pub fn hand(&self, seat: usize) -> &[Card] {
        self.hands.get(seat).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// How a finished round came out.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RoundSummary {
    pub dealer: usize,
    pub declarer: Option<usize>,
    pub bid: u32,
    pub announcement: Option<Announcement>,
    pub trick_winners: Vec<usize>,
    pub tricks_won: Vec<usize>,
    pub final_state: State,
}

impl fmt::Display for RoundSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.declarer {
            Some(seat) => write!(f, "seat {seat} declared at {}", self.bid)?,
            None => write!(f, "no declarer")?,
        }
        match self.announcement {
            Some(Announcement::Trump(suit)) => write!(f, ", trump {}", suit.name())?,
            Some(Announcement::GoingOut) => write!(f, ", went out")?,
            Some(other) => write!(f, ", {other:?}")?,
            None => {}
        }
        if !self.tricks_won.is_empty() {
            write!(f, "; tricks {:?}", self.tricks_won)?;
        }
        Ok(())
    }
}

struct ControllerCore<'h> {
    record: RoundRecord,
    human: Box<dyn HumanInterface + 'h>,
    sink: Box<dyn PresentationSink + 'h>,
    strategies: Vec<Option<Box<dyn SeatStrategy + 'h>>>,
    profile: BotProfile,
    /// Seats whose strategy came from [`RoundController::with_strategy`].
    pinned: Vec<usize>,
    table: Table,
}

impl<'h> ControllerCore<'h> {
    fn handle(&mut self, notification: &Notification) -> Result<Reply, RoundError> {
        self.table.turn = notification.seat();
        match *notification {
            Notification::DealingStarted { .. } => {
                self.deal();
                Ok(self.present(notification))
            }
            Notification::ExchangingWithBlind { seat } => {
                self.pick_up_dabb(seat);
                self.decide(DecisionPoint::Exchange, notification.kind(), seat)
            }
            Notification::ValidatingCard { seat } => self.referee(seat).map(Reply::Trigger),
            _ => {
                let kind = notification.kind();
                match (DecisionPoint::for_kind(kind), notification.seat()) {
                    (Some(point), Some(seat)) => self.decide(point, kind, seat),
                    _ => Ok(self.present(notification)),
                }
            }
        }
    }

    fn present(&mut self, notification: &Notification) -> Reply {
        match self.sink.present(notification, &self.table) {
            Presented::Done => match notification.kind().completion_trigger() {
                Some(trigger) => Reply::Trigger(trigger),
                None => Reply::Deferred,
            },
            Presented::Pending => Reply::Deferred,
        }
    }

    /// Fresh bots for every automated seat, so replaying the record replays
    /// the round.
    fn reseat_bots(&mut self) {
        let fresh = seat_bots(&self.record, &self.profile);
        for (seat, bot) in fresh.into_iter().enumerate() {
            if self.pinned.contains(&seat) {
                continue;
            }
            if let Some(slot) = self.strategies.get_mut(seat) {
                *slot = bot;
            }
        }
    }

    fn deal(&mut self) {
        self.reseat_bots();
        let record = &self.record;
        let deal = Deck::deal_seeded(&record.settings, record.dealer, record.seed);
        self.table = Table::new(record);
        self.table.hands = deal.hands;
        self.table.dabb = deal.dabb;
        debug!(seed = record.seed, dabb = self.table.dabb.len(), "dealt");
    }

    fn pick_up_dabb(&mut self, seat: usize) {
        if self.table.bidder.is_none() {
            // House policy: with no bid at all the dealer plays at the opening bid.
            info!(seat, "nobody bid; dealer takes the game");
            self.table.bid = self.record.settings.opening_bid;
            self.table.bidder = Some(seat);
        }
        self.table.declarer = Some(seat);
        let dabb = std::mem::take(&mut self.table.dabb);
        if let Some(hand) = self.table.hands.get_mut(seat) {
            hand.extend(dabb);
            hand.sort_unstable();
        }
        info!(seat, bid = self.table.bid, "bidding won");
    }

    fn view(&self, point: DecisionPoint, kind: NotificationKind, seat: usize) -> SeatView {
        let settings = &self.record.settings;
        let hand = self.table.hand(seat).to_vec();
        let legal_cards = match point {
            DecisionPoint::Card => tricks::legal_cards(&hand, &self.table.trick, self.table.trump),
            _ => Vec::new(),
        };
        let min_bid = match point {
            DecisionPoint::FirstBid => settings.opening_bid,
            DecisionPoint::CounterBid => self.table.bid.max(settings.opening_bid) + settings.bid_step,
            DecisionPoint::BidAnswer => self.table.bid.max(settings.opening_bid),
            DecisionPoint::Exchange | DecisionPoint::Card => 0,
        };
        SeatView {
            point,
            seat,
            dealer: self.record.dealer,
            players: settings.player_count,
            hand,
            bid: self.table.bid,
            bidder: self.table.bidder,
            opening_bid: settings.opening_bid,
            min_bid,
            bid_step: settings.bid_step,
            trump: self.table.trump,
            trick: self.table.trick.clone(),
            legal_cards,
            dabb_size: settings.dabb_size(),
            options: kind.legal_triggers(),
        }
    }

    fn decide(
        &mut self,
        point: DecisionPoint,
        kind: NotificationKind,
        seat: usize,
    ) -> Result<Reply, RoundError> {
        let view = self.view(point, kind, seat);
        let decision = match self.record.seat_kind(seat) {
            SeatKind::Human => {
                let decision = point.ask(self.human.as_mut(), &view)?;
                validate(&view, kind, &decision)?;
                decision
            }
            SeatKind::Bot => {
                let Some(strategy) = self.strategies.get_mut(seat).and_then(Option::as_mut) else {
                    return Err(RoundError::Collaborator(format!("no strategy for seat {seat}")));
                };
                point.choose(strategy.as_mut(), &view)
            }
        };
        debug!(seat, ?point, trigger = ?decision.trigger, "decided");
        self.apply(seat, &decision);
        self.sink.decided(seat, &decision, &self.table);
        Ok(Reply::Trigger(decision.trigger))
    }

    fn apply(&mut self, seat: usize, decision: &Decision) {
        let table = &mut self.table;
        match (decision.trigger, &decision.payload) {
            (Trigger::BidPlaced | Trigger::BidCountered, Payload::Bid(amount)) => {
                table.bid = *amount;
                table.bidder = Some(seat);
            }
            (Trigger::TrumpSelected, Payload::Exchange { discard, trump }) => {
                if let Some(hand) = table.hands.get_mut(seat) {
                    for card in discard {
                        if let Some(i) = hand.iter().position(|c| c == card) {
                            hand.remove(i);
                        }
                    }
                }
                table.discards = discard.clone();
                table.trump = *trump;
                table.announcement = trump.map(Announcement::Trump);
            }
            (Trigger::GoingOut, _) => table.announcement = Some(Announcement::GoingOut),
            (Trigger::DurchAnnounced, _) => table.announcement = Some(Announcement::Durch),
            (Trigger::BettelAnnounced, _) => table.announcement = Some(Announcement::Bettel),
            (Trigger::CardPlaced, Payload::Card(card)) => table.pending = Some((seat, *card)),
            _ => {}
        }
    }

    /// Judge the pending card and update the trick.
    fn referee(&mut self, seat: usize) -> Result<Trigger, RoundError> {
        let Some((player, card)) = self.table.pending.take() else {
            return Err(RoundError::Collaborator(format!("seat {seat} has no card to validate")));
        };
        let table = &mut self.table;
        let trump = table.trump;
        let Some(hand) = table.hands.get_mut(player) else {
            return Err(RoundError::Collaborator(format!("seat {player} has no hand")));
        };
        if !tricks::is_legal(hand, &table.trick, trump, card) {
            debug!(seat = player, %card, "card rejected");
            table.rejected = Some((player, card));
            return Ok(Trigger::InvalidCardPlaced);
        }
        if let Some(i) = hand.iter().position(|&c| c == card) {
            hand.remove(i);
        }
        table.rejected = None;
        table.trick.push((player, card));
        let heads = tricks::winning_index(&table.trick, trump) == Some(table.trick.len() - 1);
        if table.trick.len() == table.players {
            self.close_trick();
        }
        Ok(if heads { Trigger::WinningCardPlaced } else { Trigger::LosingCardPlaced })
    }

    fn close_trick(&mut self) {
        let table = &mut self.table;
        let Some(winner) = tricks::winning_seat(&table.trick, table.trump) else {
            return;
        };
        if let Some(count) = table.tricks_won.get_mut(winner) {
            *count += 1;
        }
        table.trick_winners.push(winner);
        table.last_trick = std::mem::take(&mut table.trick);
        debug!(winner, trick = table.trick_winners.len(), "trick taken");
    }
}

/// One seeded bot per automated seat, `None` for human seats.
fn seat_bots<'h>(
    record: &RoundRecord,
    profile: &BotProfile,
) -> Vec<Option<Box<dyn SeatStrategy + 'h>>> {
    (0..record.settings.player_count)
        .map(|seat| match record.seat_kind(seat) {
            SeatKind::Bot => {
                let seed = record.seed.wrapping_add(seat as u64 + 1);
                let bot = BotAgent::new(profile.clone().with_seed(seed));
                Some(Box::new(bot) as Box<dyn SeatStrategy + 'h>)
            }
            SeatKind::Human => None,
        })
        .collect()
}

/// Payload sanity for human decisions. Automated seats are trusted.
fn validate(view: &SeatView, kind: NotificationKind, decision: &Decision) -> Result<(), RoundError> {
    let seat = view.seat;
    if !view.options.contains(&decision.trigger) {
        warn!(seat, ?kind, trigger = ?decision.trigger, "illegal trigger from human seat");
        return Err(RoundError::IllegalTrigger { seat, kind, trigger: decision.trigger });
    }
    let invalid = |reason: String| -> Result<(), RoundError> {
        warn!(seat, %reason, "invalid decision from human seat");
        Err(RoundError::InvalidDecision { seat, reason })
    };
    match (decision.trigger, &decision.payload) {
        (Trigger::BidPlaced | Trigger::BidCountered, Payload::Bid(amount)) => {
            if *amount < view.min_bid {
                return invalid(format!("bid {amount} is below the minimum of {}", view.min_bid));
            }
        }
        (Trigger::BidPlaced | Trigger::BidCountered, other) => {
            return invalid(format!("bid without an amount: {other:?}"));
        }
        (Trigger::CardPlaced, Payload::Card(card)) => {
            if !view.hand.contains(card) {
                return invalid(format!("{card} is not in hand"));
            }
        }
        (Trigger::CardPlaced, other) => return invalid(format!("card play without a card: {other:?}")),
        (Trigger::TrumpSelected, Payload::Exchange { discard, trump }) => {
            if trump.is_none() {
                return invalid("no trump suit named".to_string());
            }
            if discard.len() != view.dabb_size {
                return invalid(format!(
                    "must lay away {} cards, got {}",
                    view.dabb_size,
                    discard.len()
                ));
            }
            let mut hand = view.hand.clone();
            for card in discard {
                match hand.iter().position(|c| c == card) {
                    Some(i) => {
                        hand.remove(i);
                    }
                    None => return invalid(format!("cannot lay away {card}: not in hand")),
                }
            }
        }
        (Trigger::TrumpSelected, other) => {
            return invalid(format!("trump selection without an exchange: {other:?}"));
        }
        _ => {}
    }
    Ok(())
}

/// Drives one round through a bridge.
///
/// ```
/// use binokel::agents::{ScriptedHuman, TracingSink};
/// use binokel::bridge::RoundBridge;
/// use binokel::controller::RoundController;
/// use binokel::settings::{RoundRecord, RoundSettings};
///
/// let record = RoundRecord::new(RoundSettings::default(), 0, 42);
/// let controller = RoundController::new(record, ScriptedHuman::default(), TracingSink).unwrap();
/// let mut bridge = RoundBridge::new();
/// let summary = controller.play(&mut bridge).unwrap();
/// assert!(bridge.is_finished());
/// assert!(summary.declarer.is_some());
/// ```
pub struct RoundController<'h> {
    core: Rc<RefCell<ControllerCore<'h>>>,
}

impl fmt::Debug for RoundController<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.core.try_borrow() {
            Ok(core) => f
                .debug_struct("RoundController")
                .field("record", &core.record)
                .field("table", &core.table)
                .finish(),
            Err(_) => f.write_str("RoundController(<busy>)"),
        }
    }
}

impl<'h> RoundController<'h> {
    /// Automated seats get a seeded [`BotAgent`] unless replaced with
    /// [`RoundController::with_strategy`].
    pub fn new(
        record: RoundRecord,
        human: impl HumanInterface + 'h,
        sink: impl PresentationSink + 'h,
    ) -> Result<Self, RoundError> {
        record.validate()?;
        let profile = BotProfile::default();
        let strategies = seat_bots(&record, &profile);
        let table = Table::new(&record);
        let core = ControllerCore {
            record,
            human: Box::new(human),
            sink: Box::new(sink),
            strategies,
            profile,
            pinned: Vec::new(),
            table,
        };
        Ok(Self { core: Rc::new(RefCell::new(core)) })
    }

    /// Replace every automated seat's strategy with a bot of `profile`,
    /// reseeded per seat from the round seed. Seats set with
    /// [`RoundController::with_strategy`] keep their strategy.
    pub fn with_bots(self, profile: &BotProfile) -> Self {
        {
            let mut core = self.core.borrow_mut();
            core.profile = profile.clone();
            core.reseat_bots();
        }
        self
    }

    pub fn with_strategy(self, seat: usize, strategy: impl SeatStrategy + 'h) -> Self {
        {
            let mut core = self.core.borrow_mut();
            if seat >= core.strategies.len() {
                core.strategies.resize_with(seat + 1, || None);
            }
            core.strategies[seat] = Some(Box::new(strategy));
            if !core.pinned.contains(&seat) {
                core.pinned.push(seat);
            }
        }
        self
    }

    pub fn record(&self) -> RoundRecord {
        self.core.borrow().record.clone()
    }

    pub fn table(&self) -> Table {
        self.core.borrow().table.clone()
    }

    /// Subscribe one handler per notification kind.
    pub fn bind<S: NotificationSource<'h>>(&self, source: &mut S) -> Result<(), RoundError> {
        for kind in NotificationKind::ALL {
            let core = Rc::clone(&self.core);
            source.subscribe(kind, Box::new(move |n| core.borrow_mut().handle(n)))?;
        }
        Ok(())
    }

    /// Bind to a prepared bridge and fire the first trigger. Returns once the
    /// round ends or a handler defers.
    pub fn start<B>(&self, bridge: &mut B) -> Result<(), RoundError>
    where
        B: TriggerSender + NotificationSource<'h>,
    {
        self.bind(bridge)?;
        bridge.send_trigger(Trigger::GameStarted)
    }

    /// Prepare `bridge` for this round and run it to the end. Every
    /// presentation must complete synchronously.
    pub fn play(&self, bridge: &mut RoundBridge<'h>) -> Result<RoundSummary, RoundError> {
        let (settings, dealer) = {
            let core = self.core.borrow();
            (core.record.settings.clone(), core.record.dealer)
        };
        bridge.prepare_new_game(&settings, dealer)?;
        self.start(bridge)?;
        if let Some(n) = bridge.awaiting() {
            return Err(RoundError::Unanswered { kind: n.kind() });
        }
        let summary = self.summary(bridge).ok_or(RoundError::NotPrepared)?;
        info!(%summary, "round finished");
        Ok(summary)
    }

    pub fn summary(&self, bridge: &RoundBridge<'_>) -> Option<RoundSummary> {
        let machine = bridge.machine()?;
        let core = self.core.borrow();
        Some(RoundSummary {
            dealer: core.record.dealer,
            declarer: core.table.declarer,
            bid: core.table.bid,
            announcement: core.table.announcement,
            trick_winners: machine.properties().trick_winners().to_vec(),
            tricks_won: core.table.tricks_won.clone(),
            final_state: machine.state(),
        })
    }
}
