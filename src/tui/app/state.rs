use crate::agents::{DecisionPoint, HostEvent, SeatView};
use crate::cards::{Card, Suit};
use crate::controller::{RoundSummary, Table};
use crate::protocol::{Decision, Notification, Payload, Trigger};
use crate::settings::{RoundRecord, SeatKind};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Scene {
    Table,
    Summary,
}

/// High-level input actions for the TUI controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputAction {
    ToggleHelp,
    ToggleHistory,
    HistoryUp,
    HistoryDown,
    CursorLeft,
    CursorRight,
    ToggleSelect,
    TrumpNext,
    AmountDigit(u8),
    AmountBackspace,
    AmountInc,
    AmountDec,
    Confirm,
    Pass,
    GoOut,
}

#[derive(Debug)]
#[non_exhaustive]
pub struct AppState {
    pub scene: Scene,
    pub started: Instant,
    pub record: RoundRecord,
    // Latest table snapshot from the round thread
    pub table: Table,
    // Seat whose hand is shown
    pub focus: usize,
    pub cursor: usize,
    pub trump_choice: Suit,
    prompt: Option<SeatView>,
    selected: Vec<usize>,
    summary: Option<Result<RoundSummary, String>>,
    history: Vec<String>,
    help_open: bool,
    history_open: bool,
    history_offset: usize,
    amount_entry: Option<String>,
    action_error: Option<String>,
    action_error_at: Option<Instant>,
}

impl AppState {
    pub const HISTORY_PAGE_SIZE: usize = 20;
    const ACTION_ERROR_TTL: Duration = Duration::from_secs(3);

    pub fn new(record: RoundRecord) -> Self {
        let focus = record.seats.iter().position(|k| *k == SeatKind::Human).unwrap_or(0);
        Self {
            scene: Scene::Table,
            started: Instant::now(),
            record,
            table: Table::default(),
            focus,
            cursor: 0,
            trump_choice: Suit::Hearts,
            prompt: None,
            selected: Vec::new(),
            summary: None,
            history: Vec::new(),
            help_open: false,
            history_open: false,
            history_offset: 0,
            amount_entry: None,
            action_error: None,
            action_error_at: None,
        }
    }

    pub fn prompt(&self) -> Option<&SeatView> {
        self.prompt.as_ref()
    }

    pub fn summary(&self) -> Option<&Result<RoundSummary, String>> {
        self.summary.as_ref()
    }

    pub fn is_selected(&self, idx: usize) -> bool {
        self.selected.contains(&idx)
    }

    pub fn help_open(&self) -> bool {
        self.help_open
    }

    pub fn history_open(&self) -> bool {
        self.history_open
    }

    pub fn history_offset(&self) -> usize {
        self.history_offset
    }

    /// A page of history, newest last, scrolled back by `history_offset`.
    pub fn history_page(&self) -> &[String] {
        let end = self.history.len().saturating_sub(self.history_offset);
        let start = end.saturating_sub(Self::HISTORY_PAGE_SIZE);
        &self.history[start..end]
    }

    pub fn last_event(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    pub fn amount_entry_active(&self) -> bool {
        self.amount_entry.is_some()
    }

    pub fn amount_entry_text(&self) -> Option<&str> {
        self.amount_entry.as_deref()
    }

    pub fn action_error(&self) -> Option<&str> {
        self.action_error.as_deref()
    }

    /// The hand shown at the bottom: the prompted hand while a prompt is
    /// open, otherwise the focused seat's hand from the table.
    pub fn shown_hand(&self) -> &[Card] {
        match &self.prompt {
            Some(view) => &view.hand,
            None => self.table.hand(self.focus),
        }
    }

    fn set_action_error(&mut self, msg: impl Into<String>) {
        self.action_error = Some(msg.into());
        self.action_error_at = Some(Instant::now());
    }

    fn clear_action_error(&mut self) {
        self.action_error = None;
        self.action_error_at = None;
    }

    /// Expire stale error messages.
    pub fn on_tick(&mut self) {
        if let Some(at) = self.action_error_at {
            if at.elapsed() >= Self::ACTION_ERROR_TTL {
                self.clear_action_error();
            }
        }
    }

    fn log(&mut self, line: String) {
        self.history.push(line);
        if self.history_offset > 0 {
            self.history_offset += 1;
        }
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Prompt(view) => {
                self.focus = view.seat;
                self.cursor = 0;
                self.selected.clear();
                self.amount_entry = match view.point {
                    DecisionPoint::FirstBid | DecisionPoint::CounterBid | DecisionPoint::BidAnswer => {
                        Some(view.min_bid.to_string())
                    }
                    _ => None,
                };
                if view.point == DecisionPoint::Exchange {
                    self.trump_choice = longest_suit(&view.hand);
                }
                self.log(format!("P{}: {}", view.seat + 1, prompt_label(view.point)));
                self.prompt = Some(view);
            }
            HostEvent::Presented { notification, table } => {
                if let Some(line) = describe(&notification, &table) {
                    self.log(line);
                }
                self.table = table;
            }
            HostEvent::Decided { seat, decision, table } => {
                self.log(describe_decision(seat, &decision));
                self.table = table;
            }
            HostEvent::Finished(result) => {
                match &result {
                    Ok(summary) => self.log(format!("Round over: {summary}")),
                    Err(err) => self.log(format!("Round aborted: {err}")),
                }
                self.prompt = None;
                self.amount_entry = None;
                self.summary = Some(result);
                self.scene = Scene::Summary;
            }
        }
    }

    /// Apply one input. Returns a decision once the open prompt is answered.
    pub fn handle_input(&mut self, action: InputAction) -> Option<Decision> {
        match action {
            InputAction::ToggleHelp => {
                self.history_open = false;
                self.help_open = !self.help_open;
                None
            }
            InputAction::ToggleHistory => {
                self.help_open = false;
                if !self.history_open {
                    self.history_offset = 0;
                }
                self.history_open = !self.history_open;
                None
            }
            InputAction::HistoryUp => {
                if self.history_open {
                    let max_offset = self.history.len().saturating_sub(Self::HISTORY_PAGE_SIZE);
                    self.history_offset = (self.history_offset + 1).min(max_offset);
                }
                None
            }
            InputAction::HistoryDown => {
                if self.history_open && self.history_offset > 0 {
                    self.history_offset -= 1;
                }
                None
            }
            InputAction::CursorLeft => {
                let n = self.shown_hand().len();
                if n > 0 {
                    self.cursor = (self.cursor + n - 1) % n;
                }
                None
            }
            InputAction::CursorRight => {
                let n = self.shown_hand().len();
                if n > 0 {
                    self.cursor = (self.cursor + 1) % n;
                }
                None
            }
            InputAction::ToggleSelect => {
                if self.prompt_point() == Some(DecisionPoint::Exchange) {
                    if let Some(i) = self.selected.iter().position(|&s| s == self.cursor) {
                        self.selected.remove(i);
                    } else {
                        self.selected.push(self.cursor);
                    }
                }
                None
            }
            InputAction::TrumpNext => {
                if self.prompt_point() == Some(DecisionPoint::Exchange) {
                    let i = Suit::ALL.iter().position(|&s| s == self.trump_choice).unwrap_or(0);
                    self.trump_choice = Suit::ALL[(i + 1) % Suit::ALL.len()];
                }
                None
            }
            InputAction::AmountDigit(d) => {
                if let Some(buf) = self.amount_entry.as_mut() {
                    if buf.len() < 6 {
                        buf.push(char::from(b'0' + d.min(9)));
                    }
                }
                None
            }
            InputAction::AmountBackspace => {
                if let Some(buf) = self.amount_entry.as_mut() {
                    buf.pop();
                }
                None
            }
            InputAction::AmountInc => {
                self.adjust_amount(1);
                None
            }
            InputAction::AmountDec => {
                self.adjust_amount(-1);
                None
            }
            InputAction::Confirm => self.confirm(),
            InputAction::Pass => self.answer_with(Trigger::Passed, Decision::pass()),
            InputAction::GoOut => self.answer_with(Trigger::GoingOut, Decision::go_out()),
        }
    }

    fn prompt_point(&self) -> Option<DecisionPoint> {
        self.prompt.as_ref().map(|v| v.point)
    }

    fn adjust_amount(&mut self, steps: i64) {
        let Some(view) = self.prompt.as_ref() else {
            return;
        };
        let step = i64::from(view.bid_step.max(1));
        let floor = i64::from(view.min_bid);
        if let Some(buf) = self.amount_entry.as_mut() {
            let cur = buf.parse::<i64>().unwrap_or(floor);
            *buf = (cur + steps * step).max(floor).to_string();
        }
    }

    fn answer_with(&mut self, trigger: Trigger, decision: Decision) -> Option<Decision> {
        let view = self.prompt.as_ref()?;
        if !view.options.contains(&trigger) {
            self.set_action_error(format!("{trigger:?} is not possible now"));
            return None;
        }
        self.finish_prompt();
        Some(decision)
    }

    fn finish_prompt(&mut self) {
        self.prompt = None;
        self.amount_entry = None;
        self.selected.clear();
        self.cursor = 0;
        self.clear_action_error();
    }

    fn confirm(&mut self) -> Option<Decision> {
        let view = self.prompt.as_ref()?;
        let decision = match view.point {
            DecisionPoint::FirstBid | DecisionPoint::CounterBid | DecisionPoint::BidAnswer => {
                let text = self.amount_entry.as_deref().unwrap_or("");
                let Ok(amount) = text.parse::<u32>() else {
                    self.set_action_error("Invalid amount");
                    return None;
                };
                if amount < view.min_bid {
                    let msg = format!("Minimum is {}", view.min_bid);
                    self.set_action_error(msg);
                    return None;
                }
                if view.point == DecisionPoint::CounterBid {
                    Decision::counter(amount)
                } else {
                    Decision::bid(amount)
                }
            }
            DecisionPoint::Exchange => {
                if self.selected.len() != view.dabb_size {
                    let msg = format!("Select {} cards to lay away", view.dabb_size);
                    self.set_action_error(msg);
                    return None;
                }
                let discard = self.selected.iter().filter_map(|&i| view.hand.get(i).copied()).collect();
                Decision::trump(self.trump_choice, discard)
            }
            DecisionPoint::Card => {
                let Some(&card) = view.hand.get(self.cursor) else {
                    return None;
                };
                Decision::card(card)
            }
        };
        self.finish_prompt();
        Some(decision)
    }
}

fn longest_suit(hand: &[Card]) -> Suit {
    let count = |s: Suit| hand.iter().filter(|c| c.suit() == s).count();
    let mut best = Suit::ALL[0];
    for &s in &Suit::ALL[1..] {
        if count(s) > count(best) {
            best = s;
        }
    }
    best
}

fn prompt_label(point: DecisionPoint) -> &'static str {
    match point {
        DecisionPoint::FirstBid => "your bid",
        DecisionPoint::CounterBid => "counter or pass",
        DecisionPoint::BidAnswer => "hold or pass",
        DecisionPoint::Exchange => "pick trump and lay away",
        DecisionPoint::Card => "play a card",
    }
}

fn describe(notification: &Notification, table: &Table) -> Option<String> {
    let line = match *notification {
        Notification::DealingStarted { dealer } => format!("P{} deals", dealer + 1),
        Notification::CountingGoingOutScore { seat } => format!("P{} goes out", seat + 1),
        Notification::MeldingStarted => match table.trump {
            Some(suit) => format!("Melding, trump is {}", suit.name()),
            None => "Melding".to_string(),
        },
        Notification::RevertingInvalidMove { seat } => match table.rejected {
            Some((_, card)) => format!("P{}: {card} is not allowed", seat + 1),
            None => format!("P{}: card not allowed", seat + 1),
        },
        Notification::NewTrickStarted { leader } => format!("P{} takes the trick", leader + 1),
        Notification::CountingGameScore => "All tricks played".to_string(),
        _ => return None,
    };
    Some(line)
}

fn describe_decision(seat: usize, decision: &Decision) -> String {
    let who = format!("P{}", seat + 1);
    match (decision.trigger, &decision.payload) {
        (Trigger::BidPlaced, Payload::Bid(a)) => format!("{who} bids {a}"),
        (Trigger::BidCountered, Payload::Bid(a)) => format!("{who} counters {a}"),
        (Trigger::Passed, _) => format!("{who} passes"),
        (Trigger::TrumpSelected, Payload::Exchange { trump: Some(s), .. }) => {
            format!("{who} names {}", s.name())
        }
        (Trigger::CardPlaced, Payload::Card(c)) => format!("{who} plays {c}"),
        (trigger, _) => format!("{who}: {trigger:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::RoundSettings;

    fn card_prompt() -> SeatView {
        let hand = crate::cards::parse_cards("Ah Th Kd").unwrap();
        SeatView {
            point: DecisionPoint::Card,
            seat: 0,
            dealer: 3,
            players: 4,
            legal_cards: hand.clone(),
            hand,
            bid: 150,
            bidder: Some(1),
            opening_bid: 150,
            min_bid: 0,
            bid_step: 10,
            trump: Some(Suit::Clubs),
            trick: Vec::new(),
            dabb_size: 4,
            options: vec![Trigger::CardPlaced],
        }
    }

    #[test]
    fn input_ignored_without_prompt() {
        let record = RoundRecord::new(RoundSettings::default(), 3, 1).with_seat(0, SeatKind::Human);
        let mut app = AppState::new(record);
        assert_eq!(app.handle_input(InputAction::Confirm), None);
        assert_eq!(app.handle_input(InputAction::Pass), None);
    }

    #[test]
    fn cursor_wraps_and_plays_card() {
        let record = RoundRecord::new(RoundSettings::default(), 3, 1).with_seat(0, SeatKind::Human);
        let mut app = AppState::new(record);
        app.handle_event(HostEvent::Prompt(card_prompt()));
        let _ = app.handle_input(InputAction::CursorLeft);
        assert_eq!(app.cursor, 2);
        let played = app.handle_input(InputAction::Confirm);
        assert_eq!(played, Some(Decision::card("Kd".parse().unwrap())));
        assert!(app.prompt().is_none());
        assert_eq!(app.handle_input(InputAction::Pass), None);
    }
}
