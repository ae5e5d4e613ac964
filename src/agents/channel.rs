//! Channel-backed collaborators for hosts that run the round on a worker
//! thread while a front end owns the terminal.

use crate::controller::{RoundSummary, Table};
use crate::protocol::{Decision, Notification};
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;
use tracing::warn;

use super::{AgentError, HumanInterface, PresentationSink, Presented, SeatView};

/// Everything the round thread tells the front end.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum HostEvent {
    /// A human seat must answer; the front end replies on the decision channel.
    Prompt(SeatView),
    Presented { notification: Notification, table: Table },
    Decided { seat: usize, decision: Decision, table: Table },
    Finished(Result<RoundSummary, String>),
}

/// Human interface that forwards each question to the front end and blocks
/// until it answers.
#[derive(Debug)]
pub struct ChannelHuman {
    events: Sender<HostEvent>,
    decisions: Receiver<Decision>,
}

impl ChannelHuman {
    pub fn new(events: Sender<HostEvent>, decisions: Receiver<Decision>) -> Self {
        Self { events, decisions }
    }

    fn ask(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.events.send(HostEvent::Prompt(view.clone())).map_err(|_| AgentError::Disconnected)?;
        self.decisions.recv().map_err(|_| AgentError::Disconnected)
    }
}

impl HumanInterface for ChannelHuman {
    fn ask_bid(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.ask(view)
    }
    fn ask_counter_bid(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.ask(view)
    }
    fn ask_bid_answer(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.ask(view)
    }
    fn ask_exchange(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.ask(view)
    }
    fn ask_card(&mut self, view: &SeatView) -> Result<Decision, AgentError> {
        self.ask(view)
    }
}

/// Presentation sink that mirrors the table to the front end, pausing after
/// each event so automated play stays readable.
#[derive(Debug)]
pub struct ChannelSink {
    events: Sender<HostEvent>,
    delay: Duration,
}

impl ChannelSink {
    pub fn new(events: Sender<HostEvent>, delay: Duration) -> Self {
        Self { events, delay }
    }

    fn send(&self, event: HostEvent) {
        if self.events.send(event).is_err() {
            warn!("front end went away; dropping presentation");
            return;
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

impl PresentationSink for ChannelSink {
    fn present(&mut self, notification: &Notification, table: &Table) -> Presented {
        self.send(HostEvent::Presented { notification: *notification, table: table.clone() });
        Presented::Done
    }

    fn decided(&mut self, seat: usize, decision: &Decision, table: &Table) {
        self.send(HostEvent::Decided { seat, decision: decision.clone(), table: table.clone() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::DecisionPoint;
    use crate::protocol::Trigger;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn human_round_trips_over_channels() {
        let (ev_tx, ev_rx) = mpsc::channel();
        let (dec_tx, dec_rx) = mpsc::channel();
        let front = thread::spawn(move || {
            let Ok(HostEvent::Prompt(view)) = ev_rx.recv() else {
                panic!("expected a prompt");
            };
            dec_tx.send(Decision::bid(view.min_bid)).unwrap();
        });
        let mut human = ChannelHuman::new(ev_tx, dec_rx);
        let view = SeatView {
            point: DecisionPoint::FirstBid,
            seat: 0,
            dealer: 3,
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
        };
        assert_eq!(human.ask_bid(&view), Ok(Decision::bid(150)));
        front.join().unwrap();
        assert_eq!(human.ask_card(&view), Err(AgentError::Disconnected));
    }
}
