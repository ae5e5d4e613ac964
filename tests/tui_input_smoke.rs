use binokel::agents::{DecisionPoint, HostEvent, ScriptedHuman, SeatView, TracingSink};
use binokel::bridge::RoundBridge;
use binokel::cards::{parse_cards, Suit};
use binokel::controller::RoundController;
use binokel::protocol::{Decision, Payload, Trigger};
use binokel::settings::{RoundRecord, RoundSettings, SeatKind};
use binokel::tui::app::{AppState, InputAction, Scene};

fn setup_app() -> AppState {
    let record = RoundRecord::new(RoundSettings::default(), 3, 11).with_seat(0, SeatKind::Human);
    AppState::new(record)
}

fn prompt(point: DecisionPoint, hand: &str, options: &[Trigger]) -> SeatView {
    let hand = parse_cards(hand).unwrap();
    SeatView {
        point,
        seat: 0,
        dealer: 3,
        players: 4,
        legal_cards: hand.clone(),
        hand,
        bid: 0,
        bidder: None,
        opening_bid: 150,
        min_bid: 150,
        bid_step: 10,
        trump: None,
        trick: Vec::new(),
        dabb_size: 2,
        options: options.to_vec(),
    }
}

#[test]
fn help_and_history_toggle() {
    let mut app = setup_app();
    let _ = app.handle_input(InputAction::ToggleHelp);
    assert!(app.help_open());
    let _ = app.handle_input(InputAction::ToggleHistory);
    assert!(!app.help_open());
    assert!(app.history_open());
    let _ = app.handle_input(InputAction::ToggleHistory);
    assert!(!app.history_open());
}

#[test]
fn amount_entry_edit_and_submit() {
    let mut app = setup_app();
    let view = prompt(DecisionPoint::FirstBid, "Ah Th", &[Trigger::BidPlaced, Trigger::Passed]);
    app.handle_event(HostEvent::Prompt(view));
    assert!(app.amount_entry_active());
    assert_eq!(app.amount_entry_text(), Some("150"));

    let _ = app.handle_input(InputAction::AmountInc);
    assert_eq!(app.amount_entry_text(), Some("160"));
    let _ = app.handle_input(InputAction::AmountDec);
    let _ = app.handle_input(InputAction::AmountDec);
    assert_eq!(app.amount_entry_text(), Some("150"));

    let _ = app.handle_input(InputAction::AmountBackspace);
    let _ = app.handle_input(InputAction::AmountDigit(5));
    assert_eq!(app.amount_entry_text(), Some("155"));
    assert_eq!(app.handle_input(InputAction::Confirm), Some(Decision::bid(155)));
    assert!(!app.amount_entry_active());
    assert!(app.prompt().is_none());
}

#[test]
fn low_bid_keeps_the_prompt_open() {
    let mut app = setup_app();
    let view = prompt(DecisionPoint::FirstBid, "Ah", &[Trigger::BidPlaced, Trigger::Passed]);
    app.handle_event(HostEvent::Prompt(view));
    let _ = app.handle_input(InputAction::AmountBackspace);
    let _ = app.handle_input(InputAction::AmountBackspace);
    assert_eq!(app.amount_entry_text(), Some("1"));
    assert_eq!(app.handle_input(InputAction::Confirm), None);
    assert_eq!(app.action_error(), Some("Minimum is 150"));
    assert_eq!(app.handle_input(InputAction::Pass), Some(Decision::pass()));
}

#[test]
fn going_out_only_offered_during_the_exchange() {
    let mut app = setup_app();
    let view = prompt(DecisionPoint::FirstBid, "Ah", &[Trigger::BidPlaced, Trigger::Passed]);
    app.handle_event(HostEvent::Prompt(view));
    assert_eq!(app.handle_input(InputAction::GoOut), None);
    assert!(app.action_error().is_some());
    assert!(app.prompt().is_some());
}

#[test]
fn exchange_needs_the_dabb_count() {
    let mut app = setup_app();
    let options = [Trigger::TrumpSelected, Trigger::GoingOut];
    let view = prompt(DecisionPoint::Exchange, "Jc Qc Ah Th Kh", &options);
    app.handle_event(HostEvent::Prompt(view));
    // Hearts is the longest suit.
    assert_eq!(app.trump_choice, Suit::Hearts);

    let _ = app.handle_input(InputAction::ToggleSelect);
    assert_eq!(app.handle_input(InputAction::Confirm), None);
    assert!(app.is_selected(0));

    let _ = app.handle_input(InputAction::CursorRight);
    let _ = app.handle_input(InputAction::ToggleSelect);
    let _ = app.handle_input(InputAction::TrumpNext);
    assert_eq!(app.trump_choice, Suit::Spades);
    let decision = app.handle_input(InputAction::Confirm).unwrap();
    assert_eq!(decision.trigger, Trigger::TrumpSelected);
    assert_eq!(
        decision.payload,
        Payload::Exchange { discard: parse_cards("Jc Qc").unwrap(), trump: Some(Suit::Spades) }
    );
}

#[test]
fn finished_round_switches_to_summary() {
    let mut app = setup_app();
    let record = RoundRecord::new(RoundSettings::default(), 3, 11);
    let controller = RoundController::new(record, ScriptedHuman::default(), TracingSink).unwrap();
    let summary = controller.play(&mut RoundBridge::new()).unwrap();
    app.handle_event(HostEvent::Finished(Ok(summary.clone())));
    assert_eq!(app.scene, Scene::Summary);
    assert_eq!(app.summary(), Some(&Ok(summary)));
    assert!(app.last_event().is_some_and(|line| line.starts_with("Round over")));
}
