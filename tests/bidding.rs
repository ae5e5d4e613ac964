use binokel::protocol::{Notification, Trigger};
use binokel::round::{BiddingState, Outcome, RoundMachine, State};
use binokel::settings::RoundSettings;

fn dealt(n: usize, dealer: usize) -> RoundMachine {
    let mut m = RoundMachine::new(&RoundSettings::default().with_players(n), dealer).unwrap();
    m.fire(Trigger::GameStarted).unwrap();
    m.fire(Trigger::DealingFinished).unwrap();
    m
}

fn notified(m: &mut RoundMachine, trigger: Trigger) -> Notification {
    match m.fire(trigger).unwrap() {
        Outcome::Waiting(n) => n,
        other => panic!("{trigger:?} in {:?} gave {other:?}", m.state()),
    }
}

/// Answer a pass, acknowledging the seat switch that follows unless the
/// bidding closes on the spot.
fn pass(m: &mut RoundMachine) -> Notification {
    let n = notified(m, Trigger::Passed);
    match n {
        Notification::FirstBidPlayerSwitched { .. }
        | Notification::CurrentBidderSwitched { .. }
        | Notification::CounterBidderSwitched { .. } => notified(m, Trigger::PlayerSwitched),
        other => other,
    }
}

// House policy: when nobody opens, the dealer takes the game unasked.
#[test]
fn all_pass_gives_the_game_to_the_dealer() {
    for n in [3usize, 4] {
        for dealer in 0..n {
            let mut m = dealt(n, dealer);
            let mut last = None;
            for _ in 0..n - 1 {
                last = Some(pass(&mut m));
            }
            assert_eq!(
                last,
                Some(Notification::ExchangingWithBlind { seat: dealer }),
                "n={n} dealer={dealer}"
            );
            assert_eq!(m.state(), State::ExchangingWithBlind);
        }
    }
}

#[test]
fn first_bids_go_round_from_left_of_dealer() {
    let mut m = dealt(4, 2);
    assert_eq!(pass(&mut m), Notification::WaitingForFirstBid { seat: 0 });
    assert_eq!(pass(&mut m), Notification::WaitingForFirstBid { seat: 1 });
    assert!(m.visited().contains(&State::Bidding(BiddingState::SwitchingFirstBidPlayer)));
}

#[test]
fn opener_wins_when_everyone_else_passes() {
    for n in [3usize, 4] {
        for dealer in 0..n {
            let opener = (dealer + 1) % n;
            let mut m = dealt(n, dealer);
            let mut last = notified(&mut m, Trigger::BidPlaced);
            assert_eq!(last, Notification::WaitingForCounterBid { seat: (opener + 1) % n });
            for _ in 0..n - 1 {
                last = pass(&mut m);
            }
            assert_eq!(last, Notification::ExchangingWithBlind { seat: opener }, "n={n} dealer={dealer}");
        }
    }
}

#[test]
fn counter_bidder_wins_when_answered_by_passes() {
    let mut m = dealt(4, 0);
    assert_eq!(
        notified(&mut m, Trigger::BidPlaced),
        Notification::WaitingForCounterBid { seat: 2 }
    );
    assert_eq!(
        notified(&mut m, Trigger::BidCountered),
        Notification::WaitingForBidAnswer { seat: 1 }
    );
    // Seat 1 gives up; seat 2 now holds the bid and seat 3 may counter.
    assert_eq!(
        notified(&mut m, Trigger::Passed),
        Notification::CurrentBidderSwitched { current: 2, next: 3 }
    );
    assert_eq!(
        notified(&mut m, Trigger::PlayerSwitched),
        Notification::WaitingForCounterBid { seat: 3 }
    );
    assert_eq!(pass(&mut m), Notification::WaitingForCounterBid { seat: 0 });
    assert_eq!(pass(&mut m), Notification::ExchangingWithBlind { seat: 2 });
    assert_eq!(m.properties().current_player(), 2);
}

#[test]
fn holding_the_bid_returns_to_the_counter_bidder() {
    let mut m = dealt(3, 0);
    notified(&mut m, Trigger::BidPlaced);
    notified(&mut m, Trigger::BidCountered);
    assert_eq!(
        notified(&mut m, Trigger::BidPlaced),
        Notification::WaitingForCounterBid { seat: 2 }
    );
    assert_eq!(pass(&mut m), Notification::WaitingForCounterBid { seat: 0 });
    assert_eq!(pass(&mut m), Notification::ExchangingWithBlind { seat: 1 });
}

#[test]
fn dealer_wins_by_countering_when_the_holder_passes() {
    let mut m = dealt(3, 0);
    assert_eq!(
        notified(&mut m, Trigger::BidPlaced),
        Notification::WaitingForCounterBid { seat: 2 }
    );
    assert_eq!(pass(&mut m), Notification::WaitingForCounterBid { seat: 0 });
    assert_eq!(
        notified(&mut m, Trigger::BidCountered),
        Notification::WaitingForBidAnswer { seat: 1 }
    );
    // The dealer now holds the bid and nobody is left to counter.
    assert_eq!(
        notified(&mut m, Trigger::Passed),
        Notification::ExchangingWithBlind { seat: 0 }
    );
    assert!(m.visited().contains(&State::Bidding(BiddingState::SwitchingCurrentPlayer)));
    assert_eq!(m.state(), State::ExchangingWithBlind);
    assert_eq!(m.properties().current_player(), 0);
}

#[test]
fn bidding_ignores_triggers_from_other_phases() {
    let mut m = dealt(4, 0);
    let before = m.properties().clone();
    for t in [Trigger::CardPlaced, Trigger::TrumpSelected, Trigger::PlayerSwitched] {
        assert_eq!(m.fire(t).unwrap(), Outcome::Ignored);
    }
    assert_eq!(m.state(), State::Bidding(BiddingState::WaitingForFirstBid));
    assert_eq!(m.properties(), &before);
}
