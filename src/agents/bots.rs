use crate::cards::{Card, Rank, Suit};
use crate::protocol::{Decision, Payload, Trigger};
use crate::tricks::{beats, winning_index};
use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use std::thread;
use std::time::Duration;

use super::{SeatStrategy, SeatView};

/// Difficulty tiers for bot play style and mistake rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

/// Configuration for a bot's play style and randomness.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct BotProfile {
    pub difficulty: Difficulty,
    /// How far past its hand estimate the bot is willing to bid.
    pub aggression: f64,
    /// Reluctance to play a contract it is unlikely to make.
    pub caution: f64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub rng_seed: Option<u64>,
}

impl BotProfile {
    /// Create a profile with tuned defaults for a difficulty tier.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let (aggression, caution) = match difficulty {
            Difficulty::Easy => (0.15, 0.2),
            Difficulty::Medium => (0.3, 0.45),
            Difficulty::Hard => (0.42, 0.6),
            Difficulty::Expert => (0.5, 0.75),
        };
        Self { difficulty, aggression, caution, min_delay_ms: 0, max_delay_ms: 0, rng_seed: None }
    }

    /// Set a deterministic RNG seed for reproducible decisions.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_delay_ms(mut self, min: u64, max: u64) -> Self {
        self.min_delay_ms = min;
        self.max_delay_ms = max;
        self
    }
}

impl Default for BotProfile {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::Medium)
    }
}

#[derive(Debug)]
struct BotState {
    rng: StdRng,
}

impl BotState {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(v) => StdRng::seed_from_u64(v),
            None => {
                let mut seed = [0u8; 32];
                rand::rng().fill_bytes(&mut seed);
                StdRng::from_seed(seed)
            }
        };
        Self { rng }
    }
}

/// A seeded heuristic seat strategy.
#[derive(Debug)]
pub struct BotAgent {
    profile: BotProfile,
    state: BotState,
}

impl BotAgent {
    pub fn new(profile: BotProfile) -> Self {
        let state = BotState::new(profile.rng_seed);
        Self { profile, state }
    }

    pub fn profile(&self) -> &BotProfile {
        &self.profile
    }

    fn pause(&mut self) {
        let delay = choose_delay_ms(&self.profile, &mut self.state);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
    }

    /// Highest bid the bot is prepared to hold with this hand.
    fn bid_limit(&mut self, view: &SeatView) -> u32 {
        let rate = mistake_rate(self.profile.difficulty);
        let noise = self.state.rng.random_range(-1.0..=1.0) * rate;
        let strength = (hand_strength(&view.hand) + noise).clamp(0.0, 1.0);
        let reach = strength * (1.0 + self.profile.aggression);
        let opening = view.opening_bid as f64;
        let step = view.bid_step.max(1);
        // A hand of average strength is worth roughly the opening bid.
        let raw = (opening * (0.55 + reach)).round() as u32;
        raw / step * step
    }

    fn bid_or_pass(&mut self, view: &SeatView, trigger: Trigger, amount: u32) -> Decision {
        if view.options.contains(&trigger) && self.bid_limit(view) >= amount {
            Decision::new(trigger, Payload::Bid(amount))
        } else {
            Decision::pass()
        }
    }
}

impl SeatStrategy for BotAgent {
    fn choose_bid(&mut self, view: &SeatView) -> Decision {
        self.pause();
        self.bid_or_pass(view, Trigger::BidPlaced, view.min_bid)
    }

    fn choose_counter_bid(&mut self, view: &SeatView) -> Decision {
        self.pause();
        self.bid_or_pass(view, Trigger::BidCountered, view.min_bid)
    }

    fn choose_bid_answer(&mut self, view: &SeatView) -> Decision {
        self.pause();
        self.bid_or_pass(view, Trigger::BidPlaced, view.min_bid)
    }

    fn choose_exchange(&mut self, view: &SeatView) -> Decision {
        self.pause();
        let strength = hand_strength(&view.hand);
        let roll = self.state.rng.random::<f64>();
        if view.options.contains(&Trigger::GoingOut)
            && strength < 0.25
            && roll < self.profile.caution
        {
            return Decision::go_out();
        }
        let trump = best_trump(&view.hand);
        let discard = choose_discard(&view.hand, trump, view.dabb_size);
        Decision::trump(trump, discard)
    }

    fn choose_card(&mut self, view: &SeatView) -> Decision {
        self.pause();
        let legal = if view.legal_cards.is_empty() { &view.hand } else { &view.legal_cards };
        let rate = mistake_rate(self.profile.difficulty);
        if self.state.rng.random::<f64>() < rate * 0.5 && !legal.is_empty() {
            let idx = self.state.rng.random_range(0..legal.len());
            return Decision::card(legal[idx]);
        }
        match pick_card(legal, &view.trick, view.trump) {
            Some(card) => Decision::card(card),
            // Nothing to play: the controller only asks seats holding cards.
            None => Decision::pass(),
        }
    }
}

fn choose_delay_ms(profile: &BotProfile, state: &mut BotState) -> u64 {
    let min = profile.min_delay_ms;
    let max = profile.max_delay_ms.max(min);
    if max == min {
        min
    } else {
        state.rng.random_range(min..=max)
    }
}

fn mistake_rate(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 0.28,
        Difficulty::Medium => 0.14,
        Difficulty::Hard => 0.08,
        Difficulty::Expert => 0.04,
    }
}

fn card_weight(rank: Rank) -> f64 {
    match rank {
        Rank::Ace => 11.0,
        Rank::Ten => 10.0,
        Rank::King => 4.0,
        Rank::Queen => 3.0,
        Rank::Jack => 2.0,
        Rank::Seven => 0.0,
    }
}

/// Rough hand quality in `0.0..=1.0`: high cards, a long suit, and
/// king/queen pairs that would meld.
fn hand_strength(hand: &[Card]) -> f64 {
    if hand.is_empty() {
        return 0.0;
    }
    let high: f64 = hand.iter().map(|c| card_weight(c.rank())).sum::<f64>() / hand.len() as f64;
    let longest = Suit::ALL.iter().map(|&s| suit_count(hand, s)).max().unwrap_or(0) as f64;
    let pairs = Suit::ALL
        .iter()
        .filter(|&&s| {
            hand.contains(&Card::new(Rank::King, s)) && hand.contains(&Card::new(Rank::Queen, s))
        })
        .count() as f64;
    let score = (high / 11.0) * 0.6 + (longest / hand.len() as f64) * 0.25 + pairs * 0.05;
    score.clamp(0.0, 1.0)
}

fn suit_count(hand: &[Card], suit: Suit) -> usize {
    hand.iter().filter(|c| c.suit() == suit).count()
}

fn best_trump(hand: &[Card]) -> Suit {
    let score = |s: Suit| -> f64 {
        hand.iter()
            .filter(|c| c.suit() == s)
            .map(|c| 2.0 + card_weight(c.rank()) / 11.0)
            .sum()
    };
    let mut best = Suit::ALL[0];
    for &s in &Suit::ALL[1..] {
        if score(s) > score(best) {
            best = s;
        }
    }
    best
}

/// Lay away the cheapest cards outside the trump suit, keeping aces.
fn choose_discard(hand: &[Card], trump: Suit, count: usize) -> Vec<Card> {
    let mut candidates: Vec<Card> = hand.to_vec();
    candidates.sort_by(|a, b| {
        let key = |c: &Card| (c.suit() == trump, c.rank() == Rank::Ace, c.rank());
        key(a).cmp(&key(b))
    });
    candidates.truncate(count);
    candidates
}

fn cheapest(cards: impl Iterator<Item = Card>, trump: Option<Suit>) -> Option<Card> {
    cards.min_by_key(|c| (Some(c.suit()) == trump, c.rank()))
}

fn pick_card(legal: &[Card], trick: &[(usize, Card)], trump: Option<Suit>) -> Option<Card> {
    let Some(head) = winning_index(trick, trump).map(|i| trick[i].1) else {
        // Leading: cash an ace if there is one, otherwise start cheap.
        return legal
            .iter()
            .copied()
            .find(|c| c.rank() == Rank::Ace && Some(c.suit()) != trump)
            .or_else(|| cheapest(legal.iter().copied(), trump));
    };
    let winners: Vec<Card> = legal.iter().copied().filter(|&c| beats(c, head, trump)).collect();
    if winners.is_empty() {
        cheapest(legal.iter().copied(), trump)
    } else {
        cheapest(winners.into_iter(), trump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::DecisionPoint;
    use crate::cards::parse_cards;

    fn view(point: DecisionPoint, hand: &str) -> SeatView {
        let hand = parse_cards(hand).unwrap();
        SeatView {
            point,
            seat: 1,
            dealer: 0,
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
            dabb_size: 4,
            options: Vec::new(),
        }
    }

    #[test]
    fn strong_hand_opens_weak_hand_passes() {
        let mut bot = BotAgent::new(BotProfile::for_difficulty(Difficulty::Expert).with_seed(3));
        let mut strong = view(DecisionPoint::FirstBid, "Ah Ah Th Th Kh Qh As Ac Ad");
        strong.options = vec![Trigger::BidPlaced, Trigger::Passed];
        assert_eq!(bot.choose_bid(&strong), Decision::bid(150));

        let mut weak = view(DecisionPoint::FirstBid, "Jh Jd Js Jc Qd Qs Jh Qc Jd");
        weak.options = vec![Trigger::BidPlaced, Trigger::Passed];
        assert_eq!(bot.choose_bid(&weak), Decision::pass());
    }

    #[test]
    fn exchange_keeps_trump_and_aces() {
        let mut bot = BotAgent::new(BotProfile::for_difficulty(Difficulty::Expert).with_seed(1));
        let mut v = view(DecisionPoint::Exchange, "Ah Th Kh Qh Jh As Jc Qc Jd Kd Ac Qs Js");
        v.options = vec![Trigger::TrumpSelected];
        let d = bot.choose_exchange(&v);
        let Payload::Exchange { discard, trump } = d.payload else {
            panic!("expected an exchange, got {d:?}");
        };
        assert_eq!(trump, Some(Suit::Hearts));
        assert_eq!(discard.len(), 4);
        assert!(discard.iter().all(|c| c.suit() != Suit::Hearts && c.rank() != Rank::Ace));
    }

    #[test]
    fn plays_cheapest_winner_when_following() {
        let legal = parse_cards("Th Ah").unwrap();
        let trick = vec![(0, "Kh".parse().unwrap())];
        assert_eq!(pick_card(&legal, &trick, Some(Suit::Clubs)), Some("Th".parse().unwrap()));
    }

    #[test]
    fn same_seed_same_choices() {
        let v = view(DecisionPoint::Card, "Jh Th Ac Qs Kd");
        let mut a = BotAgent::new(BotProfile::for_difficulty(Difficulty::Easy).with_seed(9));
        let mut b = BotAgent::new(BotProfile::for_difficulty(Difficulty::Easy).with_seed(9));
        for _ in 0..10 {
            assert_eq!(a.choose_card(&v), b.choose_card(&v));
        }
    }
}
