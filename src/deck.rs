use crate::cards::{Card, Rank, Suit};
use crate::settings::{DeckVariant, RoundSettings};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A Binokel double deck: every card of the variant appears twice.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

/// Hands and dabb produced by one deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    pub hands: Vec<Vec<Card>>,
    pub dabb: Vec<Card>,
}

impl Deck {
    /// ```
    /// use binokel::deck::Deck;
    /// use binokel::settings::DeckVariant;
    ///
    /// assert_eq!(Deck::new(DeckVariant::Short40).len(), 40);
    /// assert_eq!(Deck::new(DeckVariant::Full48).len(), 48);
    /// ```
    pub fn new(variant: DeckVariant) -> Self {
        let ranks: &[Rank] = match variant {
            DeckVariant::Short40 => &Rank::SHORT,
            DeckVariant::Full48 => &Rank::ALL,
        };
        let mut cards = Vec::with_capacity(variant.size());
        for _copy in 0..2 {
            for &s in &Suit::ALL {
                for &r in ranks {
                    cards.push(Card::new(r, s));
                }
            }
        }
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Shuffle using a seeded RNG for reproducibility.
    pub fn shuffle_seeded(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.cards.shuffle(&mut rng);
    }

    /// Draw one card from the top of the deck.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Draw `n` cards from the top of the deck.
    pub fn draw_n(&mut self, n: usize) -> Vec<Card> {
        (0..n).filter_map(|_| self.draw()).collect()
    }

    /// Shuffle with `seed` and deal hands in seat order starting left of the
    /// dealer, then lay the rest aside as the dabb. Hands come back sorted.
    pub fn deal_seeded(settings: &RoundSettings, dealer: usize, seed: u64) -> Deal {
        let players = settings.player_count.max(1);
        let mut deck = Deck::new(settings.deck);
        deck.shuffle_seeded(seed);
        let mut hands = vec![Vec::with_capacity(settings.hand_size()); players];
        for i in 0..settings.hand_size() * players {
            let seat = (dealer + 1 + i) % players;
            if let Some(card) = deck.draw() {
                hands[seat].push(card);
            }
        }
        for hand in &mut hands {
            hand.sort_unstable();
        }
        let dabb = deck.draw_n(deck.len());
        Deal { hands, dabb }
    }
}
