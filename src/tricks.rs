//! Trick rules: which cards a seat may play and which card heads a trick.
//!
//! A seat must follow the led suit and beat the card heading the trick when
//! it can. A seat void in the led suit must trump, overtrumping when it can.
//! Only a seat with neither may discard freely. Of two identical cards the
//! one played first wins.

use crate::cards::{Card, Suit};

/// Cards played so far in a trick, with the seat that played each.
pub type Trick = [(usize, Card)];

/// Whether `challenger`, played after `holder`, takes the trick from it.
pub fn beats(challenger: Card, holder: Card, trump: Option<Suit>) -> bool {
    if challenger.suit() == holder.suit() {
        return challenger.rank() > holder.rank();
    }
    Some(challenger.suit()) == trump
}

/// Index into `trick` of the card currently heading it.
pub fn winning_index(trick: &Trick, trump: Option<Suit>) -> Option<usize> {
    let (first, rest) = trick.split_first()?;
    let mut best = (0, first.1);
    for (i, &(_, card)) in rest.iter().enumerate() {
        if beats(card, best.1, trump) {
            best = (i + 1, card);
        }
    }
    Some(best.0)
}

/// Seat currently heading `trick`.
pub fn winning_seat(trick: &Trick, trump: Option<Suit>) -> Option<usize> {
    winning_index(trick, trump).map(|i| trick[i].0)
}

/// The subset of `hand` that may legally be played into `trick`.
///
/// ```
/// use binokel::cards::{Card, Rank, Suit};
/// use binokel::tricks::legal_cards;
///
/// let hand = [
///     Card::new(Rank::Jack, Suit::Hearts),
///     Card::new(Rank::Ace, Suit::Hearts),
///     Card::new(Rank::Ace, Suit::Clubs),
/// ];
/// let trick = [(0, Card::new(Rank::King, Suit::Hearts))];
/// assert_eq!(legal_cards(&hand, &trick, Some(Suit::Clubs)), vec![hand[1]]);
/// ```
pub fn legal_cards(hand: &[Card], trick: &Trick, trump: Option<Suit>) -> Vec<Card> {
    let Some(&(_, lead)) = trick.first() else {
        return hand.to_vec();
    };
    let Some(head) = winning_index(trick, trump).map(|i| trick[i].1) else {
        return hand.to_vec();
    };
    let led = lead.suit();
    let following: Vec<Card> = hand.iter().copied().filter(|c| c.suit() == led).collect();
    if !following.is_empty() {
        // Beating is only possible while the led suit still heads the trick.
        if head.suit() == led {
            let higher: Vec<Card> =
                following.iter().copied().filter(|&c| beats(c, head, trump)).collect();
            if !higher.is_empty() {
                return higher;
            }
        }
        return following;
    }
    let Some(trump_suit) = trump else {
        return hand.to_vec();
    };
    let trumps: Vec<Card> = hand.iter().copied().filter(|c| c.suit() == trump_suit).collect();
    if trumps.is_empty() {
        return hand.to_vec();
    }
    let over: Vec<Card> = trumps.iter().copied().filter(|&c| beats(c, head, trump)).collect();
    if over.is_empty() {
        trumps
    } else {
        over
    }
}

pub fn is_legal(hand: &[Card], trick: &Trick, trump: Option<Suit>, card: Card) -> bool {
    hand.contains(&card) && legal_cards(hand, trick, trump).contains(&card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{parse_cards, Rank};

    fn c(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn seated(cards: &str) -> Vec<(usize, Card)> {
        parse_cards(cards).unwrap().into_iter().enumerate().collect()
    }

    #[test]
    fn first_of_identical_cards_wins() {
        let trick = seated("Ah Ah Kh");
        assert_eq!(winning_index(&trick, Some(Suit::Spades)), Some(0));
    }

    #[test]
    fn ten_beats_king_and_trump_beats_ace() {
        assert!(beats(c("Th"), c("Kh"), None));
        assert!(!beats(c("Kh"), c("Th"), None));
        assert!(beats(c("Js"), c("Ah"), Some(Suit::Spades)));
        assert!(!beats(c("Ad"), c("Jh"), Some(Suit::Spades)));
    }

    #[test]
    fn must_follow_and_beat() {
        let hand = parse_cards("Jh Th Ac").unwrap();
        let trick = seated("Kh");
        assert_eq!(legal_cards(&hand, &trick, Some(Suit::Clubs)), vec![c("Th")]);
    }

    #[test]
    fn follow_without_beating_when_trumped() {
        let hand = parse_cards("Jh Ah Kc").unwrap();
        let trick = seated("Kh Jc");
        assert_eq!(legal_cards(&hand, &trick, Some(Suit::Clubs)), vec![c("Jh"), c("Ah")]);
    }

    #[test]
    fn void_must_overtrump() {
        let hand = parse_cards("Jc Ac Ad").unwrap();
        let trick = seated("Kh Qc");
        assert_eq!(legal_cards(&hand, &trick, Some(Suit::Clubs)), vec![c("Ac")]);
        let trick = seated("Kh Tc Ac");
        assert_eq!(legal_cards(&hand, &trick, Some(Suit::Clubs)), vec![c("Jc"), c("Ac")]);
    }

    #[test]
    fn void_without_trump_plays_anything() {
        let hand = parse_cards("Jd Ad").unwrap();
        let trick = seated("Kh");
        assert_eq!(legal_cards(&hand, &trick, Some(Suit::Clubs)), hand);
        assert!(is_legal(&hand, &trick, Some(Suit::Clubs), c("Jd")));
        assert!(!is_legal(&hand, &trick, Some(Suit::Clubs), Card::new(Rank::Ace, Suit::Spades)));
    }

    #[test]
    fn lead_is_free() {
        let hand = parse_cards("Jd Ad Th").unwrap();
        assert_eq!(legal_cards(&hand, &[], None), hand);
        assert_eq!(winning_seat(&[], None), None);
    }
}
