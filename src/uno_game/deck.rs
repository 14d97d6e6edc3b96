use super::card::{Card, CardType, Color};
use super::rules::Rules;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

/// Number of cards in a full deck.
pub const DECK_SIZE: usize = 108;

/// Source of uniformly random permutations for the deck and reshuffles.
pub trait Shuffler: Send + Sync {
    fn shuffle(&self, cards: &mut [Card]);
}

/// Shuffles with the thread-local RNG. Used by the server.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadShuffler;

impl Shuffler for ThreadShuffler {
    fn shuffle(&self, cards: &mut [Card]) {
        let mut rng = rand::rng();
        cards.shuffle(&mut rng);
    }
}

/// Reproducible shuffles from a fixed seed.
#[derive(Debug)]
pub struct SeededShuffler {
    rng: Mutex<StdRng>,
}

impl SeededShuffler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Shuffler for SeededShuffler {
    fn shuffle(&self, cards: &mut [Card]) {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cards.shuffle(&mut *rng);
    }
}

/// Builds a full 108-card deck and shuffles it.
///
/// The composition does not depend on `rules` yet; every version plays with
/// the standard deck.
pub fn build_deck(_rules: &Rules, shuffler: &dyn Shuffler) -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);

    for color in Color::BASE {
        // One zero per color
        deck.push(Card::new(color, CardType::Number(0)));

        // Two copies of 1-9 and of each action card
        for _ in 0..2 {
            for number in 1..=9 {
                deck.push(Card::new(color, CardType::Number(number)));
            }
            deck.push(Card::new(color, CardType::Skip));
            deck.push(Card::new(color, CardType::Reverse));
            deck.push(Card::new(color, CardType::DrawTwo));
        }
    }

    for _ in 0..4 {
        deck.push(Card::new(Color::Wild, CardType::Wild));
        deck.push(Card::new(Color::Wild, CardType::WildDrawFour));
    }

    shuffler.shuffle(&mut deck);
    deck
}
