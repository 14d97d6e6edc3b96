use super::card::Card;
use super::room::GameError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: String,
    pub name: String,
    #[serde(default)]
    pub hand: Vec<Card>,
    #[serde(default)]
    pub is_host: bool,
}

impl Player {
    pub fn new(player_id: String, name: String, is_host: bool) -> Self {
        Self {
            player_id,
            name,
            hand: Vec::new(),
            is_host,
        }
    }

    /// Adds a card to the player's hand.
    pub fn add_card(&mut self, card: Card) {
        self.hand.push(card);
    }

    /// Removes a card from the player's hand at the specified index.
    /// Returns `Err(GameError::InvalidCardIndex)` if the index is out of bounds.
    pub fn remove_card(&mut self, card_index: usize) -> Result<Card, GameError> {
        if card_index < self.hand.len() {
            Ok(self.hand.remove(card_index))
        } else {
            Err(GameError::InvalidCardIndex(card_index))
        }
    }

    /// Checks if the player has won (i.e., their hand is empty).
    pub fn has_won(&self) -> bool {
        self.hand.is_empty()
    }
}
