use super::card::{can_play, Card, CardType, Color};
use super::deck::{build_deck, Shuffler};
use super::player::Player;
use super::rules::Rules;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cards dealt to each player when they enter a room.
pub const HAND_SIZE: usize = 7;

pub const ROOM_CODE_LEN: usize = 4;

/// Room codes are exactly four ASCII uppercase letters.
pub fn is_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LEN && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// Broad class of a rejected request, used by the transport to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidTurn,
    InvalidMove,
    InvalidState,
    ExhaustedSupply,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    RoomNotFound(String),
    Forbidden(String),
    NotYourTurn,
    InvalidCardIndex(usize),
    CardCannotBePlayed,
    WildColorRequired,
    NameTaken(String),
    InvalidState(String),
    EmptyDeck,
    Storage(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::RoomNotFound(_) => ErrorKind::NotFound,
            GameError::Forbidden(_) => ErrorKind::Forbidden,
            GameError::NotYourTurn => ErrorKind::InvalidTurn,
            GameError::InvalidCardIndex(_)
            | GameError::CardCannotBePlayed
            | GameError::WildColorRequired => ErrorKind::InvalidMove,
            GameError::NameTaken(_) | GameError::InvalidState(_) => ErrorKind::InvalidState,
            GameError::EmptyDeck => ErrorKind::ExhaustedSupply,
            GameError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::RoomNotFound(code) => write!(f, "Room {} not found", code),
            GameError::Forbidden(msg) => write!(f, "{}", msg),
            GameError::NotYourTurn => write!(f, "Not your turn"),
            GameError::InvalidCardIndex(index) => write!(f, "Invalid card index {}", index),
            GameError::CardCannotBePlayed => write!(f, "Card cannot be played"),
            GameError::WildColorRequired => write!(f, "Choose a valid color for wild"),
            GameError::NameTaken(name) => write!(f, "Name {} already taken in room", name),
            GameError::InvalidState(msg) => write!(f, "{}", msg),
            GameError::EmptyDeck => write!(f, "No cards left to draw"),
            GameError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for GameError {}

impl From<std::io::Error> for GameError {
    fn from(err: std::io::Error) -> Self {
        GameError::Storage(err.to_string())
    }
}

/// Represents the direction of play. Serialized as `1` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn reverse(&self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// The seat one step away from `index` in this direction.
    pub fn next(&self, index: usize, num_players: usize) -> usize {
        match self {
            Direction::Clockwise => (index + 1) % num_players,
            Direction::CounterClockwise => (index + num_players - 1) % num_players,
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Clockwise),
            -1 => Ok(Direction::CounterClockwise),
            other => Err(format!("invalid direction {}", other)),
        }
    }
}

/// Kind of draw penalty waiting to be stacked on. Reserved for the stacking
/// rule; nothing sets it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingDraw {
    #[serde(rename = "draw2")]
    DrawTwo,
    #[serde(rename = "wild4")]
    WildDrawFour,
}

/// One game table: the players, the piles and whose turn it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub code: String,
    pub players: Vec<Player>,
    pub rules: Rules,
    pub started: bool,
    pub direction: Direction,
    pub current_player_index: usize,
    /// Top of the pile is the last element.
    pub draw_pile: Vec<Card>,
    /// Last element is the card in play.
    pub discard_pile: Vec<Card>,
    pub current_color: Option<Color>,
    #[serde(default)]
    pub pending_draw_count: usize,
    #[serde(default)]
    pub pending_draw_type: Option<PendingDraw>,
    pub winner_id: Option<String>,
}

impl Room {
    /// Opens a room with a fresh deck, deals the host in and flips a colored
    /// start card.
    pub fn new(
        code: String,
        mut host: Player,
        rules: Rules,
        shuffler: &dyn Shuffler,
    ) -> Result<Self, GameError> {
        let mut deck = build_deck(&rules, shuffler);

        host.is_host = true;
        for _ in 0..HAND_SIZE {
            host.add_card(deck.pop().ok_or(GameError::EmptyDeck)?);
        }

        if !deck.iter().any(|card| !card.is_wild()) {
            return Err(GameError::EmptyDeck);
        }
        let mut top = deck.pop().ok_or(GameError::EmptyDeck)?;
        while top.is_wild() {
            // Wilds never start the game; bury it and try again
            deck.insert(0, top);
            shuffler.shuffle(&mut deck);
            top = deck.pop().ok_or(GameError::EmptyDeck)?;
        }

        Ok(Self {
            code,
            players: vec![host],
            rules,
            started: false,
            direction: Direction::Clockwise,
            current_player_index: 0,
            draw_pile: deck,
            discard_pile: vec![top],
            current_color: Some(top.color),
            pending_draw_count: 0,
            pending_draw_type: None,
            winner_id: None,
        })
    }

    pub fn top_card(&self) -> Result<&Card, GameError> {
        self.discard_pile
            .last()
            .ok_or_else(|| GameError::InvalidState("Discard pile is empty".to_string()))
    }

    pub fn current_player(&self) -> Result<&Player, GameError> {
        self.players
            .get(self.current_player_index)
            .ok_or_else(|| GameError::InvalidState("Room has no current player".to_string()))
    }

    /// Cards across both piles and every hand.
    pub fn total_cards(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
    }

    /// Cards that can still be drawn, counting the discard pile minus its top.
    pub fn drawable_cards(&self) -> usize {
        self.draw_pile.len() + self.discard_pile.len().saturating_sub(1)
    }

    /// Seats a new player and deals them a hand.
    pub fn add_player(
        &mut self,
        player_id: String,
        name: String,
        shuffler: &dyn Shuffler,
    ) -> Result<(), GameError> {
        if self.started {
            return Err(GameError::InvalidState(
                "Can't join after the game has started".to_string(),
            ));
        }
        if self.players.iter().any(|p| p.name == name) {
            return Err(GameError::NameTaken(name));
        }
        if self.drawable_cards() < HAND_SIZE {
            return Err(GameError::EmptyDeck);
        }

        let mut player = Player::new(player_id, name, false);
        for _ in 0..HAND_SIZE {
            player.add_card(self.draw_one(shuffler)?);
        }
        info!(
            "Player {} ({}) joined room {}",
            player.name, player.player_id, self.code
        );
        self.players.push(player);
        Ok(())
    }

    pub fn start(&mut self, player_id: &str) -> Result<(), GameError> {
        self.ensure_host(player_id, "Only host can start")?;
        self.started = true;
        info!("Room {} started with {} players", self.code, self.players.len());
        Ok(())
    }

    pub fn set_rules(&mut self, player_id: &str, rules: Rules) -> Result<(), GameError> {
        self.ensure_host(player_id, "Only host can change rules")?;
        if self.started {
            return Err(GameError::InvalidState(
                "Can't change rules after start".to_string(),
            ));
        }
        info!("Room {} rules set to {:?}", self.code, rules);
        self.rules = rules;
        Ok(())
    }

    /// Takes the top card of the draw pile, recycling the discard pile first
    /// when the draw pile is empty.
    pub fn draw_one(&mut self, shuffler: &dyn Shuffler) -> Result<Card, GameError> {
        if self.draw_pile.is_empty() {
            self.reshuffle(shuffler);
        }
        self.draw_pile.pop().ok_or(GameError::EmptyDeck)
    }

    /// Turns everything under the discard top into a new draw pile.
    /// Only called with an empty draw pile.
    fn reshuffle(&mut self, shuffler: &dyn Shuffler) {
        let Some(top) = self.discard_pile.pop() else {
            return;
        };
        let mut pile = std::mem::take(&mut self.discard_pile);
        shuffler.shuffle(&mut pile);
        debug!("Room {}: reshuffled {} cards into the draw pile", self.code, pile.len());
        self.draw_pile = pile;
        self.discard_pile.push(top);
    }

    /// Plays the card at `card_index` from the current player's hand.
    ///
    /// Everything is validated before the room changes, so an `Err` leaves the
    /// room as it was. Once a winner exists this does nothing.
    pub fn play_card(
        &mut self,
        player_id: &str,
        card_index: usize,
        chosen_color: Option<Color>,
        shuffler: &dyn Shuffler,
    ) -> Result<(), GameError> {
        if self.winner_id.is_some() {
            return Ok(());
        }

        let actor = self.ensure_turn(player_id)?;
        let card = *self.players[actor]
            .hand
            .get(card_index)
            .ok_or(GameError::InvalidCardIndex(card_index))?;

        if !can_play(&card, self.top_card()?, self.current_color) {
            return Err(GameError::CardCannotBePlayed);
        }

        let color = if card.is_wild() {
            match chosen_color {
                Some(color) if color.is_base() => color,
                _ => return Err(GameError::WildColorRequired),
            }
        } else {
            card.color
        };

        let penalty = match card.card_type {
            CardType::DrawTwo => 2,
            CardType::WildDrawFour => 4,
            _ => 0,
        };
        // Once the card lands, the old top joins the reshufflable cards
        if penalty > self.draw_pile.len() + self.discard_pile.len() {
            return Err(GameError::EmptyDeck);
        }

        let played = self.players[actor].remove_card(card_index)?;
        self.discard_pile.push(played);
        self.current_color = Some(color);
        info!(
            "Room {}: {} played {} (color now {})",
            self.code, self.players[actor].name, played, color
        );

        let num_players = self.players.len();
        let step = match played.card_type {
            CardType::Reverse => {
                self.direction = self.direction.reverse();
                // Two players: reverse acts as a skip and the actor goes again
                if num_players == 2 {
                    2
                } else {
                    1
                }
            }
            CardType::Skip => 2,
            CardType::DrawTwo | CardType::WildDrawFour => {
                let target = self.direction.next(actor, num_players);
                for _ in 0..penalty {
                    let drawn = self.draw_one(shuffler)?;
                    self.players[target].add_card(drawn);
                }
                info!(
                    "Room {}: {} draws {} and loses their turn",
                    self.code, self.players[target].name, penalty
                );
                2
            }
            _ => 1,
        };

        if self.players[actor].has_won() {
            let winner = self.players[actor].player_id.clone();
            info!("Room {}: {} wins", self.code, self.players[actor].name);
            self.winner_id = Some(winner);
        }

        self.current_player_index = self.seat_after(actor, step);
        Ok(())
    }

    /// Current player draws one card and the turn passes on.
    pub fn draw_card(&mut self, player_id: &str, shuffler: &dyn Shuffler) -> Result<(), GameError> {
        if let Some(actor) = self.draw_for_current(player_id, shuffler)? {
            self.current_player_index = self.direction.next(actor, self.players.len());
        }
        Ok(())
    }

    /// Current player draws one card and keeps the turn, so the drawn card
    /// can be played right away.
    pub fn draw_and_keep_turn(
        &mut self,
        player_id: &str,
        shuffler: &dyn Shuffler,
    ) -> Result<(), GameError> {
        self.draw_for_current(player_id, shuffler)?;
        Ok(())
    }

    /// Returns the drawing seat, or `None` when the game is already decided.
    fn draw_for_current(
        &mut self,
        player_id: &str,
        shuffler: &dyn Shuffler,
    ) -> Result<Option<usize>, GameError> {
        if self.winner_id.is_some() {
            return Ok(None);
        }

        let actor = self.ensure_turn(player_id)?;
        let card = self.draw_one(shuffler)?;
        self.players[actor].add_card(card);
        info!("Room {}: {} drew a card", self.code, self.players[actor].name);
        Ok(Some(actor))
    }

    fn seat_after(&self, from: usize, step: usize) -> usize {
        let num_players = self.players.len();
        (0..step).fold(from, |seat, _| self.direction.next(seat, num_players))
    }

    fn ensure_turn(&self, player_id: &str) -> Result<usize, GameError> {
        if self.current_player()?.player_id != player_id {
            return Err(GameError::NotYourTurn);
        }
        Ok(self.current_player_index)
    }

    fn ensure_host(&self, player_id: &str, message: &str) -> Result<(), GameError> {
        match self.players.iter().find(|p| p.is_host) {
            Some(host) if host.player_id == player_id => Ok(()),
            _ => Err(GameError::Forbidden(message.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uno_game::deck::tests::NoShuffle;
    use crate::uno_game::deck::{SeededShuffler, ThreadShuffler, DECK_SIZE};

    fn card(color: Color, card_type: CardType) -> Card {
        Card::new(color, card_type)
    }

    fn red(n: u8) -> Card {
        card(Color::Red, CardType::Number(n))
    }

    /// Builds a started room with the given hands; player 0 is host and to act.
    fn room_with(hands: Vec<Vec<Card>>, top: Card, draw_pile: Vec<Card>) -> Room {
        let players = hands
            .into_iter()
            .enumerate()
            .map(|(i, hand)| Player {
                player_id: format!("p{}", i),
                name: format!("Player{}", i),
                hand,
                is_host: i == 0,
            })
            .collect();

        Room {
            code: "ABCD".to_string(),
            players,
            rules: Rules::default(),
            started: true,
            direction: Direction::Clockwise,
            current_player_index: 0,
            draw_pile,
            discard_pile: vec![top],
            current_color: Some(top.color),
            pending_draw_count: 0,
            pending_draw_type: None,
            winner_id: None,
        }
    }

    fn filler(n: usize) -> Vec<Card> {
        (0..n).map(|i| card(Color::Green, CardType::Number((i % 9) as u8 + 1))).collect()
    }

    #[test]
    fn test_room_code_format() {
        assert!(is_room_code("ABCD"));
        assert!(!is_room_code("ABC"));
        assert!(!is_room_code("ABCDE"));
        assert!(!is_room_code("abcd"));
        assert!(!is_room_code("../x"));
        assert!(!is_room_code("AB/D"));
        assert!(!is_room_code("ÄBCD"));
    }

    #[test]
    fn test_new_room() {
        let host = Player::new("p_host".to_string(), "Alice".to_string(), false);
        let room = Room::new("ABCD".to_string(), host, Rules::default(), &ThreadShuffler).unwrap();

        assert_eq!(room.players.len(), 1);
        assert!(room.players[0].is_host);
        assert_eq!(room.players[0].hand.len(), HAND_SIZE);
        assert_eq!(room.discard_pile.len(), 1);
        assert!(!room.discard_pile[0].is_wild());
        assert_eq!(room.current_color, Some(room.discard_pile[0].color));
        assert_eq!(room.direction, Direction::Clockwise);
        assert!(!room.started);
        assert_eq!(room.total_cards(), DECK_SIZE);
    }

    #[test]
    fn test_new_room_buries_wild_start_card() {
        // Unshuffled, the wilds sit on top of the deck
        let host = Player::new("p_host".to_string(), "Alice".to_string(), true);
        let room = Room::new("ABCD".to_string(), host, Rules::default(), &NoShuffle).unwrap();

        assert!(room.players[0].hand.iter().all(|c| c.is_wild()));
        assert!(!room.top_card().unwrap().is_wild());
        assert_eq!(room.total_cards(), DECK_SIZE);
    }

    #[test]
    fn test_play_same_color_wins_and_advances() {
        let mut room = room_with(vec![vec![red(5)], filler(3)], red(7), filler(10));

        room.play_card("p0", 0, None, &NoShuffle).unwrap();

        assert_eq!(room.top_card().unwrap(), &red(5));
        assert_eq!(room.current_color, Some(Color::Red));
        assert_eq!(room.current_player_index, 1);
        assert_eq!(room.winner_id.as_deref(), Some("p0"));
    }

    #[test]
    fn test_normal_card_turn_progression() {
        let mut room = room_with(vec![vec![red(5), red(1)], filler(3), filler(3)], red(7), vec![]);

        room.play_card("p0", 0, None, &NoShuffle).unwrap();
        assert_eq!(room.current_player_index, 1);
        assert_eq!(room.players[0].hand, vec![red(1)]);
        assert!(room.winner_id.is_none());
    }

    #[test]
    fn test_skip_turn_progression() {
        let skip = card(Color::Red, CardType::Skip);
        let hands = vec![vec![skip, red(1)], filler(2), filler(2), vec![skip, red(2)]];

        let mut room = room_with(hands.clone(), red(7), vec![]);
        room.play_card("p0", 0, None, &NoShuffle).unwrap();
        assert_eq!(room.current_player_index, 2);

        let mut room = room_with(hands, red(7), vec![]);
        room.direction = Direction::CounterClockwise;
        room.current_player_index = 3;
        room.play_card("p3", 0, None, &NoShuffle).unwrap();
        assert_eq!(room.current_player_index, 1);
    }

    #[test]
    fn test_reverse_turn_progression() {
        let reverse = card(Color::Blue, CardType::Reverse);
        let mut room = room_with(
            vec![filler(2), vec![reverse, red(1)], filler(2)],
            card(Color::Blue, CardType::Number(4)),
            vec![],
        );
        room.current_player_index = 1;

        room.play_card("p1", 0, None, &NoShuffle).unwrap();

        assert_eq!(room.direction, Direction::CounterClockwise);
        assert_eq!(room.current_player_index, 0);
    }

    #[test]
    fn test_reverse_with_two_players_repeats_turn() {
        let reverse = card(Color::Red, CardType::Reverse);
        let mut room = room_with(vec![vec![reverse, red(1)], filler(2)], red(7), vec![]);

        room.play_card("p0", 0, None, &NoShuffle).unwrap();

        assert_eq!(room.direction, Direction::CounterClockwise);
        assert_eq!(room.current_player_index, 0);
        // The same player can act again
        room.play_card("p0", 0, None, &NoShuffle).unwrap();
        assert_eq!(room.current_player_index, 1);
    }

    #[test]
    fn test_draw_two_penalises_next_seat() {
        let draw_two = card(Color::Green, CardType::DrawTwo);
        let mut room = room_with(
            vec![vec![draw_two, red(1)], filler(2), filler(2)],
            card(Color::Green, CardType::Number(3)),
            filler(5),
        );

        room.play_card("p0", 0, None, &NoShuffle).unwrap();

        assert_eq!(room.players[1].hand.len(), 4);
        assert_eq!(room.players[2].hand.len(), 2);
        assert_eq!(room.draw_pile.len(), 3);
        assert_eq!(room.current_player_index, 2);
        assert_eq!(room.pending_draw_count, 0);
        assert!(room.pending_draw_type.is_none());
    }

    #[test]
    fn test_wild_draw_four_with_chosen_color() {
        let wild_four = card(Color::Wild, CardType::WildDrawFour);
        let mut room = room_with(
            vec![vec![red(2), wild_four, red(3)], filler(3), filler(3), filler(3)],
            red(7),
            filler(20),
        );
        let before = room.total_cards();

        room.play_card("p0", 1, Some(Color::Blue), &NoShuffle).unwrap();

        assert_eq!(room.players[1].hand.len(), 7);
        assert_eq!(room.current_player_index, 2);
        assert_eq!(room.current_color, Some(Color::Blue));
        assert_eq!(room.top_card().unwrap(), &wild_four);
        assert_eq!(room.total_cards(), before);

        // Only blue follows a blue wild
        room.current_player_index = 2;
        room.players[2].hand = vec![card(Color::Blue, CardType::Number(7)), red(4)];
        assert_eq!(
            room.play_card("p2", 1, None, &NoShuffle),
            Err(GameError::CardCannotBePlayed)
        );
        room.play_card("p2", 0, None, &NoShuffle).unwrap();
    }

    #[test]
    fn test_wild_requires_base_color() {
        let wild = card(Color::Wild, CardType::Wild);
        let room = room_with(vec![vec![wild, red(1)], filler(2)], red(7), filler(5));

        let mut missing = room.clone();
        assert_eq!(
            missing.play_card("p0", 0, None, &NoShuffle),
            Err(GameError::WildColorRequired)
        );
        assert_eq!(missing, room);

        let mut wild_color = room.clone();
        assert_eq!(
            wild_color.play_card("p0", 0, Some(Color::Wild), &NoShuffle),
            Err(GameError::WildColorRequired)
        );
        assert_eq!(wild_color, room);
    }

    #[test]
    fn test_rejected_plays_leave_room_untouched() {
        let room = room_with(
            vec![vec![card(Color::Blue, CardType::Number(3))], filler(2)],
            red(7),
            filler(5),
        );

        let mut attempt = room.clone();
        assert_eq!(attempt.play_card("p1", 0, None, &NoShuffle), Err(GameError::NotYourTurn));
        assert_eq!(
            attempt.play_card("p0", 1, None, &NoShuffle),
            Err(GameError::InvalidCardIndex(1))
        );
        assert_eq!(
            attempt.play_card("p0", 0, None, &NoShuffle),
            Err(GameError::CardCannotBePlayed)
        );
        assert_eq!(attempt.draw_card("p1", &NoShuffle), Err(GameError::NotYourTurn));
        assert_eq!(attempt, room);
    }

    #[test]
    fn test_winner_freezes_room() {
        let mut room = room_with(vec![vec![red(5)], filler(2)], red(7), filler(5));
        room.play_card("p0", 0, None, &NoShuffle).unwrap();
        let finished = room.clone();

        room.play_card("p1", 0, None, &NoShuffle).unwrap();
        room.draw_card("p1", &NoShuffle).unwrap();
        room.draw_and_keep_turn("p1", &NoShuffle).unwrap();
        assert_eq!(room, finished);
        assert_eq!(room.winner_id.as_deref(), Some("p0"));
    }

    #[test]
    fn test_draw_card_turn_progression() {
        let mut room = room_with(vec![filler(2), filler(2), filler(2)], red(7), filler(4));

        room.draw_card("p0", &NoShuffle).unwrap();
        assert_eq!(room.players[0].hand.len(), 3);
        assert_eq!(room.draw_pile.len(), 3);
        assert_eq!(room.current_player_index, 1);

        room.direction = Direction::CounterClockwise;
        room.draw_card("p1", &NoShuffle).unwrap();
        assert_eq!(room.current_player_index, 0);
    }

    #[test]
    fn test_draw_and_keep_turn() {
        let mut room = room_with(vec![filler(2), filler(2)], red(7), vec![red(3)]);

        room.draw_and_keep_turn("p0", &NoShuffle).unwrap();
        assert_eq!(room.current_player_index, 0);
        assert_eq!(room.players[0].hand.last(), Some(&red(3)));

        room.play_card("p0", 2, None, &NoShuffle).unwrap();
        assert_eq!(room.current_player_index, 1);
    }

    #[test]
    fn test_draw_reshuffles_discard_pile() {
        let mut room = room_with(vec![filler(2), filler(2)], red(7), vec![]);
        room.discard_pile = vec![red(1), red(2), red(3), red(4), red(5), red(6)];
        let before = room.total_cards();

        room.draw_card("p0", &ThreadShuffler).unwrap();

        assert_eq!(room.discard_pile, vec![red(6)]);
        assert_eq!(room.draw_pile.len(), 4);
        assert_eq!(room.players[0].hand.len(), 3);
        assert_eq!(room.current_player_index, 1);
        assert_eq!(room.total_cards(), before);
    }

    #[test]
    fn test_draw_with_no_supply_fails() {
        let room = room_with(vec![filler(2), filler(2)], red(7), vec![]);

        let mut attempt = room.clone();
        assert_eq!(attempt.draw_card("p0", &NoShuffle), Err(GameError::EmptyDeck));
        assert_eq!(attempt, room);
        assert_eq!(GameError::EmptyDeck.kind(), ErrorKind::ExhaustedSupply);
    }

    #[test]
    fn test_draw_two_without_supply_fails() {
        let draw_two = card(Color::Red, CardType::DrawTwo);
        let room = room_with(vec![vec![draw_two, red(1)], filler(2)], red(7), vec![]);

        let mut attempt = room.clone();
        assert_eq!(attempt.play_card("p0", 0, None, &NoShuffle), Err(GameError::EmptyDeck));
        assert_eq!(attempt, room);
    }

    #[test]
    fn test_forced_draw_reshuffles_mid_penalty() {
        let draw_two = card(Color::Red, CardType::DrawTwo);
        let mut room = room_with(vec![vec![draw_two, red(1)], filler(2)], red(7), vec![red(9)]);
        room.discard_pile = vec![red(2), red(3), red(7)];
        let before = room.total_cards();

        room.play_card("p0", 0, None, &NoShuffle).unwrap();

        assert_eq!(room.players[1].hand.len(), 4);
        assert_eq!(room.discard_pile, vec![draw_two]);
        assert_eq!(room.draw_pile.len(), 2);
        assert_eq!(room.total_cards(), before);
        // Two players, draw two skips the opponent
        assert_eq!(room.current_player_index, 0);
    }

    #[test]
    fn test_add_player() {
        let host = Player::new("p_host".to_string(), "Alice".to_string(), true);
        let mut room =
            Room::new("ABCD".to_string(), host, Rules::default(), &SeededShuffler::new(7)).unwrap();

        room.add_player("p_bob".to_string(), "Bob".to_string(), &ThreadShuffler)
            .unwrap();
        assert_eq!(room.players.len(), 2);
        assert_eq!(room.players[1].hand.len(), HAND_SIZE);
        assert!(!room.players[1].is_host);
        assert_eq!(room.total_cards(), DECK_SIZE);

        assert_eq!(
            room.add_player("p_x".to_string(), "Bob".to_string(), &ThreadShuffler),
            Err(GameError::NameTaken("Bob".to_string()))
        );

        room.start("p_host").unwrap();
        assert!(matches!(
            room.add_player("p_c".to_string(), "Carol".to_string(), &ThreadShuffler),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_add_player_reshuffles_when_needed() {
        let mut room = room_with(vec![filler(2)], red(7), filler(3));
        room.started = false;
        room.discard_pile = vec![red(1), red(2), red(3), red(4), red(5), red(7)];

        room.add_player("p1".to_string(), "Bob".to_string(), &NoShuffle)
            .unwrap();
        assert_eq!(room.players[1].hand.len(), HAND_SIZE);
        assert_eq!(room.discard_pile, vec![red(7)]);
        assert_eq!(room.draw_pile.len(), 1);

        assert_eq!(
            room.add_player("p2".to_string(), "Carol".to_string(), &NoShuffle),
            Err(GameError::EmptyDeck)
        );
    }

    #[test]
    fn test_host_only_actions() {
        let mut room = room_with(vec![filler(2), filler(2)], red(7), vec![]);
        room.started = false;

        assert!(matches!(room.start("p1"), Err(GameError::Forbidden(_))));
        let party = Rules {
            stacking: true,
            ..Rules::default()
        };
        assert!(matches!(
            room.set_rules("p1", party.clone()),
            Err(GameError::Forbidden(_))
        ));

        room.set_rules("p0", party.clone()).unwrap();
        assert_eq!(room.rules, party);

        room.start("p0").unwrap();
        assert!(room.started);
        assert!(matches!(
            room.set_rules("p0", Rules::default()),
            Err(GameError::InvalidState(_))
        ));
    }

    #[test]
    fn test_room_wire_format() {
        let mut room = room_with(vec![vec![red(1)]], red(7), vec![]);
        room.direction = Direction::CounterClockwise;

        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["direction"], -1);
        assert_eq!(json["current_color"], "red");
        assert_eq!(json["pending_draw_type"], serde_json::Value::Null);
        assert_eq!(json["discard_pile"][0]["value"], "7");
        assert_eq!(json["players"][0]["is_host"], true);

        let back: Room = serde_json::from_value(json).unwrap();
        assert_eq!(back, room);
    }

    #[test]
    fn test_random_game_conserves_cards() {
        let shuffler = SeededShuffler::new(2024);
        let host = Player::new("p0".to_string(), "Alice".to_string(), true);
        let mut room = Room::new("WXYZ".to_string(), host, Rules::default(), &shuffler).unwrap();
        room.add_player("p1".to_string(), "Bob".to_string(), &shuffler).unwrap();
        room.add_player("p2".to_string(), "Carol".to_string(), &shuffler).unwrap();
        room.start("p0").unwrap();

        for _ in 0..500 {
            if room.winner_id.is_some() {
                break;
            }
            let current = room.current_player().unwrap().clone();
            let top = *room.top_card().unwrap();
            let playable = current
                .hand
                .iter()
                .position(|c| can_play(c, &top, room.current_color));

            let result = match playable {
                Some(index) => {
                    room.play_card(&current.player_id, index, Some(Color::Red), &shuffler)
                }
                None => room.draw_card(&current.player_id, &shuffler),
            };
            if result == Err(GameError::EmptyDeck) {
                break;
            }
            result.unwrap();

            assert_eq!(room.total_cards(), DECK_SIZE);
            assert!(room.current_player_index < room.players.len());
            assert!(!room.discard_pile.is_empty());
            assert!(room.current_color.is_some());
        }
    }
}
