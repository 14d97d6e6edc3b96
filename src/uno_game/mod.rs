pub mod api;
pub mod card;
pub mod deck;
pub mod player;
pub mod room;
pub mod rules;
pub mod service;
pub mod store;

pub use card::{can_play, Card, CardType, Color};
pub use deck::{build_deck, SeededShuffler, Shuffler, ThreadShuffler};
pub use player::Player;
pub use room::{Direction, ErrorKind, GameError, Room};
pub use rules::{Rules, RulesVersion};
pub use service::RoomService;
pub use store::{FileRoomStore, MemoryRoomStore, RoomStore};
