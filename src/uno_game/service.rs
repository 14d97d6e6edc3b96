use super::card::Color;
use super::deck::Shuffler;
use super::player::Player;
use super::room::{is_room_code, GameError, Room, ROOM_CODE_LEN};
use super::rules::Rules;
use super::store::RoomStore;
use log::{debug, info};
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;
use tokio::task::{self, JoinError};

type LockMap = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Generates a 4-letter room code.
pub fn new_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| rng.random_range(b'A'..=b'Z') as char)
        .collect()
}

pub fn new_player_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("p_{}", &id[..8])
}

fn task_failed(err: JoinError) -> GameError {
    GameError::Storage(err.to_string())
}

/// Exclusive hold on one room. Dropping it releases the room and forgets
/// the lock once nobody else is holding or waiting on it.
struct RoomLock {
    guard: Option<OwnedMutexGuard<()>>,
    code: String,
    locks: Arc<LockMap>,
}

impl Drop for RoomLock {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.code)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.code);
        }
    }
}

/// Runs room operations against the store.
///
/// Every mutation holds that room's lock from fetch to write-back, so two
/// requests for the same room never overwrite each other. Store calls run on
/// the blocking pool.
#[derive(Clone)]
pub struct RoomService {
    store: Arc<dyn RoomStore>,
    shuffler: Arc<dyn Shuffler>,
    locks: Arc<LockMap>,
}

impl RoomService {
    pub fn new(store: Arc<dyn RoomStore>, shuffler: Arc<dyn Shuffler>) -> Self {
        Self {
            store,
            shuffler,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn lock_room(&self, code: &str) -> RoomLock {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(code.to_string()).or_default().clone()
        };
        RoomLock {
            guard: Some(lock.lock_owned().await),
            code: code.to_string(),
            locks: self.locks.clone(),
        }
    }

    async fn fetch(&self, code: &str) -> Result<Option<Room>, GameError> {
        let store = self.store.clone();
        let code = code.to_string();
        let room = task::spawn_blocking(move || store.fetch(&code))
            .await
            .map_err(task_failed)??;
        Ok(room)
    }

    async fn persist(&self, room: Room) -> Result<Room, GameError> {
        let store = self.store.clone();
        let room = task::spawn_blocking(move || store.replace(&room).map(|()| room))
            .await
            .map_err(task_failed)??;
        Ok(room)
    }

    /// Fetches the room, applies `apply` and writes the result back.
    /// Nothing is written when `apply` fails.
    async fn update<F>(&self, code: &str, apply: F) -> Result<Room, GameError>
    where
        F: FnOnce(&mut Room, &dyn Shuffler) -> Result<(), GameError>,
    {
        if !is_room_code(code) {
            return Err(GameError::RoomNotFound(code.to_string()));
        }
        let _lock = self.lock_room(code).await;
        let mut room = self.get_room(code).await?;
        apply(&mut room, self.shuffler.as_ref())?;
        self.persist(room).await
    }

    /// Opens a new room with `name` as host. Returns the host's player ID.
    pub async fn create_room(
        &self,
        name: String,
        rules: Option<Rules>,
    ) -> Result<(String, Room), GameError> {
        let player_id = new_player_id();
        let rules = rules.unwrap_or_default();

        loop {
            let code = new_room_code();
            let _lock = self.lock_room(&code).await;
            if self.fetch(&code).await?.is_some() {
                debug!("Room code {} already in use, picking another", code);
                continue;
            }

            let host = Player::new(player_id.clone(), name.clone(), true);
            let room = Room::new(code, host, rules, self.shuffler.as_ref())?;
            let room = self.persist(room).await?;
            info!("Created room {} hosted by {} ({})", room.code, name, player_id);
            return Ok((player_id, room));
        }
    }

    pub async fn get_room(&self, code: &str) -> Result<Room, GameError> {
        if !is_room_code(code) {
            return Err(GameError::RoomNotFound(code.to_string()));
        }
        self.fetch(code)
            .await?
            .ok_or_else(|| GameError::RoomNotFound(code.to_string()))
    }

    /// Seats `name` in the room. Returns the new player's ID.
    pub async fn join_room(&self, code: &str, name: String) -> Result<(String, Room), GameError> {
        let player_id = new_player_id();
        let room = self
            .update(code, |room, shuffler| {
                room.add_player(player_id.clone(), name, shuffler)
            })
            .await?;
        Ok((player_id, room))
    }

    pub async fn start_room(&self, code: &str, player_id: &str) -> Result<Room, GameError> {
        self.update(code, |room, _| room.start(player_id)).await
    }

    pub async fn set_rules(
        &self,
        code: &str,
        player_id: &str,
        rules: Rules,
    ) -> Result<Room, GameError> {
        self.update(code, |room, _| room.set_rules(player_id, rules))
            .await
    }

    /// Plays a card, or draws one without passing when `card_index` is `None`.
    pub async fn play_card(
        &self,
        code: &str,
        player_id: &str,
        card_index: Option<usize>,
        chosen_color: Option<Color>,
    ) -> Result<Room, GameError> {
        self.update(code, |room, shuffler| match card_index {
            Some(index) => room.play_card(player_id, index, chosen_color, shuffler),
            None => room.draw_and_keep_turn(player_id, shuffler),
        })
        .await
    }

    pub async fn draw_card(&self, code: &str, player_id: &str) -> Result<Room, GameError> {
        self.update(code, |room, shuffler| room.draw_card(player_id, shuffler))
            .await
    }
}
