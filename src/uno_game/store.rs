use super::room::{is_room_code, Room};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::RwLock;

/// Whole-document room persistence keyed by room code.
pub trait RoomStore: Send + Sync {
    fn fetch(&self, code: &str) -> io::Result<Option<Room>>;

    /// Writes `room` under `room.code`, replacing any previous document.
    fn replace(&self, room: &Room) -> io::Result<()>;
}

/// On-disk form of a room.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredRoom {
    pub room: Room,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

/// Keeps each room as a JSON file named after its code.
#[derive(Debug, Clone)]
pub struct FileRoomStore {
    pub rooms_dir: PathBuf,
}

impl FileRoomStore {
    pub fn new(rooms_dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&rooms_dir)?;
        Ok(Self { rooms_dir })
    }

    fn room_path(&self, code: &str) -> PathBuf {
        self.rooms_dir.join(format!("{}.json", code))
    }

    /// Scratch file in the same directory, so the final rename stays on one filesystem.
    fn temp_path(&self, code: &str) -> PathBuf {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        self.rooms_dir.join(format!(".{}.{}.tmp", code, suffix))
    }
}

impl RoomStore for FileRoomStore {
    fn fetch(&self, code: &str) -> io::Result<Option<Room>> {
        if !is_room_code(code) {
            return Ok(None);
        }
        let json = match fs::read_to_string(self.room_path(code)) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let stored: StoredRoom = serde_json::from_str(&json)?;
        Ok(Some(stored.room))
    }

    fn replace(&self, room: &Room) -> io::Result<()> {
        if !is_room_code(&room.code) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid room code '{}'", room.code),
            ));
        }
        let stored = StoredRoom {
            room: room.clone(),
            last_updated: chrono::Utc::now(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        // Readers see either the old document or the new one, never a partial write
        let temp_path = self.temp_path(&room.code);
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, self.room_path(&room.code)).inspect_err(|_| {
            let _ = fs::remove_file(&temp_path);
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<String, Room>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> io::Error {
    io::Error::other("room store lock poisoned")
}

impl RoomStore for MemoryRoomStore {
    fn fetch(&self, code: &str) -> io::Result<Option<Room>> {
        let rooms = self.rooms.read().map_err(poisoned)?;
        Ok(rooms.get(code).cloned())
    }

    fn replace(&self, room: &Room) -> io::Result<()> {
        let mut rooms = self.rooms.write().map_err(poisoned)?;
        rooms.insert(room.code.clone(), room.clone());
        Ok(())
    }
}
