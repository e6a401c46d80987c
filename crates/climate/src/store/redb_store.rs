// redb-backed store
//
// Rooms are kept as JSON under their id. Readings are keyed by
// "room_id:timestamp_micros:seq" (zero padded) so that a room's history is
// one contiguous, time-ordered key range. `seq` counts readings that share a
// timestamp.

use std::fmt::Display;
use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use climate_types::{Room, TimedReading};

use super::{ClimateStore, Result, StoreError};

const ROOMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("rooms");
const READINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("readings");

/// Stored reading format (compact for storage)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredReading {
    /// Timestamp in microseconds since epoch
    ts: i64,
    t: f64,
    h: f64,
}

impl StoredReading {
    fn into_reading(self) -> Option<TimedReading> {
        Some(TimedReading::new(self.t, self.h, DateTime::from_timestamp_micros(self.ts)?))
    }
}

fn reading_key(room_id: &str, micros: i64, seq: u32) -> String {
    format!("{}:{:020}:{:010}", room_id, micros.max(0), seq)
}

/// Key range covering `start..=end` (microseconds) of one room
fn key_range(room_id: &str, start: i64, end: i64) -> (String, String) {
    (reading_key(room_id, start, 0), reading_key(room_id, end, u32::MAX))
}

fn db_error(e: impl Display) -> StoreError {
    StoreError::Database(e.to_string())
}

/// Store backed by a single redb database file
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(path)
            .map_err(|e| StoreError::Database(format!("Failed to open database: {}", e)))?;

        // Ensure tables exist
        let write_txn = db.begin_write().map_err(db_error)?;
        write_txn.open_table(ROOMS_TABLE).map_err(db_error)?;
        write_txn.open_table(READINGS_TABLE).map_err(db_error)?;
        write_txn.commit().map_err(db_error)?;

        tracing::info!("Opened climate store at {}", path.display());
        Ok(Self { db })
    }

    fn room_range(room_id: &str) -> (String, String) {
        key_range(room_id, 0, i64::MAX)
    }
}

impl ClimateStore for RedbStore {
    fn put_room(&self, room: &Room) -> Result<()> {
        let bytes = serde_json::to_vec(room)?;

        let write_txn = self.db.begin_write().map_err(db_error)?;
        {
            let mut table = write_txn.open_table(ROOMS_TABLE).map_err(db_error)?;
            table
                .insert(room.id.as_str(), bytes.as_slice())
                .map_err(db_error)?;
        }
        write_txn.commit().map_err(db_error)?;
        Ok(())
    }

    fn get_room(&self, id: &str) -> Result<Option<Room>> {
        let read_txn = self.db.begin_read().map_err(db_error)?;
        let table = read_txn.open_table(ROOMS_TABLE).map_err(db_error)?;

        match table.get(id).map_err(db_error)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn list_rooms(&self) -> Result<Vec<Room>> {
        let read_txn = self.db.begin_read().map_err(db_error)?;
        let table = read_txn.open_table(ROOMS_TABLE).map_err(db_error)?;

        let mut rooms = Vec::new();
        for entry in table.iter().map_err(db_error)? {
            let (_, value) = entry.map_err(db_error)?;
            rooms.push(serde_json::from_slice(value.value())?);
        }
        Ok(rooms)
    }

    fn delete_room(&self, id: &str) -> Result<bool> {
        let (start_key, end_key) = Self::room_range(id);

        let write_txn = self.db.begin_write().map_err(db_error)?;
        let existed = {
            let mut rooms = write_txn.open_table(ROOMS_TABLE).map_err(db_error)?;
            let existed = rooms.remove(id).map_err(db_error)?.is_some();

            let mut readings = write_txn.open_table(READINGS_TABLE).map_err(db_error)?;
            let mut keys = Vec::new();
            for entry in readings
                .range(start_key.as_str()..=end_key.as_str())
                .map_err(db_error)?
            {
                let (key, _) = entry.map_err(db_error)?;
                keys.push(key.value().to_string());
            }
            for key in &keys {
                readings.remove(key.as_str()).map_err(db_error)?;
            }
            if !keys.is_empty() {
                tracing::debug!("Removed {} readings of room {}", keys.len(), id);
            }
            existed
        };
        write_txn.commit().map_err(db_error)?;

        Ok(existed)
    }

    fn append_reading(&self, room_id: &str, reading: &TimedReading) -> Result<()> {
        let stored = StoredReading {
            ts: reading.created_at.timestamp_micros(),
            t: reading.temperature,
            h: reading.humidity,
        };
        let (first, last) = key_range(room_id, stored.ts, stored.ts);
        let bytes = serde_json::to_vec(&stored)?;

        let write_txn = self.db.begin_write().map_err(db_error)?;
        {
            let mut table = write_txn.open_table(READINGS_TABLE).map_err(db_error)?;
            // Readings already stored at this instant
            let seq = table
                .range(first.as_str()..=last.as_str())
                .map_err(db_error)?
                .count();
            let seq = u32::try_from(seq).map_err(db_error)?;
            let key = reading_key(room_id, stored.ts, seq);
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(db_error)?;
        }
        write_txn.commit().map_err(db_error)?;
        Ok(())
    }

    fn readings(
        &self,
        room_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<TimedReading>> {
        let (start_key, end_key) =
            key_range(room_id, start.timestamp_micros(), end.timestamp_micros());
        let limit = limit.unwrap_or(usize::MAX);

        let read_txn = self.db.begin_read().map_err(db_error)?;
        let table = read_txn.open_table(READINGS_TABLE).map_err(db_error)?;

        let mut readings = Vec::new();
        for entry in table
            .range(start_key.as_str()..=end_key.as_str())
            .map_err(db_error)?
        {
            if readings.len() >= limit {
                break;
            }

            let (_, value) = entry.map_err(db_error)?;
            let stored: StoredReading = serde_json::from_slice(value.value())?;
            if let Some(reading) = stored.into_reading() {
                readings.push(reading);
            }
        }

        Ok(readings)
    }

    fn latest_reading(&self, room_id: &str) -> Result<Option<TimedReading>> {
        let (start_key, end_key) = Self::room_range(room_id);

        let read_txn = self.db.begin_read().map_err(db_error)?;
        let table = read_txn.open_table(READINGS_TABLE).map_err(db_error)?;

        let mut range = table
            .range(start_key.as_str()..=end_key.as_str())
            .map_err(db_error)?;
        match range.next_back() {
            Some(entry) => {
                let (_, value) = entry.map_err(db_error)?;
                let stored: StoredReading = serde_json::from_slice(value.value())?;
                Ok(stored.into_reading())
            }
            None => Ok(None),
        }
    }
}
