//! In-memory store, used for tests and `--in-memory` runs.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use climate_types::{Room, TimedReading};

use super::{ClimateStore, Result};

#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: RwLock<BTreeMap<String, Room>>,
    /// Readings per room, kept sorted by `created_at`
    readings: RwLock<HashMap<String, Vec<TimedReading>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClimateStore for MemoryStore {
    fn put_room(&self, room: &Room) -> Result<()> {
        self.rooms.write().insert(room.id.clone(), room.clone());
        Ok(())
    }

    fn get_room(&self, id: &str) -> Result<Option<Room>> {
        Ok(self.rooms.read().get(id).cloned())
    }

    fn list_rooms(&self) -> Result<Vec<Room>> {
        Ok(self.rooms.read().values().cloned().collect())
    }

    fn delete_room(&self, id: &str) -> Result<bool> {
        self.readings.write().remove(id);
        Ok(self.rooms.write().remove(id).is_some())
    }

    fn append_reading(&self, room_id: &str, reading: &TimedReading) -> Result<()> {
        let mut readings = self.readings.write();
        let series = readings.entry(room_id.to_string()).or_default();
        let idx = series.partition_point(|r| r.created_at <= reading.created_at);
        series.insert(idx, *reading);
        Ok(())
    }

    fn readings(
        &self,
        room_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<TimedReading>> {
        let readings = self.readings.read();
        let Some(series) = readings.get(room_id) else {
            return Ok(Vec::new());
        };

        Ok(series
            .iter()
            .filter(|r| r.created_at >= start && r.created_at <= end)
            .take(limit.unwrap_or(usize::MAX))
            .copied()
            .collect())
    }

    fn latest_reading(&self, room_id: &str) -> Result<Option<TimedReading>> {
        Ok(self
            .readings
            .read()
            .get(room_id)
            .and_then(|series| series.last().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::conformance;

    #[test]
    fn test_rooms_crud() {
        conformance::rooms_crud(&MemoryStore::new());
    }

    #[test]
    fn test_readings_by_room_and_range() {
        conformance::readings_by_room_and_range(&MemoryStore::new());
    }

    #[test]
    fn test_same_timestamp_readings_kept() {
        conformance::same_timestamp_readings_kept(&MemoryStore::new());
    }

    #[test]
    fn test_delete_room_drops_readings() {
        conformance::delete_room_drops_readings(&MemoryStore::new());
    }
}
