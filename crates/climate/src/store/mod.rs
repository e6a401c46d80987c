//! Climate Store
//!
//! Persistence for rooms and their raw sensor readings.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use chrono::{DateTime, Utc};

use climate_types::{Room, TimedReading};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Storage backend for rooms and readings
pub trait ClimateStore: Send + Sync {
    /// Insert or replace a room
    fn put_room(&self, room: &Room) -> Result<()>;

    fn get_room(&self, id: &str) -> Result<Option<Room>>;

    /// All rooms, ordered by id
    fn list_rooms(&self) -> Result<Vec<Room>>;

    /// Delete a room and its readings; returns whether the room existed
    fn delete_room(&self, id: &str) -> Result<bool>;

    fn append_reading(&self, room_id: &str, reading: &TimedReading) -> Result<()>;

    /// Readings with `start <= created_at <= end`, oldest first, at most
    /// `limit` of them when given
    fn readings(
        &self,
        room_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<TimedReading>>;

    /// Most recent reading of a room
    fn latest_reading(&self, room_id: &str) -> Result<Option<TimedReading>>;
}

/// Conformance checks shared by the store implementations
#[cfg(test)]
pub(crate) mod conformance {
    use super::*;
    use chrono::{Duration, TimeZone};
    use climate_types::{RoomPhysicalProfile, RoomType};

    fn room(id: &str) -> Room {
        Room {
            id: id.to_string(),
            name: format!("Room {}", id),
            profile: RoomPhysicalProfile::new(20.0, 4.0, RoomType::Office),
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap()
    }

    pub fn rooms_crud(store: &dyn ClimateStore) {
        store.put_room(&room("b-102")).unwrap();
        store.put_room(&room("a-101")).unwrap();

        let rooms = store.list_rooms().unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].id, "a-101");

        let mut renamed = room("a-101");
        renamed.name = "Library".to_string();
        store.put_room(&renamed).unwrap();
        assert_eq!(store.get_room("a-101").unwrap().unwrap().name, "Library");

        assert!(store.delete_room("a-101").unwrap());
        assert!(!store.delete_room("a-101").unwrap());
        assert!(store.get_room("a-101").unwrap().is_none());
    }

    pub fn readings_by_room_and_range(store: &dyn ClimateStore) {
        for h in [3, 1, 2, 0] {
            let reading = TimedReading::new(20.0 + h as f64, 50.0, t0() + Duration::hours(h));
            store.append_reading("a-101", &reading).unwrap();
        }
        store
            .append_reading("a-1010", &TimedReading::new(30.0, 60.0, t0()))
            .unwrap();

        let all = store
            .readings("a-101", t0() - Duration::days(1), t0() + Duration::days(1), None)
            .unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].created_at < w[1].created_at));

        let middle = store
            .readings("a-101", t0() + Duration::hours(1), t0() + Duration::hours(2), None)
            .unwrap();
        assert_eq!(middle.len(), 2);

        let limited = store
            .readings("a-101", t0(), t0() + Duration::hours(3), Some(1))
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].created_at, t0());

        let latest = store.latest_reading("a-101").unwrap().unwrap();
        assert_eq!(latest.created_at, t0() + Duration::hours(3));
        assert!(store.latest_reading("missing").unwrap().is_none());
    }

    pub fn same_timestamp_readings_kept(store: &dyn ClimateStore) {
        store
            .append_reading("d-104", &TimedReading::new(21.0, 40.0, t0()))
            .unwrap();
        store
            .append_reading("d-104", &TimedReading::new(23.0, 50.0, t0()))
            .unwrap();
        store
            .append_reading("d-104", &TimedReading::new(25.0, 60.0, t0() + Duration::minutes(1)))
            .unwrap();

        let readings = store.readings("d-104", t0(), t0(), None).unwrap();
        assert_eq!(readings.len(), 2);
        let mut temperatures: Vec<f64> = readings.iter().map(|r| r.temperature).collect();
        temperatures.sort_by(f64::total_cmp);
        assert_eq!(temperatures, vec![21.0, 23.0]);

        let all = store
            .readings("d-104", t0(), t0() + Duration::hours(1), None)
            .unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(store.latest_reading("d-104").unwrap().unwrap().temperature, 25.0);
    }

    pub fn delete_room_drops_readings(store: &dyn ClimateStore) {
        store.put_room(&room("c-103")).unwrap();
        store
            .append_reading("c-103", &TimedReading::new(21.0, 45.0, t0()))
            .unwrap();

        assert!(store.delete_room("c-103").unwrap());
        assert!(store.latest_reading("c-103").unwrap().is_none());
    }
}
