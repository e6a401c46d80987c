//! Server Application State
//!
//! Shared state accessible by all HTTP and WebSocket handlers.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use uuid::Uuid;
use wildmatch::WildMatch;

use climate_engine::{TtlCache, assess_climate};
use climate_types::TimedReading;

use crate::store::{ClimateStore, StoreError};

use super::protocol::{ChangeType, RoomClimate, ServerMessage};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Rooms and readings
    store: Arc<dyn ClimateStore>,

    /// Latest assessment per room id
    assessments: TtlCache<String, RoomClimate>,

    /// Bumped on every write to a room; guards `assessments` inserts
    generations: DashMap<String, u64>,

    /// Connected clients
    clients: DashMap<Uuid, ClientState>,
}

/// Per-client state
#[derive(Debug, Clone)]
pub struct ClientState {
    /// Client session ID
    pub session_id: Uuid,

    /// Subscribed paths (with potential wildcards)
    pub subscriptions: HashSet<String>,

    /// Channel to send messages to this client
    pub tx: tokio::sync::mpsc::Sender<ServerMessage>,
}

/// Path on which a room's assessment changes are pushed
pub fn climate_path(room_id: &str) -> String {
    format!("/rooms/{}/climate", room_id)
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn ClimateStore>, cache_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store,
                assessments: TtlCache::new(cache_ttl),
                generations: DashMap::new(),
                clients: DashMap::new(),
            }),
        }
    }

    /// Get the store
    pub fn store(&self) -> &Arc<dyn ClimateStore> {
        &self.inner.store
    }

    /// Latest reading of a room scored against its profile
    ///
    /// Served from the assessment cache while fresh. Rooms without a stored
    /// profile get the basic assessment.
    pub fn room_climate(&self, room_id: &str) -> Result<Option<RoomClimate>, StoreError> {
        let key = room_id.to_string();
        if let Some(cached) = self.inner.assessments.get(&key) {
            tracing::trace!("Assessment cache hit for room {}", room_id);
            return Ok(Some(cached));
        }

        let generation = *self.inner.generations.entry(key.clone()).or_default();
        let Some(climate) = self.score_latest(room_id)? else {
            return Ok(None);
        };

        // A write since the store was read owns the cache entry
        let current = self.inner.generations.entry(key.clone()).or_default();
        if *current == generation {
            self.inner.assessments.insert(key, climate.clone());
        } else {
            tracing::trace!("Skipping stale assessment for room {}", room_id);
        }

        Ok(Some(climate))
    }

    /// Score the most recent stored reading of a room
    fn score_latest(&self, room_id: &str) -> Result<Option<RoomClimate>, StoreError> {
        let Some(reading) = self.inner.store.latest_reading(room_id)? else {
            return Ok(None);
        };
        let room = self.inner.store.get_room(room_id)?;

        Ok(Some(RoomClimate {
            room_id: room_id.to_string(),
            reading,
            assessment: assess_climate(&reading.climate(), room.as_ref().map(|r| &r.profile)),
        }))
    }

    /// Forget the cached assessment of a room
    pub fn invalidate_climate(&self, room_id: &str) {
        let mut generation = self.inner.generations.entry(room_id.to_string()).or_default();
        *generation += 1;
        self.inner.assessments.invalidate(&room_id.to_string());
    }

    /// Store a reading and push the new assessment to subscribers
    ///
    /// The pushed assessment is for the room's newest reading, which is not
    /// `reading` when an older sample is backfilled.
    pub async fn record_reading(
        &self,
        room_id: &str,
        reading: TimedReading,
    ) -> Result<RoomClimate, StoreError> {
        self.inner.store.append_reading(room_id, &reading)?;

        let climate = {
            let mut generation = self.inner.generations.entry(room_id.to_string()).or_default();
            *generation += 1;

            let climate = self.score_latest(room_id)?.unwrap_or_else(|| RoomClimate {
                room_id: room_id.to_string(),
                reading,
                assessment: assess_climate(&reading.climate(), None),
            });
            self.inner
                .assessments
                .insert(room_id.to_string(), climate.clone());
            climate
        };

        tracing::debug!(
            "Room {} reading {:.1}°C / {:.1}% -> {:?}",
            room_id,
            reading.temperature,
            reading.humidity,
            climate.assessment.status
        );

        let path = climate_path(room_id);
        let data = serde_json::to_value(&climate).ok();
        self.broadcast(&path, ServerMessage::change(&path, ChangeType::Updated, data))
            .await;

        Ok(climate)
    }

    /// Register a new client connection
    pub async fn register_client(&self, tx: tokio::sync::mpsc::Sender<ServerMessage>) -> Uuid {
        let session_id = Uuid::new_v4();
        let client = ClientState {
            session_id,
            subscriptions: HashSet::new(),
            tx,
        };

        self.inner.clients.insert(session_id, client);
        tracing::info!("Client connected: {}", session_id);

        session_id
    }

    /// Remove a client connection
    pub async fn remove_client(&self, session_id: Uuid) {
        self.inner.clients.remove(&session_id);
        tracing::info!("Client disconnected: {}", session_id);
    }

    /// Add subscriptions for a client
    pub async fn subscribe(&self, session_id: Uuid, paths: Vec<String>) {
        if let Some(mut client) = self.inner.clients.get_mut(&session_id) {
            for path in paths {
                tracing::debug!("Client {} subscribed to: {}", session_id, path);
                client.subscriptions.insert(path);
            }
        }
    }

    /// Remove subscriptions for a client
    pub async fn unsubscribe(&self, session_id: Uuid, paths: Vec<String>) {
        if let Some(mut client) = self.inner.clients.get_mut(&session_id) {
            for path in &paths {
                client.subscriptions.remove(path);
            }
        }
    }

    /// Get subscriptions for a client
    pub async fn get_subscriptions(&self, session_id: Uuid) -> HashSet<String> {
        self.inner
            .clients
            .get(&session_id)
            .map(|c| c.subscriptions.clone())
            .unwrap_or_default()
    }

    /// Broadcast a message to all clients subscribed to a path
    pub async fn broadcast(&self, path: &str, message: ServerMessage) {
        for client in self.inner.clients.iter() {
            if !Self::matches_any_subscription(&client.subscriptions, path) {
                continue;
            }
            if let Err(e) = client.tx.try_send(message.clone()) {
                tracing::warn!(
                    "Failed to send message to client {}: {}",
                    client.session_id,
                    e
                );
            }
        }
    }

    /// Check if a path matches any subscription pattern
    ///
    /// `/rooms/*` matches one more segment, `/rooms/**` any depth below
    /// `/rooms`. Other patterns go through wildmatch.
    fn matches_any_subscription(subscriptions: &HashSet<String>, path: &str) -> bool {
        subscriptions.iter().any(|pattern| {
            if pattern == path {
                return true;
            }

            if let Some(prefix) = pattern.strip_suffix("/**") {
                return path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
            }

            if !pattern.contains("**") {
                // Segment-aware: '*' never crosses a '/'
                let pattern_segments = pattern.split('/').count();
                if pattern_segments != path.split('/').count() {
                    return false;
                }
                return pattern
                    .split('/')
                    .zip(path.split('/'))
                    .all(|(p, s)| WildMatch::new(p).matches(s));
            }

            WildMatch::new(pattern).matches(path)
        })
    }

    /// Get the number of connected clients
    pub async fn client_count(&self) -> usize {
        self.inner.clients.len()
    }

    /// Send a message to a specific client
    pub async fn send_to_client(&self, session_id: Uuid, message: ServerMessage) {
        if let Some(client) = self.inner.clients.get(&session_id) {
            let _ = client.tx.try_send(message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::store::MemoryStore;
    use chrono::{DateTime, Utc};
    use climate_types::{ClimateStatus, Room, RoomPhysicalProfile, RoomType};

    fn create_subscriptions(patterns: &[&str]) -> HashSet<String> {
        patterns.iter().map(|s| s.to_string()).collect()
    }

    fn test_state() -> AppState {
        AppState::new(Arc::new(MemoryStore::new()), Duration::from_secs(120))
    }

    #[test]
    fn test_exact_match() {
        let subs = create_subscriptions(&["/rooms/a-101/climate"]);
        assert!(AppState::matches_any_subscription(&subs, "/rooms/a-101/climate"));
        assert!(!AppState::matches_any_subscription(&subs, "/rooms/a-102/climate"));
    }

    #[test]
    fn test_single_wildcard() {
        let subs = create_subscriptions(&["/rooms/*/climate"]);
        assert!(AppState::matches_any_subscription(&subs, "/rooms/a-101/climate"));
        assert!(!AppState::matches_any_subscription(&subs, "/rooms/a/b/climate"));
        assert!(!AppState::matches_any_subscription(&subs, "/rooms/a-101"));

        let subs = create_subscriptions(&["/rooms/*"]);
        assert!(AppState::matches_any_subscription(&subs, "/rooms/a-101"));
        assert!(!AppState::matches_any_subscription(&subs, "/rooms/a-101/climate"));
    }

    #[test]
    fn test_recursive_wildcard() {
        let subs = create_subscriptions(&["/rooms/**"]);
        assert!(AppState::matches_any_subscription(&subs, "/rooms/a-101"));
        assert!(AppState::matches_any_subscription(&subs, "/rooms/a-101/climate"));
        assert!(!AppState::matches_any_subscription(&subs, "/roomsx/a"));
        assert!(!AppState::matches_any_subscription(&subs, "/alarms/foo"));
    }

    #[tokio::test]
    async fn test_room_climate_uses_profile_and_cache() {
        let state = test_state();
        state
            .store()
            .put_room(&Room {
                id: "a-101".to_string(),
                name: "A 101".to_string(),
                profile: RoomPhysicalProfile::new(20.0, 4.0, RoomType::Office),
            })
            .unwrap();

        assert!(state.room_climate("a-101").unwrap().is_none());

        let climate = state
            .record_reading("a-101", TimedReading::new(21.0, 50.0, Utc::now()))
            .await
            .unwrap();
        assert_eq!(climate.assessment.status, ClimateStatus::Excellent);
        assert!(climate.assessment.details.is_some());

        // Written behind the state's back: the cached assessment is served
        state
            .store()
            .append_reading("a-101", &TimedReading::new(35.0, 90.0, Utc::now()))
            .unwrap();
        let cached = state.room_climate("a-101").unwrap().unwrap();
        assert_eq!(cached.assessment.status, ClimateStatus::Excellent);

        state.invalidate_climate("a-101");
        let fresh = state.room_climate("a-101").unwrap().unwrap();
        assert_eq!(fresh.assessment.status, ClimateStatus::Bad);
    }

    /// Store whose next `latest_reading` parks the caller after the read
    struct PausingStore {
        inner: MemoryStore,
        armed: AtomicBool,
        read_done: Barrier,
        resume: Barrier,
    }

    impl ClimateStore for PausingStore {
        fn put_room(&self, room: &Room) -> crate::store::Result<()> {
            self.inner.put_room(room)
        }

        fn get_room(&self, id: &str) -> crate::store::Result<Option<Room>> {
            self.inner.get_room(id)
        }

        fn list_rooms(&self) -> crate::store::Result<Vec<Room>> {
            self.inner.list_rooms()
        }

        fn delete_room(&self, id: &str) -> crate::store::Result<bool> {
            self.inner.delete_room(id)
        }

        fn append_reading(&self, room_id: &str, reading: &TimedReading) -> crate::store::Result<()> {
            self.inner.append_reading(room_id, reading)
        }

        fn readings(
            &self,
            room_id: &str,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
            limit: Option<usize>,
        ) -> crate::store::Result<Vec<TimedReading>> {
            self.inner.readings(room_id, start, end, limit)
        }

        fn latest_reading(&self, room_id: &str) -> crate::store::Result<Option<TimedReading>> {
            let latest = self.inner.latest_reading(room_id);
            if self.armed.swap(false, Ordering::SeqCst) {
                self.read_done.wait();
                self.resume.wait();
            }
            latest
        }
    }

    #[tokio::test]
    async fn test_slow_reader_cannot_cache_superseded_reading() {
        let store = Arc::new(PausingStore {
            inner: MemoryStore::new(),
            armed: AtomicBool::new(false),
            read_done: Barrier::new(2),
            resume: Barrier::new(2),
        });
        let state = AppState::new(store.clone(), Duration::from_secs(120));
        state
            .store()
            .put_room(&Room {
                id: "a-101".to_string(),
                name: "A 101".to_string(),
                profile: RoomPhysicalProfile::new(20.0, 4.0, RoomType::Office),
            })
            .unwrap();

        let start = Utc::now();
        state
            .record_reading("a-101", TimedReading::new(21.0, 50.0, start))
            .await
            .unwrap();
        state.invalidate_climate("a-101");

        // The reader loads the 21°C reading, then stalls before caching it
        store.armed.store(true, Ordering::SeqCst);
        let reader = {
            let state = state.clone();
            std::thread::spawn(move || state.room_climate("a-101").unwrap().unwrap())
        };
        store.read_done.wait();

        let recorded = state
            .record_reading(
                "a-101",
                TimedReading::new(35.0, 90.0, start + chrono::Duration::seconds(1)),
            )
            .await
            .unwrap();
        assert_eq!(recorded.assessment.status, ClimateStatus::Bad);

        store.resume.wait();
        let stale = reader.join().unwrap();
        assert_eq!(stale.reading.temperature, 21.0);

        let cached = state.room_climate("a-101").unwrap().unwrap();
        assert_eq!(cached.reading.temperature, 35.0);
        assert_eq!(cached.assessment.status, ClimateStatus::Bad);
    }

    #[tokio::test]
    async fn test_backfilled_reading_keeps_newest_assessment() {
        let state = test_state();
        let now = Utc::now();
        state
            .record_reading("b-1", TimedReading::new(22.0, 50.0, now))
            .await
            .unwrap();

        let climate = state
            .record_reading(
                "b-1",
                TimedReading::new(35.0, 90.0, now - chrono::Duration::hours(1)),
            )
            .await
            .unwrap();
        assert_eq!(climate.reading.temperature, 22.0);
        assert_eq!(
            state.room_climate("b-1").unwrap().unwrap().reading.temperature,
            22.0
        );
    }

    #[tokio::test]
    async fn test_unknown_room_gets_basic_assessment() {
        let state = test_state();
        let climate = state
            .record_reading("loose-sensor", TimedReading::new(25.0, 50.0, Utc::now()))
            .await
            .unwrap();
        assert_eq!(climate.assessment.status, ClimateStatus::Good);
        assert!(climate.assessment.details.is_none());
    }

    #[tokio::test]
    async fn test_record_reading_pushes_to_subscribers() {
        let state = test_state();
        let (tx, mut rx) = tokio::sync::mpsc::channel(8);
        let session = state.register_client(tx).await;
        state
            .subscribe(session, vec!["/rooms/*/climate".to_string()])
            .await;

        state
            .record_reading("b-2", TimedReading::new(22.0, 50.0, Utc::now()))
            .await
            .unwrap();

        match rx.try_recv().unwrap() {
            ServerMessage::Change {
                path,
                change_type,
                data,
            } => {
                assert_eq!(path, "/rooms/b-2/climate");
                assert_eq!(change_type, ChangeType::Updated);
                assert_eq!(data.unwrap()["assessment"]["status"], "excellent");
            }
            other => panic!("Expected Change, got {:?}", other),
        }

        state.remove_client(session).await;
        assert_eq!(state.client_count().await, 0);
    }
}
