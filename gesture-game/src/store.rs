//! Player statistics and recent-session history with explicit persistence.
use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::GestureStorage;
use crate::achievements::{Achievement, unlocked_achievements};
use crate::analysis::{self, PerformanceAnalysis};
use crate::config::GameConfig;
use crate::constants::{PLAYER_STATS_KEY, RECENT_SESSIONS_KEY};
use crate::session::Session;
use crate::stats::PlayerStats;

/// Failures while writing the two persisted blobs.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize {key}: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage backend failed for {key}: {source}")]
    Storage {
        key: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Read-only export bundle of both blobs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    player_stats: &'a PlayerStats,
    recent_sessions: &'a [Session],
    export_date: String,
}

/// Owns `PlayerStats` and the recent-session list, persisting both after every mutation.
#[derive(Debug)]
pub struct PlayerStore<S: GestureStorage> {
    storage: S,
    config: GameConfig,
    stats: PlayerStats,
    recent: Vec<Session>,
}

impl<S: GestureStorage> PlayerStore<S> {
    /// Load both blobs, falling back to empty defaults for anything missing or unreadable.
    pub fn load(storage: S, config: GameConfig) -> Self {
        let stats: PlayerStats = load_or_default(&storage, PLAYER_STATS_KEY);
        let mut recent: Vec<Session> = load_or_default(&storage, RECENT_SESSIONS_KEY);
        recent.truncate(config.recent_session_cap);
        info!(
            "Loaded player stats ({} sessions) and {} recent sessions",
            stats.total_sessions,
            recent.len()
        );
        Self {
            storage,
            config,
            stats,
            recent,
        }
    }

    #[must_use]
    pub const fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Most recent first.
    #[must_use]
    pub fn recent_sessions(&self) -> &[Session] {
        &self.recent
    }

    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Fold a terminal session into the stats, prepend it to history and persist.
    ///
    /// The in-memory update is kept even when persisting fails; the error
    /// tells the caller the update is not durable yet.
    ///
    /// # Errors
    ///
    /// Returns an error if either blob cannot be serialized or written.
    pub fn record_session(&mut self, session: Session, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.stats.update_with(&session, now);
        info!(
            "Recorded session {} (level {}, score {}, completed {})",
            session.id,
            session.level,
            session.score(),
            session.is_completed()
        );
        self.recent.insert(0, session);
        self.recent.truncate(self.config.recent_session_cap);
        self.persist()
    }

    /// Write both blobs in full. Both are serialized before either is written.
    ///
    /// # Errors
    ///
    /// Returns the first serialization or storage failure.
    pub fn persist(&self) -> Result<(), StoreError> {
        let stats_json = to_json(PLAYER_STATS_KEY, &self.stats)?;
        let recent_json = to_json(RECENT_SESSIONS_KEY, &self.recent)?;
        self.write(PLAYER_STATS_KEY, &stats_json)?;
        self.write(RECENT_SESSIONS_KEY, &recent_json)
    }

    /// Replace both blobs with empty defaults and persist immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults cannot be written.
    pub fn reset_all_data(&mut self) -> Result<(), StoreError> {
        self.stats = PlayerStats::default();
        self.recent.clear();
        info!("Player data reset");
        self.persist()
    }

    /// Pretty JSON bundle of both blobs plus an RFC 3339 export timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be serialized.
    pub fn export_data(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let document = ExportDocument {
            player_stats: &self.stats,
            recent_sessions: &self.recent,
            export_date: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        serde_json::to_string_pretty(&document).map_err(|source| StoreError::Serialize {
            key: "export",
            source,
        })
    }

    #[must_use]
    pub fn recommended_level(&self) -> u32 {
        analysis::recommended_level(&self.stats, &self.recent, &self.config)
    }

    #[must_use]
    pub fn achievements(&self) -> Vec<&'static Achievement> {
        unlocked_achievements(&self.stats)
    }

    /// Analyse `session` against the history as it stood before it was recorded.
    #[must_use]
    pub fn performance_analysis(&self, session: &Session, now: DateTime<Utc>) -> PerformanceAnalysis {
        analysis::performance_analysis(session, &self.stats, &self.recent, &self.config, now)
    }

    #[must_use]
    pub fn is_level_unlocked(&self, level: u32) -> bool {
        analysis::is_level_unlocked(&self.stats, level)
    }

    fn write(&self, key: &'static str, json: &str) -> Result<(), StoreError> {
        self.storage.save_blob(key, json).map_err(|err| {
            warn!("Failed to persist {key}: {err}");
            StoreError::Storage {
                key,
                source: Box::new(err),
            }
        })
    }
}

fn to_json<T: Serialize + ?Sized>(key: &'static str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Serialize { key, source })
}

fn load_or_default<S, T>(storage: &S, key: &str) -> T
where
    S: GestureStorage,
    T: DeserializeOwned + Default,
{
    match storage.load_blob(key) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|err| {
            warn!("Discarding unreadable {key} blob: {err}");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(err) => {
            warn!("Failed to read {key} blob: {err}");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::Challenge;
    use crate::gesture::GestureType;
    use crate::storage::MemoryStorage;
    use std::io;

    fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }

    fn finished_session(id: u64, level: u32) -> Session {
        let challenges = vec![Challenge::new(GestureType::Tap, 1, 9.5, level)];
        let mut session = Session::with_challenges(id, level, challenges, epoch());
        session.record_gesture(true);
        session.complete_current_challenge_at(1.0, 1.0, epoch());
        session
    }

    #[derive(Debug, Clone, Copy)]
    struct BrokenStorage;

    impl GestureStorage for BrokenStorage {
        type Error = io::Error;

        fn load_blob(&self, _key: &str) -> Result<Option<String>, Self::Error> {
            Err(io::Error::other("disk unplugged"))
        }

        fn save_blob(&self, _key: &str, _json: &str) -> Result<(), Self::Error> {
            Err(io::Error::other("disk unplugged"))
        }
    }

    #[test]
    fn record_persists_both_blobs() {
        let storage = MemoryStorage::new();
        let mut store = PlayerStore::load(storage.clone(), GameConfig::default());
        store.record_session(finished_session(1, 1), epoch()).unwrap();

        let reloaded = PlayerStore::load(storage, GameConfig::default());
        assert_eq!(reloaded.stats(), store.stats());
        assert_eq!(reloaded.recent_sessions().len(), 1);
        assert_eq!(reloaded.recent_sessions()[0].id, 1);
    }

    #[test]
    fn history_is_capped_newest_first() {
        let mut store = PlayerStore::load(MemoryStorage::new(), GameConfig::default());
        for id in 0..60 {
            store.record_session(finished_session(id, 1), epoch()).unwrap();
            assert!(store.recent_sessions().len() <= 50);
            assert_eq!(store.recent_sessions()[0].id, id);
        }
        assert_eq!(store.recent_sessions().len(), 50);
        assert_eq!(store.recent_sessions()[49].id, 10);
        assert_eq!(store.stats().total_sessions, 60);
    }

    #[test]
    fn corrupt_blobs_load_as_defaults() {
        let storage = MemoryStorage::new();
        storage.insert(PLAYER_STATS_KEY, "{ definitely not json");
        storage.insert(RECENT_SESSIONS_KEY, "42");
        let store = PlayerStore::load(storage, GameConfig::default());
        assert_eq!(store.stats(), &PlayerStats::default());
        assert!(store.recent_sessions().is_empty());
    }

    #[test]
    fn unreadable_backend_loads_defaults_and_reports_write_failure() {
        let mut store = PlayerStore::load(BrokenStorage, GameConfig::default());
        assert_eq!(store.stats().total_sessions, 0);

        let err = store
            .record_session(finished_session(9, 2), epoch())
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Storage {
                key: PLAYER_STATS_KEY,
                ..
            }
        ));
        // The fold itself still happened in memory.
        assert_eq!(store.stats().total_sessions, 1);
    }

    #[test]
    fn reset_clears_and_persists() {
        let storage = MemoryStorage::new();
        let mut store = PlayerStore::load(storage.clone(), GameConfig::default());
        store.record_session(finished_session(1, 3), epoch()).unwrap();
        store.reset_all_data().unwrap();

        assert_eq!(store.stats(), &PlayerStats::default());
        assert!(store.recent_sessions().is_empty());
        assert_eq!(storage.get(RECENT_SESSIONS_KEY).as_deref(), Some("[]"));
        let reloaded = PlayerStore::load(storage, GameConfig::default());
        assert_eq!(reloaded.stats().total_sessions, 0);
    }

    #[test]
    fn export_bundles_both_blobs_without_mutating() {
        let storage = MemoryStorage::new();
        let mut store = PlayerStore::load(storage.clone(), GameConfig::default());
        store.record_session(finished_session(5, 1), epoch()).unwrap();
        let before = storage.get(PLAYER_STATS_KEY);

        let exported = store.export_data(epoch()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(value["playerStats"]["total_sessions"], 1);
        assert_eq!(value["recentSessions"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["exportDate"], "1970-01-01T00:00:00Z");
        assert_eq!(storage.get(PLAYER_STATS_KEY), before);
    }
}
