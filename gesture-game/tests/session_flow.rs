use chrono::{DateTime, TimeDelta, Utc};
use gesture_game::{
    AccuracyRating, Challenge, ControllerPhase, FileStorage, GameConfig, GameEngine,
    GestureStorage, GestureType, ManualClock, MemoryStorage, PLAYER_STATS_KEY, PerformanceRating,
    PlayerStats, PlayerStore, RECENT_SESSIONS_KEY, Session, SpeedRating, challenge_breakdown,
    classify_drag, recommended_level, unlocked_achievements,
};
use std::path::PathBuf;

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn scratch_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "gesture-flow-{label}-{}-{}",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ))
}

fn play_session<S: GestureStorage>(engine: &mut GameEngine<S, &ManualClock>, level: u32) {
    engine.start_game(level);
    while engine.controller().phase() != ControllerPhase::Finished {
        let expected = engine
            .controller()
            .current_challenge()
            .map(|challenge| challenge.gesture);
        engine.clock().advance_secs(0.1);
        engine.tick(0.1).unwrap();
        if let (Some(gesture), ControllerPhase::Playing) = (expected, engine.controller().phase())
        {
            engine.handle_gesture(gesture).unwrap();
        }
    }
}

#[test]
fn perfect_level_one_session_scores_1710() {
    let challenges = (0..6)
        .map(|_| Challenge::new(GestureType::Tap, 1, 9.5, 1))
        .collect();
    let mut session = Session::with_challenges(1, 1, challenges, epoch());
    for _ in 0..6 {
        let outcome = session
            .complete_current_challenge_at(1.0, 1.0, epoch())
            .unwrap();
        assert_eq!(outcome.points, 285);
    }
    assert_eq!(session.score(), 1710);
    assert!(session.is_completed());

    let ratings: Vec<_> = challenge_breakdown(&session)
        .into_iter()
        .map(|row| row.rating)
        .collect();
    assert!(ratings.iter().all(|r| *r == PerformanceRating::Perfect));
}

#[test]
fn fresh_player_is_recommended_level_one() {
    let stats = PlayerStats::default();
    assert_eq!(recommended_level(&stats, &[], &GameConfig::default()), 1);
}

#[test]
fn accuracy_ratings_match_examples() {
    let cases = [
        (0.95, AccuracyRating::Excellent),
        (0.75, AccuracyRating::Good),
        (0.55, AccuracyRating::Average),
        (0.3, AccuracyRating::NeedsImprovement),
    ];
    for (accuracy, rating) in cases {
        assert_eq!(AccuracyRating::from_accuracy(accuracy), rating);
    }
    assert_eq!(SpeedRating::from_mean_time(2.0), SpeedRating::Fast);
}

#[test]
fn progress_survives_restart_on_disk() {
    let dir = scratch_dir("restart");
    let clock = ManualClock::new(epoch());
    {
        let storage = FileStorage::open(&dir).unwrap();
        let mut engine = GameEngine::with_clock(storage, GameConfig::default(), 1, &clock);
        for level in 1..=3 {
            play_session(&mut engine, level);
        }
        assert_eq!(engine.store().stats().total_sessions, 3);
    }

    let storage = FileStorage::open(&dir).unwrap();
    assert!(dir.join("PlayerStats.json").exists());
    assert!(dir.join("RecentSessions.json").exists());
    let store = PlayerStore::load(storage, GameConfig::default());
    assert_eq!(store.stats().total_sessions, 3);
    assert_eq!(store.stats().levels_completed, 3);
    assert_eq!(store.recent_sessions()[0].level, 3);
    assert!(store.is_level_unlocked(4));
    assert!(!store.is_level_unlocked(5));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn many_sessions_unlock_achievements() {
    let clock = ManualClock::new(epoch());
    let mut engine = GameEngine::with_clock(MemoryStorage::new(), GameConfig::default(), 5, &clock);
    for level in 1..=10 {
        play_session(&mut engine, level);
        clock.advance_secs(60.0);
    }
    let stats = engine.store().stats();
    assert_eq!(stats.total_sessions, 10);
    assert!(stats.best_score >= 1000);

    let ids: Vec<_> = unlocked_achievements(stats)
        .into_iter()
        .map(|achievement| achievement.id)
        .collect();
    assert!(ids.contains(&"score_master"));
    assert!(ids.contains(&"dedicated_player"));
    assert!(ids.contains(&"precision_master"));
    assert!(ids.contains(&"level_explorer"));
    assert!(!ids.contains(&"gesture_enthusiast"));
}

#[test]
fn corrupted_blobs_load_as_first_launch() {
    let storage = MemoryStorage::new();
    storage.insert(PLAYER_STATS_KEY, "\u{0}garbage");
    storage.insert(RECENT_SESSIONS_KEY, "{\"not\": \"a list\"}");
    let store = PlayerStore::load(storage, GameConfig::default());
    assert_eq!(store.stats(), &PlayerStats::default());
    assert!(store.recent_sessions().is_empty());
}

#[test]
fn export_is_read_only_snapshot() {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(epoch() + TimeDelta::days(3));
    let mut engine = GameEngine::with_clock(storage.clone(), GameConfig::default(), 9, &clock);
    play_session(&mut engine, 2);
    let before = storage.get(RECENT_SESSIONS_KEY);

    let exported = engine.export_data().unwrap();
    let doc: serde_json::Value = serde_json::from_str(&exported).unwrap();
    assert_eq!(doc["playerStats"]["total_sessions"], 1);
    assert_eq!(doc["recentSessions"][0]["level"], 2);
    assert!(doc["exportDate"].as_str().unwrap().starts_with("1970-01-04T"));
    assert_eq!(storage.get(RECENT_SESSIONS_KEY), before);
}

#[test]
fn drag_classification_contract() {
    assert_eq!(classify_drag(30.0, 30.0, 50.0), GestureType::Drag);
    assert_eq!(classify_drag(120.0, 10.0, 50.0), GestureType::SwipeRight);
    assert_eq!(classify_drag(-5.0, 90.0, 50.0), GestureType::SwipeDown);
    assert_eq!(classify_drag(10.0, -200.0, 50.0), GestureType::SwipeUp);
    assert_eq!(classify_drag(-80.0, 5.0, 50.0), GestureType::SwipeLeft);
}
