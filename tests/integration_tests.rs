//! Integration tests for the skill ladder
//!
//! These tests drive `LadderService` end to end against real local files
//! and a revisioned remote double:
//! - Rating updates and History Log growth
//! - Reloading a ladder from disk
//! - Remote-first reads and writes with local fallback
//! - Validation failures leaving state untouched

// Modules for organizing tests
mod fixtures;

use fixtures::{assert_close, open_ladder, SwitchableRemote, TempDataDir};
use proptest::prelude::*;
use skill_ladder::storage::StorageKey;
use skill_ladder::{LadderError, Rating};
use std::sync::Arc;

#[tokio::test]
async fn test_four_player_match_scenario() {
    let dir = TempDataDir::new();
    let mut ladder = open_ladder(None, dir.path(), &["P1", "P2", "P3", "P4"]).await;
    let prior = ladder.calculator().initial_rating();
    assert_close(prior.mu, 25.0);
    assert_close(prior.sigma, 25.0 / 3.0);

    let report = ladder
        .record_match(["P1", "P2", "P3", "P4"])
        .await
        .unwrap();

    for name in ["P1", "P2", "P3", "P4"] {
        assert!(report.ratings[name].sigma < prior.sigma, "{} sigma", name);
    }
    assert!(report.ratings["P1"].mu > 25.0);
    assert!(report.ratings["P4"].mu < 25.0);

    // Exactly one new entry, matching the returned mapping
    assert_eq!(ladder.history().len(), 1);
    assert_eq!(ladder.history()[0].ratings, report.ratings);

    // Both documents landed in the data directory
    let ratings = dir.read_json("ratings.json");
    assert_eq!(ratings.as_object().unwrap().len(), 4);
    let history = dir.read_json("history.json");
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert!(history[0]["timestamp"].is_string());
}

#[tokio::test]
async fn test_duplicate_add_player_leaves_state_unchanged() {
    let dir = TempDataDir::new();
    let mut ladder = open_ladder(None, dir.path(), &["Bav", "Sam"]).await;
    ladder.add_player("Riz").await.unwrap();

    let ratings = ladder.get_all_ratings();
    let history_len = ladder.history().len();

    let err = ladder.add_player("Riz").await.unwrap_err();
    assert!(matches!(err, LadderError::DuplicatePlayer { .. }));
    assert!(err.is_validation());

    // Names are case-sensitive
    ladder.add_player("riz").await.unwrap();
    assert_eq!(ladder.get_all_ratings().len(), ratings.len() + 1);
    assert_eq!(ladder.history().len(), history_len + 1);
}

#[tokio::test]
async fn test_repeated_participant_rejected_before_any_change() {
    let dir = TempDataDir::new();
    let mut ladder = open_ladder(None, dir.path(), &["A", "B", "C"]).await;
    let before = ladder.get_all_ratings();

    let err = ladder.record_match(["A", "B", "A"]).await.unwrap_err();
    assert!(matches!(err, LadderError::DuplicateParticipant { ref name } if name == "A"));

    assert_eq!(ladder.get_all_ratings(), before);
    assert!(ladder.history().is_empty());
    // Nothing was written either
    assert!(!dir.path().join("ratings.json").exists());
}

#[tokio::test]
async fn test_get_all_ratings_is_idempotent() {
    let dir = TempDataDir::new();
    let mut ladder = open_ladder(None, dir.path(), &["A", "B"]).await;
    ladder.record_match(["B", "A"]).await.unwrap();

    let first = ladder.get_all_ratings();
    let second = ladder.get_all_ratings();
    assert_eq!(first, second);
    assert_eq!(ladder.history().len(), 1);
}

#[tokio::test]
async fn test_reload_from_data_dir() {
    let dir = TempDataDir::new();
    let expected = {
        let mut ladder = open_ladder(None, dir.path(), &["A", "B", "C"]).await;
        ladder.record_match(["C", "B", "A"]).await.unwrap();
        ladder.add_player("D").await.unwrap();
        ladder.record_match(["D", "C"]).await.unwrap().ratings
    };

    // Bootstrap list is ignored once a snapshot exists
    let ladder = open_ladder(None, dir.path(), &["X", "Y"]).await;
    let loaded = ladder.get_all_ratings();
    assert_eq!(loaded.len(), 4);
    for (name, rating) in &expected {
        assert_close(loaded[name].mu, rating.mu);
        assert_close(loaded[name].sigma, rating.sigma);
    }

    assert_eq!(ladder.history().len(), 3);
    let d: Vec<_> = ladder.get_history("D").unwrap().collect();
    assert_eq!(d.len(), 2);
}

#[tokio::test]
async fn test_missing_snapshot_restored_from_history() {
    let dir = TempDataDir::new();
    {
        let mut ladder = open_ladder(None, dir.path(), &["A", "B"]).await;
        ladder.record_match(["A", "B"]).await.unwrap();
    }
    std::fs::remove_file(dir.path().join("ratings.json")).unwrap();

    let ladder = open_ladder(None, dir.path(), &["Other"]).await;
    let ratings = ladder.get_all_ratings();
    assert!(ratings.contains_key("A"));
    assert!(!ratings.contains_key("Other"));
    assert!(ratings["A"].mu > ratings["B"].mu);
}

#[tokio::test]
async fn test_remote_create_then_update() {
    let dir = TempDataDir::new();
    let remote = Arc::new(SwitchableRemote::new());
    let mut ladder = open_ladder(Some(remote.clone()), dir.path(), &["A", "B"]).await;

    ladder.add_player("C").await.unwrap();
    ladder.record_match(["C", "A", "B"]).await.unwrap();

    let writes = remote.documents().writes();
    assert_eq!(
        writes,
        vec![
            StorageKey::Ratings,
            StorageKey::History,
            StorageKey::Ratings,
            StorageKey::History
        ]
    );

    // A successful remote write does not touch the local copy
    assert!(!dir.path().join("ratings.json").exists());
    assert!(!dir.path().join("history.json").exists());

    let reopened = open_ladder(Some(remote), dir.path(), &[]).await;
    assert_eq!(reopened.history().len(), 2);
    assert_eq!(reopened.get_all_ratings().len(), 3);
}

#[tokio::test]
async fn test_remote_preferred_over_local_on_read() {
    let dir = TempDataDir::new();
    {
        let mut ladder = open_ladder(None, dir.path(), &["Local"]).await;
        ladder.add_player("OnlyLocal").await.unwrap();
    }

    let remote = Arc::new(SwitchableRemote::new());
    remote
        .documents()
        .insert(
            StorageKey::Ratings,
            r#"{"OnlyRemote": {"mu": 28.0, "sigma": 4.0}}"#,
        )
        .unwrap();

    let ladder = open_ladder(Some(remote.clone()), dir.path(), &[]).await;
    let ratings = ladder.get_all_ratings();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings["OnlyRemote"], Rating { mu: 28.0, sigma: 4.0 });

    // No remote history, so the local log is used
    assert_eq!(ladder.history().len(), 1);
}

#[tokio::test]
async fn test_remote_outage_falls_back_to_local() {
    let dir = TempDataDir::new();
    let remote = Arc::new(SwitchableRemote::new());
    let mut ladder = open_ladder(Some(remote.clone()), dir.path(), &["A", "B"]).await;

    ladder.record_match(["A", "B"]).await.unwrap();
    remote.set_online(false);
    let report = ladder.record_match(["B", "A"]).await.unwrap();

    // The second update was not lost
    let local = dir.read_json("ratings.json");
    assert_close(local["B"]["mu"].as_f64().unwrap(), report.ratings["B"].mu);
    assert_eq!(dir.read_json("history.json").as_array().unwrap().len(), 2);

    // With the remote still down, a new session picks up the local copy
    let reopened = open_ladder(Some(remote.clone()), dir.path(), &[]).await;
    assert_eq!(reopened.history().len(), 2);
    assert!(remote
        .attempts()
        .iter()
        .any(|(operation, _)| *operation == "read"));
}

#[tokio::test]
async fn test_stale_remote_revision_falls_back_to_local() {
    let dir = TempDataDir::new();
    let remote = Arc::new(SwitchableRemote::new());
    let mut ladder = open_ladder(Some(remote.clone()), dir.path(), &["A", "B"]).await;
    ladder.record_match(["A", "B"]).await.unwrap();

    // Another session rewrites the remote ratings behind our back
    remote
        .documents()
        .insert(StorageKey::Ratings, r#"{"A": {"mu": 1.0, "sigma": 1.0}}"#)
        .unwrap();

    ladder.record_match(["B", "A"]).await.unwrap();
    assert!(dir.path().join("ratings.json").exists());
    // The remote copy written by the other session is left alone
    assert_eq!(
        remote.documents().get(StorageKey::Ratings),
        Some(br#"{"A": {"mu": 1.0, "sigma": 1.0}}"#.to_vec())
    );
}

#[tokio::test]
async fn test_remote_updated_after_offline_startup() {
    let dir = TempDataDir::new();
    let remote = Arc::new(SwitchableRemote::new());
    {
        let mut ladder = open_ladder(Some(remote.clone()), dir.path(), &["A", "B"]).await;
        ladder.record_match(["A", "B"]).await.unwrap();
    }

    // Mirror the remote documents locally, as an earlier outage would have
    std::fs::create_dir_all(dir.path()).unwrap();
    for (key, file) in [
        (StorageKey::Ratings, "ratings.json"),
        (StorageKey::History, "history.json"),
    ] {
        std::fs::write(dir.path().join(file), remote.documents().get(key).unwrap()).unwrap();
    }

    remote.set_online(false);
    let mut ladder = open_ladder(Some(remote.clone()), dir.path(), &[]).await;
    assert_eq!(ladder.history().len(), 1);
    remote.set_online(true);

    let report = ladder.record_match(["B", "A"]).await.unwrap();
    assert_eq!(remote.documents().writes().len(), 4);
    assert_eq!(dir.read_json("history.json").as_array().unwrap().len(), 1);

    let reopened = open_ladder(Some(remote), dir.path(), &[]).await;
    assert_eq!(reopened.history().len(), 2);
    assert_close(
        reopened.get_all_ratings()["B"].mu,
        report.ratings["B"].mu,
    );
}

#[tokio::test]
async fn test_storage_failure_surfaces_and_memory_stays_updated() {
    let dir = TempDataDir::new();
    // A plain file where the data directory should be makes local writes fail
    std::fs::write(dir.path(), b"not a directory").unwrap();

    let remote = Arc::new(SwitchableRemote::new());
    remote.set_online(false);
    let mut ladder = open_ladder(Some(remote), dir.path(), &["A", "B"]).await;

    let err = ladder.record_match(["A", "B"]).await.unwrap_err();
    assert!(matches!(err, LadderError::Storage { .. }));
    assert!(ladder.get_all_ratings()["A"].mu > 25.0);
    assert_eq!(ladder.history().len(), 1);

    std::fs::remove_file(dir.path()).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_random_seasons_keep_ladder_consistent(
        seasons in prop::collection::vec(
            Just(vec![0usize, 1, 2, 3, 4]).prop_shuffle().prop_flat_map(|order| {
                (2usize..=5).prop_map(move |size| order[..size].to_vec())
            }),
            1..12,
        )
    ) {
        let players = ["A", "B", "C", "D", "E"];
        let dir = TempDataDir::new();

        tokio_test::block_on(async {
            let mut ladder = open_ladder(None, dir.path(), &players).await;

            for (played, season) in seasons.iter().enumerate() {
                let order: Vec<&str> = season.iter().map(|&index| players[index]).collect();
                let report = ladder.record_match(order.clone()).await.unwrap();

                prop_assert_eq!(report.ratings.len(), players.len());
                prop_assert_eq!(ladder.history().len(), played + 1);
                for name in &order {
                    prop_assert!(report.ratings[*name].sigma > 0.0);
                }
            }

            let entries = ladder.history();
            prop_assert!(entries.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
            Ok(())
        })?;
    }
}
