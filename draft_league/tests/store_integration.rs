//! Integration tests for the tournament store
//!
//! These tests drive the store the way a request layer would: through its
//! named operations, from several tasks at once, and across a reopen.

use draft_league::{
    draft::{CandidatePool, SpeciesId, SpeciesTemplate},
    store::{JsonFileRepository, MemoryRepository, StoreOptions, TournamentStore},
    tournament::{ErrorKind, PlayerStatus, SettingsOverrides},
    usage::{StaticUsage, UsageSource},
};
use std::{path::PathBuf, sync::Arc, time::Duration};

fn usage() -> Arc<dyn UsageSource> {
    let tier = |prefix: &str, count: usize| -> CandidatePool {
        (0..count)
            .map(|i| {
                (
                    0.04 + (i % 7) as f64 * 0.05,
                    SpeciesTemplate::new(format!("{prefix}{i:03}"))
                        .with_moves([
                            (0.9, "Protect"),
                            (0.6, "Substitute"),
                            (0.5, "Toxic"),
                            (0.3, "Rest"),
                            (0.2, "Sleep Talk"),
                        ])
                        .with_abilities([(1.0, "Pressure")])
                        .with_items([(0.7, "Leftovers"), (0.3, "Life Orb")]),
                )
            })
            .collect()
    };

    Arc::new(
        StaticUsage::new()
            .with_tier("gen8ou", tier("Ou", 60))
            .with_tier("gen8uu", tier("Uu", 60)),
    )
}

fn options(seed: u64) -> StoreOptions {
    StoreOptions {
        seed: Some(seed),
        ..StoreOptions::default()
    }
}

fn cup(team_size: usize, draw_size: usize) -> SettingsOverrides {
    SettingsOverrides::with_sizes(team_size, draw_size)
        .with_steal_size(1)
        .with_tier("gen8ou", 0.6)
        .with_tier("gen8uu", 1.0)
}

fn species_of(candidates: &[draft_league::Candidate]) -> Vec<SpeciesId> {
    candidates.iter().map(|c| c.species.clone()).collect()
}

fn scratch_file() -> PathBuf {
    std::env::temp_dir()
        .join(format!("dl-store-{}", uuid::Uuid::new_v4()))
        .join("tournaments.json")
}

#[tokio::test]
async fn test_cup1_scenario() {
    let store = TournamentStore::in_memory(usage(), options(1));
    store.create_tournament("cup1", cup(2, 3)).await.unwrap();
    store.register_player("cup1", "p1").await.unwrap();
    store.start_tournament("cup1").await.unwrap();

    let p1 = store.player_snapshot("cup1", "p1").await.unwrap();
    assert_eq!(p1.status, PlayerStatus::ChoosingPokemon);
    assert_eq!(p1.generated.len(), 3);

    let offer = species_of(&p1.generated);
    let err = store.choose("cup1", "p1", &offer).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidChoice);
    assert_eq!(store.player_snapshot("cup1", "p1").await.unwrap(), p1);

    let p1 = store.choose("cup1", "p1", &offer[..2]).await.unwrap();
    assert_eq!(p1.status, PlayerStatus::WaitingBattle);
    assert_eq!(p1.team.len(), 2);
    assert!(p1.generated.is_empty());
}

#[tokio::test]
async fn test_failed_operations_leave_snapshot_unchanged() {
    let store = TournamentStore::in_memory(usage(), options(2));
    store.create_tournament("cup1", cup(2, 3)).await.unwrap();
    store.register_player("cup1", "p1").await.unwrap();
    store.register_player("cup1", "p2").await.unwrap();
    store.start_tournament("cup1").await.unwrap();
    let before = store.tournament_snapshot("cup1").await.unwrap();

    let failures = [
        store.register_player("cup1", "p1").await.unwrap_err(),
        store.start_tournament("cup1").await.unwrap_err(),
        store.pair_for_battle("cup1", "p1", "p2").await.unwrap_err(),
        store.pair_for_battle("cup1", "p1", "p1").await.unwrap_err(),
        store.report_result("cup1", "p1", true).await.unwrap_err(),
        store.steal("cup1", "p1", &[], &[]).await.unwrap_err(),
        store.swap("cup1", "p1", &[]).await.unwrap_err(),
        store
            .choose("cup1", "p1", &["Nope".to_string(), "Nada".to_string()])
            .await
            .unwrap_err(),
    ];

    let kinds: Vec<ErrorKind> = failures.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ErrorKind::NameTaken,
            ErrorKind::IllegalState,
            ErrorKind::IllegalState,
            ErrorKind::IllegalState,
            ErrorKind::IllegalState,
            ErrorKind::IllegalState,
            ErrorKind::IllegalState,
            ErrorKind::InvalidChoice,
        ]
    );
    assert_eq!(store.tournament_snapshot("cup1").await.unwrap(), before);
}

#[tokio::test]
async fn test_double_win_is_settled_by_first_steal() {
    let store = TournamentStore::in_memory(usage(), options(9));
    store.create_tournament("cup1", cup(2, 3)).await.unwrap();
    store.register_player("cup1", "p1").await.unwrap();
    store.register_player("cup1", "p2").await.unwrap();
    store.start_tournament("cup1").await.unwrap();
    for id in ["p1", "p2"] {
        let offer = species_of(&store.player_snapshot("cup1", id).await.unwrap().generated);
        store.choose("cup1", id, &offer[..2]).await.unwrap();
    }
    store.pair_for_battle("cup1", "p1", "p2").await.unwrap();

    // Both sides claim the win
    store.report_result("cup1", "p1", true).await.unwrap();
    store.report_result("cup1", "p2", true).await.unwrap();

    let p2_team = species_of(&store.player_snapshot("cup1", "p2").await.unwrap().team);
    store
        .steal("cup1", "p1", &p2_team[..1], &[])
        .await
        .unwrap_err();
    let p1_team = species_of(&store.player_snapshot("cup1", "p1").await.unwrap().team);
    store
        .steal("cup1", "p1", &p2_team[..1], &p1_team[..1])
        .await
        .unwrap();

    let p1 = store.player_snapshot("cup1", "p1").await.unwrap();
    let p2 = store.player_snapshot("cup1", "p2").await.unwrap();
    assert_eq!(p1.status, PlayerStatus::WaitingBattle);
    assert_eq!(p2.status, PlayerStatus::Swapping);
    assert!(species_of(&p1.team).contains(&p2_team[0]));
    assert_eq!(species_of(&p2.generated), p1_team[..1].to_vec());

    let before = store.tournament_snapshot("cup1").await.unwrap();
    let err = store
        .steal("cup1", "p2", &p1_team[1..], &p2_team[1..])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalState);
    assert_eq!(store.tournament_snapshot("cup1").await.unwrap(), before);

    // The loser of the settled battle can still finish its swap
    let p2 = store.swap("cup1", "p2", &[]).await.unwrap();
    assert_eq!(p2.status, PlayerStatus::WaitingBattle);
    assert_eq!(p2.team.len(), 2);
}

#[tokio::test]
async fn test_exhausted_pool_reports_insufficient_candidates() {
    let store = TournamentStore::in_memory(usage(), options(3));
    // 120 species, 20 per draw: the seventh player cannot be served
    store.create_tournament("big", cup(5, 20)).await.unwrap();
    store.start_tournament("big").await.unwrap();

    for i in 0..6 {
        store.register_player("big", &format!("p{i}")).await.unwrap();
    }
    let err = store.register_player("big", "p6").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientCandidates);

    let tour = store.tournament_snapshot("big").await.unwrap();
    assert_eq!(tour.players.len(), 6);
    assert_eq!(tour.used_species.len(), 120);
}

#[tokio::test]
async fn test_unknown_tier_is_reported_on_start() {
    let store = TournamentStore::in_memory(usage(), options(4));
    store
        .create_tournament("cup1", SettingsOverrides::with_sizes(2, 3).with_tier("gen8lc", 1.0))
        .await
        .unwrap();
    store.register_player("cup1", "p1").await.unwrap();

    let err = store.start_tournament("cup1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TierUnavailable);
    assert!(!store.tournament_snapshot("cup1").await.unwrap().started);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_never_lose_updates() {
    let store = Arc::new(TournamentStore::in_memory(usage(), options(5)));
    store.create_tournament("cup1", cup(1, 2)).await.unwrap();
    store.start_tournament("cup1").await.unwrap();

    let tasks: Vec<_> = (0..40)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.register_player("cup1", &format!("p{i}")).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let tour = store.tournament_snapshot("cup1").await.unwrap();
    assert_eq!(tour.players.len(), 40);
    assert_eq!(tour.used_species.len(), 80);

    // Every offer was drawn against the ledger left by the previous writer
    let mut offered: Vec<&SpeciesId> = tour
        .players
        .iter()
        .flat_map(|p| p.generated.iter().map(|c| &c.species))
        .collect();
    offered.sort();
    offered.dedup();
    assert_eq!(offered.len(), 80);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_writer_waits_for_held_lease() {
    let store = Arc::new(TournamentStore::in_memory(usage(), options(6)));
    store.create_tournament("cup1", cup(2, 3)).await.unwrap();

    let lease = store.lease("cup1").await.unwrap();

    let waiting = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.register_player("cup1", "late").await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiting.is_finished());

    // Readers never queue behind the lease
    let handle = tokio::time::timeout(Duration::from_millis(100), store.read("cup1"))
        .await
        .expect("read blocked by writer lease")
        .unwrap();
    assert!(handle.players.is_empty());

    drop(lease);
    let late = waiting.await.unwrap().unwrap();
    assert_eq!(late.player_id, "late");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reader_on_one_tournament_never_delays_another() {
    let store = Arc::new(TournamentStore::in_memory(usage(), options(7)));
    store.create_tournament("a", cup(2, 3)).await.unwrap();
    store.create_tournament("b", cup(2, 3)).await.unwrap();

    let _reading_a = store.read("a").await.unwrap();
    let _leasing_a = store.lease("a").await.unwrap();

    let committed = tokio::time::timeout(
        Duration::from_millis(500),
        store.register_player("b", "p1"),
    )
    .await
    .expect("writer on b was delayed by a")
    .unwrap();
    assert_eq!(committed.status, PlayerStatus::WaitingStart);
}

#[tokio::test]
async fn test_reopen_sees_same_snapshots() {
    let path = scratch_file();

    let before = {
        let store = TournamentStore::open(
            Arc::new(JsonFileRepository::new(&path)),
            usage(),
            options(8),
        )
        .await
        .unwrap();

        store.create_tournament("cup1", cup(2, 3)).await.unwrap();
        store.create_tournament("cup2", cup(3, 4)).await.unwrap();
        store.register_player("cup1", "p1").await.unwrap();
        store.register_player("cup1", "p2").await.unwrap();
        store.start_tournament("cup1").await.unwrap();
        let offer = species_of(&store.player_snapshot("cup1", "p1").await.unwrap().generated);
        store.choose("cup1", "p1", &offer[1..]).await.unwrap();

        store.document().await
    };

    let reopened = TournamentStore::open(
        Arc::new(JsonFileRepository::new(&path)),
        usage(),
        options(9),
    )
    .await
    .unwrap();

    assert_eq!(reopened.list_tournaments().await, vec!["cup1", "cup2"]);
    assert_eq!(reopened.document().await.tournaments, before.tournaments);

    // Operations resume where they left off
    let p2 = reopened.player_snapshot("cup1", "p2").await.unwrap();
    assert_eq!(p2.status, PlayerStatus::ChoosingPokemon);

    std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
}

#[tokio::test]
async fn test_clear_all_persists_empty_document() {
    let repo = Arc::new(MemoryRepository::new());
    let store = TournamentStore::open(repo.clone(), usage(), options(10))
        .await
        .unwrap();
    store.create_tournament("cup1", cup(2, 3)).await.unwrap();
    store.create_tournament("cup2", cup(2, 3)).await.unwrap();
    assert_eq!(repo.document().await.unwrap().tournaments.len(), 2);

    assert_eq!(store.clear_all().await, 2);
    assert!(repo.document().await.unwrap().tournaments.is_empty());
    assert_eq!(
        store.tournament_snapshot("cup1").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}
