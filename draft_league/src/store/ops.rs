//! Store operations: each one runs under the right handle and returns a full
//! snapshot of what it touched.

use super::manager::TournamentStore;
use crate::{
    draft::{Candidate, CandidatePool, DraftError, PoolEntry, SpeciesId},
    tournament::{
        Player, SettingsOverrides, Tournament, TournamentError, TournamentResult,
        TournamentSettings, TournamentSnapshot,
    },
};
use std::sync::Arc;

impl TournamentStore {
    /// Create an empty tournament
    ///
    /// # Errors
    ///
    /// * `TournamentError::NameTaken` - name already in use
    /// * `TournamentError::InvalidSettings` - blank name or inconsistent settings
    pub async fn create_tournament(
        &self,
        name: &str,
        overrides: SettingsOverrides,
    ) -> TournamentResult<TournamentSnapshot> {
        let settings = TournamentSettings::from_overrides(overrides);
        let snapshot = Tournament::new(name, settings)?.into_snapshot();

        {
            let mut directory = self.directory.write().await;
            Self::insert_slot(&mut directory, snapshot.clone())?;
        }

        log::info!(
            "Created tournament {} (team {}, draw {}, steal {})",
            snapshot.name,
            snapshot.settings.team_size,
            snapshot.settings.draw_size,
            snapshot.settings.steal_size
        );
        self.persist().await;
        Ok(snapshot)
    }

    /// Remove every tournament
    ///
    /// # Returns
    ///
    /// * `usize` - Number of tournaments removed
    pub async fn clear_all(&self) -> usize {
        let removed = {
            let mut directory = self.directory.write().await;
            let removed = directory.len();
            directory.clear();
            removed
        };

        log::info!("Cleared {} tournaments", removed);
        self.persist().await;
        removed
    }

    /// Latest committed snapshot of a tournament
    pub async fn tournament_snapshot(&self, name: &str) -> TournamentResult<TournamentSnapshot> {
        Ok(self.read(name).await?.into_snapshot())
    }

    /// Register a player; drafts for them at once if the tournament is running
    pub async fn register_player(&self, tournament: &str, player_id: &str) -> TournamentResult<Player> {
        let snapshot = self
            .write(tournament, |tour, ctx| {
                tour.add_player(player_id, ctx)?;
                Ok(())
            })
            .await?;
        player_in(&snapshot, player_id)
    }

    pub async fn player_snapshot(&self, tournament: &str, player_id: &str) -> TournamentResult<Player> {
        let handle = self.read(tournament).await?;
        player_in(&handle, player_id)
    }

    /// Start a tournament, drafting for every registered player
    pub async fn start_tournament(&self, name: &str) -> TournamentResult<TournamentSnapshot> {
        self.write(name, |tour, ctx| tour.start(ctx)).await
    }

    /// Lock in a team out of the player's current offer
    pub async fn choose(
        &self,
        tournament: &str,
        player_id: &str,
        choices: &[SpeciesId],
    ) -> TournamentResult<Player> {
        let snapshot = self
            .write(tournament, |tour, _| {
                tour.choose(player_id, choices)?;
                Ok(())
            })
            .await?;
        player_in(&snapshot, player_id)
    }

    pub async fn pair_for_battle(
        &self,
        tournament: &str,
        first: &str,
        second: &str,
    ) -> TournamentResult<TournamentSnapshot> {
        self.write(tournament, |tour, _| tour.pair_for_battle(first, second))
            .await
    }

    pub async fn report_result(
        &self,
        tournament: &str,
        player_id: &str,
        won: bool,
    ) -> TournamentResult<Player> {
        let snapshot = self
            .write(tournament, |tour, _| {
                tour.report_result(player_id, won)?;
                Ok(())
            })
            .await?;
        player_in(&snapshot, player_id)
    }

    /// Steal from the opponent the player just beat
    pub async fn steal(
        &self,
        tournament: &str,
        player_id: &str,
        stolen: &[SpeciesId],
        swapped: &[SpeciesId],
    ) -> TournamentResult<TournamentSnapshot> {
        self.write(tournament, |tour, _| tour.steal(player_id, stolen, swapped))
            .await
    }

    /// Keep some handed-over candidates and redraw the rest
    pub async fn swap(
        &self,
        tournament: &str,
        player_id: &str,
        kept: &[SpeciesId],
    ) -> TournamentResult<Player> {
        let snapshot = self
            .write(tournament, |tour, ctx| {
                tour.swap(player_id, kept, ctx)?;
                Ok(())
            })
            .await?;
        player_in(&snapshot, player_id)
    }
}

/// Usage lookups outside any tournament
impl TournamentStore {
    /// Usage entry of one species in a tier
    ///
    /// # Errors
    ///
    /// * `TournamentError::Draft(TierUnavailable)` - unknown tier
    /// * `TournamentError::Draft(SpeciesNotFound)` - the tier has no such species
    pub async fn species_usage(&self, tier: &str, species: &str) -> TournamentResult<PoolEntry> {
        let pool = self.tier_pool(tier).await?;
        pool.get(species).cloned().ok_or_else(|| {
            DraftError::SpeciesNotFound {
                tier: tier.to_string(),
                species: species.to_string(),
            }
            .into()
        })
    }

    /// Roll one candidate from a tier, of the named species or of a species
    /// picked uniformly. Touches no tournament and no ledger.
    pub async fn random_candidate(
        &self,
        tier: &str,
        species: Option<&str>,
    ) -> TournamentResult<Candidate> {
        let pool = self.tier_pool(tier).await?;
        let mut rng = self.fork_rng();
        Ok(self.generator().roll(tier, &pool, species, &mut rng)?)
    }

    async fn tier_pool(&self, tier: &str) -> TournamentResult<Arc<CandidatePool>> {
        let mut pools = self.lookup_tiers(vec![tier.to_string()]).await;
        match pools.pop() {
            Some((_, pool)) => Ok(pool?),
            None => Err(DraftError::TierUnavailable(tier.to_string()).into()),
        }
    }
}

fn player_in(snapshot: &TournamentSnapshot, player_id: &str) -> TournamentResult<Player> {
    snapshot
        .player(player_id)
        .cloned()
        .ok_or_else(|| TournamentError::PlayerNotFound {
            tournament: snapshot.name.clone(),
            player: player_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        draft::{CandidatePool, SpeciesTemplate},
        store::StoreOptions,
        tournament::{ErrorKind, PlayerStatus},
        usage::StaticUsage,
    };
    use std::sync::Arc;

    fn store() -> TournamentStore {
        let pool: CandidatePool = (0..30)
            .map(|i| (0.2, SpeciesTemplate::new(format!("S{i:02}"))))
            .collect();
        TournamentStore::in_memory(
            Arc::new(StaticUsage::new().with_tier("ou", pool)),
            StoreOptions {
                seed: Some(11),
                ..StoreOptions::default()
            },
        )
    }

    fn small() -> SettingsOverrides {
        SettingsOverrides::with_sizes(2, 3).with_tier("ou", 1.0)
    }

    fn species(candidates: &[crate::draft::Candidate]) -> Vec<SpeciesId> {
        candidates.iter().map(|c| c.species.clone()).collect()
    }

    #[tokio::test]
    async fn test_create_rejects_taken_and_blank_names() {
        let store = store();
        store.create_tournament("cup1", small()).await.unwrap();

        let err = store.create_tournament("cup1", small()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NameTaken);
        let err = store.create_tournament("", small()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSettings);
    }

    #[tokio::test]
    async fn test_unknown_names_are_not_found() {
        let store = store();
        assert_eq!(
            store.tournament_snapshot("nope").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        store.create_tournament("cup1", small()).await.unwrap();
        assert_eq!(
            store.player_snapshot("cup1", "ghost").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            store.register_player("nope", "p1").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_full_round_through_store() {
        let store = store();
        store.create_tournament("cup1", small()).await.unwrap();
        store.register_player("cup1", "p1").await.unwrap();
        store.register_player("cup1", "p2").await.unwrap();
        store.start_tournament("cup1").await.unwrap();

        for id in ["p1", "p2"] {
            let offer = species(&store.player_snapshot("cup1", id).await.unwrap().generated);
            let player = store.choose("cup1", id, &offer[..2]).await.unwrap();
            assert_eq!(player.status, PlayerStatus::WaitingBattle);
        }

        let tour = store.pair_for_battle("cup1", "p1", "p2").await.unwrap();
        assert!(tour.players.iter().all(|p| p.status == PlayerStatus::Battling));

        store.report_result("cup1", "p1", true).await.unwrap();
        let loser = store.report_result("cup1", "p2", false).await.unwrap();
        assert_eq!(loser.status, PlayerStatus::WaitingStolen);

        let stolen = vec![loser.team[0].species.clone()];
        let winner = store.player_snapshot("cup1", "p1").await.unwrap();
        let swapped = vec![winner.team[0].species.clone()];
        let tour = store.steal("cup1", "p1", &stolen, &swapped).await.unwrap();
        assert_eq!(tour.player("p2").unwrap().status, PlayerStatus::Swapping);

        let loser = store.swap("cup1", "p2", &swapped).await.unwrap();
        assert_eq!(loser.team.len(), 2);
        assert!(loser.team.iter().any(|c| c.species == swapped[0]));
        assert_eq!(loser.status, PlayerStatus::WaitingBattle);
    }

    #[tokio::test]
    async fn test_clear_all_counts_and_empties() {
        let store = store();
        for name in ["a", "b", "c"] {
            store.create_tournament(name, small()).await.unwrap();
        }

        assert_eq!(store.list_tournaments().await, vec!["a", "b", "c"]);
        assert_eq!(store.clear_all().await, 3);
        assert!(store.list_tournaments().await.is_empty());
        assert_eq!(store.clear_all().await, 0);
    }

    #[tokio::test]
    async fn test_species_usage_lookup() {
        let store = store();

        let entry = store.species_usage("ou", "S07").await.unwrap();
        assert_eq!(entry.template.species, "S07");
        assert_eq!(entry.weight, 0.2);

        let err = store.species_usage("ou", "Pikachu").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = store.species_usage("gen8lc", "S07").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TierUnavailable);
    }

    #[tokio::test]
    async fn test_random_candidate_leaves_tournaments_alone() {
        let store = store();
        store.create_tournament("cup1", small()).await.unwrap();
        store.register_player("cup1", "p1").await.unwrap();
        store.start_tournament("cup1").await.unwrap();
        let before = store.tournament_snapshot("cup1").await.unwrap();

        let named = store.random_candidate("ou", Some("S03")).await.unwrap();
        assert_eq!(named.species, "S03");
        let any = store.random_candidate("ou", None).await.unwrap();
        assert!(any.species.starts_with('S'));

        assert_eq!(
            store.random_candidate("ou", Some("Pikachu")).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            store.random_candidate("gen8lc", None).await.unwrap_err().kind(),
            ErrorKind::TierUnavailable
        );
        assert_eq!(store.tournament_snapshot("cup1").await.unwrap(), before);
    }
}
