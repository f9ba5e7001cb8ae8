//! Tournament aggregate: players, settings and the species ledger.

use super::{
    errors::{TournamentError, TournamentResult},
    models::{PlayerId, PlayerStatus, TournamentSettings, TournamentSnapshot},
    player::Player,
};
use crate::{
    draft::{Candidate, DraftGenerator, SpeciesId, TierDraw},
    usage::UsageSource,
};
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::collections::{BTreeSet, HashSet};

/// Everything a draft needs besides the tournament itself
pub struct DraftContext<'a> {
    pub usage: &'a dyn UsageSource,
    pub generator: &'a DraftGenerator,
    pub rng: &'a mut dyn RngCore,
}

impl<'a> DraftContext<'a> {
    pub fn new(
        usage: &'a dyn UsageSource,
        generator: &'a DraftGenerator,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            usage,
            generator,
            rng,
        }
    }
}

/// A drafting tournament
#[derive(Debug, Clone, PartialEq)]
pub struct Tournament {
    name: String,
    players: Vec<Player>,
    used_species: BTreeSet<SpeciesId>,
    settings: TournamentSettings,
    started: bool,
    created_at: DateTime<Utc>,
}

impl Tournament {
    /// Create an empty, unstarted tournament
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidSettings` - blank name or inconsistent settings
    pub fn new(name: impl Into<String>, settings: TournamentSettings) -> TournamentResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TournamentError::InvalidSettings(
                "tournament name must not be blank".to_string(),
            ));
        }
        settings.validate()?;

        Ok(Self {
            name,
            players: Vec::new(),
            used_species: BTreeSet::new(),
            settings,
            started: false,
            created_at: Utc::now(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Players in registration order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    /// Every species offered so far
    pub fn used_species(&self) -> &BTreeSet<SpeciesId> {
        &self.used_species
    }

    pub fn settings(&self) -> &TournamentSettings {
        &self.settings
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Register a player; drafts for them right away if the tournament is running
    ///
    /// # Errors
    ///
    /// * `TournamentError::InvalidSettings` - blank id
    /// * `TournamentError::PlayerIdTaken` - id already registered
    /// * draft errors when the tournament is running
    pub fn add_player(
        &mut self,
        player_id: impl Into<PlayerId>,
        ctx: &mut DraftContext<'_>,
    ) -> TournamentResult<&Player> {
        let player_id = player_id.into();
        if player_id.trim().is_empty() {
            return Err(TournamentError::InvalidSettings(
                "player id must not be blank".to_string(),
            ));
        }
        if self.player(&player_id).is_some() {
            return Err(TournamentError::PlayerIdTaken {
                tournament: self.name.clone(),
                player: player_id,
            });
        }

        let mut player = Player::new(player_id);
        if self.started {
            let offer = draw_into_ledger(
                &mut self.used_species,
                &self.settings,
                self.settings.draw_size,
                ctx,
            )?;
            player.offer_draft(offer);
        }

        self.players.push(player);
        Ok(&self.players[self.players.len() - 1])
    }

    /// Start the tournament and draft for every registered player.
    ///
    /// All drafts succeed or the tournament is left unchanged.
    ///
    /// # Errors
    ///
    /// * `TournamentError::AlreadyStarted` - second start
    /// * draft errors
    pub fn start(&mut self, ctx: &mut DraftContext<'_>) -> TournamentResult<()> {
        if self.started {
            return Err(TournamentError::AlreadyStarted(self.name.clone()));
        }

        let mut ledger = self.used_species.clone();
        let offers = self
            .players
            .iter()
            .map(|_| draw_into_ledger(&mut ledger, &self.settings, self.settings.draw_size, ctx))
            .collect::<TournamentResult<Vec<_>>>()?;

        for (player, offer) in self.players.iter_mut().zip(offers) {
            player.offer_draft(offer);
        }
        self.used_species = ledger;
        self.started = true;

        log::debug!(
            "Started tournament {} with {} players",
            self.name,
            self.players.len()
        );
        Ok(())
    }

    /// Draft a fresh offer for one player
    pub fn draft_for(&mut self, player_id: &str, ctx: &mut DraftContext<'_>) -> TournamentResult<()> {
        let idx = self.player_index(player_id)?;
        let offer = draw_into_ledger(
            &mut self.used_species,
            &self.settings,
            self.settings.draw_size,
            ctx,
        )?;
        self.players[idx].offer_draft(offer);
        Ok(())
    }

    /// Pair two distinct players that are both waiting for a battle
    ///
    /// # Errors
    ///
    /// * `TournamentError::SelfPairing` - same id twice
    /// * `TournamentError::PlayerNotFound` - unknown id
    /// * `TournamentError::IllegalState` - either player is not `waiting_battle`
    pub fn pair_for_battle(&mut self, first: &str, second: &str) -> TournamentResult<()> {
        if first == second {
            return Err(TournamentError::SelfPairing(first.to_string()));
        }
        let a = self.player_index(first)?;
        let b = self.player_index(second)?;

        for idx in [a, b] {
            let player = &self.players[idx];
            if player.status != PlayerStatus::WaitingBattle {
                return Err(TournamentError::illegal_state(
                    &player.player_id,
                    PlayerStatus::WaitingBattle.as_str(),
                    player.status,
                ));
            }
        }

        self.players[a].enter_battle(second);
        self.players[b].enter_battle(first);
        Ok(())
    }

    /// Choose a team of `team_size` out of the player's offer
    pub fn choose(&mut self, player_id: &str, selected: &[SpeciesId]) -> TournamentResult<&Player> {
        let idx = self.player_index(player_id)?;
        self.players[idx].choose(selected, self.settings.team_size)?;
        Ok(&self.players[idx])
    }

    pub fn report_result(&mut self, player_id: &str, won: bool) -> TournamentResult<&Player> {
        let idx = self.player_index(player_id)?;
        self.players[idx].report_result(won)?;
        Ok(&self.players[idx])
    }

    /// Steal from the opponent the player just beat
    ///
    /// # Errors
    ///
    /// * `TournamentError::IllegalState` - the player is not stealing
    /// * see [`Player::steal`]
    pub fn steal(
        &mut self,
        player_id: &str,
        stolen: &[SpeciesId],
        swapped: &[SpeciesId],
    ) -> TournamentResult<()> {
        let winner_idx = self.player_index(player_id)?;
        let winner = &self.players[winner_idx];
        let opponent_id = match (&winner.status, &winner.battling) {
            (PlayerStatus::Stealing, Some(opponent)) if opponent != player_id => opponent.clone(),
            _ => {
                return Err(TournamentError::illegal_state(
                    player_id,
                    PlayerStatus::Stealing.as_str(),
                    winner.status,
                ));
            }
        };
        let loser_idx = self.player_index(&opponent_id)?;

        let (winner, loser) = pair_mut(&mut self.players, winner_idx, loser_idx);
        winner.steal(loser, stolen, swapped, self.settings.steal_size)
    }

    /// Keep some handed-over candidates and redraw the rest
    pub fn swap(
        &mut self,
        player_id: &str,
        kept: &[SpeciesId],
        ctx: &mut DraftContext<'_>,
    ) -> TournamentResult<&Player> {
        let idx = self.player_index(player_id)?;
        let Self {
            players,
            used_species,
            settings,
            ..
        } = self;

        players[idx].swap(kept, |count| {
            draw_into_ledger(used_species, settings, count, ctx)
        })?;
        Ok(&self.players[idx])
    }

    pub fn snapshot(&self) -> TournamentSnapshot {
        self.clone().into_snapshot()
    }

    pub fn into_snapshot(self) -> TournamentSnapshot {
        TournamentSnapshot {
            name: self.name,
            players: self.players,
            used_species: self.used_species,
            settings: self.settings,
            started: self.started,
            created_at: self.created_at,
        }
    }

    /// Rebuild a tournament from its snapshot, checking every invariant
    ///
    /// # Errors
    ///
    /// * `TournamentError::CorruptSnapshot` - describing the first violation
    pub fn restore(snapshot: TournamentSnapshot) -> TournamentResult<Self> {
        let corrupt = |msg: String| {
            Err(TournamentError::CorruptSnapshot(format!(
                "{}: {}",
                snapshot.name, msg
            )))
        };

        if snapshot.name.trim().is_empty() {
            return corrupt("blank tournament name".to_string());
        }
        if let Err(err) = snapshot.settings.validate() {
            return corrupt(err.to_string());
        }

        let ids: HashSet<&str> = snapshot
            .players
            .iter()
            .map(|p| p.player_id.as_str())
            .collect();
        if ids.len() != snapshot.players.len() {
            return corrupt("duplicate player ids".to_string());
        }

        let mut held: HashSet<&str> = HashSet::new();
        for player in &snapshot.players {
            for species in player.held_species() {
                if !snapshot.used_species.contains(species) {
                    return corrupt(format!("{species} is held but missing from the ledger"));
                }
                if !held.insert(species.as_str()) {
                    return corrupt(format!("{species} is held twice"));
                }
            }

            match &player.battling {
                Some(opponent)
                    if opponent == &player.player_id || !ids.contains(opponent.as_str()) =>
                {
                    return corrupt(format!(
                        "{} battles unknown opponent {opponent}",
                        player.player_id
                    ));
                }
                battling if battling.is_some() != player.status.is_in_battle() => {
                    return corrupt(format!(
                        "{} is {} with opponent {:?}",
                        player.player_id, player.status, battling
                    ));
                }
                _ => {}
            }

            let waiting = player.status == PlayerStatus::WaitingStart;
            if waiting == snapshot.started {
                return corrupt(format!(
                    "{} is {} but started is {}",
                    player.player_id, player.status, snapshot.started
                ));
            }
        }

        Ok(Self {
            name: snapshot.name,
            players: snapshot.players,
            used_species: snapshot.used_species,
            settings: snapshot.settings,
            started: snapshot.started,
            created_at: snapshot.created_at,
        })
    }

    fn player_index(&self, player_id: &str) -> TournamentResult<usize> {
        self.players
            .iter()
            .position(|p| p.player_id == player_id)
            .ok_or_else(|| TournamentError::PlayerNotFound {
                tournament: self.name.clone(),
                player: player_id.to_string(),
            })
    }
}

/// Draw `count` candidates from every positively scaled tier, excluding and
/// then extending the ledger. The ledger is untouched when the draw fails.
fn draw_into_ledger(
    ledger: &mut BTreeSet<SpeciesId>,
    settings: &TournamentSettings,
    count: usize,
    ctx: &mut DraftContext<'_>,
) -> TournamentResult<Vec<Candidate>> {
    let pools = settings
        .tiers
        .iter()
        .filter(|&(_, &scale)| scale > 0.0)
        .map(|(tier, &scale)| Ok((tier.as_str(), ctx.usage.weights_for_tier(tier)?, scale)))
        .collect::<TournamentResult<Vec<_>>>()?;
    let tiers: Vec<TierDraw<'_>> = pools
        .iter()
        .map(|(tier, pool, scale)| TierDraw {
            tier: *tier,
            pool: pool.as_ref(),
            scale: *scale,
        })
        .collect();

    let drawn = ctx.generator.draw(count, &tiers, ledger, &mut *ctx.rng)?;
    ledger.extend(drawn.iter().map(|c| c.species.clone()));
    Ok(drawn)
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
