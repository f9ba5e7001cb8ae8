//! Per-participant state machine.
//!
//! ```text
//! waiting_start --offer--> choosing_pokemon --choose--> waiting_battle
//!        waiting_battle --pair--> battling --won--> stealing
//!                                          --lost-> waiting_stolen
//! stealing --steal--> waiting_battle      (winner)
//! waiting_stolen ---> swapping --swap--> waiting_battle   (loser)
//! ```

use super::{
    errors::{TournamentError, TournamentResult},
    models::{PlayerId, PlayerStatus},
};
use crate::draft::{Candidate, SpeciesId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A tournament participant; also its own snapshot record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: PlayerId,
    /// Committed squad
    #[serde(default)]
    pub team: Vec<Candidate>,
    /// Current offer awaiting a choice
    #[serde(default)]
    pub generated: Vec<Candidate>,
    pub status: PlayerStatus,
    /// Opponent of the current or last battle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battling: Option<PlayerId>,
}

impl Player {
    pub fn new(player_id: impl Into<PlayerId>) -> Self {
        Self {
            player_id: player_id.into(),
            team: Vec::new(),
            generated: Vec::new(),
            status: PlayerStatus::WaitingStart,
            battling: None,
        }
    }

    /// Every species this player holds or is being offered
    pub fn held_species(&self) -> impl Iterator<Item = &SpeciesId> {
        self.team
            .iter()
            .chain(self.generated.iter())
            .map(|c| &c.species)
    }

    /// Replace the current offer and wait for a choice
    pub fn offer_draft(&mut self, candidates: Vec<Candidate>) {
        self.generated = candidates;
        self.status = PlayerStatus::ChoosingPokemon;
    }

    /// Pick the team out of the current offer
    ///
    /// # Errors
    ///
    /// * `TournamentError::IllegalState` - not choosing
    /// * `TournamentError::InvalidChoice` - wrong size, unknown or repeated ids
    pub fn choose(&mut self, selected: &[SpeciesId], required: usize) -> TournamentResult<()> {
        self.expect_status(PlayerStatus::ChoosingPokemon)?;

        if selected.len() != required {
            return Err(TournamentError::InvalidChoice(format!(
                "expected {} selections, got {}",
                required,
                selected.len()
            )));
        }
        let selected = distinct_ids(selected, "selection")?;
        ensure_all_in(&selected, &self.generated, "offer")?;

        let offer = std::mem::take(&mut self.generated);
        self.team = offer
            .into_iter()
            .filter(|c| selected.contains(c.species.as_str()))
            .collect();
        self.status = PlayerStatus::WaitingBattle;

        Ok(())
    }

    /// Bind to an opponent; both players are checked by the tournament
    pub(crate) fn enter_battle(&mut self, opponent: &str) {
        self.status = PlayerStatus::Battling;
        self.battling = Some(opponent.to_string());
    }

    /// Record the outcome of the current battle
    ///
    /// # Errors
    ///
    /// * `TournamentError::IllegalState` - not battling
    pub fn report_result(&mut self, won: bool) -> TournamentResult<()> {
        self.expect_status(PlayerStatus::Battling)?;

        self.status = if won {
            PlayerStatus::Stealing
        } else {
            PlayerStatus::WaitingStolen
        };

        Ok(())
    }

    /// Take `stolen` from the beaten opponent's team, handing `swapped` from
    /// this team to the opponent's offer.
    ///
    /// Everything is validated before either player changes.
    ///
    /// # Errors
    ///
    /// * `TournamentError::IllegalState` - not stealing, or `opponent` is not the one just battled
    /// * `TournamentError::InvalidChoice` - counts or ids do not line up
    pub fn steal(
        &mut self,
        opponent: &mut Player,
        stolen: &[SpeciesId],
        swapped: &[SpeciesId],
        max_stolen: usize,
    ) -> TournamentResult<()> {
        self.expect_status(PlayerStatus::Stealing)?;

        if self.battling.as_deref() != Some(opponent.player_id.as_str()) {
            return Err(TournamentError::illegal_state(
                &self.player_id,
                format!("stealing from {}", opponent.player_id),
                self.status,
            ));
        }

        if stolen.len() > max_stolen {
            return Err(TournamentError::InvalidChoice(format!(
                "at most {} may be stolen, got {}",
                max_stolen,
                stolen.len()
            )));
        }
        if stolen.len() != swapped.len() {
            return Err(TournamentError::InvalidChoice(format!(
                "stole {} but swapped {}",
                stolen.len(),
                swapped.len()
            )));
        }
        let stolen = distinct_ids(stolen, "stolen")?;
        let swapped = distinct_ids(swapped, "swapped")?;
        ensure_all_in(&stolen, &opponent.team, "opponent team")?;
        ensure_all_in(&swapped, &self.team, "team")?;

        let (taken, opponent_kept): (Vec<_>, Vec<_>) = std::mem::take(&mut opponent.team)
            .into_iter()
            .partition(|c| stolen.contains(c.species.as_str()));
        let (handed_over, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.team)
            .into_iter()
            .partition(|c| swapped.contains(c.species.as_str()));

        self.team = kept;
        self.team.extend(taken);
        opponent.team = opponent_kept;
        opponent.generated.extend(handed_over);

        self.status = PlayerStatus::WaitingBattle;
        self.battling = None;
        opponent.status = PlayerStatus::Swapping;
        opponent.battling = None;

        Ok(())
    }

    /// Keep some of the handed-over candidates and refill the rest with a
    /// fresh draw of `generated.len() - kept.len()` candidates.
    ///
    /// `reroll` is invoked before any change, so a failed draw leaves the
    /// player untouched.
    ///
    /// # Errors
    ///
    /// * `TournamentError::IllegalState` - not swapping
    /// * `TournamentError::InvalidChoice` - unknown or repeated kept ids
    /// * whatever `reroll` returns
    pub fn swap<F>(&mut self, kept: &[SpeciesId], reroll: F) -> TournamentResult<()>
    where
        F: FnOnce(usize) -> TournamentResult<Vec<Candidate>>,
    {
        self.expect_status(PlayerStatus::Swapping)?;

        let kept = distinct_ids(kept, "kept")?;
        ensure_all_in(&kept, &self.generated, "offer")?;

        let fresh = reroll(self.generated.len() - kept.len())?;

        let offer = std::mem::take(&mut self.generated);
        self.team
            .extend(offer.into_iter().filter(|c| kept.contains(c.species.as_str())));
        self.team.extend(fresh);
        self.status = PlayerStatus::WaitingBattle;

        Ok(())
    }

    fn expect_status(&self, expected: PlayerStatus) -> TournamentResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(TournamentError::illegal_state(
                &self.player_id,
                expected.as_str(),
                self.status,
            ))
        }
    }
}

fn distinct_ids<'a>(ids: &'a [SpeciesId], what: &str) -> TournamentResult<HashSet<&'a str>> {
    let mut set = HashSet::with_capacity(ids.len());
    for id in ids {
        if !set.insert(id.as_str()) {
            return Err(TournamentError::InvalidChoice(format!(
                "{what} lists \"{id}\" more than once"
            )));
        }
    }
    Ok(set)
}

fn ensure_all_in(ids: &HashSet<&str>, pool: &[Candidate], what: &str) -> TournamentResult<()> {
    let known: HashSet<&str> = pool.iter().map(|c| c.species.as_str()).collect();
    // Sorted so the reported id is deterministic
    let mut missing: Vec<&str> = ids.difference(&known).copied().collect();
    missing.sort_unstable();

    match missing.first() {
        None => Ok(()),
        Some(id) => Err(TournamentError::InvalidChoice(format!(
            "\"{id}\" is not in the {what}"
        ))),
    }
}
