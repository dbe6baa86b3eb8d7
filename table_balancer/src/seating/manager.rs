//! Seating manager: the entry point for the elimination workflow, setup
//! wizard, and display layer.

use super::{
    allocator::SeatAllocator,
    balance::BalanceEngine,
    builder::TableSetBuilder,
    errors::SeatingResult,
    invariants::{self, InvariantViolation},
    layout::{LayoutReporter, TableLayout},
    models::{
        BalanceResult, ParticipantId, SeatAssignment, Table, TableId, Tournament, TournamentId,
    },
    overrides::ManualOverride,
    randomizer::SeatRandomizer,
};
use crate::{
    config::SeatingConfig,
    db::{TournamentRepository, timeouts::with_timeout},
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};

/// Seating manager
///
/// Every mutating call runs load → transform → save while holding the
/// tournament's write lock, so two balancing runs for one tournament never
/// interleave. Transforms work on an owned copy; if the save fails the stored
/// aggregate is untouched. Layout reads take the read lock and therefore never
/// observe a half-applied change.
#[derive(Clone)]
pub struct SeatingManager {
    /// Aggregate storage
    repository: Arc<dyn TournamentRepository>,

    /// Manager configuration
    config: SeatingConfig,

    /// Shared randomness for shuffles and equalize picks
    randomizer: Arc<Mutex<SeatRandomizer>>,

    /// Per-tournament reader/writer locks
    locks: Arc<RwLock<HashMap<TournamentId, Arc<RwLock<()>>>>>,
}

impl SeatingManager {
    /// Create a new seating manager
    ///
    /// # Arguments
    ///
    /// * `repository` - Tournament aggregate storage
    /// * `config` - Seating configuration
    ///
    /// # Returns
    ///
    /// * `SeatingManager` - New seating manager instance
    pub fn new(repository: Arc<dyn TournamentRepository>, config: SeatingConfig) -> Self {
        let randomizer = SeatRandomizer::from_seed(config.shuffle_seed);
        Self {
            repository,
            config,
            randomizer: Arc::new(Mutex::new(randomizer)),
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replace the active tables with a fresh set sized for the current field
    pub async fn create_tables(&self, tournament_id: TournamentId) -> SeatingResult<Vec<Table>> {
        self.mutate(tournament_id, |tournament, _| {
            let players = tournament.active_player_count();
            let seats = tournament.seats_per_table;
            TableSetBuilder::create_tables(tournament, players, seats)
        })
        .await
    }

    /// Randomly seat every active participant.
    ///
    /// Builds the table set first when the tournament has no active table.
    pub async fn auto_assign_players(
        &self,
        tournament_id: TournamentId,
    ) -> SeatingResult<Vec<SeatAssignment>> {
        self.mutate(tournament_id, |tournament, randomizer| {
            if tournament.active_table_count() == 0 {
                TableSetBuilder::build_and_seat(tournament, randomizer.rng_mut())
            } else {
                SeatAllocator::initial_random_seat(tournament, randomizer.rng_mut())
            }
        })
        .await
    }

    /// Rebalance after an elimination, rebuy, or late registration
    pub async fn auto_balance_after_change(
        &self,
        tournament_id: TournamentId,
    ) -> SeatingResult<BalanceResult> {
        let max_passes = self.config.max_balance_passes;
        self.mutate(tournament_id, move |tournament, randomizer| {
            BalanceEngine::rebalance(tournament, randomizer.rng_mut(), max_passes)
        })
        .await
    }

    /// Seat a late arrival, then rebalance.
    ///
    /// Returns the participant's seat once balancing finishes, or `None` for
    /// an eliminated participant.
    pub async fn assign_late_player(
        &self,
        participant_id: ParticipantId,
    ) -> SeatingResult<Option<SeatAssignment>> {
        let tournament_id = self.resolve(participant_id).await?;
        let max_passes = self.config.max_balance_passes;
        self.mutate(tournament_id, move |tournament, randomizer| {
            let (tournament, assignment) =
                SeatAllocator::assign_late_player(tournament, participant_id)?;
            if assignment.is_none() {
                return Ok((tournament, None));
            }
            let (tournament, result) =
                BalanceEngine::rebalance(tournament, randomizer.rng_mut(), max_passes)?;
            log::debug!("Late seating of {}: {}", participant_id, result.message);
            let seat = tournament.assignment_for(participant_id);
            Ok((tournament, seat))
        })
        .await
    }

    /// Move a participant to a specific seat without rebalancing.
    ///
    /// Returns `false` when the target is unknown, closed, out of range, or taken.
    pub async fn move_player(
        &self,
        participant_id: ParticipantId,
        target_table: TableId,
        target_seat: u32,
    ) -> SeatingResult<bool> {
        let tournament_id = self.resolve(participant_id).await?;
        self.mutate(tournament_id, move |tournament, _| {
            ManualOverride::move_player(tournament, participant_id, target_table, target_seat)
        })
        .await
    }

    /// Flip a participant's seat lock, returning the new state
    pub async fn toggle_lock(&self, participant_id: ParticipantId) -> SeatingResult<bool> {
        let tournament_id = self.resolve(participant_id).await?;
        self.mutate(tournament_id, move |tournament, _| {
            ManualOverride::toggle_lock(tournament, participant_id)
        })
        .await
    }

    /// Mark a participant eliminated and rebalance in the same transaction
    pub async fn record_elimination(
        &self,
        participant_id: ParticipantId,
    ) -> SeatingResult<BalanceResult> {
        let tournament_id = self.resolve(participant_id).await?;
        let max_passes = self.config.max_balance_passes;
        self.mutate(tournament_id, move |mut tournament, randomizer| {
            if let Some(participant) = tournament.participant_mut(participant_id) {
                participant.eliminated = true;
                participant.current_stack = 0;
            }
            log::info!(
                "Player {} eliminated from tournament {}",
                participant_id,
                tournament.id
            );
            BalanceEngine::rebalance(tournament, randomizer.rng_mut(), max_passes)
        })
        .await
    }

    /// Bring an eliminated participant back with a new stack and reseat them
    /// as a late arrival.
    pub async fn record_rebuy(
        &self,
        participant_id: ParticipantId,
        stack: i64,
    ) -> SeatingResult<Option<SeatAssignment>> {
        let tournament_id = self.resolve(participant_id).await?;
        let max_passes = self.config.max_balance_passes;
        self.mutate(tournament_id, move |mut tournament, randomizer| {
            if let Some(participant) = tournament.participant_mut(participant_id) {
                participant.eliminated = false;
                participant.locked = false;
                participant.seat = None;
                participant.current_stack = stack;
            }
            let (tournament, _) = SeatAllocator::assign_late_player(tournament, participant_id)?;
            let (tournament, _) =
                BalanceEngine::rebalance(tournament, randomizer.rng_mut(), max_passes)?;
            let seat = tournament.assignment_for(participant_id);
            Ok((tournament, seat))
        })
        .await
    }

    /// Current layout of the active tables
    pub async fn get_table_layout(
        &self,
        tournament_id: TournamentId,
    ) -> SeatingResult<Vec<TableLayout>> {
        let tournament = self.read(tournament_id).await?;
        Ok(LayoutReporter::get_layout(&tournament))
    }

    /// Check the stored aggregate for seating rule violations
    pub async fn validate(
        &self,
        tournament_id: TournamentId,
    ) -> SeatingResult<Vec<InvariantViolation>> {
        let tournament = self.read(tournament_id).await?;
        Ok(invariants::check(&tournament))
    }

    async fn resolve(&self, participant_id: ParticipantId) -> SeatingResult<TournamentId> {
        with_timeout(
            self.config.operation_timeout,
            self.repository.find_tournament_for_participant(participant_id),
        )
        .await
    }

    /// Lock for one tournament, created on first use.
    ///
    /// Entries nobody holds are evicted whenever a new one is inserted, so the
    /// registry only grows with the number of tournaments in flight.
    async fn tournament_lock(&self, tournament_id: TournamentId) -> Arc<RwLock<()>> {
        if let Some(lock) = self.locks.read().await.get(&tournament_id) {
            return lock.clone();
        }
        let mut locks = self.locks.write().await;
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(tournament_id)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    async fn read(&self, tournament_id: TournamentId) -> SeatingResult<Tournament> {
        let lock = self.tournament_lock(tournament_id).await;
        let _guard = lock.read().await;
        with_timeout(
            self.config.operation_timeout,
            self.repository.load_tournament(tournament_id),
        )
        .await
    }

    /// Load, transform, and save one tournament under its write lock.
    ///
    /// Nothing is stored when the transform fails or the aggregate is unchanged.
    async fn mutate<T, F>(&self, tournament_id: TournamentId, transform: F) -> SeatingResult<T>
    where
        F: FnOnce(Tournament, &mut SeatRandomizer) -> SeatingResult<(Tournament, T)> + Send,
        T: Send,
    {
        let lock = self.tournament_lock(tournament_id).await;
        let _guard = lock.write().await;

        let original = with_timeout(
            self.config.operation_timeout,
            self.repository.load_tournament(tournament_id),
        )
        .await?;

        let (next, output) = {
            let mut randomizer = self.randomizer.lock().await;
            transform(original.clone(), &mut *randomizer)?
        };

        if next != original {
            if let Err(e) = with_timeout(
                self.config.operation_timeout,
                self.repository.save_tournament(&next),
            )
            .await
            {
                log::warn!("Failed to save tournament {}: {}", tournament_id, e);
                return Err(e);
            }
        }

        Ok(output)
    }
}
