//! Manual overrides: director moves and seat locks. Nothing here rebalances.

use super::{
    errors::{SeatingError, SeatingResult},
    lock::SeatLockRegistry,
    models::{ParticipantId, SeatPosition, TableId, Tournament},
};

/// Manual override operations
pub struct ManualOverride;

impl ManualOverride {
    /// Move a participant directly to a seat.
    ///
    /// Returns `false` without changing anything when the target table is
    /// unknown or closed, the seat number is out of range, the seat holds
    /// another active participant, or the participant is eliminated.
    ///
    /// # Errors
    ///
    /// * `SeatingError::ParticipantNotFound` - Unknown participant
    pub fn move_player(
        mut tournament: Tournament,
        participant_id: ParticipantId,
        target_table: TableId,
        target_seat: u32,
    ) -> SeatingResult<(Tournament, bool)> {
        let participant = tournament
            .participant(participant_id)
            .ok_or(SeatingError::ParticipantNotFound(participant_id))?;
        if participant.eliminated {
            return Ok((tournament, false));
        }

        let table_ok = tournament
            .table(target_table)
            .is_some_and(|t| t.is_active() && (1..=t.max_seats).contains(&target_seat));
        if !table_ok {
            return Ok((tournament, false));
        }

        let target = SeatPosition::new(target_table, target_seat);
        if tournament
            .occupant_of(target)
            .is_some_and(|occupant| occupant.id != participant_id)
        {
            return Ok((tournament, false));
        }

        if let Some(participant) = tournament.participant_mut(participant_id) {
            participant.seat = Some(target);
        }
        log::info!(
            "Manually moved player {} to table {} seat {}",
            participant_id,
            target_table,
            target_seat
        );
        Ok((tournament, true))
    }

    /// Flip a participant's seat lock, returning the new state
    pub fn toggle_lock(
        mut tournament: Tournament,
        participant_id: ParticipantId,
    ) -> SeatingResult<(Tournament, bool)> {
        let participant = tournament
            .participant_mut(participant_id)
            .ok_or(SeatingError::ParticipantNotFound(participant_id))?;
        let locked = SeatLockRegistry::toggle(participant);
        log::debug!("Player {} lock set to {}", participant_id, locked);
        Ok((tournament, locked))
    }
}
