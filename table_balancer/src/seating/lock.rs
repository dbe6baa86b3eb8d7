//! Seat lock registry.
//!
//! Locks are per-participant flags. Automatic seating consults them through
//! [`SeatLockRegistry::is_movable`] and never sets them; the only automatic
//! change is clearing a lock when the participant's table is closed.

use super::models::{Participant, ParticipantId, TableId, Tournament};

/// Seat lock registry
pub struct SeatLockRegistry;

impl SeatLockRegistry {
    /// Whether automatic seating may relocate this participant
    pub fn is_movable(participant: &Participant) -> bool {
        !participant.locked && !participant.eliminated
    }

    /// Flip the lock flag, returning the new state
    pub fn toggle(participant: &mut Participant) -> bool {
        participant.locked = !participant.locked;
        participant.locked
    }

    /// Clear locks held by occupants of a table that is being closed.
    ///
    /// Returns the ids whose lock was cleared.
    pub fn release_table(tournament: &mut Tournament, table_id: TableId) -> Vec<ParticipantId> {
        let mut released = Vec::new();
        for participant in tournament
            .participants
            .iter_mut()
            .filter(|p| !p.eliminated && p.seat.is_some_and(|s| s.table_id == table_id))
        {
            if participant.locked {
                participant.locked = false;
                released.push(participant.id);
            }
        }
        released
    }
}
