//! Consistency checks over a tournament snapshot.

use super::{
    allocator::is_valid_position,
    models::{ParticipantId, SeatPosition, Tournament},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A broken seating rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvariantViolation {
    /// Two or more active participants share a seat
    SeatConflict {
        position: SeatPosition,
        participants: Vec<ParticipantId>,
    },
    /// Seat points at a closed or unknown table, or past the last seat
    InvalidSeat {
        participant_id: ParticipantId,
        position: SeatPosition,
    },
    /// Active participant without a seat
    Unseated { participant_id: ParticipantId },
    /// Two active tables share a number
    DuplicateTableNumber { table_number: u32 },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::SeatConflict {
                position,
                participants,
            } => write!(
                f,
                "seat {} at table {} held by {:?}",
                position.seat_number, position.table_id, participants
            ),
            InvariantViolation::InvalidSeat {
                participant_id,
                position,
            } => write!(
                f,
                "player {} seated at invalid seat {} of table {}",
                participant_id, position.seat_number, position.table_id
            ),
            InvariantViolation::Unseated { participant_id } => {
                write!(f, "player {participant_id} has no seat")
            }
            InvariantViolation::DuplicateTableNumber { table_number } => {
                write!(f, "table number {table_number} used by several active tables")
            }
        }
    }
}

/// Check every seating rule, returning all violations found
pub fn check(tournament: &Tournament) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    let mut by_seat: BTreeMap<(i64, u32), Vec<ParticipantId>> = BTreeMap::new();
    for participant in tournament.participants.iter().filter(|p| !p.eliminated) {
        match participant.seat {
            None => violations.push(InvariantViolation::Unseated {
                participant_id: participant.id,
            }),
            Some(position) if !is_valid_position(tournament, position) => {
                violations.push(InvariantViolation::InvalidSeat {
                    participant_id: participant.id,
                    position,
                });
            }
            Some(position) => by_seat
                .entry((position.table_id, position.seat_number))
                .or_default()
                .push(participant.id),
        }
    }

    for ((table_id, seat_number), participants) in by_seat {
        if participants.len() > 1 {
            violations.push(InvariantViolation::SeatConflict {
                position: SeatPosition::new(table_id, seat_number),
                participants,
            });
        }
    }

    let mut numbers: HashMap<u32, usize> = HashMap::new();
    for table in tournament.tables.iter().filter(|t| t.is_active()) {
        *numbers.entry(table.table_number).or_default() += 1;
    }
    let mut duplicates: Vec<u32> = numbers
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(number, _)| number)
        .collect();
    duplicates.sort_unstable();
    violations.extend(
        duplicates
            .into_iter()
            .map(|table_number| InvariantViolation::DuplicateTableNumber { table_number }),
    );

    violations
}
