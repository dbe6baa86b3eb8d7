//! Seat allocator: initial random seating and late-arrival placement.

use super::{
    errors::{SeatingError, SeatingResult},
    lock::SeatLockRegistry,
    models::{ParticipantId, SeatAssignment, SeatPosition, TableId, Tournament},
};
use rand::{Rng, seq::SliceRandom};
use std::collections::HashSet;

/// Seat allocator
pub struct SeatAllocator;

impl SeatAllocator {
    /// Randomly seat every non-eliminated participant.
    ///
    /// Locked participants with a valid seat keep it and are listed first.
    /// Everyone else is unseated, shuffled, then dealt into the active tables
    /// in table-number order, lowest seat first, skipping occupied seats.
    /// Players left over once every seat is taken go to overflow tables.
    ///
    /// # Arguments
    ///
    /// * `tournament` - Snapshot to seat
    /// * `rng` - Source for the shuffle
    ///
    /// # Returns
    ///
    /// * `SeatingResult<(Tournament, Vec<SeatAssignment>)>` - New snapshot and seat list
    pub fn initial_random_seat<R: Rng + ?Sized>(
        mut tournament: Tournament,
        rng: &mut R,
    ) -> SeatingResult<(Tournament, Vec<SeatAssignment>)> {
        let mut taken: HashSet<SeatPosition> = HashSet::new();
        let mut kept = Vec::new();
        let mut to_seat = Vec::new();

        for idx in 0..tournament.participants.len() {
            let participant = &tournament.participants[idx];
            if participant.eliminated {
                continue;
            }
            let keep = !SeatLockRegistry::is_movable(participant)
                && participant
                    .seat
                    .is_some_and(|s| is_valid_position(&tournament, s) && !taken.contains(&s));
            if keep {
                if let Some(seat) = participant.seat {
                    taken.insert(seat);
                }
                kept.push(participant.id);
            } else {
                to_seat.push(participant.id);
                tournament.participants[idx].seat = None;
            }
        }

        to_seat.shuffle(rng);

        let mut assignments: Vec<SeatAssignment> = kept
            .iter()
            .filter_map(|&id| tournament.assignment_for(id))
            .collect();

        let mut queue = to_seat.into_iter().peekable();
        let tables: Vec<(TableId, u32)> = tournament
            .active_tables()
            .iter()
            .map(|t| (t.id, t.max_seats))
            .collect();

        'tables: for (table_id, max_seats) in tables {
            for seat_number in 1..=max_seats {
                if queue.peek().is_none() {
                    break 'tables;
                }
                let position = SeatPosition::new(table_id, seat_number);
                if !tournament.is_seat_free(position) {
                    continue;
                }
                if let Some(id) = queue.next() {
                    if let Some(assignment) = place(&mut tournament, id, position) {
                        assignments.push(assignment);
                    }
                }
            }
        }

        for id in queue {
            assignments.push(place_late(&mut tournament, id)?);
        }

        log::info!(
            "Seated {} players across {} tables in tournament {}",
            assignments.len(),
            tournament.active_table_count(),
            tournament.id
        );

        Ok((tournament, assignments))
    }

    /// Seat a late arrival.
    ///
    /// The player goes to the active table with the fewest occupants that still
    /// has room (ties to the lowest table number), at its lowest free seat. When
    /// every table is full, one new table numbered one past the highest active
    /// number is opened and the player takes seat 1.
    ///
    /// Already-seated players keep their seat; eliminated players get `None`.
    pub fn assign_late_player(
        mut tournament: Tournament,
        participant_id: ParticipantId,
    ) -> SeatingResult<(Tournament, Option<SeatAssignment>)> {
        let participant = tournament
            .participant(participant_id)
            .ok_or(SeatingError::ParticipantNotFound(participant_id))?;

        if participant.eliminated {
            return Ok((tournament, None));
        }

        if has_valid_seat(&tournament, participant_id) {
            let existing = tournament.assignment_for(participant_id);
            return Ok((tournament, existing));
        }

        if let Some(p) = tournament.participant_mut(participant_id) {
            p.seat = None;
        }
        let assignment = place_late(&mut tournament, participant_id)?;
        Ok((tournament, Some(assignment)))
    }

    /// Seat every non-eliminated participant lacking a valid seat.
    ///
    /// A seat is invalid when it is missing, points at a closed or unknown
    /// table, is out of range, or collides with an earlier participant.
    pub fn seat_stragglers(
        mut tournament: Tournament,
    ) -> SeatingResult<(Tournament, Vec<SeatAssignment>)> {
        let mut claimed: HashSet<SeatPosition> = HashSet::new();
        let mut stragglers = Vec::new();

        // Locked players claim first so a collision never unseats them
        let mut order: Vec<usize> = (0..tournament.participants.len()).collect();
        order.sort_by_key(|&i| !tournament.participants[i].locked);

        for idx in order {
            let participant = &tournament.participants[idx];
            if participant.eliminated {
                continue;
            }
            match participant.seat {
                Some(seat) if is_valid_position(&tournament, seat) && claimed.insert(seat) => {}
                _ => stragglers.push(participant.id),
            }
        }

        let mut assignments = Vec::with_capacity(stragglers.len());
        for id in stragglers {
            if let Some(p) = tournament.participant_mut(id) {
                p.seat = None;
            }
            assignments.push(place_late(&mut tournament, id)?);
        }

        if !assignments.is_empty() {
            log::debug!(
                "Seated {} unseated players in tournament {}",
                assignments.len(),
                tournament.id
            );
        }

        Ok((tournament, assignments))
    }
}

/// Whether a seat pair points at an active table and an in-range seat
pub(crate) fn is_valid_position(tournament: &Tournament, position: SeatPosition) -> bool {
    tournament
        .table(position.table_id)
        .is_some_and(|t| t.is_active() && (1..=t.max_seats).contains(&position.seat_number))
}

/// Whether the participant holds a valid seat nobody else claims
pub(crate) fn has_valid_seat(tournament: &Tournament, participant_id: ParticipantId) -> bool {
    let Some(seat) = tournament.participant(participant_id).and_then(|p| p.seat) else {
        return false;
    };
    is_valid_position(tournament, seat)
        && tournament
            .participants
            .iter()
            .filter(|p| !p.eliminated && p.seat == Some(seat))
            .count()
            == 1
}

fn place(
    tournament: &mut Tournament,
    participant_id: ParticipantId,
    position: SeatPosition,
) -> Option<SeatAssignment> {
    tournament.participant_mut(participant_id)?.seat = Some(position);
    tournament.assignment_for(participant_id)
}

/// Late-arrival placement; the participant must currently be unseated.
pub(crate) fn place_late(
    tournament: &mut Tournament,
    participant_id: ParticipantId,
) -> SeatingResult<SeatAssignment> {
    let occupancy = tournament.occupancy_map();
    let target = tournament
        .active_tables()
        .into_iter()
        .filter(|t| occupancy.get(&t.id).copied().unwrap_or(0) < t.max_seats as usize)
        .min_by_key(|t| (occupancy.get(&t.id).copied().unwrap_or(0), t.table_number))
        .map(|t| t.id);

    let position = match target.and_then(|id| {
        tournament
            .lowest_free_seat(id)
            .map(|seat| SeatPosition::new(id, seat))
    }) {
        Some(position) => position,
        None => {
            let table_number = tournament.next_table_number();
            let table_id = tournament
                .open_table(table_number)
                .ok_or(SeatingError::NoCapacity(tournament.id))?;
            log::info!(
                "Opened overflow table {} in tournament {}",
                table_number,
                tournament.id
            );
            SeatPosition::new(table_id, 1)
        }
    };

    place(tournament, participant_id, position)
        .ok_or(SeatingError::ParticipantNotFound(participant_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seating::models::{Participant, Table};
    use rand::{SeedableRng, rngs::StdRng};

    fn tournament_with(tables: &[(i64, u32)], seats: u32, players: usize) -> Tournament {
        let mut t = Tournament::new(1, "t", seats);
        for &(id, number) in tables {
            t.tables.push(Table::new(id, number, seats));
        }
        for i in 0..players {
            t.participants
                .push(Participant::new(100 + i as i64, format!("p{i}"), 1000));
        }
        t
    }

    #[test]
    fn test_initial_seat_fills_tables_in_order() {
        let t = tournament_with(&[(1, 1), (2, 2)], 4, 6);
        let mut rng = StdRng::seed_from_u64(3);

        let (t, assignments) = SeatAllocator::initial_random_seat(t, &mut rng).unwrap();

        assert_eq!(assignments.len(), 6);
        assert_eq!(t.occupancy(1), 4);
        assert_eq!(t.occupancy(2), 2);
        let seats: Vec<u32> = t
            .occupants(2)
            .iter()
            .map(|p| p.seat.unwrap().seat_number)
            .collect();
        assert_eq!(seats, vec![1, 2]);
    }

    #[test]
    fn test_initial_seat_is_reproducible_with_seed() {
        let base = tournament_with(&[(1, 1), (2, 2)], 5, 9);

        let mut first = StdRng::seed_from_u64(11);
        let mut second = StdRng::seed_from_u64(11);
        let (_, a) = SeatAllocator::initial_random_seat(base.clone(), &mut first).unwrap();
        let (_, b) = SeatAllocator::initial_random_seat(base, &mut second).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_initial_seat_keeps_locked_players() {
        let mut t = tournament_with(&[(1, 1), (2, 2)], 3, 4);
        t.participants[0] = Participant::new(100, "pinned", 1000)
            .seated_at(2, 3)
            .with_lock();

        let (t, assignments) =
            SeatAllocator::initial_random_seat(t, &mut StdRng::seed_from_u64(5)).unwrap();

        assert_eq!(assignments[0].participant_id, 100);
        assert_eq!(t.participant(100).unwrap().seat, Some(SeatPosition::new(2, 3)));
        assert_eq!(t.occupancy(1), 3);
    }

    #[test]
    fn test_initial_seat_overflows_when_tables_too_small() {
        let t = tournament_with(&[(1, 1)], 2, 3);
        let (t, assignments) =
            SeatAllocator::initial_random_seat(t, &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(assignments.len(), 3);
        assert_eq!(t.active_table_count(), 2);
        assert_eq!(assignments[2].table_number, 2);
        assert_eq!(assignments[2].seat_number, 1);
    }

    #[test]
    fn test_late_player_goes_to_emptiest_table() {
        let mut t = tournament_with(&[(1, 1), (2, 2), (3, 3)], 9, 0);
        for (i, table) in [1, 1, 2, 3, 3].into_iter().enumerate() {
            t.participants.push(
                Participant::new(i as i64 + 1, "x", 100).seated_at(table, i as u32 + 1),
            );
        }
        t.participants.push(Participant::new(50, "late", 100));

        let (t, assignment) = SeatAllocator::assign_late_player(t, 50).unwrap();
        let assignment = assignment.unwrap();

        assert_eq!(assignment.table_number, 2);
        assert_eq!(assignment.seat_number, 1);
        assert_eq!(t.occupancy(2), 2);
    }

    #[test]
    fn test_late_player_tie_breaks_by_table_number() {
        let mut t = tournament_with(&[(1, 2), (2, 1)], 9, 0);
        t.participants.push(Participant::new(50, "late", 100));

        let (_, assignment) = SeatAllocator::assign_late_player(t, 50).unwrap();

        assert_eq!(assignment.unwrap().table_number, 1);
    }

    #[test]
    fn test_late_player_opens_overflow_table_when_full() {
        let mut t = tournament_with(&[(1, 1), (2, 2)], 2, 0);
        let mut id = 1;
        for table in [1, 2] {
            for seat in 1..=2 {
                t.participants
                    .push(Participant::new(id, "x", 100).seated_at(table, seat));
                id += 1;
            }
        }
        t.participants.push(Participant::new(50, "late", 100));

        let (t, assignment) = SeatAllocator::assign_late_player(t, 50).unwrap();
        let assignment = assignment.unwrap();

        assert_eq!(assignment.table_number, 3);
        assert_eq!(assignment.seat_number, 1);
        assert_eq!(t.active_table_count(), 3);
    }

    #[test]
    fn test_late_player_already_seated_keeps_seat() {
        let mut t = tournament_with(&[(1, 1)], 9, 0);
        t.participants.push(Participant::new(7, "x", 100).seated_at(1, 5));

        let (_, assignment) = SeatAllocator::assign_late_player(t, 7).unwrap();

        assert_eq!(assignment.unwrap().seat_number, 5);
    }

    #[test]
    fn test_late_player_eliminated_is_not_seated() {
        let mut t = tournament_with(&[(1, 1)], 9, 0);
        let mut out = Participant::new(7, "x", 0);
        out.eliminated = true;
        t.participants.push(out);

        let (_, assignment) = SeatAllocator::assign_late_player(t, 7).unwrap();

        assert!(assignment.is_none());
    }

    #[test]
    fn test_late_player_unknown_is_not_found() {
        let t = tournament_with(&[(1, 1)], 9, 0);
        let err = SeatAllocator::assign_late_player(t, 404).unwrap_err();
        assert!(matches!(err, SeatingError::ParticipantNotFound(404)));
    }

    #[test]
    fn test_stragglers_on_closed_table_are_reseated() {
        let mut t = tournament_with(&[(1, 1), (2, 2)], 9, 0);
        t.participants.push(Participant::new(1, "a", 100).seated_at(1, 1));
        t.participants.push(Participant::new(2, "b", 100).seated_at(2, 1));
        t.participants.push(Participant::new(3, "c", 100).seated_at(1, 1));
        t.table_mut(2).unwrap().close();

        let (t, assignments) = SeatAllocator::seat_stragglers(t).unwrap();

        assert_eq!(assignments.len(), 2);
        assert_eq!(t.occupancy(1), 3);
        assert_eq!(t.participant(1).unwrap().seat, Some(SeatPosition::new(1, 1)));
    }
}
