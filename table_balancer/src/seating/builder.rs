//! Table set builder: sizes and opens the initial set of tables.

use super::{
    allocator::SeatAllocator,
    errors::{SeatingError, SeatingResult},
    lock::SeatLockRegistry,
    models::{SeatAssignment, Table, TableId, Tournament},
};
use rand::Rng;

/// Table set builder
pub struct TableSetBuilder;

impl TableSetBuilder {
    /// Number of tables needed to seat `player_count` players, never less than one
    pub fn table_count_for(player_count: usize, seats_per_table: u32) -> SeatingResult<usize> {
        if seats_per_table == 0 {
            return Err(SeatingError::InvalidConfiguration(
                "Seats per table must be greater than zero".to_string(),
            ));
        }
        Ok(player_count.div_ceil(seats_per_table as usize).max(1))
    }

    /// Replace the tournament's active tables with a fresh set numbered `1..=count`.
    ///
    /// Previously active tables are closed, not deleted. Their occupants lose
    /// their seat (and any lock) and must be seated again.
    ///
    /// # Arguments
    ///
    /// * `tournament` - Snapshot to rebuild
    /// * `active_player_count` - Players to size for
    /// * `seats_per_table` - Seats at each new table
    ///
    /// # Returns
    ///
    /// * `SeatingResult<(Tournament, Vec<Table>)>` - New snapshot and the new tables
    ///
    /// # Errors
    ///
    /// * `SeatingError::InvalidConfiguration` - `seats_per_table` is zero
    /// * `SeatingError::NoCapacity` - Table ids exhausted
    pub fn create_tables(
        mut tournament: Tournament,
        active_player_count: usize,
        seats_per_table: u32,
    ) -> SeatingResult<(Tournament, Vec<Table>)> {
        let table_count = Self::table_count_for(active_player_count, seats_per_table)?;

        let closing: Vec<TableId> = tournament
            .tables
            .iter()
            .filter(|t| t.is_active())
            .map(|t| t.id)
            .collect();
        for table_id in &closing {
            SeatLockRegistry::release_table(&mut tournament, *table_id);
            for participant in tournament
                .participants
                .iter_mut()
                .filter(|p| !p.eliminated && p.seat.is_some_and(|s| s.table_id == *table_id))
            {
                participant.seat = None;
            }
            if let Some(table) = tournament.table_mut(*table_id) {
                table.close();
            }
        }

        tournament.seats_per_table = seats_per_table;
        let mut created = Vec::with_capacity(table_count);
        for number in 1..=table_count as u32 {
            let id = tournament
                .open_table(number)
                .ok_or(SeatingError::NoCapacity(tournament.id))?;
            if let Some(table) = tournament.table(id) {
                created.push(table.clone());
            }
        }

        log::info!(
            "Created {} tables of {} seats for {} players in tournament {} ({} closed)",
            table_count,
            seats_per_table,
            active_player_count,
            tournament.id,
            closing.len()
        );

        Ok((tournament, created))
    }

    /// Build a table set for the current field and randomly seat everyone
    pub fn build_and_seat<R: Rng + ?Sized>(
        tournament: Tournament,
        rng: &mut R,
    ) -> SeatingResult<(Tournament, Vec<SeatAssignment>)> {
        let players = tournament.active_player_count();
        let seats = tournament.seats_per_table;
        let (tournament, _) = Self::create_tables(tournament, players, seats)?;
        SeatAllocator::initial_random_seat(tournament, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seating::models::{Participant, TableStatus};
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_table_count_rounds_up() {
        assert_eq!(TableSetBuilder::table_count_for(0, 9).unwrap(), 1);
        assert_eq!(TableSetBuilder::table_count_for(9, 9).unwrap(), 1);
        assert_eq!(TableSetBuilder::table_count_for(10, 9).unwrap(), 2);
        assert_eq!(TableSetBuilder::table_count_for(27, 9).unwrap(), 3);
    }

    #[test]
    fn test_zero_seats_is_invalid() {
        let t = Tournament::new(1, "t", 0);
        let err = TableSetBuilder::create_tables(t, 10, 0).unwrap_err();
        assert!(matches!(err, SeatingError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_create_tables_numbers_from_one() {
        let t = Tournament::new(1, "t", 10);
        let (t, tables) = TableSetBuilder::create_tables(t, 25, 10).unwrap();

        let numbers: Vec<u32> = tables.iter().map(|t| t.table_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(tables.iter().all(|t| t.max_seats == 10));
        assert_eq!(t.active_table_count(), 3);
    }

    #[test]
    fn test_create_tables_closes_previous_set() {
        let mut t = Tournament::new(1, "t", 6);
        t.tables.push(Table::new(1, 1, 6));
        t.tables.push(Table::new(2, 2, 6));
        t.participants
            .push(Participant::new(5, "a", 100).seated_at(2, 4).with_lock());

        let (t, tables) = TableSetBuilder::create_tables(t, 1, 6).unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].id, 3);
        assert_eq!(t.tables.len(), 3);
        assert_eq!(t.table(1).unwrap().status, TableStatus::Closed);
        assert_eq!(t.table(2).unwrap().status, TableStatus::Closed);
        let p = t.participant(5).unwrap();
        assert!(p.seat.is_none());
        assert!(!p.locked);
    }

    #[test]
    fn test_build_and_seat_seats_everyone() {
        let mut t = Tournament::new(1, "t", 8);
        for i in 0..20 {
            t.participants.push(Participant::new(i, format!("p{i}"), 1000));
        }

        let (t, assignments) =
            TableSetBuilder::build_and_seat(t, &mut StdRng::seed_from_u64(8)).unwrap();

        assert_eq!(assignments.len(), 20);
        assert_eq!(t.active_table_count(), 3);
        assert_eq!(t.occupancy_map().values().sum::<usize>(), 20);
    }
}
