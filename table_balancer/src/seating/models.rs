//! Seating data models: the tournament aggregate and the records produced by
//! seating and balancing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tournament ID type
pub type TournamentId = i64;

/// Table ID type (unique within a tournament, never reused)
pub type TableId = i64;

/// Participant ID type
pub type ParticipantId = i64;

/// Table status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    /// Eligible for seating
    Active,
    /// Broken or replaced; retained for audit
    Closed,
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStatus::Active => write!(f, "active"),
            TableStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for TableStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TableStatus::Active),
            "closed" => Ok(TableStatus::Closed),
            other => Err(format!("Unknown table status: {other}")),
        }
    }
}

/// A physical table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: TableId,
    /// Ordinal shown to players, unique among active tables
    pub table_number: u32,
    pub max_seats: u32,
    pub status: TableStatus,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Table {
    /// Create a new active table
    pub fn new(id: TableId, table_number: u32, max_seats: u32) -> Self {
        Self {
            id,
            table_number,
            max_seats,
            status: TableStatus::Active,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TableStatus::Active
    }

    /// Close the table. Closed tables are never reopened.
    pub fn close(&mut self) {
        if self.is_active() {
            self.status = TableStatus::Closed;
            self.closed_at = Some(Utc::now());
        }
    }
}

/// Table and seat pair a participant occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatPosition {
    pub table_id: TableId,
    /// 1-indexed seat number
    pub seat_number: u32,
}

impl SeatPosition {
    pub fn new(table_id: TableId, seat_number: u32) -> Self {
        Self {
            table_id,
            seat_number,
        }
    }
}

/// Tournament participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub eliminated: bool,
    /// Pinned to the current seat; automatic seating leaves the player alone
    pub locked: bool,
    pub seat: Option<SeatPosition>,
    pub current_stack: i64,
}

impl Participant {
    /// Create a new unseated participant
    pub fn new(id: ParticipantId, name: impl Into<String>, current_stack: i64) -> Self {
        Self {
            id,
            name: name.into(),
            eliminated: false,
            locked: false,
            seat: None,
            current_stack,
        }
    }

    /// Builder-style helper to place a participant
    pub fn seated_at(mut self, table_id: TableId, seat_number: u32) -> Self {
        self.seat = Some(SeatPosition::new(table_id, seat_number));
        self
    }

    pub fn with_lock(mut self) -> Self {
        self.locked = true;
        self
    }
}

/// Tournament aggregate: everything seating reads and writes in one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub seats_per_table: u32,
    pub tables: Vec<Table>,
    pub participants: Vec<Participant>,
}

impl Tournament {
    /// Create an empty tournament
    pub fn new(id: TournamentId, name: impl Into<String>, seats_per_table: u32) -> Self {
        Self {
            id,
            name: name.into(),
            seats_per_table,
            tables: Vec::new(),
            participants: Vec::new(),
        }
    }

    /// Active tables ordered by table number
    pub fn active_tables(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self.tables.iter().filter(|t| t.is_active()).collect();
        tables.sort_by_key(|t| t.table_number);
        tables
    }

    pub fn active_table_count(&self) -> usize {
        self.tables.iter().filter(|t| t.is_active()).count()
    }

    pub fn table(&self, table_id: TableId) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == table_id)
    }

    pub fn table_mut(&mut self, table_id: TableId) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == table_id)
    }

    pub fn active_table_by_number(&self, table_number: u32) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.is_active() && t.table_number == table_number)
    }

    pub fn participant(&self, participant_id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    pub fn participant_mut(&mut self, participant_id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == participant_id)
    }

    /// Number of participants still in the tournament
    pub fn active_player_count(&self) -> usize {
        self.participants.iter().filter(|p| !p.eliminated).count()
    }

    /// Non-eliminated participants seated at the given table, ordered by seat
    pub fn occupants(&self, table_id: TableId) -> Vec<&Participant> {
        let mut occupants: Vec<&Participant> = self
            .participants
            .iter()
            .filter(|p| !p.eliminated && p.seat.is_some_and(|s| s.table_id == table_id))
            .collect();
        occupants.sort_by_key(|p| p.seat.map(|s| s.seat_number));
        occupants
    }

    pub fn occupancy(&self, table_id: TableId) -> usize {
        self.participants
            .iter()
            .filter(|p| !p.eliminated && p.seat.is_some_and(|s| s.table_id == table_id))
            .count()
    }

    /// Occupancy per active table id
    pub fn occupancy_map(&self) -> HashMap<TableId, usize> {
        let mut map: HashMap<TableId, usize> = self
            .tables
            .iter()
            .filter(|t| t.is_active())
            .map(|t| (t.id, 0))
            .collect();
        for seat in self
            .participants
            .iter()
            .filter(|p| !p.eliminated)
            .filter_map(|p| p.seat)
        {
            if let Some(count) = map.get_mut(&seat.table_id) {
                *count += 1;
            }
        }
        map
    }

    /// Non-eliminated participant sitting in the given seat, if any
    pub fn occupant_of(&self, position: SeatPosition) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| !p.eliminated && p.seat == Some(position))
    }

    pub fn is_seat_free(&self, position: SeatPosition) -> bool {
        self.occupant_of(position).is_none()
    }

    /// Lowest unoccupied seat number at an active table
    pub fn lowest_free_seat(&self, table_id: TableId) -> Option<u32> {
        let table = self.table(table_id).filter(|t| t.is_active())?;
        (1..=table.max_seats).find(|&seat| self.is_seat_free(SeatPosition::new(table_id, seat)))
    }

    /// Next unused table id; ids are never reused, even after a table closes
    pub fn next_table_id(&self) -> Option<TableId> {
        match self.tables.iter().map(|t| t.id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        }
    }

    /// Next table number for an overflow table: one past the highest active number
    pub fn next_table_number(&self) -> u32 {
        self.tables
            .iter()
            .filter(|t| t.is_active())
            .map(|t| t.table_number)
            .max()
            .map_or(1, |n| n + 1)
    }

    /// Open a new active table sized to `seats_per_table`.
    ///
    /// Returns `None` once the table id space is exhausted.
    pub fn open_table(&mut self, table_number: u32) -> Option<TableId> {
        let id = self.next_table_id()?;
        self.tables
            .push(Table::new(id, table_number, self.seats_per_table));
        Some(id)
    }

    /// Seat assignment record for a seated participant
    pub fn assignment_for(&self, participant_id: ParticipantId) -> Option<SeatAssignment> {
        let participant = self.participant(participant_id)?;
        let seat = participant.seat?;
        let table = self.table(seat.table_id)?;
        Some(SeatAssignment {
            participant_id,
            table_id: table.id,
            table_number: table.table_number,
            seat_number: seat.seat_number,
        })
    }
}

/// Result of placing a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatAssignment {
    pub participant_id: ParticipantId,
    pub table_id: TableId,
    pub table_number: u32,
    pub seat_number: u32,
}

/// A single relocation performed by balancing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub participant_id: ParticipantId,
    pub from_table: u32,
    pub from_seat: u32,
    pub to_table: u32,
    pub to_seat: u32,
}

impl std::fmt::Display for Movement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "player {}: table {} seat {} -> table {} seat {}",
            self.participant_id, self.from_table, self.from_seat, self.to_table, self.to_seat
        )
    }
}

/// Which balancing branch ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceAction {
    /// Everyone merged onto the lowest-numbered table
    Consolidate,
    /// One table closed and its occupants redistributed
    Break,
    /// Occupants moved between existing tables
    Equalize,
    /// Nothing to do
    None,
}

/// Outcome of a balancing run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResult {
    pub success: bool,
    pub action: BalanceAction,
    pub table_broken: bool,
    /// Table numbers closed during this run, in closing order
    pub broken_table_numbers: Vec<u32>,
    pub movements: Vec<Movement>,
    pub message: String,
}

impl BalanceResult {
    /// Successful run that changed nothing
    pub fn unchanged(message: impl Into<String>) -> Self {
        Self {
            success: true,
            action: BalanceAction::None,
            table_broken: false,
            broken_table_numbers: Vec::new(),
            movements: Vec::new(),
            message: message.into(),
        }
    }

    /// First table closed, if any
    pub fn broken_table_number(&self) -> Option<u32> {
        self.broken_table_numbers.first().copied()
    }

    /// True if nothing moved and no table closed
    pub fn is_noop(&self) -> bool {
        self.movements.is_empty() && self.broken_table_numbers.is_empty()
    }

    /// Fold a later step into this result
    pub fn absorb(&mut self, step: BalanceResult) {
        if step.is_noop() {
            return;
        }
        if self.action == BalanceAction::None {
            self.action = step.action;
        }
        self.success &= step.success;
        self.table_broken |= step.table_broken;
        self.broken_table_numbers.extend(step.broken_table_numbers);
        self.movements.extend(step.movements);
        if self.message.is_empty() {
            self.message = step.message;
        } else {
            self.message = format!("{}; {}", self.message, step.message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tournament {
        let mut t = Tournament::new(1, "Friday Freezeout", 3);
        t.tables.push(Table::new(1, 1, 3));
        t.tables.push(Table::new(2, 2, 3));
        t.participants.push(Participant::new(10, "alice", 1500).seated_at(1, 1));
        t.participants.push(Participant::new(11, "bob", 1500).seated_at(1, 3));
        t.participants.push(Participant::new(12, "carol", 1500).seated_at(2, 1));
        t
    }

    #[test]
    fn test_lowest_free_seat_skips_occupied() {
        let t = sample();
        assert_eq!(t.lowest_free_seat(1), Some(2));
        assert_eq!(t.lowest_free_seat(2), Some(2));
    }

    #[test]
    fn test_eliminated_players_do_not_occupy_seats() {
        let mut t = sample();
        t.participant_mut(10).unwrap().eliminated = true;
        assert_eq!(t.occupancy(1), 1);
        assert_eq!(t.lowest_free_seat(1), Some(1));
        assert_eq!(t.active_player_count(), 2);
    }

    #[test]
    fn test_closed_table_has_no_free_seat() {
        let mut t = sample();
        t.table_mut(2).unwrap().close();
        assert_eq!(t.lowest_free_seat(2), None);
        assert_eq!(t.active_table_count(), 1);
        assert!(t.table(2).unwrap().closed_at.is_some());
    }

    #[test]
    fn test_next_table_number_ignores_closed_tables() {
        let mut t = sample();
        t.table_mut(2).unwrap().close();
        assert_eq!(t.next_table_number(), 2);
        assert_eq!(t.next_table_id(), Some(3));
    }

    #[test]
    fn test_table_status_round_trips_through_str() {
        assert_eq!("closed".parse::<TableStatus>(), Ok(TableStatus::Closed));
        assert_eq!(TableStatus::Active.to_string(), "active");
        assert!("broken".parse::<TableStatus>().is_err());
    }

    #[test]
    fn test_absorb_accumulates_steps() {
        let mut total = BalanceResult::unchanged("");
        total.absorb(BalanceResult {
            success: true,
            action: BalanceAction::Break,
            table_broken: true,
            broken_table_numbers: vec![3],
            movements: vec![],
            message: "Broke table 3".to_string(),
        });
        total.absorb(BalanceResult::unchanged("Already balanced"));
        assert_eq!(total.action, BalanceAction::Break);
        assert_eq!(total.broken_table_number(), Some(3));
        assert_eq!(total.message, "Broke table 3");
    }
}
