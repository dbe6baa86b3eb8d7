//! Read-only table layout projection for display.

use super::{
    errors::SeatingResult,
    models::{ParticipantId, SeatPosition, TableId, Tournament},
};
use serde::{Deserialize, Serialize};

/// One seat in a layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub seat_number: u32,
    pub occupied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<ParticipantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<i64>,
}

/// One active table in a layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub table_id: TableId,
    pub table_number: u32,
    pub occupied_count: usize,
    pub seats: Vec<SeatView>,
}

/// Layout reporter
pub struct LayoutReporter;

impl LayoutReporter {
    /// Project the active tables of a snapshot, ordered by table number
    pub fn get_layout(tournament: &Tournament) -> Vec<TableLayout> {
        tournament
            .active_tables()
            .into_iter()
            .map(|table| {
                let seats: Vec<SeatView> = (1..=table.max_seats)
                    .map(|seat_number| {
                        match tournament.occupant_of(SeatPosition::new(table.id, seat_number)) {
                            Some(p) => SeatView {
                                seat_number,
                                occupied: true,
                                participant_id: Some(p.id),
                                name: Some(p.name.clone()),
                                locked: Some(p.locked),
                                stack: Some(p.current_stack),
                            },
                            None => SeatView {
                                seat_number,
                                occupied: false,
                                participant_id: None,
                                name: None,
                                locked: None,
                                stack: None,
                            },
                        }
                    })
                    .collect();
                TableLayout {
                    table_id: table.id,
                    table_number: table.table_number,
                    occupied_count: seats.iter().filter(|s| s.occupied).count(),
                    seats,
                }
            })
            .collect()
    }

    /// Layout as JSON for display clients
    pub fn to_json(layout: &[TableLayout]) -> SeatingResult<String> {
        Ok(serde_json::to_string(layout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seating::models::{Participant, Table};

    fn sample() -> Tournament {
        let mut t = Tournament::new(1, "t", 3);
        t.tables.push(Table::new(1, 2, 3));
        t.tables.push(Table::new(2, 1, 3));
        t.tables.push(Table::new(3, 3, 3));
        t.table_mut(3).unwrap().close();
        t.participants
            .push(Participant::new(10, "alice", 2500).seated_at(1, 2).with_lock());
        let mut out = Participant::new(11, "bob", 0).seated_at(2, 1);
        out.eliminated = true;
        t.participants.push(out);
        t
    }

    #[test]
    fn test_layout_lists_active_tables_in_order() {
        let layout = LayoutReporter::get_layout(&sample());
        let numbers: Vec<u32> = layout.iter().map(|t| t.table_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert!(layout.iter().all(|t| t.seats.len() == 3));
    }

    #[test]
    fn test_layout_shows_occupant_details() {
        let layout = LayoutReporter::get_layout(&sample());
        let seat = &layout[1].seats[1];
        assert!(seat.occupied);
        assert_eq!(seat.participant_id, Some(10));
        assert_eq!(seat.name.as_deref(), Some("alice"));
        assert_eq!(seat.locked, Some(true));
        assert_eq!(seat.stack, Some(2500));
        assert_eq!(layout[1].occupied_count, 1);
    }

    #[test]
    fn test_eliminated_players_leave_seats_empty() {
        let layout = LayoutReporter::get_layout(&sample());
        assert!(!layout[0].seats[0].occupied);
        assert_eq!(layout[0].occupied_count, 0);
    }

    #[test]
    fn test_json_omits_empty_seat_details() {
        let json = LayoutReporter::to_json(&LayoutReporter::get_layout(&sample())).unwrap();
        assert!(json.contains("\"name\":\"alice\""));
        assert!(json.contains("{\"seat_number\":1,\"occupied\":false}"));
    }
}
