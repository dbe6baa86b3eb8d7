//! Repository trait definitions for the tournament aggregate.
//!
//! Provides the load/save seam the seating manager depends on, a PostgreSQL
//! implementation, and an in-memory implementation for tests and embedding.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::seating::{
    ParticipantId, SeatingError, SeatingResult, SeatPosition, Table, TableStatus, Tournament,
    TournamentId, models::Participant,
};

/// Trait for tournament aggregate storage
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Load the full aggregate: settings, every table, every participant
    async fn load_tournament(&self, tournament_id: TournamentId) -> SeatingResult<Tournament>;

    /// Persist the full aggregate. Either every change is stored or none is.
    async fn save_tournament(&self, tournament: &Tournament) -> SeatingResult<()>;

    /// Resolve which tournament a participant belongs to
    async fn find_tournament_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> SeatingResult<TournamentId>;
}

/// PostgreSQL implementation of `TournamentRepository`
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn column_u32(value: i32, column: &str) -> SeatingResult<u32> {
    u32::try_from(value)
        .map_err(|_| SeatingError::Persistence(format!("Negative value {value} in {column}")))
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn load_tournament(&self, tournament_id: TournamentId) -> SeatingResult<Tournament> {
        let row = sqlx::query(
            r#"
            SELECT id, name, seats_per_table
            FROM seating_tournaments
            WHERE id = $1
            "#,
        )
        .bind(tournament_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SeatingError::TournamentNotFound(tournament_id))?;

        let mut tournament = Tournament::new(
            row.get("id"),
            row.get::<String, _>("name"),
            column_u32(row.get("seats_per_table"), "seats_per_table")?,
        );

        let table_rows = sqlx::query(
            r#"
            SELECT id, table_number, max_seats, status, created_at, closed_at
            FROM seating_tables
            WHERE tournament_id = $1
            ORDER BY id
            "#,
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        for r in table_rows {
            let status: String = r.get("status");
            tournament.tables.push(Table {
                id: r.get("id"),
                table_number: column_u32(r.get("table_number"), "table_number")?,
                max_seats: column_u32(r.get("max_seats"), "max_seats")?,
                status: status.parse::<TableStatus>().map_err(SeatingError::Persistence)?,
                created_at: r.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
                closed_at: r
                    .get::<Option<chrono::NaiveDateTime>, _>("closed_at")
                    .map(|dt| dt.and_utc()),
            });
        }

        let participant_rows = sqlx::query(
            r#"
            SELECT id, name, eliminated, locked, table_id, seat_number, current_stack
            FROM seating_participants
            WHERE tournament_id = $1
            ORDER BY id
            "#,
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        for r in participant_rows {
            let table_id: Option<i64> = r.get("table_id");
            let seat_number: Option<i32> = r.get("seat_number");
            let seat = match (table_id, seat_number) {
                (Some(table_id), Some(seat)) => {
                    Some(SeatPosition::new(table_id, column_u32(seat, "seat_number")?))
                }
                _ => None,
            };
            tournament.participants.push(Participant {
                id: r.get("id"),
                name: r.get("name"),
                eliminated: r.get("eliminated"),
                locked: r.get("locked"),
                seat,
                current_stack: r.get("current_stack"),
            });
        }

        Ok(tournament)
    }

    async fn save_tournament(&self, tournament: &Tournament) -> SeatingResult<()> {
        // Dropping the transaction on any error rolls the whole save back
        let mut tx = self.pool.begin().await?;

        let updated =
            sqlx::query("UPDATE seating_tournaments SET seats_per_table = $1 WHERE id = $2")
                .bind(tournament.seats_per_table as i32)
                .bind(tournament.id)
                .execute(&mut *tx)
                .await?;
        if updated.rows_affected() == 0 {
            return Err(SeatingError::TournamentNotFound(tournament.id));
        }

        // Closed tables first so a reused table number is free before it is claimed
        let mut tables: Vec<&Table> = tournament.tables.iter().collect();
        tables.sort_by_key(|t| (t.is_active(), t.id));

        for table in tables {
            sqlx::query(
                r#"
                INSERT INTO seating_tables
                    (tournament_id, id, table_number, max_seats, status, created_at, closed_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (tournament_id, id) DO UPDATE
                SET table_number = EXCLUDED.table_number,
                    max_seats = EXCLUDED.max_seats,
                    status = EXCLUDED.status,
                    closed_at = EXCLUDED.closed_at
                "#,
            )
            .bind(tournament.id)
            .bind(table.id)
            .bind(table.table_number as i32)
            .bind(table.max_seats as i32)
            .bind(table.status.to_string())
            .bind(table.created_at.naive_utc())
            .bind(table.closed_at.map(|dt| dt.naive_utc()))
            .execute(&mut *tx)
            .await?;
        }

        for participant in &tournament.participants {
            sqlx::query(
                r#"
                INSERT INTO seating_participants
                    (id, tournament_id, name, eliminated, locked,
                     table_id, seat_number, current_stack)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (id) DO UPDATE
                SET name = EXCLUDED.name,
                    eliminated = EXCLUDED.eliminated,
                    locked = EXCLUDED.locked,
                    table_id = EXCLUDED.table_id,
                    seat_number = EXCLUDED.seat_number,
                    current_stack = EXCLUDED.current_stack
                "#,
            )
            .bind(participant.id)
            .bind(tournament.id)
            .bind(&participant.name)
            .bind(participant.eliminated)
            .bind(participant.locked)
            .bind(participant.seat.map(|s| s.table_id))
            .bind(participant.seat.map(|s| s.seat_number as i32))
            .bind(participant.current_stack)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_tournament_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> SeatingResult<TournamentId> {
        let row = sqlx::query("SELECT tournament_id FROM seating_participants WHERE id = $1")
            .bind(participant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(SeatingError::ParticipantNotFound(participant_id))?;
        Ok(row.get("tournament_id"))
    }
}

/// In-memory implementation of `TournamentRepository`.
///
/// Saves replace the whole aggregate under one write lock, so readers see
/// either the previous or the next state.
#[derive(Default)]
pub struct InMemoryTournamentRepository {
    tournaments: RwLock<HashMap<TournamentId, Tournament>>,
    fail_next_save: AtomicBool,
}

impl InMemoryTournamentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a tournament
    pub async fn insert(&self, tournament: Tournament) {
        self.tournaments
            .write()
            .await
            .insert(tournament.id, tournament);
    }

    /// Make the next save fail without storing anything
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl TournamentRepository for InMemoryTournamentRepository {
    async fn load_tournament(&self, tournament_id: TournamentId) -> SeatingResult<Tournament> {
        self.tournaments
            .read()
            .await
            .get(&tournament_id)
            .cloned()
            .ok_or(SeatingError::TournamentNotFound(tournament_id))
    }

    async fn save_tournament(&self, tournament: &Tournament) -> SeatingResult<()> {
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(SeatingError::Persistence(format!(
                "save of tournament {} rejected",
                tournament.id
            )));
        }
        let mut tournaments = self.tournaments.write().await;
        if !tournaments.contains_key(&tournament.id) {
            return Err(SeatingError::TournamentNotFound(tournament.id));
        }
        tournaments.insert(tournament.id, tournament.clone());
        Ok(())
    }

    async fn find_tournament_for_participant(
        &self,
        participant_id: ParticipantId,
    ) -> SeatingResult<TournamentId> {
        self.tournaments
            .read()
            .await
            .values()
            .find(|t| t.participant(participant_id).is_some())
            .map(|t| t.id)
            .ok_or(SeatingError::ParticipantNotFound(participant_id))
    }
}
