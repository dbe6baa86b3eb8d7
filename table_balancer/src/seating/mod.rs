//! Seating module for multi-table tournament table assignment and balancing.
//!
//! This module provides:
//! - Initial random seating and late-arrival placement
//! - Table set construction sized to the field
//! - Automatic balancing after eliminations (consolidate, break, equalize)
//! - Director overrides: direct moves and seat locks
//! - A per-table layout for display
//!
//! Every operation here is a transform over an owned [`Tournament`] snapshot;
//! [`SeatingManager`] loads the snapshot, runs the transform, and saves it back.
//!
//! ## Example
//!
//! ```no_run
//! use table_balancer::config::SeatingConfig;
//! use table_balancer::db::{Database, PgTournamentRepository};
//! use table_balancer::seating::SeatingManager;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let repository = Arc::new(PgTournamentRepository::new(db.pool().clone()));
//!     let seating = SeatingManager::new(repository, SeatingConfig::from_env()?);
//!
//!     seating.auto_assign_players(1).await?;
//!     let result = seating.record_elimination(42).await?;
//!     println!("{}", result.message);
//!
//!     Ok(())
//! }
//! ```

pub mod allocator;
pub mod balance;
pub mod builder;
pub mod errors;
pub mod invariants;
pub mod layout;
pub mod lock;
pub mod manager;
pub mod models;
pub mod overrides;
pub mod randomizer;

pub use allocator::SeatAllocator;
pub use balance::BalanceEngine;
pub use builder::TableSetBuilder;
pub use errors::{SeatingError, SeatingResult};
pub use invariants::InvariantViolation;
pub use layout::{LayoutReporter, SeatView, TableLayout};
pub use lock::SeatLockRegistry;
pub use manager::SeatingManager;
pub use models::{
    BalanceAction, BalanceResult, Movement, Participant, ParticipantId, SeatAssignment,
    SeatPosition, Table, TableId, TableStatus, Tournament, TournamentId,
};
pub use overrides::ManualOverride;
pub use randomizer::SeatRandomizer;
