//! # Table Balancer
//!
//! Seat assignment and table balancing for multi-table poker tournaments.
//!
//! Players are seated randomly when a tournament starts, late arrivals are
//! placed at the emptiest table, and after each elimination the table set is
//! rebalanced: consolidated when the field fits fewer tables, broken one table
//! at a time as it shrinks, and evened out so no two tables differ by more than
//! one player. Tournament directors can move players by hand and lock seats.
//!
//! ## Core Modules
//!
//! - [`seating`]: Seating models, algorithms, and the async [`SeatingManager`]
//! - [`db`]: PostgreSQL pool, tournament repository, and storage timeouts
//! - [`config`]: Environment-driven seating configuration
//!
//! ## Example
//!
//! ```
//! use table_balancer::seating::{BalanceEngine, Participant, TableSetBuilder, Tournament};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let mut tournament = Tournament::new(1, "Sunday Special", 9);
//! for id in 1..=20 {
//!     tournament.participants.push(Participant::new(id, format!("player{id}"), 1500));
//! }
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let (tournament, seats) = TableSetBuilder::build_and_seat(tournament, &mut rng).unwrap();
//! assert_eq!(seats.len(), 20);
//!
//! let (_, result) = BalanceEngine::rebalance(tournament, &mut rng, 64).unwrap();
//! assert!(result.movements.iter().all(|m| m.from_table != m.to_table));
//! ```

/// Seating configuration.
pub mod config;
pub use config::SeatingConfig;

/// Database connection pool and tournament storage.
pub mod db;

/// Seat assignment, balancing, and layout.
pub mod seating;
pub use seating::{SeatingError, SeatingManager, SeatingResult};
