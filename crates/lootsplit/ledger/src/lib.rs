//! Lootsplit ledger: the item lifecycle state machine, profit ledger views
//! and the configuration and logging setup shared by front ends.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
pub mod lifecycle;
pub mod profits;
pub mod settings;
pub mod telemetry;

pub use error::{ErrorCode, LootError, LootResult};
pub use lifecycle::{LifecycleManager, SaleOutcome};
pub use profits::{build_leaderboard, Leaderboard, LeaderboardEntry, ProfitLedger};
pub use settings::{AllocationConfig, ConfigError, LoggingConfig, LootConfig, SalePolicy};
pub use telemetry::init_tracing;
