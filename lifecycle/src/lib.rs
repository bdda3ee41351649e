//! Markt Lifecycle
//!
//! Month-end batch processing:
//! - the four monthly achievements derived from the transaction ledger
//! - the five-phase orchestrator (snapshot -> achievements -> liquidation
//!   -> balance reset -> token rollover) with a resume checkpoint
//! - the scheduler driving the monthly run and the hourly boost sweep

pub mod achievements;
pub mod notifier;
pub mod orchestrator;
pub mod scheduler;

pub use achievements::AchievementCalculator;
pub use notifier::{JobNotifier, LogNotifier};
pub use orchestrator::{LifecycleReport, MonthlyOrchestrator};
pub use scheduler::Scheduler;
