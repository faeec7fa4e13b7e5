//! Keeps account folder names in step with renamed account ids.
//!
//! The planner diffs scanned identity records against the configured
//! account → email mapping; the executor renames and relabels folders,
//! undoing the rename if the relabel fails.

mod executor;
mod model;
mod planner;

pub use executor::{execute_all, execute_migration};
pub use model::{MigrationAnalysis, MigrationFailure, MigrationPlan, MigrationReport};
pub use planner::{detect_migrations, plan_migrations};
