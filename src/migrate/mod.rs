//! Detection, planning and execution of project layout migrations.
//!
//! The pipeline is `prober` → `classifier` (with `differ` and `catalog`) →
//! `planner` → `executor`, with `report` rendering the results.

pub mod catalog;
pub mod classifier;
pub mod differ;
pub mod executor;
pub mod markdown;
pub mod planner;
pub mod prober;
pub mod report;

pub use catalog::Catalog;
pub use classifier::Classifier;
pub use executor::{ExecutionReport, Step, execute};
pub use planner::plan;
