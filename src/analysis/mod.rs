//! Pure aggregation over fetched API data.
//!
//! Nothing here touches the network; every function takes already-decoded
//! models and returns plain values the report layer renders.

pub mod aggregator;
pub mod grouping;
pub mod recency;
pub mod skills;

pub use aggregator::*;
pub use grouping::{group_by_category, GroupedPortfolios};
pub use recency::{classify_recency, RecencyReport, RecencyStatus, RecencyThresholds};
pub use skills::{skill_distribution, SkillShare};
