//! Partitioning portfolio items into the two dashboard buckets.

use crate::models::{Category, Portfolio};
use serde::Serialize;
use tracing::debug;

/// Portfolio items split by category.
///
/// Both buckets always exist. Items whose category is neither project nor
/// microcredential are left out of both and counted in `excluded`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedPortfolios {
    pub projects: Vec<Portfolio>,
    pub microcredentials: Vec<Portfolio>,
    pub excluded: usize,
}

impl GroupedPortfolios {
    /// Items in either bucket.
    pub fn recognized(&self) -> usize {
        self.projects.len() + self.microcredentials.len()
    }

    /// Projects followed by microcredentials, each in original order.
    pub fn merged(&self) -> Vec<Portfolio> {
        self.projects
            .iter()
            .chain(self.microcredentials.iter())
            .cloned()
            .collect()
    }
}

/// Group items by case-insensitive category.
pub fn group_by_category(items: &[Portfolio]) -> GroupedPortfolios {
    let mut grouped = GroupedPortfolios::default();

    for item in items {
        match item.category() {
            Category::Project => grouped.projects.push(item.clone()),
            Category::Microcredentials => grouped.microcredentials.push(item.clone()),
            other => {
                debug!(
                    "Portfolio {} has unrecognized category '{}'; excluded from counts",
                    item.id, other
                );
                grouped.excluded += 1;
            }
        }
    }

    grouped
}

/// Count items per bucket without cloning them.
pub fn count_by_category(items: &[Portfolio]) -> (usize, usize, usize) {
    items
        .iter()
        .fold((0, 0, 0), |(projects, creds, other), item| match item.category() {
            Category::Project => (projects + 1, creds, other),
            Category::Microcredentials => (projects, creds + 1, other),
            _ => (projects, creds, other + 1),
        })
}
