//! Skill frequency distribution across portfolio items.

use crate::models::Portfolio;
use serde::Serialize;
use std::collections::HashMap;

/// One row of the skills chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillShare {
    pub name: String,
    pub count: usize,
    /// Rounded percentage of all skill mentions.
    pub percent: u32,
}

/// Count skills over all items, most frequent first.
///
/// Equal counts are ordered by name so output is stable.
pub fn skill_distribution(items: &[Portfolio]) -> Vec<SkillShare> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for skill in items.iter().flat_map(|p| p.skills.iter()) {
        *counts.entry(skill.as_str()).or_default() += 1;
    }

    let total: usize = counts.values().sum();

    let mut shares: Vec<SkillShare> = counts
        .into_iter()
        .map(|(name, count)| SkillShare {
            name: name.to_string(),
            count,
            percent: percent_of(count, total),
        })
        .collect();

    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    shares
}

/// Rounded percentage, 0 when `total` is 0.
pub fn percent_of(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}
