//! Dashboard aggregation and statistics.
//!
//! This module builds the admin/faculty home summaries and the per-student
//! rows of the student tables from already-fetched data.

use crate::analysis::grouping::count_by_category;
use crate::analysis::recency::{classify_recency, RecencyReport, RecencyThresholds};
use crate::analysis::skills::{skill_distribution, SkillShare};
use crate::models::{Portfolio, User, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Account totals per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleCounts {
    pub students: usize,
    pub faculty: usize,
    pub pending_faculty: usize,
    pub total_users: usize,
}

/// One line of the recent activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub portfolio_id: i64,
    pub title: String,
    pub category: String,
    pub owner_id: Option<UserId>,
    pub owner_name: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Monthly counts for two series over the union of their months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelinePoint {
    pub month: String,
    pub first: usize,
    pub second: usize,
}

/// Everything the home dashboards display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub counts: RoleCounts,
    pub projects: usize,
    pub microcredentials: usize,
    /// Items with an unrecognized or missing category.
    pub uncategorized: usize,
    pub recent_activity: Vec<ActivityEntry>,
    pub student_signups: BTreeMap<String, usize>,
    pub faculty_signups: BTreeMap<String, usize>,
    pub portfolio_creations: BTreeMap<String, usize>,
    /// Student sign-ups (`first`) against portfolio creations (`second`).
    pub growth_timeline: Vec<TimelinePoint>,
    pub top_skills: Vec<SkillShare>,
}

/// Borrowed inputs for [`summarize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardInput<'a> {
    pub students: &'a [User],
    pub faculty: &'a [User],
    pub pending_faculty: &'a [User],
    pub portfolios: &'a [Portfolio],
}

/// Build the home dashboard summary.
pub fn summarize(input: DashboardInput<'_>, recent_limit: usize) -> DashboardSummary {
    let (projects, microcredentials, uncategorized) = count_by_category(input.portfolios);

    let mut top_skills = skill_distribution(input.portfolios);
    top_skills.truncate(5);

    let student_signups = month_histogram(input.students.iter().filter_map(|u| u.created_at));
    let portfolio_creations =
        month_histogram(input.portfolios.iter().filter_map(|p| p.created_at));
    let growth_timeline = merge_timelines(&student_signups, &portfolio_creations);

    DashboardSummary {
        counts: RoleCounts {
            students: input.students.len(),
            faculty: input.faculty.len(),
            pending_faculty: input.pending_faculty.len(),
            total_users: input.students.len() + input.faculty.len(),
        },
        projects,
        microcredentials,
        uncategorized,
        recent_activity: recent_activity(input.portfolios, input.students, recent_limit),
        student_signups,
        faculty_signups: month_histogram(input.faculty.iter().filter_map(|u| u.created_at)),
        portfolio_creations,
        growth_timeline,
        top_skills,
    }
}

/// Items sorted newest first by effective timestamp; undated items sort last.
pub fn sort_by_recency(items: &[Portfolio]) -> Vec<&Portfolio> {
    let mut sorted: Vec<&Portfolio> = items.iter().collect();
    // Option orders None first, so reverse the comparison for newest-first.
    sorted.sort_by(|a, b| b.effective_timestamp().cmp(&a.effective_timestamp()));
    sorted
}

/// The `limit` most recently updated items, attributed to their owners.
pub fn recent_activity(
    portfolios: &[Portfolio],
    owners: &[User],
    limit: usize,
) -> Vec<ActivityEntry> {
    let names: HashMap<UserId, String> = owners.iter().map(|u| (u.id, u.full_name())).collect();

    sort_by_recency(portfolios)
        .into_iter()
        .take(limit)
        .map(|p| ActivityEntry {
            portfolio_id: p.id,
            title: p.display_title().to_string(),
            category: p.category().to_string(),
            owner_id: p.owner_id,
            owner_name: p.owner_id.and_then(|id| names.get(&id).cloned()),
            timestamp: p.effective_timestamp(),
        })
        .collect()
}

/// `YYYY-MM` bucket key for a timestamp.
pub fn month_key(date: DateTime<Utc>) -> String {
    date.format("%Y-%m").to_string()
}

/// Count timestamps per month. Keys iterate in ascending order.
pub fn month_histogram<I>(dates: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut histogram = BTreeMap::new();
    for date in dates {
        *histogram.entry(month_key(date)).or_default() += 1;
    }
    histogram
}

/// Merge two monthly histograms over the union of their keys.
pub fn merge_timelines(
    first: &BTreeMap<String, usize>,
    second: &BTreeMap<String, usize>,
) -> Vec<TimelinePoint> {
    let months: BTreeSet<&String> = first.keys().chain(second.keys()).collect();

    months
        .into_iter()
        .map(|month| TimelinePoint {
            month: month.clone(),
            first: first.get(month).copied().unwrap_or(0),
            second: second.get(month).copied().unwrap_or(0),
        })
        .collect()
}

/// One row of the student table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRow {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub program: Option<String>,
    pub projects: usize,
    pub microcredentials: usize,
    pub total: usize,
    pub recency: RecencyReport,
}

/// Build table rows; students missing from `portfolios` count as having none.
pub fn student_rows(
    students: &[User],
    portfolios: &HashMap<UserId, Vec<Portfolio>>,
    now: DateTime<Utc>,
    thresholds: RecencyThresholds,
) -> Vec<StudentRow> {
    students
        .iter()
        .map(|student| {
            let items = portfolios
                .get(&student.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let (projects, microcredentials, _) = count_by_category(items);

            StudentRow {
                id: student.id,
                name: student.full_name(),
                username: student.username.clone(),
                email: student.email.clone(),
                program: student.program_major.clone(),
                projects,
                microcredentials,
                total: projects + microcredentials,
                recency: classify_recency(items, now, thresholds),
            }
        })
        .collect()
}

/// Case-insensitive search on full name, username or email.
pub fn filter_students<'a>(students: &'a [User], term: &str) -> Vec<&'a User> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return students.iter().collect();
    }

    students
        .iter()
        .filter(|s| {
            s.full_name().to_lowercase().contains(&term)
                || s.username.to_lowercase().contains(&term)
                || s.email.to_lowercase().contains(&term)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::recency::RecencyStatus;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn user(id: i64, fname: &str, created: &str) -> User {
        serde_json::from_value(json!({
            "userID": id,
            "fname": fname,
            "lname": "Doe",
            "userEmail": format!("{}@school.edu", fname.to_lowercase()),
            "createdAt": created
        }))
        .unwrap()
    }

    fn portfolio(id: i64, owner: i64, category: &str, created: &str, updated: Option<&str>) -> Portfolio {
        serde_json::from_value(json!({
            "portfolioID": id,
            "userID": owner,
            "portfolioTitle": format!("Item {}", id),
            "category": category,
            "createdAt": created,
            "lastUpdated": updated
        }))
        .unwrap()
    }

    fn date(raw: &str) -> DateTime<Utc> {
        crate::models::timestamp::parse(raw).unwrap()
    }

    #[test]
    fn test_month_histogram() {
        let histogram = month_histogram(vec![
            date("2024-01-05"),
            date("2024-01-20"),
            date("2024-02-01"),
        ]);

        let entries: Vec<_> = histogram.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(entries, vec![("2024-01", 2), ("2024-02", 1)]);
    }

    #[test]
    fn test_month_histogram_orders_across_years() {
        let histogram = month_histogram(vec![date("2024-01-05"), date("2023-12-31")]);
        let keys: Vec<_> = histogram.keys().cloned().collect();
        assert_eq!(keys, vec!["2023-12", "2024-01"]);
    }

    #[test]
    fn test_merge_timelines() {
        let a = month_histogram(vec![date("2024-01-05"), date("2024-03-01")]);
        let b = month_histogram(vec![date("2024-02-10"), date("2024-03-02"), date("2024-03-03")]);

        let merged = merge_timelines(&a, &b);

        assert_eq!(
            merged,
            vec![
                TimelinePoint {
                    month: "2024-01".to_string(),
                    first: 1,
                    second: 0
                },
                TimelinePoint {
                    month: "2024-02".to_string(),
                    first: 0,
                    second: 1
                },
                TimelinePoint {
                    month: "2024-03".to_string(),
                    first: 1,
                    second: 2
                },
            ]
        );
    }

    #[test]
    fn test_recent_activity_limit_and_order() {
        let students = vec![user(1, "Ada", "2024-01-01")];
        let portfolios: Vec<_> = (1..=7)
            .map(|i| portfolio(i, 1, "project", &format!("2024-01-0{}", i), None))
            .collect();

        let activity = recent_activity(&portfolios, &students, 5);

        let ids: Vec<_> = activity.iter().map(|a| a.portfolio_id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
        assert_eq!(activity[0].owner_name.as_deref(), Some("Ada Doe"));
    }

    #[test]
    fn test_recent_activity_prefers_last_updated() {
        let portfolios = vec![
            portfolio(1, 1, "project", "2024-01-01", Some("2024-05-01")),
            portfolio(2, 1, "project", "2024-04-01", None),
        ];

        let activity = recent_activity(&portfolios, &[], 5);

        assert_eq!(activity[0].portfolio_id, 1);
        assert!(activity[0].owner_name.is_none());
    }

    #[test]
    fn test_undated_items_sort_last() {
        let mut undated = portfolio(1, 1, "project", "2024-01-01", None);
        undated.created_at = None;
        let portfolios = vec![undated, portfolio(2, 1, "project", "2024-01-02", None)];

        let sorted = sort_by_recency(&portfolios);

        assert_eq!(sorted[0].id, 2);
        assert_eq!(sorted[1].id, 1);
    }

    #[test]
    fn test_summarize() {
        let students = vec![user(1, "Ada", "2024-01-05"), user(2, "Alan", "2024-02-01")];
        let faculty = vec![user(10, "Grace", "2024-01-20")];
        let pending = vec![user(11, "Barbara", "2024-02-02")];
        let portfolios = vec![
            portfolio(1, 1, "Project", "2024-01-10", None),
            portfolio(2, 1, "microcredentials", "2024-02-10", None),
            portfolio(3, 2, "thesis", "2024-03-10", None),
        ];

        let summary = summarize(
            DashboardInput {
                students: &students,
                faculty: &faculty,
                pending_faculty: &pending,
                portfolios: &portfolios,
            },
            5,
        );

        assert_eq!(
            summary.counts,
            RoleCounts {
                students: 2,
                faculty: 1,
                pending_faculty: 1,
                total_users: 3
            }
        );
        assert_eq!(summary.projects, 1);
        assert_eq!(summary.microcredentials, 1);
        assert_eq!(summary.uncategorized, 1);
        assert_eq!(summary.recent_activity.len(), 3);
        assert_eq!(summary.faculty_signups.get("2024-01"), Some(&1));
        let months: Vec<_> = summary.growth_timeline.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(DashboardInput::default(), 5);
        assert_eq!(summary.counts, RoleCounts::default());
        assert!(summary.recent_activity.is_empty());
        assert!(summary.growth_timeline.is_empty());
    }

    #[test]
    fn test_student_rows() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap();
        let students = vec![user(1, "Ada", "2024-01-05"), user(2, "Alan", "2024-01-05")];
        let recent = (now - Duration::days(2)).to_rfc3339();
        let mut by_student = HashMap::new();
        by_student.insert(
            1,
            vec![
                portfolio(1, 1, "project", "2024-01-10", Some(recent.as_str())),
                portfolio(2, 1, "microcredentials", "2024-01-11", None),
                portfolio(3, 1, "misc", "2024-01-12", None),
            ],
        );

        let rows = student_rows(&students, &by_student, now, RecencyThresholds::default());

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].projects, 1);
        assert_eq!(rows[0].microcredentials, 1);
        assert_eq!(rows[0].total, 2);
        assert_eq!(rows[0].recency.status, RecencyStatus::Fresh);
        assert_eq!(rows[1].total, 0);
        assert_eq!(rows[1].recency.status, RecencyStatus::Unknown);
    }

    #[test]
    fn test_filter_students() {
        let students = vec![user(1, "Ada", "2024-01-05"), user(2, "Alan", "2024-01-05")];

        assert_eq!(filter_students(&students, "").len(), 2);
        assert_eq!(filter_students(&students, "ADA").len(), 1);
        assert_eq!(filter_students(&students, "alan@school").len(), 1);
        assert_eq!(filter_students(&students, "doe").len(), 2);
        assert!(filter_students(&students, "zed").is_empty());

        let mut countess = user(3, "Augusta", "2024-01-05");
        countess.username = "Countess42".to_string();
        let students = vec![countess, user(4, "Alan", "2024-01-05")];
        let found = filter_students(&students, "countess");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 3);
    }
}
