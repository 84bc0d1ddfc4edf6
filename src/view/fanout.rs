//! Sequential per-student portfolio fetching.
//!
//! Student dashboards need every student's portfolio, and the backend only
//! offers a per-student endpoint. Students are fetched one at a time; a
//! failure for one student is recorded and that student counts as having
//! no portfolio items. Authorization failures and cancellation still abort.

use crate::api::ApiError;
use crate::models::{Portfolio, User, UserId};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, warn};

/// A student whose portfolio fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub student_id: UserId,
    pub student_name: String,
    /// HTTP status, when the backend answered at all.
    pub status: Option<u16>,
    pub message: String,
}

/// Result of fetching every student's portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FanOut {
    /// One entry per student, in input order.
    pub entries: Vec<(UserId, Vec<Portfolio>)>,
    pub failures: Vec<FetchFailure>,
}

impl FanOut {
    /// Some students are missing data.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Portfolio items keyed by student.
    pub fn by_student(&self) -> HashMap<UserId, Vec<Portfolio>> {
        self.entries.iter().cloned().collect()
    }

    /// Every fetched item, in student order.
    pub fn all_portfolios(&self) -> Vec<Portfolio> {
        self.entries
            .iter()
            .flat_map(|(_, items)| items.iter().cloned())
            .collect()
    }
}

/// Fetch each student's portfolio in turn.
pub async fn collect_student_portfolios<F, Fut>(
    students: &[User],
    mut fetch: F,
    show_progress: bool,
) -> Result<FanOut, ApiError>
where
    F: FnMut(UserId) -> Fut,
    Fut: Future<Output = Result<Vec<Portfolio>, ApiError>>,
{
    let progress_bar = show_progress.then(|| progress_bar(students.len() as u64));
    let mut fan_out = FanOut::default();

    for student in students {
        if let Some(ref pb) = progress_bar {
            pb.set_message(student.full_name());
        }

        match fetch(student.id).await {
            Ok(mut items) => {
                for item in items.iter_mut() {
                    item.owner_id.get_or_insert(student.id);
                }
                debug!("Student {} has {} portfolio item(s)", student.id, items.len());
                fan_out.entries.push((student.id, items));
            }
            Err(err) if err.is_auth() || matches!(err, ApiError::Cancelled) => {
                if let Some(pb) = progress_bar {
                    pb.abandon();
                }
                return Err(err);
            }
            Err(err) => {
                warn!(
                    "Could not fetch portfolios for student {}: {}; counting as empty",
                    student.id, err
                );
                fan_out.failures.push(FetchFailure {
                    student_id: student.id,
                    student_name: student.full_name(),
                    status: err.status(),
                    message: err.to_string(),
                });
                fan_out.entries.push((student.id, Vec::new()));
            }
        }

        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    Ok(fan_out)
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
