//! Report rendering for dashboard pages.
//!
//! A [`Report`] is what one command produced: the page it rendered, the
//! page's data (or its error), and any students whose data is missing.
//! `generator` renders Markdown and JSON, `text` renders the terminal view.

pub mod generator;
pub mod text;

pub use generator::{generate_json_report, generate_markdown_report};
pub use text::generate_text_report;

use crate::analysis::{
    ActivityEntry, DashboardSummary, GroupedPortfolios, RecencyReport, SkillShare, StudentRow,
};
use crate::models::User;
use crate::view::{FetchFailure, PageError};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Information about the report itself.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Page name, e.g. `admin-home`.
    pub page: String,
    pub api_url: String,
    pub generated_at: DateTime<Utc>,
    /// Final load state of the page.
    pub state: &'static str,
}

/// A rendered page plus its context.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub view: PageView,
    /// Students whose portfolio could not be fetched.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub partial: Vec<FetchFailure>,
}

impl Report {
    pub fn new(page: &str, api_url: &str, state: &'static str, view: PageView) -> Self {
        Self {
            metadata: ReportMetadata {
                page: page.to_string(),
                api_url: api_url.to_string(),
                generated_at: Utc::now(),
                state,
            },
            view,
            partial: Vec::new(),
        }
    }

    pub fn with_partial(mut self, failures: Vec<FetchFailure>) -> Self {
        self.partial = failures;
        self
    }
}

/// Data shown by one dashboard page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageView {
    AdminHome {
        summary: DashboardSummary,
    },
    FacultyHome {
        welcome: Option<String>,
        summary: DashboardSummary,
    },
    Students {
        search: Option<String>,
        rows: Vec<StudentRow>,
    },
    Student {
        detail: StudentDetail,
    },
    Users {
        title: String,
        users: Vec<UserCard>,
    },
    Portfolios {
        grouped: GroupedPortfolios,
    },
    Skills {
        scope: String,
        skills: Vec<SkillShare>,
    },
    /// The page settled in its error state.
    Failed {
        error: PageError,
    },
}

impl PageView {
    /// Heading used by the Markdown and text renderers.
    pub fn title(&self) -> String {
        match self {
            PageView::AdminHome { .. } => "Admin Dashboard".to_string(),
            PageView::FacultyHome { .. } => "Faculty Dashboard".to_string(),
            PageView::Students { .. } => "Students".to_string(),
            PageView::Student { detail } => format!("Portfolio of {}", detail.student.name),
            PageView::Users { title, .. } => title.clone(),
            PageView::Portfolios { .. } => "Portfolio Items".to_string(),
            PageView::Skills { scope, .. } => format!("Skills ({})", scope),
            PageView::Failed { .. } => "Error".to_string(),
        }
    }
}

/// A user as shown in lists and profile headers.
#[derive(Debug, Clone, Serialize)]
pub struct UserCard {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub program: Option<String>,
    pub status: Option<crate::models::AccountStatus>,
    pub joined: Option<DateTime<Utc>>,
    /// Resolved profile picture URL; initials are shown when absent.
    pub avatar_url: Option<String>,
    pub initials: String,
}

impl UserCard {
    /// Build a card, resolving the picture path with `resolve`.
    pub fn from_user<F>(user: &User, resolve: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            id: user.id,
            name: user.full_name(),
            username: user.username.clone(),
            email: user.email.clone(),
            program: user.program_major.clone(),
            status: user.status,
            joined: user.created_at,
            avatar_url: user.profile_pic.as_deref().and_then(resolve),
            initials: user.initials(),
        }
    }

    pub fn status_badge(&self) -> String {
        match self.status {
            Some(status) => format!("{} {}", status.emoji(), status),
            None => "—".to_string(),
        }
    }
}

/// One student's portfolio page.
#[derive(Debug, Clone, Serialize)]
pub struct StudentDetail {
    pub student: UserCard,
    pub grouped: GroupedPortfolios,
    pub recency: RecencyReport,
    /// Every item, newest first.
    pub timeline: Vec<ActivityEntry>,
    pub skills: Vec<SkillShare>,
}

/// `YYYY-MM-DD`, or a dash when unknown.
pub(crate) fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "—".to_string())
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared report inputs for renderer tests.

    use super::*;
    use crate::analysis::{summarize, DashboardInput};
    use crate::models::Portfolio;
    use serde_json::json;

    pub fn user(id: i64, fname: &str, status: &str) -> User {
        serde_json::from_value(json!({
            "userID": id,
            "fname": fname,
            "lname": "Lovelace",
            "username": fname.to_lowercase(),
            "userEmail": format!("{}@school.edu", fname.to_lowercase()),
            "status": status,
            "createdAt": "2024-01-15T10:00:00"
        }))
        .unwrap()
    }

    pub fn portfolio(id: i64, owner: i64, category: &str, skills: &[&str]) -> Portfolio {
        serde_json::from_value(json!({
            "portfolioID": id,
            "userID": owner,
            "portfolioTitle": format!("Item {}", id),
            "category": category,
            "skills": skills,
            "createdAt": "2024-02-01T09:00:00"
        }))
        .unwrap()
    }

    pub fn summary() -> DashboardSummary {
        let students = vec![user(1, "Ada", "APPROVED")];
        let faculty = vec![user(2, "Grace", "APPROVED")];
        let pending = vec![user(3, "Barbara", "PENDING")];
        let portfolios = vec![
            portfolio(10, 1, "project", &["Rust", "SQL"]),
            portfolio(11, 1, "microcredentials", &["Rust"]),
        ];
        summarize(
            DashboardInput {
                students: &students,
                faculty: &faculty,
                pending_faculty: &pending,
                portfolios: &portfolios,
            },
            5,
        )
    }

    pub fn report(view: PageView) -> Report {
        Report::new("test", "http://localhost:8080", "ready", view)
    }
}
