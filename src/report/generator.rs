//! Markdown report generation.
//!
//! This module generates Markdown and JSON reports for every dashboard page.

use crate::analysis::{ActivityEntry, DashboardSummary, RecencyStatus, SkillShare, StudentRow};
use crate::report::{format_date, PageView, Report, ReportMetadata, StudentDetail, UserCard};
use crate::view::{FetchFailure, PageError};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# PortfolioX · {}\n\n", report.view.title()));

    output.push_str(&generate_metadata_section(&report.metadata));

    if !report.partial.is_empty() {
        output.push_str(&generate_partial_note(&report.partial));
    }

    match &report.view {
        PageView::AdminHome { summary } => {
            output.push_str(&generate_user_totals_section(summary));
            output.push_str(&generate_items_section(summary));
            output.push_str(&generate_activity_section(&summary.recent_activity));
            output.push_str(&generate_growth_section(summary));
            output.push_str(&generate_skills_section("Top Skills", &summary.top_skills));
        }
        PageView::FacultyHome { welcome, summary } => {
            if let Some(name) = welcome {
                output.push_str(&format!("Welcome back, **{}**.\n\n", name));
            }
            output.push_str(&generate_faculty_overview(summary));
            output.push_str(&generate_activity_section(&summary.recent_activity));
            output.push_str(&generate_skills_section("Top Skills", &summary.top_skills));
        }
        PageView::Students { search, rows } => {
            output.push_str(&generate_students_section(search.as_deref(), rows));
        }
        PageView::Student { detail } => {
            output.push_str(&generate_student_detail(detail));
        }
        PageView::Users { users, .. } => {
            output.push_str(&generate_users_section(users));
        }
        PageView::Portfolios { grouped } => {
            output.push_str(&format!("## Projects ({})\n\n", grouped.projects.len()));
            output.push_str(&item_list(grouped.projects.iter().map(|p| {
                (p.display_title().to_string(), format_date(p.effective_timestamp()))
            })));
            output.push_str(&format!(
                "## Microcredentials ({})\n\n",
                grouped.microcredentials.len()
            ));
            output.push_str(&item_list(grouped.microcredentials.iter().map(|p| {
                (p.display_title().to_string(), format_date(p.effective_timestamp()))
            })));
            if grouped.excluded > 0 {
                output.push_str(&format!(
                    "*{} item(s) with an unrecognized category are not shown.*\n\n",
                    grouped.excluded
                ));
            }
        }
        PageView::Skills { skills, .. } => {
            output.push_str(&generate_skills_section("Skill Distribution", skills));
        }
        PageView::Failed { error } => {
            output.push_str(&generate_error_banner(&report.metadata.page, error));
        }
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Page:** `{}`\n", metadata.page));
    section.push_str(&format!("- **API:** {}\n", metadata.api_url));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

fn generate_partial_note(failures: &[FetchFailure]) -> String {
    let mut note = String::new();

    note.push_str(&format!(
        "> ⚠️ **Partial data:** portfolios for {} student(s) could not be loaded and are counted as empty.\n",
        failures.len()
    ));
    for failure in failures {
        note.push_str(&format!(
            "> - {} (#{}): {}\n",
            failure.student_name, failure.student_id, failure.message
        ));
    }
    note.push('\n');

    note
}

fn generate_error_banner(page: &str, error: &PageError) -> String {
    let mut banner = String::new();

    banner.push_str(&format!("> ⛔ **Could not load `{}`:** {}\n", page, error.message));
    if error.session_expired {
        banner.push_str(">\n> Your session has expired. Sign in again with `portfoliox login`.\n");
    }
    banner.push('\n');

    banner
}

fn generate_user_totals_section(summary: &DashboardSummary) -> String {
    let counts = &summary.counts;
    let mut section = String::new();

    section.push_str("## Users\n\n");
    section.push_str("| 🎓 Students | 🧑‍🏫 Faculty | 🟡 Pending Approval | **Total Users** |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        counts.students, counts.faculty, counts.pending_faculty, counts.total_users
    ));

    section
}

fn generate_items_section(summary: &DashboardSummary) -> String {
    let mut section = String::new();

    section.push_str("## Portfolio Items\n\n");
    section.push_str("| Projects | Microcredentials | Uncategorized |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        summary.projects, summary.microcredentials, summary.uncategorized
    ));

    section
}

fn generate_faculty_overview(summary: &DashboardSummary) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");
    section.push_str("| 🎓 Students | Projects | Microcredentials |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        summary.counts.students, summary.projects, summary.microcredentials
    ));

    section
}

fn generate_activity_section(activity: &[ActivityEntry]) -> String {
    let mut section = String::new();

    section.push_str("## Recent Activity\n\n");
    if activity.is_empty() {
        section.push_str("No portfolio activity yet.\n\n");
        return section;
    }

    section.push_str("| Date | Item | Category | Student |\n");
    section.push_str("|:---|:---|:---|:---|\n");
    for entry in activity {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            format_date(entry.timestamp),
            escape_cell(&entry.title),
            entry.category,
            entry.owner_name.as_deref().unwrap_or("—")
        ));
    }
    section.push('\n');

    section
}

fn generate_growth_section(summary: &DashboardSummary) -> String {
    if summary.growth_timeline.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Growth\n\n");
    section.push_str("| Month | Student Sign-ups | Portfolios Created |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for point in &summary.growth_timeline {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            point.month, point.first, point.second
        ));
    }
    section.push('\n');

    if !summary.faculty_signups.is_empty() {
        section.push_str("### Faculty Sign-ups\n\n");
        section.push_str("| Month | Count |\n");
        section.push_str("|:---|:---:|\n");
        for (month, count) in &summary.faculty_signups {
            section.push_str(&format!("| {} | {} |\n", month, count));
        }
        section.push('\n');
    }

    section
}

fn generate_skills_section(heading: &str, skills: &[SkillShare]) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", heading));
    if skills.is_empty() {
        section.push_str("No skills recorded.\n\n");
        return section;
    }

    section.push_str("| Skill | Count | Share |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for skill in skills {
        section.push_str(&format!(
            "| {} | {} | {}% |\n",
            escape_cell(&skill.name),
            skill.count,
            skill.percent
        ));
    }
    section.push('\n');

    section
}

fn generate_students_section(search: Option<&str>, rows: &[StudentRow]) -> String {
    let mut section = String::new();

    if let Some(term) = search {
        section.push_str(&format!(
            "*{} student(s) matching \"{}\".*\n\n",
            rows.len(),
            term
        ));
    }

    if rows.is_empty() {
        section.push_str("No students found.\n\n");
        return section;
    }

    section.push_str(
        "| Status | Student | Email | Program | Projects | Microcredentials | Total | Last Update |\n",
    );
    section.push_str("|:---:|:---|:---|:---|:---:|:---:|:---:|:---|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            row.recency.status.emoji(),
            escape_cell(&row.name),
            row.email,
            row.program.as_deref().unwrap_or("—"),
            row.projects,
            row.microcredentials,
            row.total,
            row.recency.last_update_display()
        ));
    }
    section.push('\n');

    let legend: Vec<String> = [
        RecencyStatus::Fresh,
        RecencyStatus::Aging,
        RecencyStatus::Stale,
        RecencyStatus::Unknown,
    ]
    .iter()
    .map(|status| format!("{} {} ({})", status.emoji(), status, status.color()))
    .collect();
    section.push_str(&format!("{}\n\n", legend.join(" · ")));

    section
}

fn generate_student_detail(detail: &StudentDetail) -> String {
    let mut section = String::new();
    let student = &detail.student;

    section.push_str("## Profile\n\n");
    section.push_str(&format!("- **Name:** {}\n", student.name));
    section.push_str(&format!("- **Email:** {}\n", student.email));
    if let Some(ref program) = student.program {
        section.push_str(&format!("- **Program:** {}\n", program));
    }
    if let Some(ref avatar) = student.avatar_url {
        section.push_str(&format!("- **Picture:** {}\n", avatar));
    }
    section.push_str(&format!(
        "- **Portfolio status:** {} {} (last update {})\n\n",
        detail.recency.status.emoji(),
        detail.recency.status,
        detail.recency.last_update_display()
    ));

    section.push_str(&format!("## Projects ({})\n\n", detail.grouped.projects.len()));
    for project in &detail.grouped.projects {
        section.push_str(&format!("### {}\n\n", project.display_title()));
        if !project.description.is_empty() {
            section.push_str(&format!("{}\n\n", project.description));
        }
        if let Some(ref link) = project.github_link {
            section.push_str(&format!("- **GitHub:** {}\n", link));
        }
        if !project.skills.is_empty() {
            section.push_str(&format!("- **Skills:** {}\n", project.skills.join(", ")));
        }
        section.push('\n');
    }

    section.push_str(&format!(
        "## Microcredentials ({})\n\n",
        detail.grouped.microcredentials.len()
    ));
    if !detail.grouped.microcredentials.is_empty() {
        section.push_str("| Certificate | Issued | Skills |\n");
        section.push_str("|:---|:---|:---|\n");
        for cred in &detail.grouped.microcredentials {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                escape_cell(cred.display_title()),
                format_date(cred.issue_date),
                cred.skills.join(", ")
            ));
        }
        section.push('\n');
    }

    if detail.grouped.excluded > 0 {
        section.push_str(&format!(
            "*{} item(s) with an unrecognized category are not shown.*\n\n",
            detail.grouped.excluded
        ));
    }

    section.push_str("## Timeline\n\n");
    if detail.timeline.is_empty() {
        section.push_str("No portfolio items yet.\n\n");
    } else {
        for entry in &detail.timeline {
            section.push_str(&format!(
                "- **{}** {} ({})\n",
                format_date(entry.timestamp),
                entry.title,
                entry.category
            ));
        }
        section.push('\n');
    }

    section.push_str(&generate_skills_section("Skills", &detail.skills));

    section
}

fn generate_users_section(users: &[UserCard]) -> String {
    let mut section = String::new();

    if users.is_empty() {
        section.push_str("No accounts found.\n\n");
        return section;
    }

    section.push_str("| Status | Name | Username | Email | Joined |\n");
    section.push_str("|:---|:---|:---|:---|:---|\n");
    for user in users {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            user.status_badge(),
            escape_cell(&user.name),
            user.username,
            user.email,
            format_date(user.joined)
        ));
    }
    section.push('\n');

    section
}

fn item_list<I>(items: I) -> String
where
    I: Iterator<Item = (String, String)>,
{
    let mut list = String::new();
    for (title, date) in items {
        list.push_str(&format!("- {} *(updated {})*\n", title, date));
    }
    list.push('\n');
    list
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by portfoliox v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{group_by_category, RecencyReport};
    use crate::report::fixtures;

    #[test]
    fn test_admin_home_report() {
        let report = fixtures::report(PageView::AdminHome {
            summary: fixtures::summary(),
        });
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("# PortfolioX · Admin Dashboard"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("| 1 | 1 | 1 | **2** |"));
        assert!(markdown.contains("## Recent Activity"));
        assert!(markdown.contains("Ada Lovelace"));
        assert!(markdown.contains("| 2024-01 | 1 | 0 |"));
        assert!(markdown.contains("| Rust | 2 | 67% |"));
    }

    #[test]
    fn test_faculty_home_welcome() {
        let report = fixtures::report(PageView::FacultyHome {
            welcome: Some("Grace".to_string()),
            summary: fixtures::summary(),
        });
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("Welcome back, **Grace**."));
        assert!(!markdown.contains("## Growth"));
    }

    #[test]
    fn test_error_banner() {
        let report = fixtures::report(PageView::Failed {
            error: PageError {
                message: "Session rejected by the server (HTTP 403)".to_string(),
                session_expired: true,
            },
        });
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("⛔ **Could not load `test`:**"));
        assert!(markdown.contains("portfoliox login"));
    }

    #[test]
    fn test_partial_note() {
        let report = fixtures::report(PageView::Students {
            search: None,
            rows: Vec::new(),
        })
        .with_partial(vec![FetchFailure {
            student_id: 2,
            student_name: "Alan Turing".to_string(),
            status: Some(500),
            message: "PortfolioX API error 500: boom".to_string(),
        }]);
        let markdown = generate_markdown_report(&report);

        assert!(markdown.contains("**Partial data:**"));
        assert!(markdown.contains("Alan Turing (#2)"));
        assert!(markdown.contains("No students found."));
    }

    #[test]
    fn test_student_detail_sections() {
        let user = fixtures::user(1, "Ada", "APPROVED");
        let items = vec![
            fixtures::portfolio(10, 1, "Project", &["Rust"]),
            fixtures::portfolio(11, 1, "microcredentials", &["SQL"]),
            fixtures::portfolio(12, 1, "poster", &[]),
        ];
        let detail = StudentDetail {
            student: UserCard::from_user(&user, |_| None),
            grouped: group_by_category(&items),
            recency: RecencyReport::unknown(),
            timeline: crate::analysis::recent_activity(&items, &[user.clone()], usize::MAX),
            skills: crate::analysis::skill_distribution(&items),
        };
        let markdown = generate_markdown_report(&fixtures::report(PageView::Student { detail }));

        assert!(markdown.contains("# PortfolioX · Portfolio of Ada Lovelace"));
        assert!(markdown.contains("## Projects (1)"));
        assert!(markdown.contains("## Microcredentials (1)"));
        assert!(markdown.contains("1 item(s) with an unrecognized category"));
        assert!(markdown.contains("## Timeline"));
    }

    #[test]
    fn test_users_section_badges() {
        let users = vec![
            UserCard::from_user(&fixtures::user(3, "Barbara", "PENDING"), |_| None),
            UserCard::from_user(&fixtures::user(4, "Edsger", "REJECTED"), |_| None),
        ];
        let section = generate_users_section(&users);

        assert!(section.contains("🟡 Pending"));
        assert!(section.contains("🔴 Rejected"));
        assert!(section.contains("2024-01-15"));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a|b"), "a\\|b");
    }

    #[test]
    fn test_generate_json_report() {
        let report = fixtures::report(PageView::AdminHome {
            summary: fixtures::summary(),
        });
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"kind\": \"admin_home\""));
        assert!(json.contains("\"recent_activity\""));
    }
}
