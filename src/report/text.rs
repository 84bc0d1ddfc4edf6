//! Plain-text rendering for the terminal.

use crate::analysis::{DashboardSummary, SkillShare, StudentRow};
use crate::report::{format_date, PageView, Report, StudentDetail, UserCard};

/// Render a report for the terminal. Bar charts are `chart_width` wide.
pub fn generate_text_report(report: &Report, chart_width: usize) -> String {
    let mut out = String::new();

    let title = report.view.title();
    out.push_str(&format!("{}\n{}\n\n", title, "=".repeat(title.chars().count())));

    if !report.partial.is_empty() {
        out.push_str(&format!(
            "⚠️  Partial data: {} student(s) could not be loaded and count as empty\n",
            report.partial.len()
        ));
        for failure in &report.partial {
            out.push_str(&format!(
                "   - {} (#{}): {}\n",
                failure.student_name, failure.student_id, failure.message
            ));
        }
        out.push('\n');
    }

    match &report.view {
        PageView::AdminHome { summary } => {
            let counts = &summary.counts;
            out.push_str(&format!(
                "🎓 Students: {}   🧑‍🏫 Faculty: {}   🟡 Pending: {}   Total users: {}\n",
                counts.students, counts.faculty, counts.pending_faculty, counts.total_users
            ));
            out.push_str(&items_line(summary));
            out.push_str(&activity_block(summary));
            if !summary.growth_timeline.is_empty() {
                out.push_str("\nGrowth (student sign-ups / portfolios created)\n");
                let max = summary
                    .growth_timeline
                    .iter()
                    .map(|p| p.first.max(p.second))
                    .max()
                    .unwrap_or(0);
                for point in &summary.growth_timeline {
                    out.push_str(&format!(
                        "  {}  S {:<width$} {:>3}\n           P {:<width$} {:>3}\n",
                        point.month,
                        bar(point.first, max, chart_width),
                        point.first,
                        bar(point.second, max, chart_width),
                        point.second,
                        width = chart_width
                    ));
                }
            }
            out.push_str(&skills_chart("Top skills", &summary.top_skills, chart_width));
        }
        PageView::FacultyHome { welcome, summary } => {
            if let Some(name) = welcome {
                out.push_str(&format!("Welcome back, {}!\n\n", name));
            }
            out.push_str(&format!("🎓 Students: {}\n", summary.counts.students));
            out.push_str(&items_line(summary));
            out.push_str(&activity_block(summary));
            out.push_str(&skills_chart("Top skills", &summary.top_skills, chart_width));
        }
        PageView::Students { search, rows } => {
            if let Some(term) = search {
                out.push_str(&format!("Filter: \"{}\" ({} match(es))\n\n", term, rows.len()));
            }
            out.push_str(&students_table(rows));
        }
        PageView::Student { detail } => {
            out.push_str(&student_block(detail, chart_width));
        }
        PageView::Users { users, .. } => {
            out.push_str(&users_table(users));
        }
        PageView::Portfolios { grouped } => {
            for (label, items) in [
                ("Projects", &grouped.projects),
                ("Microcredentials", &grouped.microcredentials),
            ] {
                out.push_str(&format!("{} ({})\n", label, items.len()));
                for item in items.iter() {
                    out.push_str(&format!(
                        "  {}  {}\n",
                        format_date(item.effective_timestamp()),
                        item.display_title()
                    ));
                }
                out.push('\n');
            }
            if grouped.excluded > 0 {
                out.push_str(&format!(
                    "{} item(s) with an unrecognized category not shown\n",
                    grouped.excluded
                ));
            }
        }
        PageView::Skills { skills, .. } => {
            out.push_str(&skills_chart("Skill distribution", skills, chart_width));
        }
        PageView::Failed { error } => {
            out.push_str(&format!(
                "⛔ Could not load {}: {}\n",
                report.metadata.page, error.message
            ));
            if error.session_expired {
                out.push_str("   Your session has expired. Sign in again with `portfoliox login`.\n");
            }
        }
    }

    out
}

fn items_line(summary: &DashboardSummary) -> String {
    let mut line = format!(
        "📁 Projects: {}   🏅 Microcredentials: {}",
        summary.projects, summary.microcredentials
    );
    if summary.uncategorized > 0 {
        line.push_str(&format!("   Uncategorized: {}", summary.uncategorized));
    }
    line.push('\n');
    line
}

fn activity_block(summary: &DashboardSummary) -> String {
    let mut block = String::from("\nRecent activity\n");
    if summary.recent_activity.is_empty() {
        block.push_str("  (none)\n");
    }
    for entry in &summary.recent_activity {
        block.push_str(&format!(
            "  {}  {:<32} {:<16} {}\n",
            format_date(entry.timestamp),
            truncate(&entry.title, 32),
            entry.category,
            entry.owner_name.as_deref().unwrap_or("")
        ));
    }
    block
}

fn students_table(rows: &[StudentRow]) -> String {
    if rows.is_empty() {
        return "No students found.\n".to_string();
    }

    let mut table = format!(
        "   {:<24} {:<28} {:>4} {:>4} {:>5}  {}\n",
        "Student", "Email", "Proj", "Cred", "Total", "Last update"
    );
    for row in rows {
        table.push_str(&format!(
            "{} {:<24} {:<28} {:>4} {:>4} {:>5}  {}\n",
            row.recency.status.emoji(),
            truncate(&row.name, 24),
            truncate(&row.email, 28),
            row.projects,
            row.microcredentials,
            row.total,
            row.recency.last_update_display()
        ));
    }
    table
}

fn users_table(users: &[UserCard]) -> String {
    if users.is_empty() {
        return "No accounts found.\n".to_string();
    }

    let mut table = String::new();
    for user in users {
        table.push_str(&format!(
            "{:<14} [{:>2}] {:<24} {:<28} joined {}\n",
            user.status_badge(),
            user.initials,
            truncate(&user.name, 24),
            truncate(&user.email, 28),
            format_date(user.joined)
        ));
    }
    table
}

fn student_block(detail: &StudentDetail, chart_width: usize) -> String {
    let student = &detail.student;
    let mut block = format!("{} <{}>\n", student.name, student.email);
    if let Some(ref program) = student.program {
        block.push_str(&format!("Program: {}\n", program));
    }
    block.push_str(&format!(
        "Status:  {} {} (last update {})\n\n",
        detail.recency.status.emoji(),
        detail.recency.status,
        detail.recency.last_update_display()
    ));

    block.push_str(&format!("Projects ({})\n", detail.grouped.projects.len()));
    for project in &detail.grouped.projects {
        block.push_str(&format!("  • {}", project.display_title()));
        if let Some(ref link) = project.github_link {
            block.push_str(&format!("  {}", link));
        }
        block.push('\n');
    }

    block.push_str(&format!(
        "\nMicrocredentials ({})\n",
        detail.grouped.microcredentials.len()
    ));
    for cred in &detail.grouped.microcredentials {
        block.push_str(&format!(
            "  • {}  issued {}\n",
            cred.display_title(),
            format_date(cred.issue_date)
        ));
    }

    if !detail.timeline.is_empty() {
        block.push_str("\nTimeline\n");
        for entry in &detail.timeline {
            block.push_str(&format!("  {}  {}\n", format_date(entry.timestamp), entry.title));
        }
    }

    block.push_str(&skills_chart("Skills", &detail.skills, chart_width));
    block
}

fn skills_chart(heading: &str, skills: &[SkillShare], width: usize) -> String {
    let mut chart = format!("\n{}\n", heading);
    if skills.is_empty() {
        chart.push_str("  (none)\n");
        return chart;
    }

    let label_width = skills
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .min(20);
    let max = skills.iter().map(|s| s.count).max().unwrap_or(0);

    for skill in skills {
        chart.push_str(&format!(
            "  {:<label$} {:<width$} {:>3} ({}%)\n",
            truncate(&skill.name, label_width),
            bar(skill.count, max, width),
            skill.count,
            skill.percent,
            label = label_width,
            width = width
        ));
    }
    chart
}

/// A bar of `value / max` scaled to `width` cells.
fn bar(value: usize, max: usize, width: usize) -> String {
    if max == 0 || value == 0 || width == 0 {
        return String::new();
    }
    let cells = ((value as f64 / max as f64) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width))
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
