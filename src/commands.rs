//! Subcommand execution.
//!
//! Every dashboard command follows the same path: build the session and
//! client, load the page inside its cancellation scope, then render whatever
//! state the page settled in.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (network, HTTP, decode, cancelled)
//!   2 - A listed student is stale and --fail-on-stale is set
//!   3 - No session, or the backend rejected it

use crate::analysis::{
    classify_recency, filter_students, group_by_category, recent_activity, skill_distribution,
    student_rows, summarize, DashboardInput, RecencyStatus, RecencyThresholds,
};
use crate::api::{ApiClient, ApiError};
use crate::cli::{Args, Command, OutputFormat};
use crate::config::Config;
use crate::models::{ManagedRole, User, UserId};
use crate::report::{self, PageView, Report, StudentDetail, UserCard};
use crate::session::{Session, TeardownReason};
use crate::view::{collect_student_portfolios, Canceller, FetchFailure, LoadState, Page};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::future::Future;
use tracing::{debug, info, warn};

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_STALE: i32 = 2;
pub const EXIT_SESSION: i32 = 3;

/// What a page loader produces.
#[derive(Debug, Clone)]
pub struct PageData {
    pub view: PageView,
    pub partial: Vec<FetchFailure>,
}

impl From<PageView> for PageData {
    fn from(view: PageView) -> Self {
        Self {
            view,
            partial: Vec::new(),
        }
    }
}

/// Run the parsed command. Returns the process exit code.
pub async fn run(args: Args, config: Config) -> Result<i32> {
    let Some(command) = args.command.clone() else {
        bail!("No command given");
    };

    let app = App::new(args, config)?;
    let limit = app.config.dashboard.recent_limit;
    let thresholds = app.config.thresholds();
    let show_progress = app.config.report.show_progress;
    let api = &app.api;

    match command {
        Command::Login { username, password } => login(&app.config, &username, &password).await,
        Command::Logout => Ok(logout(app.api.session())),
        Command::AdminHome => app.show_page("admin-home", load_admin_home(api, limit)).await,
        Command::FacultyHome => {
            app.show_page("faculty-home", load_faculty_home(api, limit, show_progress))
                .await
        }
        Command::Students { search } => {
            app.show_page(
                "students",
                load_students(api, search, thresholds, show_progress),
            )
            .await
        }
        Command::Student { id } => {
            app.show_page("student", load_student(api, id, thresholds))
                .await
        }
        Command::Faculty => {
            app.show_page("faculty", load_users(api, "Faculty", api.faculty()))
                .await
        }
        Command::Pending => {
            let title = "Pending Faculty Approvals";
            app.show_page("pending", load_users(api, title, api.pending_faculty()))
                .await
        }
        Command::Portfolios => app.show_page("portfolios", load_portfolios(api)).await,
        Command::Skills { student } => app.show_page("skills", load_skills(api, student)).await,
        Command::Approve { id, reject } => {
            app.run_action("approve", approve(api, id, !reject)).await
        }
        Command::ResetPassword { role, id } => {
            let action = reset_password(api, role.into(), id);
            app.run_action("reset-password", action).await
        }
        Command::Delete { role, id, .. } => {
            app.run_action("delete", delete(api, role.into(), id)).await
        }
    }
}

/// Everything a command needs once the session is known.
struct App {
    args: Args,
    config: Config,
    api: ApiClient,
}

impl App {
    fn new(args: Args, config: Config) -> Result<Self> {
        let session = match args.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Session::with_token(token, args.user_id),
            _ => {
                debug!("No token given; running without a session");
                Session::anonymous()
            }
        };

        let api = ApiClient::new(config.api_settings(), session)
            .context("Failed to create API client")?;

        Ok(Self { args, config, api })
    }

    /// Load a dashboard page, render it, and pick the exit code.
    async fn show_page<F>(&self, name: &'static str, loader: F) -> Result<i32>
    where
        F: Future<Output = Result<PageData, ApiError>>,
    {
        info!("Loading {} from {}", name, self.api.base_url());

        let mut page: Page<PageData> = Page::new(name);
        let watcher = cancel_on_ctrl_c(page.canceller());
        page.load(loader).await;
        watcher.abort();

        if let Some(error) = page.state().error() {
            eprintln!("\n❌ Error: {}", error);
        }

        let Some((report, exit_code)) = settle(
            page.name(),
            self.api.base_url(),
            page.into_state(),
            self.args.fail_on_stale,
        ) else {
            eprintln!("\n⚠️  {} cancelled before it finished loading.", name);
            return Ok(EXIT_ERROR);
        };

        self.emit(&report)?;

        if exit_code == EXIT_STALE {
            eprintln!("\n⛔ Stale portfolios found. Failing (exit code 2).");
        }

        Ok(exit_code)
    }

    /// Run an admin action inside its own scope and print its outcome.
    async fn run_action<F>(&self, name: &'static str, action: F) -> Result<i32>
    where
        F: Future<Output = Result<String, ApiError>>,
    {
        let mut page: Page<String> = Page::new(name);
        let watcher = cancel_on_ctrl_c(page.canceller());
        page.load(action).await;
        watcher.abort();

        let state = page.state();
        if let Some(message) = state.ready() {
            println!("✅ {}", message);
            return Ok(EXIT_OK);
        }
        if let Some(error) = state.error() {
            eprintln!("\n❌ Error: {}", error);
            if error.session_expired {
                eprintln!("   Sign in again with `portfoliox login`.");
                return Ok(EXIT_SESSION);
            }
            return Ok(EXIT_ERROR);
        }

        eprintln!("\n⚠️  {} cancelled.", name);
        Ok(EXIT_ERROR)
    }

    /// Write the report to the output file or stdout.
    fn emit(&self, report: &Report) -> Result<()> {
        let content = match self.args.format {
            OutputFormat::Json => report::generate_json_report(report)?,
            OutputFormat::Markdown => report::generate_markdown_report(report),
            OutputFormat::Text => {
                report::generate_text_report(report, self.config.report.chart_width)
            }
        };

        match self.args.output {
            Some(ref path) => {
                std::fs::write(path, &content)
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
                if !self.args.quiet {
                    println!("✅ Report saved to: {}", path.display());
                }
            }
            None => println!("{}", content),
        }

        Ok(())
    }
}

/// Cancel the page's fetches when the user presses Ctrl-C.
fn cancel_on_ctrl_c(canceller: Canceller) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && !canceller.is_cancelled() {
            warn!("Interrupted; cancelling pending requests");
            canceller.cancel();
        }
    })
}

/// Turn a settled page into its report and exit code. `None` if it never settled.
fn settle(
    page: &str,
    api_url: &str,
    state: LoadState<PageData>,
    fail_on_stale: bool,
) -> Option<(Report, i32)> {
    let label = state.label();
    match state {
        LoadState::Ready(data) => {
            let exit_code = if fail_on_stale && has_stale(&data.view) {
                EXIT_STALE
            } else {
                EXIT_OK
            };
            let report = Report::new(page, api_url, label, data.view).with_partial(data.partial);
            Some((report, exit_code))
        }
        LoadState::Error(error) => {
            let exit_code = if error.session_expired {
                EXIT_SESSION
            } else {
                EXIT_ERROR
            };
            Some((
                Report::new(page, api_url, label, PageView::Failed { error }),
                exit_code,
            ))
        }
        LoadState::Loading => None,
    }
}

fn has_stale(view: &PageView) -> bool {
    match view {
        PageView::Students { rows, .. } => rows
            .iter()
            .any(|row| row.recency.status == RecencyStatus::Stale),
        PageView::Student { detail } => detail.recency.status == RecencyStatus::Stale,
        _ => false,
    }
}

async fn login(config: &Config, username: &str, password: &str) -> Result<i32> {
    let api = ApiClient::new(config.api_settings(), Session::anonymous())
        .context("Failed to create API client")?;

    match api.login(username, password).await {
        Ok(response) => {
            let session = Session::from_login(&response);
            let profile = session.profile();

            println!("export PORTFOLIOX_TOKEN={}", response.token);
            println!("export PORTFOLIOX_USER_ID={}", response.user_id);
            match profile.role {
                Some(role) => eprintln!("✅ Signed in as {} ({})", response.username, role),
                None => eprintln!("✅ Signed in as {}", response.username),
            }
            Ok(EXIT_OK)
        }
        Err(err) if err.is_auth() => {
            eprintln!("❌ Invalid username or password, or the account is not approved yet.");
            Ok(EXIT_SESSION)
        }
        Err(err) => Err(err).context("Login failed"),
    }
}

/// End the session and print the shell lines that forget it.
fn logout(session: &Session) -> i32 {
    let was_active = session.is_active();
    session.clear(TeardownReason::Logout);

    println!("unset PORTFOLIOX_TOKEN PORTFOLIOX_USER_ID");
    if was_active {
        eprintln!("👋 Signed out.");
    } else {
        eprintln!("No active session.");
    }
    EXIT_OK
}

async fn load_admin_home(api: &ApiClient, recent_limit: usize) -> Result<PageData, ApiError> {
    let students = api.students().await?;
    let faculty = api.faculty().await?;
    let pending = api.pending_faculty().await?;
    let portfolios = api.portfolios().await?;

    let summary = summarize(
        DashboardInput {
            students: &students,
            faculty: &faculty,
            pending_faculty: &pending,
            portfolios: &portfolios,
        },
        recent_limit,
    );

    Ok(PageView::AdminHome { summary }.into())
}

async fn load_faculty_home(
    api: &ApiClient,
    recent_limit: usize,
    show_progress: bool,
) -> Result<PageData, ApiError> {
    let welcome = match api.session().profile().user_id {
        Some(id) => greeting(api, id).await?,
        None => None,
    };

    let students = api.students().await?;
    let fan_out =
        collect_student_portfolios(&students, move |id| api.student_portfolios(id), show_progress)
            .await?;
    if fan_out.is_partial() {
        warn!(
            "{} of {} student(s) missing from the dashboard totals",
            fan_out.failures.len(),
            students.len()
        );
    }
    let portfolios = fan_out.all_portfolios();

    let summary = summarize(
        DashboardInput {
            students: &students,
            portfolios: &portfolios,
            ..Default::default()
        },
        recent_limit,
    );

    Ok(PageData {
        view: PageView::FacultyHome { welcome, summary },
        partial: fan_out.failures,
    })
}

/// First name of the signed-in user. Only auth failures and cancellation are fatal.
async fn greeting(api: &ApiClient, id: UserId) -> Result<Option<String>, ApiError> {
    match api.user(id).await {
        Ok(user) => {
            api.session()
                .update_profile(Some(user.username.clone()), user.profile_pic.clone());
            let name = if user.fname.trim().is_empty() {
                user.username
            } else {
                user.fname
            };
            Ok(Some(name))
        }
        Err(err) if err.is_auth() || matches!(err, ApiError::Cancelled) => Err(err),
        Err(err) => {
            warn!("Could not load profile for user {}: {}", id, err);
            Ok(None)
        }
    }
}

async fn load_students(
    api: &ApiClient,
    search: Option<String>,
    thresholds: RecencyThresholds,
    show_progress: bool,
) -> Result<PageData, ApiError> {
    let students = api.students().await?;
    let selected: Vec<User> = match search.as_deref() {
        Some(term) => filter_students(&students, term)
            .into_iter()
            .cloned()
            .collect(),
        None => students,
    };
    debug!("{} student(s) selected", selected.len());

    let fan_out =
        collect_student_portfolios(&selected, move |id| api.student_portfolios(id), show_progress)
            .await?;
    if fan_out.is_partial() {
        warn!(
            "{} of {} student(s) shown without portfolio data",
            fan_out.failures.len(),
            selected.len()
        );
    }
    let rows = student_rows(&selected, &fan_out.by_student(), Utc::now(), thresholds);

    Ok(PageData {
        view: PageView::Students { search, rows },
        partial: fan_out.failures,
    })
}

async fn load_student(
    api: &ApiClient,
    id: UserId,
    thresholds: RecencyThresholds,
) -> Result<PageData, ApiError> {
    let student = api.user(id).await?;
    let mut items = api.student_portfolios(id).await?;
    for item in items.iter_mut() {
        item.owner_id.get_or_insert(id);
    }

    let grouped = group_by_category(&items);
    let shown = grouped.merged();

    let detail = StudentDetail {
        student: UserCard::from_user(&student, |path| api.asset_url(path)),
        recency: classify_recency(&items, Utc::now(), thresholds),
        timeline: recent_activity(&shown, std::slice::from_ref(&student), shown.len()),
        skills: skill_distribution(&items),
        grouped,
    };

    Ok(PageView::Student { detail }.into())
}

async fn load_users<F>(api: &ApiClient, title: &str, fetch: F) -> Result<PageData, ApiError>
where
    F: Future<Output = Result<Vec<User>, ApiError>>,
{
    let users = fetch.await?;
    let users = users
        .iter()
        .map(|user| UserCard::from_user(user, |path| api.asset_url(path)))
        .collect();

    Ok(PageView::Users {
        title: title.to_string(),
        users,
    }
    .into())
}

async fn load_portfolios(api: &ApiClient) -> Result<PageData, ApiError> {
    let items = api.portfolios().await?;
    let grouped = group_by_category(&items);
    debug!(
        "{} of {} portfolio item(s) in a known category",
        grouped.recognized(),
        items.len()
    );
    Ok(PageView::Portfolios { grouped }.into())
}

async fn load_skills(api: &ApiClient, student: Option<UserId>) -> Result<PageData, ApiError> {
    let (scope, items) = match student {
        Some(id) => (format!("student #{}", id), api.student_portfolios(id).await?),
        None => ("all portfolios".to_string(), api.portfolios().await?),
    };

    Ok(PageView::Skills {
        scope,
        skills: skill_distribution(&items),
    }
    .into())
}

async fn approve(api: &ApiClient, id: UserId, approve: bool) -> Result<String, ApiError> {
    let message = api.approve_faculty(id, approve).await?;
    let message = message.trim();
    if message.is_empty() {
        Ok(format!(
            "Faculty {} {}",
            id,
            if approve { "approved" } else { "rejected" }
        ))
    } else {
        Ok(message.to_string())
    }
}

async fn reset_password(
    api: &ApiClient,
    role: ManagedRole,
    id: UserId,
) -> Result<String, ApiError> {
    let reset = api.reset_password(role, id).await?;
    Ok(format!(
        "Temporary password for {} {}: {}",
        role, id, reset.temporary_password
    ))
}

async fn delete(api: &ApiClient, role: ManagedRole, id: UserId) -> Result<String, ApiError> {
    api.delete_user(role, id).await?;
    Ok(format!("Deleted {} {}", role, id))
}
