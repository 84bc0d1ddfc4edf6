//! Data models for the PortfolioX API.
//!
//! This module contains the wire types returned by the backend and the
//! normalization applied to them at deserialization time: timestamps are
//! parsed leniently and skills are flattened to plain names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Backend identifier of a user account.
pub type UserId = i64;

/// Backend identifier of a portfolio item.
pub type PortfolioId = i64;

/// Registration status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    /// Awaiting admin review (faculty only)
    Pending,
    /// Allowed to sign in
    Approved,
    /// Registration refused by an admin
    Rejected,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Pending => write!(f, "Pending"),
            AccountStatus::Approved => write!(f, "Approved"),
            AccountStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl AccountStatus {
    /// Returns an emoji badge for the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "🟡",
            AccountStatus::Approved => "🟢",
            AccountStatus::Rejected => "🔴",
        }
    }
}

/// Role attached to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "Student"),
            Role::Faculty => write!(f, "Faculty"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

/// Account kinds an admin can reset or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedRole {
    Student,
    Faculty,
}

impl ManagedRole {
    /// Path segment under `/api/users/`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            ManagedRole::Student => "students",
            ManagedRole::Faculty => "faculty",
        }
    }
}

impl fmt::Display for ManagedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagedRole::Student => write!(f, "student"),
            ManagedRole::Faculty => write!(f, "faculty"),
        }
    }
}

/// A student or faculty account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "userID")]
    pub id: UserId,
    #[serde(default)]
    pub fname: String,
    #[serde(default)]
    pub lname: String,
    #[serde(default)]
    pub username: String,
    #[serde(rename = "userEmail", default)]
    pub email: String,
    #[serde(default)]
    pub program_major: Option<String>,
    /// Absolute URL or an `/uploads/...` path on the backend.
    #[serde(default)]
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub status: Option<AccountStatus>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Returns "First Last", trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.fname, self.lname).trim().to_string()
    }

    /// Two-letter initials used when no profile picture is set.
    pub fn initials(&self) -> String {
        self.fname
            .chars()
            .take(1)
            .chain(self.lname.chars().take(1))
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Category of a portfolio item, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    Project,
    Microcredentials,
    /// Any value the dashboards do not recognize.
    Other(String),
    /// No category on the record.
    Missing,
}

impl Category {
    /// Classify a raw category value.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Category::Missing;
        };
        match raw.to_lowercase().as_str() {
            "project" | "projects" => Category::Project,
            "microcredential" | "microcredentials" => Category::Microcredentials,
            _ => Category::Other(raw.to_string()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Project => write!(f, "Project"),
            Category::Microcredentials => write!(f, "Microcredential"),
            Category::Other(s) => write!(f, "{}", s),
            Category::Missing => write!(f, "Uncategorized"),
        }
    }
}

/// A project or microcredential record owned by a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    #[serde(rename = "portfolioID")]
    pub id: PortfolioId,
    #[serde(rename = "userID", default)]
    pub owner_id: Option<UserId>,
    #[serde(rename = "portfolioTitle", default)]
    pub title: String,
    #[serde(rename = "portfolioDescription", default)]
    pub description: String,
    /// Raw category as sent by the backend; see [`Portfolio::category`].
    #[serde(rename = "category", default)]
    pub raw_category: Option<String>,
    #[serde(default)]
    pub github_link: Option<String>,
    #[serde(default)]
    pub cert_title: Option<String>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub issue_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cert_file: Option<String>,
    /// Skill names, normalized from either bare strings or `{skillName}` objects.
    #[serde(default, deserialize_with = "skills::normalize")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::lenient")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Portfolio {
    /// Parsed category of this item.
    pub fn category(&self) -> Category {
        Category::parse(self.raw_category.as_deref())
    }

    /// Last update time, falling back to the creation time.
    pub fn effective_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_updated.or(self.created_at)
    }

    /// Title shown on cards: the certificate title for microcredentials when present.
    pub fn display_title(&self) -> &str {
        match (self.category(), self.cert_title.as_deref()) {
            (Category::Microcredentials, Some(cert)) if !cert.trim().is_empty() => cert,
            _ => &self.title,
        }
    }
}

/// Body of a password reset response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemporaryPassword {
    pub temporary_password: String,
}

/// Credentials sent to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user_id: UserId,
    pub username: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Lenient timestamp parsing for backend date fields.
pub mod timestamp {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Parse RFC 3339, naive ISO date-times (taken as UTC) or bare dates.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    /// Jackson may emit `LocalDateTime` as `[year, month, day, hour, minute, second, nanos]`.
    fn from_parts(parts: &[Value]) -> Option<DateTime<Utc>> {
        let nums: Vec<i64> = parts.iter().map(Value::as_i64).collect::<Option<_>>()?;
        let get = |i: usize| nums.get(i).copied().unwrap_or(0);
        if nums.len() < 3 {
            return None;
        }

        let part = |i: usize| u32::try_from(get(i)).ok();
        let date = NaiveDate::from_ymd_opt(i32::try_from(get(0)).ok()?, part(1)?, part(2)?)?;
        date.and_hms_nano_opt(part(3)?, part(4)?, part(5)?, part(6)?)
            .map(|naive| naive.and_utc())
    }

    /// Deserialize an optional timestamp; unparseable values become `None`.
    pub fn lenient<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<Value> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::String(s)) => parse(&s),
            Some(Value::Array(parts)) => from_parts(&parts),
            _ => None,
        })
    }
}

/// Skill normalization applied once, at ingestion.
pub mod skills {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// The two shapes a skill arrives in.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(untagged)]
    pub enum RawSkill {
        Name(String),
        Named {
            #[serde(rename = "skillName", alias = "name", default)]
            skill_name: Option<String>,
        },
        Unknown(Value),
    }

    impl RawSkill {
        /// The usable skill name, if any.
        pub fn into_name(self) -> Option<String> {
            let name = match self {
                RawSkill::Name(name) => name,
                RawSkill::Named {
                    skill_name: Some(name),
                } => name,
                _ => return None,
            };
            let trimmed = name.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }

    /// Deserialize a skill list into plain names, dropping unnamed entries.
    pub fn normalize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<Vec<RawSkill>> = Option::deserialize(deserializer)?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .filter_map(RawSkill::into_name)
            .collect())
    }
}
