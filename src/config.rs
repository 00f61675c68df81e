// File: ./src/config.rs
// Handles configuration loading, defaults and validation.
use crate::context::AppContext;
use crate::error::AgendaError;
use anyhow::{Error, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Longest lookahead accepted, about ten years.
pub const MAX_LOOKAHEAD_DAYS: u32 = 3660;

fn default_days() -> u32 {
    14
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// One calendar to fetch and the short label it gets in the agenda.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CalendarAlias {
    /// Display name of the calendar on the server (or any name for ICS files).
    pub name: String,
    pub label: String,
    /// Collection path on the server. Skips discovery when set.
    #[serde(default)]
    pub href: Option<String>,
    /// Local `.ics` export used instead of a server.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Published `.ics` feed, downloaded on every run. Takes precedence over
    /// `file`.
    #[serde(default)]
    pub ics_url: Option<String>,
}

impl CalendarAlias {
    pub fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            href: None,
            file: None,
            ics_url: None,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub allow_insecure_certs: bool,

    /// IANA zone the agenda timestamps are shown in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Lookahead window in days, starting now.
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Meetings are kept when their title contains one of these (case-sensitive).
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub calendars: Vec<CalendarAlias>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            allow_insecure_certs: false,
            timezone: default_timezone(),
            days: default_days(),
            output: None,
            keywords: Vec::new(),
            calendars: Vec::new(),
        }
    }
}

impl Config {
    /// Load the configuration from the context's config directory.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;
        Self::load_from(&path)
    }

    /// Load and validate a configuration file at an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Config file not found: '{}'",
                path.display()
            ));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config = Self::from_toml(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Helper to detect whether an error indicates that the config file was missing.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Reject configurations that would mislabel or silently drop meetings.
    pub fn validate(&self) -> Result<(), AgendaError> {
        if self.calendars.is_empty() {
            return Err(AgendaError::Config("no calendars configured".to_string()));
        }

        let mut seen = HashSet::new();
        for cal in &self.calendars {
            if cal.name.trim().is_empty() {
                return Err(AgendaError::Config("calendar with empty name".to_string()));
            }
            if cal.label.trim().is_empty() {
                return Err(AgendaError::Config(format!(
                    "calendar '{}' has an empty label",
                    cal.name
                )));
            }
            if !seen.insert(cal.name.as_str()) {
                return Err(AgendaError::Config(format!(
                    "calendar '{}' is listed twice",
                    cal.name
                )));
            }
        }

        if self.keywords.iter().any(|k| k.is_empty()) {
            return Err(AgendaError::Config(
                "empty keyword would match every meeting".to_string(),
            ));
        }

        if self.days > MAX_LOOKAHEAD_DAYS {
            return Err(AgendaError::Config(format!(
                "days = {} is longer than the {} day maximum",
                self.days, MAX_LOOKAHEAD_DAYS
            )));
        }

        self.target_zone()?;
        Ok(())
    }

    /// Label for a calendar name. Unknown names are a configuration error.
    pub fn alias_for(&self, calendar: &str) -> Result<&str, AgendaError> {
        self.calendars
            .iter()
            .find(|c| c.name == calendar)
            .map(|c| c.label.as_str())
            .ok_or_else(|| AgendaError::UnresolvedCalendarAlias(calendar.to_string()))
    }

    pub fn target_zone(&self) -> Result<Tz, AgendaError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| AgendaError::Config(format!("unknown time zone '{}'", self.timezone)))
    }

    /// Resolved output path: the configured one (with `~/` expanded) or the
    /// context default.
    pub fn output_path(&self, ctx: &dyn AppContext) -> Result<PathBuf> {
        match &self.output {
            Some(p) => Ok(expand_home(p)),
            None => ctx.get_default_output_path(),
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(base) = directories::BaseDirs::new()
    {
        return base.home_dir().join(rest);
    }
    path.to_path_buf()
}
