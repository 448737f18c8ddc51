//! Application configuration, built once at startup and shared read-only.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};

/// Admin tokens that ship as defaults and must be replaced outside local use.
pub const PLACEHOLDER_TOKENS: &[&str] = &["change-me", "changeme", "admin"];

const DEFAULT_ADMIN_TOKEN: &str = "change-me";

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    /// Bind host (e.g. "0.0.0.0").
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Public base URL used to build the emailed moderation links, without
    /// a trailing slash.
    pub base_url: String,

    /// Shared secret protecting the `/admin` routes.
    pub admin_token: String,

    /// SQLite database file.
    pub db_path: PathBuf,

    /// Directory served at `/`.
    pub static_dir: PathBuf,

    /// Upper bound on a single notification send.
    pub notify_timeout: Duration,

    /// Mail transport settings; `None` disables notifications.
    pub mail: Option<MailConfig>,
}

/// SMTP settings for moderation notifications.
#[derive(Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    /// Implicit TLS when true, opportunistic STARTTLS otherwise.
    pub secure: bool,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `GUESTBOOK_HOST` (default "0.0.0.0"), `GUESTBOOK_PORT` (default 3000)
    /// - `GUESTBOOK_BASE_URL` (default "http://localhost:<port>")
    /// - `GUESTBOOK_ADMIN_TOKEN` (default "change-me")
    /// - `GUESTBOOK_DB_PATH` (default "guestbook.db")
    /// - `GUESTBOOK_STATIC_DIR` (default "public")
    /// - `GUESTBOOK_NOTIFY_TIMEOUT_SECS` (default 10)
    /// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_SECURE`, `SMTP_USER`, `SMTP_PASS`,
    ///   `MAIL_FROM`, `MAIL_TO`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get("GUESTBOOK_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match get("GUESTBOOK_PORT") {
            Some(v) => v.parse().with_context(|| format!("invalid GUESTBOOK_PORT: {v}"))?,
            None => 3000,
        };

        let base_url = get("GUESTBOOK_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&base_url)
            .with_context(|| format!("invalid GUESTBOOK_BASE_URL: {base_url}"))?;

        let admin_token =
            get("GUESTBOOK_ADMIN_TOKEN").unwrap_or_else(|| DEFAULT_ADMIN_TOKEN.to_string());

        let db_path: PathBuf = get("GUESTBOOK_DB_PATH")
            .unwrap_or_else(|| "guestbook.db".to_string())
            .into();
        let static_dir: PathBuf = get("GUESTBOOK_STATIC_DIR")
            .unwrap_or_else(|| "public".to_string())
            .into();

        let notify_timeout = match get("GUESTBOOK_NOTIFY_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .with_context(|| format!("invalid GUESTBOOK_NOTIFY_TIMEOUT_SECS: {v}"))?,
            ),
            None => Duration::from_secs(10),
        };

        let mail = match (get("SMTP_HOST"), get("SMTP_USER"), get("SMTP_PASS")) {
            (Some(host), Some(user), Some(pass)) => {
                let secure = match get("SMTP_SECURE") {
                    Some(v) => parse_bool(&v).with_context(|| format!("invalid SMTP_SECURE: {v}"))?,
                    None => true,
                };
                let port: u16 = match get("SMTP_PORT") {
                    Some(v) => v.parse().with_context(|| format!("invalid SMTP_PORT: {v}"))?,
                    None if secure => 465,
                    None => 587,
                };
                let from = get("MAIL_FROM").unwrap_or_else(|| user.clone());
                let to = get("MAIL_TO").unwrap_or_else(|| from.clone());
                Some(MailConfig {
                    host,
                    port,
                    secure,
                    user,
                    pass,
                    from,
                    to,
                })
            }
            _ => None,
        };

        tracing::info!(
            host = %host,
            port,
            base_url = %base_url,
            db_path = %db_path.display(),
            mail_enabled = mail.is_some(),
            notify_timeout_secs = notify_timeout.as_secs(),
            "configuration loaded"
        );

        Ok(Self {
            host,
            port,
            base_url,
            admin_token,
            db_path,
            static_dir,
            notify_timeout,
            mail,
        })
    }

    pub fn uses_placeholder_token(&self) -> bool {
        PLACEHOLDER_TOKENS.contains(&self.admin_token.as_str())
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("expected a boolean"),
    }
}
