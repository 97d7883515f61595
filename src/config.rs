use std::env;
use std::path::PathBuf;

/// Discount rate (percent) at or above which subscribers get a THRESHOLD_MET email.
pub const THRESHOLD_PERCENTAGE: f64 = 40.0;

/// Product titles longer than this are shortened in email subjects.
pub const TITLE_PREVIEW_LEN: usize = 20;

pub const PROXY_HOST: &str = "brd.superproxy.io";
pub const PROXY_PORT: u16 = 22225;

pub const DEFAULT_SMTP_HOST: &str = "smtp-mail.outlook.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

pub const DB_FILE_NAME: &str = "products.duckdb";

/// Image shown in the WELCOME email as a sample of a stock alert.
pub const WELCOME_SAMPLE_IMAGE: &str =
    "https://i.ibb.co/pwFBRMC/Screenshot-2023-09-26-at-1-47-50-AM.png";

/// Credentials for the rotating scrape proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

/// Credentials and relay for outgoing mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Runtime settings gathered from the environment.
///
/// Every section is optional: a missing database path means the platform
/// default, a missing proxy means direct requests, and missing mail settings
/// mean notifications are only logged.
#[derive(Debug, Clone, Default)]
pub struct TrackerConfig {
    pub db_path: Option<PathBuf>,
    pub proxy: Option<ProxyCredentials>,
    pub smtp: Option<SmtpSettings>,
}

impl TrackerConfig {
    /// Read `PRICE_TRACKER_DB`, `BRIGHT_DATA_USERNAME`, `BRIGHT_DATA_PASSWORD`,
    /// `EMAIL_USER`, `EMAIL_PASSWORD` and `SMTP_HOST`.
    pub fn from_env() -> Self {
        let db_path = non_empty_var("PRICE_TRACKER_DB").map(PathBuf::from);

        let proxy = match (
            non_empty_var("BRIGHT_DATA_USERNAME"),
            non_empty_var("BRIGHT_DATA_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(ProxyCredentials { username, password }),
            _ => None,
        };

        let smtp = match (non_empty_var("EMAIL_USER"), non_empty_var("EMAIL_PASSWORD")) {
            (Some(username), Some(password)) => Some(SmtpSettings {
                host: non_empty_var("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                port: DEFAULT_SMTP_PORT,
                username,
                password,
            }),
            _ => None,
        };

        Self {
            db_path,
            proxy,
            smtp,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn default_db_path() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("price-tracker").join(DB_FILE_NAME)
    } else {
        PathBuf::from(".price-tracker").join(DB_FILE_NAME)
    }
}
