use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:8000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// Base URL of the Orthanc-compatible PACS
    #[serde(default = "default_pacs_url")]
    pub pacs_url: String,

    /// HMAC secret for session tokens
    pub jwt_secret: String,

    /// Session token validity window, in minutes
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,

    /// Verification-code lifetime, in minutes
    #[serde(default = "default_code_ttl_minutes")]
    pub code_ttl_minutes: u64,

    /// Interval between archive-job status polls, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// SMTP relay host for verification codes
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    /// SMTP relay port
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Sender address on outgoing verification mail
    #[serde(default = "default_mail_from")]
    pub mail_from: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_pacs_url() -> String {
    "http://orthanc:8042".to_string()
}

fn default_token_ttl_minutes() -> i64 {
    1440
}

fn default_code_ttl_minutes() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_smtp_host() -> String {
    "smtp".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

fn default_mail_from() -> String {
    "no-reply@pacs-portal.local".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }
}
