use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),
}

/// Settings for the mailbox importer. Built once from the environment and
/// passed in explicitly so the importer stays testable in isolation.
#[derive(Clone)]
pub struct MailConfig {
    /// Path of the JSON message spool acting as the mailbox
    pub spool_path: PathBuf,
    /// Mailbox folder the importer is bounded to
    pub folder: String,
    /// Board that receives imported tasks
    pub board_name: String,
    /// Column within the board that receives imported tasks
    pub column_name: String,
    /// Optional shared secret gating the scheduled-trigger entry point
    pub cron_secret: Option<String>,
}

impl MailConfig {
    pub fn from_env(default_spool: PathBuf) -> Result<Self, ConfigError> {
        let spool_path = env::var("CREWBOARD_MAIL_SPOOL")
            .map(PathBuf::from)
            .unwrap_or(default_spool);
        let folder = env::var("CREWBOARD_MAIL_FOLDER").unwrap_or_else(|_| String::from("INBOX"));
        let board_name = env::var("CREWBOARD_MAIL_BOARD")
            .map_err(|_| ConfigError::MissingVar("CREWBOARD_MAIL_BOARD"))?;
        let column_name =
            env::var("CREWBOARD_MAIL_COLUMN").unwrap_or_else(|_| String::from("Inbox"));
        let cron_secret = env::var("CREWBOARD_CRON_SECRET").ok();

        Ok(Self {
            spool_path,
            folder,
            board_name,
            column_name,
            cron_secret,
        })
    }
}

/// Settings for the share-link subsystem.
#[derive(Clone)]
pub struct ShareConfig {
    /// Secret under which share cookies are signed
    pub secret: String,
}

impl ShareConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env::var("CREWBOARD_SHARE_SECRET")
            .map_err(|_| ConfigError::MissingVar("CREWBOARD_SHARE_SECRET"))?;
        Ok(Self { secret })
    }
}
