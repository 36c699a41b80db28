use std::path::PathBuf;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

use crate::domain::FutureDatePolicy;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime settings for opening a [`crate::application::LedgerService`].
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file
    pub database: PathBuf,
    pub future_dates: FutureDatePolicy,
    pub max_connections: u32,
    /// How long a writer waits for the database lock before giving up
    pub busy_timeout: Duration,
}

impl Config {
    pub fn new(database: impl Into<PathBuf>) -> Self {
        Self {
            database: database.into(),
            future_dates: FutureDatePolicy::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_future_dates(mut self, policy: FutureDatePolicy) -> Self {
        self.future_dates = policy;
        self
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// WAL lets readers see a consistent snapshot while a writer commits;
    /// the busy timeout queues concurrent writers instead of failing them.
    pub(crate) fn connect_options(&self, create_if_missing: bool) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.database)
            .create_if_missing(create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(self.busy_timeout)
            .foreign_keys(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("ledger.db");
        assert_eq!(config.database, PathBuf::from("ledger.db"));
        assert_eq!(config.future_dates, FutureDatePolicy::Reject);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_builders() {
        let config = Config::new("ledger.db")
            .with_future_dates(FutureDatePolicy::Allow)
            .with_max_connections(0)
            .with_busy_timeout(Duration::from_millis(250));

        assert_eq!(config.future_dates, FutureDatePolicy::Allow);
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }
}
