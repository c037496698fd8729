//! Run configuration: positional arguments plus environment overrides

use std::str::FromStr;

use thiserror::Error;

/// Environment variable selecting what a lock table creation failure does
pub const TABLE_FAILURE_ENV: &str = "TF_BASELINE_TABLE_FAILURE";

/// Errors in the environment-provided configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: expected 'continue' or 'fail'")]
    InvalidTableFailurePolicy { key: &'static str, value: String },
}

/// What happens when creating the lock table fails
///
/// `Continue` reports the failure and still finishes with success, which is
/// what existing callers of this tool depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFailurePolicy {
    #[default]
    Continue,
    Fail,
}

impl FromStr for TableFailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "fail" => Ok(Self::Fail),
            _ => Err(ConfigError::InvalidTableFailurePolicy {
                key: TABLE_FAILURE_ENV,
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration for a single provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineConfig {
    /// Globally unique S3 bucket name for state files
    pub bucket_name: String,
    /// DynamoDB lock table name
    pub table_name: String,
    /// AWS region every call is sent to
    pub region: String,
    pub table_failure: TableFailurePolicy,
}

impl BaselineConfig {
    pub fn new(
        bucket_name: impl Into<String>,
        table_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            table_name: table_name.into(),
            region: region.into(),
            table_failure: TableFailurePolicy::default(),
        }
    }

    /// Build a configuration, reading the table failure policy from the environment
    pub fn from_env(
        bucket_name: impl Into<String>,
        table_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let policy = table_failure_from(std::env::var(TABLE_FAILURE_ENV).ok().as_deref())?;
        Ok(Self::new(bucket_name, table_name, region).with_table_failure(policy))
    }

    pub fn with_table_failure(mut self, policy: TableFailurePolicy) -> Self {
        self.table_failure = policy;
        self
    }
}

/// Resolve the policy from an optional raw value; unset or empty means the default
fn table_failure_from(value: Option<&str>) -> Result<TableFailurePolicy, ConfigError> {
    match value {
        Some(raw) if !raw.trim().is_empty() => raw.parse(),
        _ => Ok(TableFailurePolicy::default()),
    }
}
