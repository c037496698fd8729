//! Setup error taxonomy
//!
//! Each variant's `Display` output is the diagnostic printed for it.

use thiserror::Error;

use crate::api::{ApiError, BucketCreateFailure, CredentialsFailure};
use crate::config::ConfigError;

/// Exit status for every handled failure
pub const EXIT_FAILURE: i32 = 1;

/// Exit status for failures that surface without a friendly message
pub const EXIT_UNHANDLED: i32 = 2;

/// Errors that end a provisioning run
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Error: {0}")]
    Config(#[from] ConfigError),

    #[error("Error: AWS credentials not found. Please configure your AWS credentials.")]
    CredentialsNotFound,

    #[error("Error: Incomplete AWS credentials. Please check your AWS credentials configuration.")]
    IncompleteCredentials,

    #[error("Error: Access denied. Please check your AWS IAM permissions.")]
    AccessDenied,

    /// Any other service error from the credential probe
    #[error("Error: {0}")]
    CredentialsRejected(ApiError),

    #[error("Unexpected error: {0}")]
    Unexpected(ApiError),

    /// Describing the lock table failed for a reason other than not-found
    #[error("Error checking DynamoDB table: {0}")]
    TableCheck(ApiError),

    #[error(
        "Error creating S3 bucket: The requested bucket name '{0}' is already in use. Please choose a different name."
    )]
    BucketNameInUse(String),

    #[error("Error creating S3 bucket: {0}")]
    BucketCreation(ApiError),

    /// A post-creation bucket setting failed; the raw error is all there is
    #[error("{operation}: {source}")]
    BucketConfiguration {
        operation: &'static str,
        source: ApiError,
    },

    #[error("Error creating DynamoDB table: {0}")]
    TableCreation(ApiError),
}

impl SetupError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BucketConfiguration { .. } => EXIT_UNHANDLED,
            _ => EXIT_FAILURE,
        }
    }

    /// Whether this error skipped the usual friendly reporting
    pub fn is_unhandled(&self) -> bool {
        matches!(self, Self::BucketConfiguration { .. })
    }

    pub(crate) fn bucket_creation(bucket_name: &str, failure: BucketCreateFailure) -> Self {
        match failure {
            BucketCreateFailure::AlreadyExists => Self::BucketNameInUse(bucket_name.to_string()),
            BucketCreateFailure::Other(err) => Self::BucketCreation(err),
        }
    }
}

impl From<CredentialsFailure> for SetupError {
    fn from(failure: CredentialsFailure) -> Self {
        match failure {
            CredentialsFailure::Missing => Self::CredentialsNotFound,
            CredentialsFailure::Partial => Self::IncompleteCredentials,
            CredentialsFailure::AccessDenied => Self::AccessDenied,
            CredentialsFailure::Service(err) => Self::CredentialsRejected(err),
            CredentialsFailure::Unexpected(err) => Self::Unexpected(err),
        }
    }
}

/// Result type for setup stages
pub type SetupResult<T> = Result<T, SetupError>;
