//! Cloud API trait and the error kinds each call can report

use async_trait::async_trait;

use crate::lock_table::LockTableSpec;

/// A failed cloud API call, carrying the SDK's rendered error chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API calls that have no call-specific error kinds
pub type ApiResult<T> = Result<T, ApiError>;

/// Whether the lock table could be described
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Exists,
    NotFound,
}

/// Why the credential probe failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsFailure {
    /// No provider in the chain produced credentials
    Missing,
    /// Credentials are only partly configured
    Partial,
    /// The service answered with `AccessDenied`
    AccessDenied,
    /// Any other error returned by the service
    Service(ApiError),
    /// Everything else: timeouts, dispatch and construction failures
    Unexpected(ApiError),
}

/// Why bucket creation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketCreateFailure {
    /// The name is already taken by some account
    AlreadyExists,
    Other(ApiError),
}

/// Cloud operations needed to set up a Terraform remote-state backend
///
/// Each method issues exactly one API call. Error classification happens
/// inside the implementation so callers only branch on typed kinds.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// List buckets to confirm credentials resolve and are authorized
    async fn list_buckets(&self) -> Result<(), CredentialsFailure>;

    /// Describe the lock table
    ///
    /// A not-found response is `Ok(TableStatus::NotFound)`, any other failure is an error.
    async fn describe_table(&self, table_name: &str) -> ApiResult<TableStatus>;

    /// Create the state bucket in the implementation's region
    async fn create_bucket(&self, bucket_name: &str) -> Result<(), BucketCreateFailure>;

    /// Turn on object versioning for the bucket
    async fn put_bucket_versioning(&self, bucket_name: &str) -> ApiResult<()>;

    /// Turn on default AES256 server-side encryption for the bucket
    async fn put_bucket_encryption(&self, bucket_name: &str) -> ApiResult<()>;

    /// Create the lock table described by `spec`
    async fn create_table(&self, spec: &LockTableSpec) -> ApiResult<()>;
}
