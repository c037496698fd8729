//! Terraform baseline backend provisioning
//!
//! This crate sets up the AWS resources a Terraform S3 remote-state backend
//! needs: a versioned, encrypted S3 bucket for state files and a DynamoDB
//! table used for state locking.
//!
//! # Overview
//!
//! - **CloudApi**: one method per AWS call, with typed failure kinds
//! - **AwsApi**: the AWS SDK implementation of `CloudApi`
//! - **Provisioner**: runs the stages in order and reports progress events
//! - **SetupError**: every fatal outcome, rendered as the printed diagnostic
//!
//! # Example
//!
//! ```ignore
//! use tfbaseline_backend::{AwsApi, BaselineConfig, Provisioner};
//!
//! let config = BaselineConfig::from_env("my-state-bucket", "my-lock-table", "eu-west-1")?;
//! let api = AwsApi::from_config(&config).await;
//!
//! Provisioner::new(&api, &config)
//!     .run(|event| println!("{}", event))
//!     .await?;
//! ```

pub mod api;
pub mod backends;
pub mod config;
pub mod error;
pub mod lock_table;
pub mod provisioner;

// Re-export main types for convenience
pub use api::{
    ApiError, ApiResult, BucketCreateFailure, CloudApi, CredentialsFailure, TableStatus,
};
pub use backends::AwsApi;
pub use config::{BaselineConfig, ConfigError, TABLE_FAILURE_ENV, TableFailurePolicy};
pub use error::{EXIT_FAILURE, EXIT_UNHANDLED, SetupError, SetupResult};
pub use lock_table::{LOCK_KEY_ATTRIBUTE, LockTableSpec};
pub use provisioner::{Event, Outcome, Provisioner};
