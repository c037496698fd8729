//! Provisioning stages and the sequence that runs them
//!
//! `ValidateCreds -> CheckTableExists -> {CreateBucket -> CreateTable} | Skip -> End`
//!
//! Checking for the table and creating it are separate calls, so two runs
//! started at the same time can both decide to create it.

use log::{info, warn};

use crate::api::{ApiError, CloudApi, TableStatus};
use crate::config::{BaselineConfig, TableFailurePolicy};
use crate::error::{SetupError, SetupResult};
use crate::lock_table::LockTableSpec;

/// Progress reported while provisioning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CredentialsValid,
    TableAlreadyExists { table: String },
    CreationSkipped,
    BucketCreated { bucket: String },
    TableCreated { table: String },
    /// Table creation failed and the policy says to carry on
    TableCreationFailed { table: String, error: ApiError },
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::CredentialsValid => write!(f, "AWS credentials are valid."),
            Event::TableAlreadyExists { table } => {
                write!(f, "DynamoDB table '{}' already exists.", table)
            }
            Event::CreationSkipped => write!(
                f,
                "Aborting DynamoDB creation process as the table already exists."
            ),
            Event::BucketCreated { bucket } => {
                write!(f, "S3 bucket '{}' created and configured.", bucket)
            }
            Event::TableCreated { table } => write!(f, "DynamoDB table '{}' created.", table),
            Event::TableCreationFailed { error, .. } => {
                write!(f, "Error creating DynamoDB table: {}", error)
            }
        }
    }
}

/// How a run ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The lock table already existed, nothing was created
    Skipped,
    /// The bucket was created; `table_created` is false if table creation failed
    Provisioned { table_created: bool },
}

/// Probe credentials with a side-effect free listing call
pub async fn validate_credentials(api: &dyn CloudApi) -> SetupResult<()> {
    api.list_buckets().await.map_err(SetupError::from)
}

/// Whether the lock table exists; any failure other than not-found is an error
pub async fn lock_table_exists(api: &dyn CloudApi, table_name: &str) -> SetupResult<bool> {
    match api.describe_table(table_name).await {
        Ok(TableStatus::Exists) => Ok(true),
        Ok(TableStatus::NotFound) => Ok(false),
        Err(err) => Err(SetupError::TableCheck(err)),
    }
}

/// Create the state bucket, then enable versioning and default encryption
pub async fn create_state_bucket(api: &dyn CloudApi, bucket_name: &str) -> SetupResult<()> {
    api.create_bucket(bucket_name)
        .await
        .map_err(|failure| SetupError::bucket_creation(bucket_name, failure))?;

    api.put_bucket_versioning(bucket_name)
        .await
        .map_err(|source| SetupError::BucketConfiguration {
            operation: "PutBucketVersioning",
            source,
        })?;

    api.put_bucket_encryption(bucket_name)
        .await
        .map_err(|source| SetupError::BucketConfiguration {
            operation: "PutBucketEncryption",
            source,
        })?;

    Ok(())
}

/// Create the lock table with Terraform's key schema and on-demand billing
pub async fn create_lock_table(api: &dyn CloudApi, table_name: &str) -> SetupResult<()> {
    let spec = LockTableSpec::new(table_name);
    api.create_table(&spec)
        .await
        .map_err(SetupError::TableCreation)
}

/// Runs the provisioning stages in order against a cloud API
pub struct Provisioner<'a> {
    api: &'a dyn CloudApi,
    config: &'a BaselineConfig,
}

impl<'a> Provisioner<'a> {
    pub fn new(api: &'a dyn CloudApi, config: &'a BaselineConfig) -> Self {
        Self { api, config }
    }

    /// Run every stage, reporting progress through `on_event`
    ///
    /// Stops at the first fatal error. A failed table creation is fatal only
    /// under `TableFailurePolicy::Fail`.
    pub async fn run<F>(&self, mut on_event: F) -> SetupResult<Outcome>
    where
        F: FnMut(&Event),
    {
        let bucket = &self.config.bucket_name;
        let table = &self.config.table_name;

        info!("validating credentials in {}", self.config.region);
        validate_credentials(self.api).await?;
        on_event(&Event::CredentialsValid);

        info!("checking for lock table {}", table);
        if lock_table_exists(self.api, table).await? {
            on_event(&Event::TableAlreadyExists {
                table: table.clone(),
            });
            on_event(&Event::CreationSkipped);
            return Ok(Outcome::Skipped);
        }

        info!("creating state bucket {}", bucket);
        create_state_bucket(self.api, bucket).await?;
        on_event(&Event::BucketCreated {
            bucket: bucket.clone(),
        });

        info!("creating lock table {}", table);
        match create_lock_table(self.api, table).await {
            Ok(()) => {
                on_event(&Event::TableCreated {
                    table: table.clone(),
                });
                Ok(Outcome::Provisioned {
                    table_created: true,
                })
            }
            Err(err) => match (self.config.table_failure, err) {
                (TableFailurePolicy::Continue, SetupError::TableCreation(error)) => {
                    warn!("lock table {} was not created: {}", table, error);
                    on_event(&Event::TableCreationFailed {
                        table: table.clone(),
                        error,
                    });
                    Ok(Outcome::Provisioned {
                        table_created: false,
                    })
                }
                (_, err) => Err(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BucketCreateFailure, CredentialsFailure};
    use crate::backends::mock::{Call, MockApi};
    use aws_sdk_dynamodb::types::{BillingMode, ScalarAttributeType};

    fn config() -> BaselineConfig {
        BaselineConfig::new("my-bucket", "my-lock-table", "us-east-1")
    }

    async fn run(api: &MockApi, config: &BaselineConfig) -> (SetupResult<Outcome>, Vec<Event>) {
        let mut events = Vec::new();
        let result = Provisioner::new(api, config)
            .run(|event| events.push(event.clone()))
            .await;
        (result, events)
    }

    #[tokio::test]
    async fn test_provisions_bucket_and_table() {
        let api = MockApi::default();
        let config = config();

        let (result, events) = run(&api, &config).await;

        assert_eq!(
            result.unwrap(),
            Outcome::Provisioned {
                table_created: true
            }
        );
        assert_eq!(
            api.calls(),
            vec![
                Call::ListBuckets,
                Call::DescribeTable("my-lock-table".to_string()),
                Call::CreateBucket("my-bucket".to_string()),
                Call::PutBucketVersioning("my-bucket".to_string()),
                Call::PutBucketEncryption("my-bucket".to_string()),
                Call::CreateTable(LockTableSpec::new("my-lock-table")),
            ]
        );

        let messages: Vec<String> = events.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "AWS credentials are valid.",
                "S3 bucket 'my-bucket' created and configured.",
                "DynamoDB table 'my-lock-table' created.",
            ]
        );
    }

    #[tokio::test]
    async fn test_created_table_uses_lock_schema() {
        let api = MockApi::default();
        let (result, _) = run(&api, &config()).await;
        assert!(result.is_ok());

        let spec = api
            .calls()
            .into_iter()
            .find_map(|call| match call {
                Call::CreateTable(spec) => Some(spec),
                _ => None,
            })
            .expect("create_table was not called");

        assert_eq!(spec.table_name, "my-lock-table");
        assert_eq!(spec.partition_key, "LockID");
        assert_eq!(spec.key_type, ScalarAttributeType::S);
        assert_eq!(spec.billing_mode, BillingMode::PayPerRequest);
    }

    #[tokio::test]
    async fn test_existing_table_skips_creation() {
        let api = MockApi {
            describe_table: Ok(TableStatus::Exists),
            ..Default::default()
        };

        let (result, events) = run(&api, &config()).await;

        assert_eq!(result.unwrap(), Outcome::Skipped);
        assert_eq!(
            api.calls(),
            vec![
                Call::ListBuckets,
                Call::DescribeTable("my-lock-table".to_string()),
            ]
        );
        assert_eq!(
            events,
            vec![
                Event::CredentialsValid,
                Event::TableAlreadyExists {
                    table: "my-lock-table".to_string()
                },
                Event::CreationSkipped,
            ]
        );
        assert_eq!(
            events[2].to_string(),
            "Aborting DynamoDB creation process as the table already exists."
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_stop_the_run() {
        let api = MockApi {
            list_buckets: Err(CredentialsFailure::Missing),
            ..Default::default()
        };

        let (result, events) = run(&api, &config()).await;

        let err = result.unwrap_err();
        assert!(matches!(err, SetupError::CredentialsNotFound));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(api.calls(), vec![Call::ListBuckets]);
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_access_denied_message() {
        let api = MockApi {
            list_buckets: Err(CredentialsFailure::AccessDenied),
            ..Default::default()
        };

        let (result, _) = run(&api, &config()).await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "Error: Access denied. Please check your AWS IAM permissions."
        );
        assert_eq!(api.calls(), vec![Call::ListBuckets]);
    }

    #[tokio::test]
    async fn test_table_check_error_is_fatal() {
        let api = MockApi {
            describe_table: Err(ApiError::new("ThrottlingException")),
            ..Default::default()
        };

        let (result, events) = run(&api, &config()).await;

        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error checking DynamoDB table: ThrottlingException"
        );
        assert_eq!(err.exit_code(), 1);
        assert_eq!(events, vec![Event::CredentialsValid]);
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_bucket_name_in_use_is_fatal() {
        let api = MockApi {
            create_bucket: Err(BucketCreateFailure::AlreadyExists),
            ..Default::default()
        };

        let (result, _) = run(&api, &config()).await;

        let err = result.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("my-bucket"));
        assert!(message.contains("already in use"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(api.calls().last(), Some(&Call::CreateBucket("my-bucket".to_string())));
    }

    #[tokio::test]
    async fn test_bucket_configuration_failure_is_unhandled() {
        let api = MockApi {
            put_bucket_versioning: Err(ApiError::new("InternalError")),
            ..Default::default()
        };

        let (result, events) = run(&api, &config()).await;

        let err = result.unwrap_err();
        assert!(err.is_unhandled());
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "PutBucketVersioning: InternalError");
        assert_eq!(events, vec![Event::CredentialsValid]);
        assert_eq!(
            api.calls().last(),
            Some(&Call::PutBucketVersioning("my-bucket".to_string()))
        );
    }

    #[tokio::test]
    async fn test_table_creation_failure_continues_by_default() {
        let api = MockApi {
            create_table: Err(ApiError::new("LimitExceededException")),
            ..Default::default()
        };

        let (result, events) = run(&api, &config()).await;

        assert_eq!(
            result.unwrap(),
            Outcome::Provisioned {
                table_created: false
            }
        );
        let last = events.last().unwrap();
        assert_eq!(
            last.to_string(),
            "Error creating DynamoDB table: LimitExceededException"
        );
    }

    #[tokio::test]
    async fn test_table_creation_failure_with_fail_policy() {
        let api = MockApi {
            create_table: Err(ApiError::new("LimitExceededException")),
            ..Default::default()
        };
        let config = config().with_table_failure(TableFailurePolicy::Fail);

        let (result, events) = run(&api, &config).await;

        let err = result.unwrap_err();
        assert!(matches!(err, SetupError::TableCreation(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, Event::TableCreationFailed { .. }))
        );
    }
}
