//! AWS implementation of the cloud API (S3 + DynamoDB)

use std::error::Error;

use async_trait::async_trait;
use aws_credential_types::provider::error::CredentialsError;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::types::{AttributeDefinition, KeySchemaElement, KeyType};
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus, CreateBucketConfiguration,
    ServerSideEncryption, ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration,
    ServerSideEncryptionRule, VersioningConfiguration,
};
use log::debug;

use crate::api::{
    ApiError, ApiResult, BucketCreateFailure, CloudApi, CredentialsFailure, TableStatus,
};
use crate::config::BaselineConfig;
use crate::lock_table::LockTableSpec;

/// Region where S3 rejects an explicit location constraint
const DEFAULT_S3_REGION: &str = "us-east-1";

/// Cloud API backed by the AWS SDK
pub struct AwsApi {
    s3_client: S3Client,
    dynamodb_client: DynamoDbClient,
    /// AWS region
    region: String,
}

impl AwsApi {
    /// Create clients for `region` using the standard credential provider chain
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        Self {
            s3_client: S3Client::new(&config),
            dynamodb_client: DynamoDbClient::new(&config),
            region: region.to_string(),
        }
    }

    /// Create clients for the region named in `config`
    pub async fn from_config(config: &BaselineConfig) -> Self {
        Self::new(&config.region).await
    }
}

#[async_trait]
impl CloudApi for AwsApi {
    async fn list_buckets(&self) -> Result<(), CredentialsFailure> {
        debug!("ListBuckets in {}", self.region);
        match self.s3_client.list_buckets().send().await {
            Ok(_) => Ok(()),
            Err(err) => Err(classify_probe_error("ListBuckets", &err)),
        }
    }

    async fn describe_table(&self, table_name: &str) -> ApiResult<TableStatus> {
        debug!("DescribeTable {} in {}", table_name, self.region);
        let result = self
            .dynamodb_client
            .describe_table()
            .table_name(table_name)
            .send()
            .await;

        match result {
            Ok(_) => Ok(TableStatus::Exists),
            Err(err) => table_status_from_error(&err),
        }
    }

    async fn create_bucket(&self, bucket_name: &str) -> Result<(), BucketCreateFailure> {
        debug!("CreateBucket {} in {}", bucket_name, self.region);
        let mut request = self.s3_client.create_bucket().bucket(bucket_name);

        if let Some(constraint) = location_constraint(&self.region) {
            let config = CreateBucketConfiguration::builder()
                .location_constraint(constraint)
                .build();
            request = request.create_bucket_configuration(config);
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) => Err(bucket_create_failure(&err)),
        }
    }

    async fn put_bucket_versioning(&self, bucket_name: &str) -> ApiResult<()> {
        debug!("PutBucketVersioning {}", bucket_name);
        self.s3_client
            .put_bucket_versioning()
            .bucket(bucket_name)
            .versioning_configuration(versioning_configuration())
            .send()
            .await
            .map_err(|e| api_error("PutBucketVersioning", &e))?;

        Ok(())
    }

    async fn put_bucket_encryption(&self, bucket_name: &str) -> ApiResult<()> {
        debug!("PutBucketEncryption {}", bucket_name);
        let config = encryption_configuration().map_err(|e| ApiError::new(error_chain(&e)))?;

        self.s3_client
            .put_bucket_encryption()
            .bucket(bucket_name)
            .server_side_encryption_configuration(config)
            .send()
            .await
            .map_err(|e| api_error("PutBucketEncryption", &e))?;

        Ok(())
    }

    async fn create_table(&self, spec: &LockTableSpec) -> ApiResult<()> {
        debug!("CreateTable {} in {}", spec.table_name, self.region);
        let (key_schema, attribute) =
            table_key(spec).map_err(|e| ApiError::new(error_chain(&e)))?;

        self.dynamodb_client
            .create_table()
            .table_name(&spec.table_name)
            .key_schema(key_schema)
            .attribute_definitions(attribute)
            .billing_mode(spec.billing_mode.clone())
            .send()
            .await
            .map_err(|e| api_error("CreateTable", &e))?;

        Ok(())
    }
}

/// Render a failed call as a one-line diagnostic
///
/// Service errors use the code and message the service returned. Failures
/// that never got a service response are rendered as their source chain.
fn api_error<E, R>(operation: &str, err: &SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + Error + 'static,
    R: std::fmt::Debug + 'static,
{
    match err.as_service_error() {
        Some(service_error) => ApiError::new(format!(
            "An error occurred ({}) when calling the {} operation: {}",
            service_error.code().unwrap_or("Unknown"),
            operation,
            service_error.message().unwrap_or("Unknown"),
        )),
        None => ApiError::new(error_chain(err)),
    }
}

/// Join an error and its sources with `": "`
fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        message.push_str(": ");
        message.push_str(&e.to_string());
        current = e.source();
    }
    message
}

/// Map a DescribeTable failure: not-found means the table is absent
fn table_status_from_error<R>(err: &SdkError<DescribeTableError, R>) -> ApiResult<TableStatus>
where
    R: std::fmt::Debug + 'static,
{
    if err
        .as_service_error()
        .is_some_and(|e| e.is_resource_not_found_exception())
    {
        Ok(TableStatus::NotFound)
    } else {
        Err(api_error("DescribeTable", err))
    }
}

/// Map a CreateBucket failure; only a name taken by another account is `AlreadyExists`
fn bucket_create_failure<R>(err: &SdkError<CreateBucketError, R>) -> BucketCreateFailure
where
    R: std::fmt::Debug + 'static,
{
    if err
        .as_service_error()
        .is_some_and(|e| e.is_bucket_already_exists())
    {
        BucketCreateFailure::AlreadyExists
    } else {
        BucketCreateFailure::Other(api_error("CreateBucket", err))
    }
}

/// Location constraint for `region`, or `None` for the default S3 region
fn location_constraint(region: &str) -> Option<BucketLocationConstraint> {
    if region == DEFAULT_S3_REGION {
        None
    } else {
        Some(BucketLocationConstraint::from(region))
    }
}

fn versioning_configuration() -> VersioningConfiguration {
    VersioningConfiguration::builder()
        .status(BucketVersioningStatus::Enabled)
        .build()
}

/// Default encryption rule: SSE-S3 with AES256
fn encryption_configuration()
-> Result<ServerSideEncryptionConfiguration, aws_sdk_s3::error::BuildError> {
    let by_default = ServerSideEncryptionByDefault::builder()
        .sse_algorithm(ServerSideEncryption::Aes256)
        .build()?;

    let rule = ServerSideEncryptionRule::builder()
        .apply_server_side_encryption_by_default(by_default)
        .build();

    ServerSideEncryptionConfiguration::builder()
        .rules(rule)
        .build()
}

/// Key schema element and matching attribute definition for the partition key
fn table_key(
    spec: &LockTableSpec,
) -> Result<(KeySchemaElement, AttributeDefinition), aws_sdk_dynamodb::error::BuildError> {
    let key_schema = KeySchemaElement::builder()
        .attribute_name(&spec.partition_key)
        .key_type(KeyType::Hash)
        .build()?;

    let attribute = AttributeDefinition::builder()
        .attribute_name(&spec.partition_key)
        .attribute_type(spec.key_type.clone())
        .build()?;

    Ok((key_schema, attribute))
}

/// Classify a failed credential probe
fn classify_probe_error<E, R>(operation: &str, err: &SdkError<E, R>) -> CredentialsFailure
where
    E: ProvideErrorMetadata + Error + 'static,
    R: std::fmt::Debug + 'static,
{
    if let Some(failure) = credentials_failure(err) {
        return failure;
    }

    match err {
        SdkError::ServiceError(context) => {
            if context.err().code() == Some("AccessDenied") {
                CredentialsFailure::AccessDenied
            } else {
                CredentialsFailure::Service(api_error(operation, err))
            }
        }
        _ => CredentialsFailure::Unexpected(api_error(operation, err)),
    }
}

/// Look for a credentials provider error anywhere in the source chain
///
/// Identity resolution fails before the request is sent, so the SDK reports it
/// as a dispatch failure wrapping the provider's `CredentialsError`.
fn credentials_failure(err: &(dyn Error + 'static)) -> Option<CredentialsFailure> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(credentials_error) = e.downcast_ref::<CredentialsError>() {
            return match credentials_error {
                CredentialsError::CredentialsNotLoaded(_) => Some(CredentialsFailure::Missing),
                CredentialsError::InvalidConfiguration(_) => Some(CredentialsFailure::Partial),
                _ => None,
            };
        }
        current = e.source();
    }
    None
}
