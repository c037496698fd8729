//! Scripted in-memory cloud API for exercising the provisioning stages

use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{
    ApiResult, BucketCreateFailure, CloudApi, CredentialsFailure, TableStatus,
};
use crate::lock_table::LockTableSpec;

/// An API call as seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListBuckets,
    DescribeTable(String),
    CreateBucket(String),
    PutBucketVersioning(String),
    PutBucketEncryption(String),
    CreateTable(LockTableSpec),
}

/// Returns the scripted outcome for each call and records the calls made
pub struct MockApi {
    pub list_buckets: Result<(), CredentialsFailure>,
    pub describe_table: ApiResult<TableStatus>,
    pub create_bucket: Result<(), BucketCreateFailure>,
    pub put_bucket_versioning: ApiResult<()>,
    pub put_bucket_encryption: ApiResult<()>,
    pub create_table: ApiResult<()>,
    pub(crate) calls: Mutex<Vec<Call>>,
}

impl Default for MockApi {
    /// Valid credentials, no existing table, every creation succeeds
    fn default() -> Self {
        Self {
            list_buckets: Ok(()),
            describe_table: Ok(TableStatus::NotFound),
            create_bucket: Ok(()),
            put_bucket_versioning: Ok(()),
            put_bucket_encryption: Ok(()),
            create_table: Ok(()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CloudApi for MockApi {
    async fn list_buckets(&self) -> Result<(), CredentialsFailure> {
        self.record(Call::ListBuckets);
        self.list_buckets.clone()
    }

    async fn describe_table(&self, table_name: &str) -> ApiResult<TableStatus> {
        self.record(Call::DescribeTable(table_name.to_string()));
        self.describe_table.clone()
    }

    async fn create_bucket(&self, bucket_name: &str) -> Result<(), BucketCreateFailure> {
        self.record(Call::CreateBucket(bucket_name.to_string()));
        self.create_bucket.clone()
    }

    async fn put_bucket_versioning(&self, bucket_name: &str) -> ApiResult<()> {
        self.record(Call::PutBucketVersioning(bucket_name.to_string()));
        self.put_bucket_versioning.clone()
    }

    async fn put_bucket_encryption(&self, bucket_name: &str) -> ApiResult<()> {
        self.record(Call::PutBucketEncryption(bucket_name.to_string()));
        self.put_bucket_encryption.clone()
    }

    async fn create_table(&self, spec: &LockTableSpec) -> ApiResult<()> {
        self.record(Call::CreateTable(spec.clone()));
        self.create_table.clone()
    }
}
