//! Lock table definition used by Terraform's DynamoDB state locking

use aws_sdk_dynamodb::types::{BillingMode, ScalarAttributeType};

/// Partition key Terraform writes lock entries under
pub const LOCK_KEY_ATTRIBUTE: &str = "LockID";

/// Everything needed to create a lock table
///
/// The key schema is a single string partition key and the table is billed
/// per request, so no throughput has to be provisioned.
#[derive(Debug, Clone, PartialEq)]
pub struct LockTableSpec {
    /// Table name, unique within the account and region
    pub table_name: String,
    /// Name of the partition (HASH) key attribute
    pub partition_key: String,
    /// Scalar type of the partition key
    pub key_type: ScalarAttributeType,
    /// Capacity mode
    pub billing_mode: BillingMode,
}

impl LockTableSpec {
    /// Create the spec Terraform expects for a lock table named `table_name`
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            partition_key: LOCK_KEY_ATTRIBUTE.to_string(),
            key_type: ScalarAttributeType::S,
            billing_mode: BillingMode::PayPerRequest,
        }
    }
}
