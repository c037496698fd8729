//! Cloud API implementations

mod aws;
#[cfg(test)]
pub(crate) mod mock;

pub use aws::AwsApi;
