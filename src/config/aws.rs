//! AWS connection settings.

use serde::Deserialize;

/// Settings shared by the S3, SQS, SNS and DynamoDB clients.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// AWS region (e.g., "us-east-1"). Uses default provider chain if not set.
    pub region: Option<String>,
    /// Custom endpoint URL (for LocalStack or testing).
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    /// Set AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set custom endpoint URL (for LocalStack or testing).
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// S3-compatible emulators only resolve path-style addressing.
    pub fn force_path_style(&self) -> bool {
        self.endpoint_url.is_some()
    }
}
