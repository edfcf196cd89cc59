//! Shared AWS SDK configuration loading.

use aws_config::{BehaviorVersion, SdkConfig};
use tracing::info;

use crate::config::AwsConfig;

/// Load the SDK configuration every AWS backend is built from.
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(ref region) = config.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }

    if let Some(ref endpoint) = config.endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    let sdk_config = loader.load().await;

    info!(
        region = ?config.region,
        endpoint = ?config.endpoint_url,
        "Loaded AWS configuration"
    );

    sdk_config
}
