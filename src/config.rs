use aws_config::BehaviorVersion;
use aws_types::region::Region;
use aws_types::SdkConfig;

/// Where the STS client gets its region, base credentials and endpoint.
///
/// Unset fields fall back to the SDK's default provider chain.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub region: Option<String>,
    pub profile_name: Option<String>,
    pub endpoint_url: Option<String>,
}

impl GatewayConfig {
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::v2024_03_28());
        if let Some(region) = self.region.as_ref() {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(profile_name) = self.profile_name.as_ref() {
            loader = loader.profile_name(profile_name);
        }
        if let Some(endpoint_url) = self.endpoint_url.as_ref() {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }
}
