//! Lark connection config: app credentials, API base URL, webhook verification token.
//! Loaded from environment variables APP_ID, APP_SECRET, LARK_API_URL, VERIFICATION_TOKEN.

use anyhow::Result;
use std::env;
use std::time::Duration;

/// Feishu (mainland) open-platform base URL.
pub const FEISHU_BASE_URL: &str = "https://open.feishu.cn/open-apis";
/// Lark (international) open-platform base URL.
pub const LARK_BASE_URL: &str = "https://open.larksuite.com/open-apis";

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct LarkConfig {
    pub app_id: String,
    pub app_secret: String,
    pub api_base_url: String,
    /// Expected `token` of webhook callbacks; unchecked when None.
    pub verification_token: Option<String>,
    pub request_timeout: Duration,
}

impl LarkConfig {
    /// Loads from environment: APP_ID and APP_SECRET required, LARK_API_URL and VERIFICATION_TOKEN optional.
    pub fn from_env() -> Result<Self> {
        let app_id = env::var("APP_ID").map_err(|_| anyhow::anyhow!("APP_ID not set"))?;
        let app_secret =
            env::var("APP_SECRET").map_err(|_| anyhow::anyhow!("APP_SECRET not set"))?;
        let api_base_url = env::var("LARK_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| FEISHU_BASE_URL.to_string());
        let verification_token = env::var("VERIFICATION_TOKEN")
            .ok()
            .filter(|s| !s.is_empty());
        Ok(Self {
            app_id,
            app_secret,
            api_base_url,
            verification_token,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Credentials with the default Feishu endpoint and no verification token.
    pub fn with_credentials(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            api_base_url: FEISHU_BASE_URL.to_string(),
            verification_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    /// Checks credentials are non-empty and the base URL parses.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() || self.app_secret.trim().is_empty() {
            anyhow::bail!("APP_ID and APP_SECRET must be set");
        }
        if reqwest::Url::parse(&self.api_base_url).is_err() {
            anyhow::bail!("LARK_API_URL is set but not a valid URL: {}", self.api_base_url);
        }
        Ok(())
    }
}
