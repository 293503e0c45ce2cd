//! Lark open-platform REST client implementing [`bridge_core::Messenger`].
//!
//! Sends go through a cached tenant access token; when the API reports the token invalid it is
//! dropped, fetched again and the request retried once.

use async_trait::async_trait;
use bridge_core::{
    BridgeError, ConversationPage, Messenger, OutboundContent, Result, SendReceipt,
};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::config::LarkConfig;

const TOKEN_REFRESH_SKEW: Duration = Duration::from_secs(120);
const DEFAULT_TOKEN_TTL_SECS: u64 = 7200;
const INVALID_ACCESS_TOKEN_CODE: i64 = 99_991_663;

#[derive(Debug, Clone)]
struct CachedTenantToken {
    value: String,
    refresh_after: Instant,
}

fn response_code(body: &Value) -> Option<i64> {
    body.get("code").and_then(|c| c.as_i64())
}

fn response_msg(body: &Value) -> String {
    body.get("msg")
        .and_then(|m| m.as_str())
        .unwrap_or("unknown error")
        .to_string()
}

fn should_refresh_token(status: StatusCode, body: &Value) -> bool {
    status == StatusCode::UNAUTHORIZED || response_code(body) == Some(INVALID_ACCESS_TOKEN_CODE)
}

fn token_ttl_seconds(body: &Value) -> u64 {
    body.get("expire")
        .or_else(|| body.get("expires_in"))
        .and_then(|v| v.as_u64())
        .unwrap_or(DEFAULT_TOKEN_TTL_SECS)
        .max(1)
}

fn refresh_deadline(now: Instant, ttl_seconds: u64) -> Instant {
    let ttl = Duration::from_secs(ttl_seconds.max(1));
    now + ttl
        .checked_sub(TOKEN_REFRESH_SKEW)
        .unwrap_or(Duration::from_secs(1))
}

/// Raw API answer: HTTP status, JSON body and the platform's request/log id header.
struct ApiResponse {
    status: StatusCode,
    body: Value,
    request_id: Option<String>,
}

impl ApiResponse {
    fn into_result(self) -> Result<Value> {
        let code = response_code(&self.body).unwrap_or(if self.status.is_success() { 0 } else { -1 });
        if !self.status.is_success() || code != 0 {
            return Err(BridgeError::Remote {
                code,
                message: response_msg(&self.body),
                request_id: self.request_id,
            });
        }
        Ok(self.body)
    }
}

fn transport(e: reqwest::Error) -> BridgeError {
    BridgeError::Transport(e.to_string())
}

#[derive(Clone)]
pub struct LarkClient {
    config: LarkConfig,
    http: reqwest::Client,
    tenant_token: Arc<RwLock<Option<CachedTenantToken>>>,
}

impl LarkClient {
    pub fn new(config: LarkConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(transport)?;
        Ok(Self {
            config,
            http,
            tenant_token: Arc::new(RwLock::new(None)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    /// Returns the cached tenant token or fetches a new one.
    async fn tenant_access_token(&self) -> Result<String> {
        {
            let cached = self.tenant_token.read().await;
            if let Some(ref token) = *cached {
                if Instant::now() < token.refresh_after {
                    return Ok(token.value.clone());
                }
            }
        }

        let resp = self
            .http
            .post(self.url("/auth/v3/tenant_access_token/internal"))
            .json(&serde_json::json!({
                "app_id": self.config.app_id,
                "app_secret": self.config.app_secret,
            }))
            .send()
            .await
            .map_err(transport)?;
        let data = Self::read_response(resp).await?.into_result()?;

        let token = data
            .get("tenant_access_token")
            .and_then(|t| t.as_str())
            .ok_or_else(|| BridgeError::Transport("missing tenant_access_token in response".to_string()))?
            .to_string();
        let refresh_after = refresh_deadline(Instant::now(), token_ttl_seconds(&data));

        *self.tenant_token.write().await = Some(CachedTenantToken {
            value: token.clone(),
            refresh_after,
        });
        debug!("Tenant access token refreshed");

        Ok(token)
    }

    async fn invalidate_token(&self) {
        *self.tenant_token.write().await = None;
    }

    async fn read_response(resp: reqwest::Response) -> Result<ApiResponse> {
        let status = resp.status();
        let request_id = ["x-request-id", "x-tt-logid"]
            .iter()
            .find_map(|h| resp.headers().get(*h))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let raw = resp.text().await.map_err(transport)?;
        let body = serde_json::from_str::<Value>(&raw)
            .unwrap_or_else(|_| serde_json::json!({ "raw": raw }));
        Ok(ApiResponse {
            status,
            body,
            request_id,
        })
    }

    async fn send_once(
        &self,
        method: Method,
        url: &str,
        token: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await.map_err(transport)?;
        Self::read_response(resp).await
    }

    /// Authorized call with one token refresh on an invalid-token answer.
    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(path);
        let token = self.tenant_access_token().await?;
        let response = self
            .send_once(method.clone(), &url, &token, query, body)
            .await?;

        if should_refresh_token(response.status, &response.body) {
            warn!(path = %path, "Tenant token rejected, refreshing and retrying once");
            self.invalidate_token().await;
            let token = self.tenant_access_token().await?;
            return self
                .send_once(method, &url, &token, query, body)
                .await?
                .into_result();
        }

        response.into_result()
    }

    fn receipt(data: &Value) -> SendReceipt {
        SendReceipt {
            message_id: data
                .pointer("/data/message_id")
                .and_then(|m| m.as_str())
                .map(str::to_string),
        }
    }
}

#[async_trait]
impl Messenger for LarkClient {
    #[instrument(skip(self, content))]
    async fn create_message(
        &self,
        conversation_id: &str,
        content: &OutboundContent,
    ) -> Result<SendReceipt> {
        let body = serde_json::json!({
            "receive_id": conversation_id,
            "msg_type": content.msg_type,
            "content": content.content,
        });
        let data = self
            .call(
                Method::POST,
                "/im/v1/messages",
                &[("receive_id_type", "chat_id".to_string())],
                Some(&body),
            )
            .await?;
        let receipt = Self::receipt(&data);
        info!(
            conversation_id = %conversation_id,
            message_id = ?receipt.message_id,
            "Message created"
        );
        Ok(receipt)
    }

    #[instrument(skip(self, content))]
    async fn reply_message(
        &self,
        message_id: &str,
        content: &OutboundContent,
    ) -> Result<SendReceipt> {
        let body = serde_json::json!({
            "msg_type": content.msg_type,
            "content": content.content,
        });
        let path = format!("/im/v1/messages/{}/reply", message_id);
        let data = self.call(Method::POST, &path, &[], Some(&body)).await?;
        let receipt = Self::receipt(&data);
        info!(
            reply_to = %message_id,
            message_id = ?receipt.message_id,
            "Reply sent"
        );
        Ok(receipt)
    }

    #[instrument(skip(self))]
    async fn list_conversations(
        &self,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<ConversationPage> {
        let mut query = vec![
            ("user_id_type", "user_id".to_string()),
            ("page_size", page_size.to_string()),
        ];
        if let Some(token) = page_token.filter(|t| !t.is_empty()) {
            query.push(("page_token", token.to_string()));
        }

        let data = self.call(Method::GET, "/im/v1/chats", &query, None).await?;

        let conversation_ids = data
            .pointer("/data/items")
            .and_then(|items| items.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.get("chat_id").and_then(|c| c.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let page_token = data
            .pointer("/data/page_token")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let has_more = data
            .pointer("/data/has_more")
            .and_then(|h| h.as_bool())
            .unwrap_or(false);

        Ok(ConversationPage {
            conversation_ids,
            page_token,
            has_more,
        })
    }
}
