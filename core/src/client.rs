use async_trait::async_trait;
use reqwest::multipart::Form;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::BackendConfig;
use crate::errors::{SetuError, SetuResult};
use crate::types::{ChatReply, ChatRequest, RegistrationRequest};

/// Contract of the caseworker backend, as used by every surface
#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /register`; Ok only on a 2xx response
    async fn register(&self, request: &RegistrationRequest) -> SetuResult<()>;

    /// `POST /chat`; Ok only on a 2xx response carrying a `reply`
    async fn chat(&self, request: &ChatRequest) -> SetuResult<ChatReply>;
}

/// HTTP client for the caseworker backend
#[derive(Debug, Clone)]
pub struct SetuClient {
    client: Client,
    base_url: String,
}

impl SetuClient {
    /// Create a new backend client
    pub fn new(config: &BackendConfig) -> SetuResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(SetuError::ConfigError(
                "Backend base URL must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SetuError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Probes the backend root; false when it cannot be reached or answers non-2xx
    pub async fn ping(&self) -> bool {
        match self.client.get(self.endpoint("/")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Backend ping failed: {}", e);
                false
            }
        }
    }

    async fn post_form(&self, path: &str, form: Form) -> SetuResult<reqwest::Response> {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SetuError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(SetuError::HttpError {
                status_code: status.as_u16(),
                message: format!("{} failed: {}", path, error_body),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Backend for SetuClient {
    #[instrument(skip(self, request), fields(phone = %request.phone))]
    async fn register(&self, request: &RegistrationRequest) -> SetuResult<()> {
        let form = Form::new()
            .text("username", request.username.clone())
            .text("email", request.email.clone())
            .text("phone", request.phone.clone());

        self.post_form("/register", form).await?;
        debug!("Registration accepted");
        Ok(())
    }

    #[instrument(skip(self, request), fields(phone = %request.phone))]
    async fn chat(&self, request: &ChatRequest) -> SetuResult<ChatReply> {
        let form = Form::new()
            .text("message", request.message.clone())
            .text("phone", request.phone.clone())
            .text("history", request.history.clone());

        let response = self.post_form("/chat", form).await?;
        let reply = response
            .json::<ChatReply>()
            .await
            .map_err(|e| SetuError::ParsingError(format!("Failed to parse chat reply: {}", e)))?;

        debug!("Received reply ({} chars)", reply.reply.len());
        Ok(reply)
    }
}
