use async_trait::async_trait;
use patentdraft_core::completion::{
    build_chat_request, classify_status, endpoint_url, extract_content, ModelList,
};
use patentdraft_core::config::Configuration;
use patentdraft_core::error::GenerationError;
use std::time::Duration;

/// Seam between the generation task and the remote model service.
///
/// One call is one attempt; implementations never retry.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send the composed prompt and return the first choice's text.
    async fn complete(&self, prompt: &str, config: &Configuration)
        -> Result<String, GenerationError>;

    /// List the models the endpoint exposes, returning how many there are.
    async fn list_models(&self, config: &Configuration) -> Result<usize, GenerationError>;
}

/// Client for OpenAI-compatible `chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new() -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("patentdraft/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GenerationError::Unknown(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// Wrap an already configured `reqwest` client.
    pub fn from_http(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
        config: &Configuration,
    ) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&config.openai.api_key)
            .timeout(Duration::from_secs(config.openai.timeout_secs))
    }
}

/// Classify a transport-level failure.
fn transport_error(e: reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::Network(format!("request timed out: {e}"))
    } else if e.is_decode() {
        GenerationError::InvalidResponse(e.to_string())
    } else {
        GenerationError::Network(e.to_string())
    }
}

/// Read the whole body, turning non-success statuses into classified errors.
async fn success_body(response: reqwest::Response) -> Result<String, GenerationError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(classify_status(status.as_u16(), &body));
    }

    Ok(body)
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(
        &self,
        prompt: &str,
        config: &Configuration,
    ) -> Result<String, GenerationError> {
        let url = endpoint_url(&config.openai.base_url, "chat/completions");
        let body = build_chat_request(prompt, config);

        log::debug!("POST {url} (model {})", body.model);

        let response = self
            .authorized(self.http.post(&url), config)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let text = success_body(response).await?;
        extract_content(&text)
    }

    async fn list_models(&self, config: &Configuration) -> Result<usize, GenerationError> {
        let url = endpoint_url(&config.openai.base_url, "models");

        log::debug!("GET {url}");

        let response = self
            .authorized(self.http.get(&url), config)
            .send()
            .await
            .map_err(transport_error)?;

        let text = success_body(response).await?;
        let models: ModelList = serde_json::from_str(&text)
            .map_err(|e| GenerationError::InvalidResponse(format!("malformed model list: {e}")))?;

        Ok(models.data.len())
    }
}

/// Check that the configured endpoint accepts the configured credential.
///
/// Only reports success or failure; the reason is logged.
pub async fn test_connection(backend: &dyn CompletionBackend, config: &Configuration) -> bool {
    if let Err(err) = config.validate() {
        log::warn!("Connection test skipped: {err}");
        return false;
    }

    match backend.list_models(config).await {
        Ok(count) => {
            log::info!(
                "Connection to {} succeeded ({count} models available)",
                config.openai.base_url
            );
            true
        }
        Err(err) => {
            log::warn!("Connection to {} failed: {err}", config.openai.base_url);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    /// Serve `router` on an ephemeral port and return its `/v1` base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{addr}/v1")
    }

    /// Local servers only; bypass any proxy from the environment.
    fn test_client() -> OpenAiClient {
        OpenAiClient::from_http(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    fn config_for(base_url: &str) -> Configuration {
        let mut config = Configuration::default();
        config.openai.api_key = "sk-test".to_string();
        config.openai.base_url = base_url.to_string();
        config.openai.timeout_secs = 5;
        config
    }

    /// Echo the roles, auth header, and sampling parameters back as content.
    async fn echo_completion(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let content = format!(
            "{}|{}|{}|{}|{}",
            auth,
            body["model"].as_str().unwrap_or_default(),
            body["messages"][0]["role"].as_str().unwrap_or_default(),
            body["messages"][1]["role"].as_str().unwrap_or_default(),
            body["temperature"]
        );
        Json(json!({"choices": [{"message": {"role": "assistant", "content": content}}]}))
    }

    #[tokio::test]
    async fn test_complete_sends_roles_and_credentials() {
        let base = serve(Router::new().route("/v1/chat/completions", post(echo_completion))).await;
        let client = test_client();

        let text = client.complete("prompt", &config_for(&base)).await.unwrap();
        assert_eq!(text, "Bearer sk-test|gpt-4o-mini|system|user|0.3");
    }

    #[tokio::test]
    async fn test_complete_classifies_auth_failure() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {"message": "Invalid API key"}})),
                )
            }),
        );
        let base = serve(router).await;
        let client = test_client();

        let err = client.complete("p", &config_for(&base)).await.unwrap_err();
        assert_eq!(
            err,
            GenerationError::Auth("HTTP 401: Invalid API key".to_string())
        );
    }

    #[tokio::test]
    async fn test_complete_classifies_rate_limit_and_server_errors() {
        let router = Router::new()
            .route(
                "/limited/chat/completions",
                post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
            )
            .route(
                "/broken/chat/completions",
                post(|| async { (StatusCode::BAD_GATEWAY, "") }),
            );
        let base = serve(router).await;
        let root = base.trim_end_matches("/v1");
        let client = test_client();

        let limited = client
            .complete("p", &config_for(&format!("{root}/limited")))
            .await
            .unwrap_err();
        assert!(matches!(limited, GenerationError::RateLimited(_)));

        let broken = client
            .complete("p", &config_for(&format!("{root}/broken")))
            .await
            .unwrap_err();
        assert_eq!(broken, GenerationError::Unknown("HTTP 502".to_string()));
    }

    #[tokio::test]
    async fn test_complete_rejects_missing_choices() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({"id": "x", "object": "chat.completion"})) }),
        );
        let base = serve(router).await;
        let client = test_client();

        let err = client.complete("p", &config_for(&base)).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_complete_unreachable_endpoint_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = test_client();
        let err = client
            .complete("p", &config_for(&format!("http://{addr}/v1")))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Network(_)));
    }

    #[tokio::test]
    async fn test_complete_times_out_as_network_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let base = serve(router).await;
        let client = test_client();

        let mut config = config_for(&base);
        config.openai.timeout_secs = 1;
        let err = client.complete("p", &config).await.unwrap_err();
        assert!(matches!(err, GenerationError::Network(_)));
    }

    #[tokio::test]
    async fn test_connection_reports_success_and_failure() {
        let router = Router::new().route(
            "/v1/models",
            get(|headers: HeaderMap| async move {
                match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                    Some("Bearer sk-test") => (
                        StatusCode::OK,
                        Json(json!({"data": [{"id": "gpt-4o-mini"}, {"id": "DeepSeek-R1"}]})),
                    ),
                    _ => (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"error": {"message": "bad key"}})),
                    ),
                }
            }),
        );
        let base = serve(router).await;
        let client = test_client();

        let good = config_for(&base);
        assert_eq!(client.list_models(&good).await, Ok(2));
        assert!(test_connection(&client, &good).await);

        let mut bad = config_for(&base);
        bad.openai.api_key = "sk-wrong".to_string();
        assert!(!test_connection(&client, &bad).await);

        let mut unset = config_for(&base);
        unset.openai.api_key = String::new();
        assert!(!test_connection(&client, &unset).await);
    }
}
