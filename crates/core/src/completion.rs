use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::error::GenerationError;
use crate::prompt::USER_DIRECTIVE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a `POST /chat/completions` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    pub content: Option<String>,
}

/// Body of a `GET /models` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Join the configured base URL and an API path without doubling slashes.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Build the single completion request for a composed prompt.
///
/// The prompt travels in the system role and the fixed directive in the user role.
pub fn build_chat_request(prompt: &str, config: &Configuration) -> ChatRequest {
    ChatRequest {
        model: config.openai.model.clone(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: prompt.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: USER_DIRECTIVE.to_string(),
            },
        ],
        temperature: config.generation.temperature,
        max_tokens: config.generation.max_tokens,
    }
}

/// Pull the first choice's text out of a raw response body.
pub fn extract_content(body: &str) -> Result<String, GenerationError> {
    if body.trim().is_empty() {
        return Err(GenerationError::InvalidResponse(
            "empty response body".to_string(),
        ));
    }

    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::InvalidResponse(format!("malformed body: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::InvalidResponse("response has no choices".to_string()))?;

    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(GenerationError::InvalidResponse(
            "first choice has no content".to_string(),
        )),
    }
}

/// Map a non-success HTTP status and its body to a classified error.
pub fn classify_status(status: u16, body: &str) -> GenerationError {
    let detail = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => format!("HTTP {status}: {}", parsed.error.message),
        Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
        Err(_) => format!("HTTP {status}: {}", body.trim()),
    };

    match status {
        401 | 403 => GenerationError::Auth(detail),
        429 => GenerationError::RateLimited(detail),
        _ => GenerationError::Unknown(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_cleanly() {
        assert_eq!(
            endpoint_url("https://aihubmix.com/v1", "chat/completions"),
            "https://aihubmix.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint_url("https://aihubmix.com/v1/", "/models"),
            "https://aihubmix.com/v1/models"
        );
    }

    #[test]
    fn test_build_chat_request_roles_and_params() {
        let mut config = Configuration::default();
        config.openai.model = "DeepSeek-R1".to_string();
        config.generation.max_tokens = Some(2048);

        let request = build_chat_request("SYSTEM PROMPT", &config);
        assert_eq!(request.model, "DeepSeek-R1");
        assert_eq!(request.temperature, 0.3);
        assert_eq!(request.max_tokens, Some(2048));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[0].content, "SYSTEM PROMPT");
        assert_eq!(request.messages[1].role, "user");
        assert_eq!(request.messages[1].content, USER_DIRECTIVE);
    }

    #[test]
    fn test_chat_request_omits_unset_max_tokens() {
        let request = build_chat_request("p", &Configuration::default());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[test]
    fn test_extract_content_first_choice() {
        let body = r##"{"choices": [
            {"message": {"role": "assistant", "content": "# 专利交底书\n..."}},
            {"message": {"role": "assistant", "content": "second"}}
        ]}"##;
        assert_eq!(extract_content(body).unwrap(), "# 专利交底书\n...");
    }

    #[test]
    fn test_extract_content_failures() {
        for body in [
            "",
            "not json",
            r#"{"choices": []}"#,
            r#"{"object": "chat.completion"}"#,
            r#"{"choices": [{"message": {"content": null}}]}"#,
            r#"{"choices": [{"message": {"content": "  "}}]}"#,
        ] {
            assert!(
                matches!(extract_content(body), Err(GenerationError::InvalidResponse(_))),
                "expected InvalidResponse for {body:?}"
            );
        }
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(classify_status(401, ""), GenerationError::Auth(_)));
        assert!(matches!(classify_status(403, ""), GenerationError::Auth(_)));
        assert!(matches!(
            classify_status(429, ""),
            GenerationError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(500, "boom"),
            GenerationError::Unknown(_)
        ));
    }

    #[test]
    fn test_classify_status_uses_api_error_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            classify_status(401, body),
            GenerationError::Auth("HTTP 401: Incorrect API key provided".to_string())
        );
    }
}
