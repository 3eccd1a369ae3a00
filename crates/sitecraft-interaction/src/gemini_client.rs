//! GeminiClient - website generation over the Gemini REST API.
//!
//! Both operations ask for a JSON response with a single `htmlContent` string
//! and return that string as the document.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sitecraft_core::config::{GeminiConfig, GenerationSettings};
use sitecraft_core::generation::{GenerationClient, GenerationError};

use crate::prompts::PromptBuilder;

const MISSING_KEY_HINT: &str = "set GEMINI_API_KEY or add gemini.api_key to secret.json";

/// Generation client that talks to the Gemini HTTP API.
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    prompts: PromptBuilder,
}

impl GeminiClient {
    /// Creates a client from config settings and resolved credentials.
    ///
    /// A missing key is not an error here: every call fails with
    /// [`GenerationError::MissingApiKey`] until one is configured. A
    /// `model_name` in the credentials takes precedence over `settings.model`.
    pub fn from_settings(
        settings: &GenerationSettings,
        credentials: Option<GeminiConfig>,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|err| GenerationError::Request {
                message: format!("Failed to build HTTP client: {err}"),
                retryable: false,
            })?;

        let (api_key, model) = match credentials {
            Some(config) => (
                Some(config.api_key),
                config.model_name.unwrap_or_else(|| settings.model.clone()),
            ),
            None => (None, settings.model.clone()),
        };

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            prompts: PromptBuilder::new(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn send_request(&self, text: String) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::MissingApiKey(MISSING_KEY_HINT.to_string()))?;

        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.base_url,
            model = self.model,
        );
        let body = GenerateContentRequest::html_document(text);

        tracing::debug!(model = %self.model, "Sending Gemini request");
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                let retryable = err.is_connect() || err.is_timeout();
                GenerationError::Request {
                    message: format!("Gemini API request failed: {}", err.without_url()),
                    retryable,
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GenerationError::MalformedResponse(err.without_url().to_string()))?;

        let text = extract_text_response(parsed)?;
        parse_document(&text)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let text = self.prompts.generation(prompt)?;
        self.send_request(text).await
    }

    async fn refine(&self, document: &str, prompt: &str) -> Result<String, GenerationError> {
        let text = self.prompts.refinement(document, prompt)?;
        self.send_request(text).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn html_document(text: String) -> Self {
        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: serde_json::json!({
                    "type": "OBJECT",
                    "properties": {
                        "htmlContent": {
                            "type": "STRING",
                            "description": "The full HTML content of the website, with embedded CSS and JavaScript."
                        }
                    },
                    "required": ["htmlContent"]
                }),
            },
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HtmlPayload {
    html_content: String,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String, GenerationError> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            GenerationError::MalformedResponse("no text in the response candidates".into())
        })
}

/// Pulls `htmlContent` out of the model's JSON answer.
///
/// Tolerates a surrounding markdown code fence, which some models emit despite
/// being asked not to.
fn parse_document(text: &str) -> Result<String, GenerationError> {
    let trimmed = text.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str::<HtmlPayload>(json)
        .map(|payload| payload.html_content)
        .map_err(|err| GenerationError::MalformedResponse(err.to_string()))
}

fn map_http_error(status: StatusCode, body: String) -> GenerationError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    GenerationError::Http {
        status: status.as_u16(),
        message,
        retryable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GenerateContentRequest::html_document("hi".into())).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(
            body["generationConfig"]["responseSchema"]["properties"]["htmlContent"]["type"],
            "STRING"
        );
    }

    #[test]
    fn test_extracts_document_from_candidate() {
        let parsed = response(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"htmlContent\": \"<h1>Hi</h1>\"}" }] }
            }]
        }));

        let text = extract_text_response(parsed).unwrap();
        assert_eq!(parse_document(&text).unwrap(), "<h1>Hi</h1>");
    }

    #[test]
    fn test_first_candidate_wins() {
        let parsed = response(serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "first" }] } },
                { "content": { "parts": [{ "text": "second" }] } }
            ]
        }));

        assert_eq!(extract_text_response(parsed).unwrap(), "first");
    }

    #[test]
    fn test_no_candidates_is_malformed() {
        let err = extract_text_response(response(serde_json::json!({}))).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_document_rejects_bad_payloads() {
        assert!(parse_document("not json").is_err());
        assert!(parse_document("{\"html\": \"x\"}").is_err());
        assert!(parse_document("{\"htmlContent\": 42}").is_err());
    }

    #[test]
    fn test_parse_document_strips_code_fence() {
        let fenced = "```json\n{\"htmlContent\": \"<p>ok</p>\"}\n```";
        assert_eq!(parse_document(fenced).unwrap(), "<p>ok</p>");
    }

    #[test]
    fn test_map_http_error_uses_provider_message() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = map_http_error(StatusCode::TOO_MANY_REQUESTS, body.to_string());

        assert_eq!(err.to_string(), "RESOURCE_EXHAUSTED: Quota exceeded (HTTP 429)");
        assert!(err.is_retryable());

        let err = map_http_error(StatusCode::BAD_REQUEST, "plain text".to_string());
        assert_eq!(err.to_string(), "plain text (HTTP 400)");
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = GeminiClient::from_settings(&GenerationSettings::default(), None).unwrap();
        assert!(!client.has_api_key());
        assert_eq!(client.model(), "gemini-2.5-flash");

        let err = client.generate("anything").await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey(_)));
    }

    #[test]
    fn test_credential_model_overrides_settings() {
        let credentials = GeminiConfig {
            api_key: "key".into(),
            model_name: Some("gemini-2.5-pro".into()),
        };
        let client =
            GeminiClient::from_settings(&GenerationSettings::default(), Some(credentials)).unwrap();
        assert!(client.has_api_key());
        assert_eq!(client.model(), "gemini-2.5-pro");
    }
}
