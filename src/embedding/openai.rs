//! Remote embeddings via an OpenAI-compatible `/embeddings` endpoint

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{validate_inputs, EmbeddingProvider, EmbeddingVector};
use crate::error::{Error, Result};

/// Embedding provider backed by an HTTP API
pub struct OpenAiProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    dimensions: usize,
    /// Sent as `dimensions` when the model should shorten its output
    requested_dimensions: Option<usize>,
    vector_name: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

/// Output size of the text-embedding-3 models, the only ones that accept `dimensions`
fn native_dimensions(model: &str) -> Option<usize> {
    match model.to_lowercase().as_str() {
        "text-embedding-3-small" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

fn requested_dimensions(model: &str, dimensions: usize) -> Option<usize> {
    native_dimensions(model).filter(|&native| native != dimensions).map(|_| dimensions)
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<EmbeddingUsage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingUsage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiProvider {
    pub fn new(api_key: SecretString, base_url: &str, model: &str, dimensions: usize) -> Self {
        OpenAiProvider {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
            requested_dimensions: requested_dimensions(model, dimensions),
            vector_name: format!("openai-{}", model.to_lowercase()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.requested_dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Error::embedding(format!("Failed to send embedding request: {}", e))
                    .with_context("base_url", self.base_url.clone())
                    .with_source(e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::embedding(format!("Failed to read embedding response: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(
                Error::embedding(format!("Embedding API error ({}): {}", status, detail))
                    .with_context("status", status.as_u16())
                    .with_context("model", self.model.clone()),
            );
        }

        let parsed: EmbeddingResponse = serde_json::from_str(&body).map_err(|e| {
            Error::embedding(format!("Failed to parse embedding response: {}", e))
                .with_context("model", self.model.clone())
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(tokens = usage.total_tokens, model = %self.model, "Embedding tokens used");
        }

        // The API may answer out of order; `index` is authoritative
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);

        if data.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Embedding API returned {} vectors for {} inputs",
                data.len(),
                texts.len()
            )));
        }

        data.into_iter()
            .map(|d| {
                if d.embedding.len() == self.dimensions {
                    Ok(d.embedding)
                } else {
                    Err(Error::embedding(format!(
                        "Embedding has dimension {}, expected {}",
                        d.embedding.len(),
                        self.dimensions
                    ))
                    .with_context("input_index", d.index))
                }
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<EmbeddingVector>> {
        validate_inputs(texts)?;
        self.request(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<EmbeddingVector> {
        let input = [text.to_string()];
        validate_inputs(&input)?;
        self.request(&input)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("No embedding returned"))
    }

    fn vector_size(&self) -> usize {
        self.dimensions
    }

    fn vector_name(&self) -> &str {
        &self.vector_name
    }

    fn describe(&self) -> String {
        format!("openai:{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, dims: usize) -> OpenAiProvider {
        OpenAiProvider::new(
            SecretString::from("test-key".to_string()),
            &server.uri(),
            "text-embedding-3-small",
            dims,
        )
    }

    #[tokio::test]
    async fn test_results_reordered_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "embedding": [0.0, 1.0], "index": 1 },
                    { "embedding": [1.0, 0.0], "index": 0 }
                ],
                "model": "text-embedding-3-small",
                "usage": { "prompt_tokens": 4, "total_tokens": 4 }
            })))
            .mount(&server)
            .await;

        let vectors = provider(&server, 2)
            .embed_documents(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_api_error_is_embedding_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let err = provider(&server, 2).embed_query("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
        assert!(err.message().contains("Incorrect API key provided"));
        assert_eq!(err.context()["status"], 401);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.5, 0.5, 0.5], "index": 0 }]
            })))
            .mount(&server)
            .await;

        let err = provider(&server, 2).embed_query("hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
    }

    #[tokio::test]
    async fn test_empty_input_never_hits_the_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider(&server, 2).embed_query(" ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Embedding);
    }

    #[tokio::test]
    async fn test_shortened_dimensions_are_requested() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({
                "model": "text-embedding-3-small",
                "dimensions": 3
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.1, 0.2, 0.3], "index": 0 }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let vector = provider(&server, 3).embed_query("hello").await.unwrap();
        assert_eq!(vector.len(), 3);
    }

    #[test]
    fn test_dimensions_only_sent_when_shortening() {
        assert_eq!(requested_dimensions("text-embedding-3-small", 512), Some(512));
        assert_eq!(requested_dimensions("text-embedding-3-small", 1536), None);
        assert_eq!(requested_dimensions("text-embedding-3-large", 1024), Some(1024));
        // Other models and compatible servers may reject the field
        assert_eq!(requested_dimensions("text-embedding-ada-002", 1536), None);
        assert_eq!(requested_dimensions("nomic-embed-text", 768), None);

        let input = ["x".to_string()];
        let body = serde_json::to_value(EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
            dimensions: None,
        })
        .unwrap();
        assert!(body.get("dimensions").is_none());
    }

    #[test]
    fn test_vector_name_and_base_url() {
        let provider = OpenAiProvider::new(
            SecretString::from("k".to_string()),
            "https://api.openai.com/v1/",
            "Text-Embedding-3-Small",
            1536,
        );
        assert_eq!(provider.vector_name(), "openai-text-embedding-3-small");
        assert_eq!(provider.base_url(), "https://api.openai.com/v1");
    }
}
