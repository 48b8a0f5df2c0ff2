use crate::error::{GitBriefError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Gemini API client
///
/// A single generateContent call per brief: system instruction plus one user
/// content part, no retry, no streaming.
pub struct GeminiClient {
    api_key: String,
    client: Client,
    model: String,
    max_tokens: u32,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            api_key,
            client,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    /// Set the model to use
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Set max output tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Generate text from a system instruction and a user prompt
    pub async fn generate(&self, system_instruction: &str, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_API_URL, self.model, self.api_key
        );

        let request = GeminiRequest {
            system_instruction: ContentDto {
                role: None,
                parts: vec![PartDto {
                    text: system_instruction.to_string(),
                }],
            },
            contents: vec![ContentDto {
                role: Some("user".to_string()),
                parts: vec![PartDto {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfigDto {
                max_output_tokens: self.max_tokens,
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GitBriefError::gemini_api(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        // Extract text from the first candidate's first part
        gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| {
                GitBriefError::gemini_api("No content in Gemini response".to_string())
            })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: ContentDto,
    contents: Vec<ContentDto>,
    generation_config: GenerationConfigDto,
}

#[derive(Debug, Serialize)]
struct ContentDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<PartDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PartDto {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigDto {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<CandidateDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    content: CandidateContentDto,
}

#[derive(Debug, Deserialize)]
struct CandidateContentDto {
    parts: Vec<PartDto>,
}
