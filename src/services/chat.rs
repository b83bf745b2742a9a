// src/services/chat.rs
use chrono::Utc;
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use super::error::{FetchError, Result};
use crate::models::ChatExchange;

const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const MAX_QUESTION_CHARS: usize = 300;

/// Trims the question and enforces the input limits.
pub fn validate_question(raw: &str) -> Result<String> {
    let question = raw.trim();
    if question.is_empty() {
        return Err(FetchError::InvalidInput("question must not be empty".to_string()));
    }
    let len = question.chars().count();
    if len > MAX_QUESTION_CHARS {
        return Err(FetchError::InvalidInput(format!(
            "question is {} characters, the limit is {}",
            len, MAX_QUESTION_CHARS
        )));
    }
    Ok(question.to_string())
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// First text part of the first candidate.
pub fn extract_answer(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    response.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| FetchError::Api("empty response or no candidates found".to_string()))
}

pub struct ChatClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    history: RwLock<Vec<ChatExchange>>,
}

#[derive(Debug, Serialize)]
pub struct ChatAnswer {
    pub question: String,
    pub response: String,
}

impl ChatClient {
    pub fn new(client: Client, api_key: Option<String>, model: impl Into<String>) -> Self {
        ChatClient {
            client,
            api_key,
            model: model.into(),
            base_url: GEMINI_URL.to_string(),
            history: RwLock::new(Vec::new()),
        }
    }

    async fn generate(&self, question: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey("GOOGLE_API_KEY"))?;
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        info!("Requesting completion from {}", url);

        let response = self.client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&json!({ "contents": [{ "parts": [{ "text": question }] }] }))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("Completion response ({}): {}", status, body);

        if !status.is_success() {
            error!("Completion request failed with {}", status);
            return Err(FetchError::Api(format!("HTTP {}", status)));
        }
        extract_answer(&body)
    }

    /// Answers a question; only successful exchanges are kept in the history.
    pub async fn ask(&self, raw_question: &str) -> Result<ChatAnswer> {
        let question = validate_question(raw_question)?;
        let response = self.generate(&question).await?;
        self.record(&question, &response).await;
        Ok(ChatAnswer { question, response })
    }

    async fn record(&self, question: &str, response: &str) {
        self.history.write().await.insert(0, ChatExchange {
            question: question.to_string(),
            response: response.to_string(),
            asked_at: Utc::now(),
        });
    }

    /// Newest first.
    pub async fn history(&self) -> Vec<ChatExchange> {
        self.history.read().await.clone()
    }
}
