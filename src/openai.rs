//! Minimal OpenAI client for lesson generation.
//!
//! We only call chat.completions and request either plain text or a strict JSON object.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::config::Prompts;
use crate::util::{fill_template, trunc_for_log};

const PLAIN_HTML_SYSTEM: &str = r#"
You are an expert educational content creator.

Output:
- Output ONLY the lesson as HTML, no Markdown fences, no commentary.
- Use <h2> headings named exactly: Introduction, Key Concepts, Examples,
  Practice Exercises, Key Takeaways, Resources.
"#;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

/// What the model is asked to produce for a lesson.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedLesson {
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub structured: Option<HashMap<String, String>>,
}

/// Inputs for one lesson generation.
#[derive(Debug, Clone)]
pub struct LessonBrief<'a> {
  pub course_title: &'a str,
  pub title: &'a str,
  pub topic: &'a str,
  pub difficulty: &'a str,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, model })
  }

  async fn chat(&self, req: &ChatCompletionRequest) -> Result<String, String> {
    let url = format!("{}/chat/completions", self.base_url);
    let res = self.client.post(&url)
      .header(USER_AGENT, "lessonflow-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(req).send().await.map_err(|e| e.to_string())?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      return Err(format!("OpenAI HTTP {}: {}", status, trunc_for_log(&msg, 300)));
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| e.to_string())?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    Ok(body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default())
  }

  /// Plain-text chat completion.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat_plain(&self, system: &str, user: &str, temperature: f32) -> Result<String, String> {
    let req = ChatCompletionRequest::new(&self.model, system, user, temperature, None);
    Ok(self.chat(&req).await?.trim().to_string())
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<T, String> {
    let req = ChatCompletionRequest::new(
      &self.model,
      system,
      user,
      temperature,
      Some(ResponseFormat { r#type: "json_object".into() }),
    );
    let text = self.chat(&req).await?;
    serde_json::from_str::<T>(&text).map_err(|e| format!("JSON parse error: {}", e))
  }

  // --- High-level helpers (domain-specialized) ---

  /// Generate lesson HTML (+ optional pre-split sections).
  /// JSON mode first; if the model breaks the JSON contract, retry once asking for bare HTML.
  #[instrument(
    level = "info",
    skip(self, prompts, brief),
    fields(title = %brief.title, difficulty = %brief.difficulty, model = %self.model)
  )]
  pub async fn generate_lesson_content(
    &self,
    prompts: &Prompts,
    brief: &LessonBrief<'_>,
  ) -> Result<GeneratedLesson, String> {
    let vars = [
      ("course_title", brief.course_title),
      ("title", brief.title),
      ("topic", brief.topic),
      ("difficulty", brief.difficulty),
    ];
    let system = fill_template(&prompts.lesson_system, &vars);
    let user = fill_template(&prompts.lesson_user_template, &vars);

    let start = std::time::Instant::now();
    match self.chat_json::<GeneratedLesson>(&system, &user, 0.7).await {
      Ok(gen) if !gen.content.trim().is_empty() || gen.structured.is_some() => {
        info!(elapsed = ?start.elapsed(), content_len = gen.content.len(), structured = gen.structured.is_some(), "Lesson content generated");
        return Ok(gen);
      }
      Ok(_) => warn!(elapsed = ?start.elapsed(), "Model returned empty lesson JSON; retrying as plain HTML"),
      Err(e) => warn!(elapsed = ?start.elapsed(), error = %e, "Lesson JSON generation failed; retrying as plain HTML"),
    }

    let html = self.chat_plain(PLAIN_HTML_SYSTEM, &user, 0.7).await.map_err(|e| {
      error!(elapsed = ?start.elapsed(), error = %e, "Plain HTML lesson generation failed");
      format!("Model generation failed: {e}")
    })?;
    if html.is_empty() {
      return Err("Model generation failed: empty response".into());
    }
    info!(elapsed = ?start.elapsed(), content_len = html.len(), "Lesson content generated (plain HTML)");
    Ok(GeneratedLesson { content: strip_code_fence(&html).to_string(), structured: None })
  }
}

/// Models sometimes wrap HTML in ```html fences despite instructions.
fn strip_code_fence(s: &str) -> &str {
  let t = s.trim();
  let Some(rest) = t.strip_prefix("```") else { return t };
  let rest = rest.strip_prefix("html").unwrap_or(rest);
  rest.strip_suffix("```").unwrap_or(rest).trim()
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}

impl ChatCompletionRequest {
  fn new(model: &str, system: &str, user: &str, temperature: f32, response_format: Option<ResponseFormat>) -> Self {
    Self {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format,
    }
  }
}

#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
