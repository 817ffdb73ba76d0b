use crate::config::Config;
use crate::models::NewScreenshot;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "You are a helpful assistant that generates relevant tags for UI/UX \
screenshots. Generate concise, relevant tags that would be useful for searching and categorizing \
UI elements and design patterns.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug)]
struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

/// Produces AI tags for new screenshots. Never fails: when the service is
/// unconfigured or errors, the result is simply empty.
#[derive(Debug)]
pub struct TagGenerator {
    client: Option<OpenAiClient>,
}

impl TagGenerator {
    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn from_config(config: &Config) -> Self {
        let Some(api_key) = config.openai_api_key.clone() else {
            tracing::warn!("No OPENAI_API_KEY found. AI tagging functionality will be disabled.");
            return Self::disabled();
        };

        let http = match reqwest::Client::builder()
            .timeout(config.tagging_timeout)
            .build()
        {
            Ok(http) => http,
            Err(err) => {
                tracing::warn!(error = %err, "failed to build AI client, tagging disabled");
                return Self::disabled();
            }
        };

        Self {
            client: Some(OpenAiClient {
                http,
                api_key,
                endpoint: format!(
                    "{}/chat/completions",
                    config.openai_base_url.trim_end_matches('/')
                ),
                model: config.openai_model.clone(),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn generate(&self, description: &str) -> Vec<String> {
        let Some(client) = &self.client else {
            tracing::debug!("AI client not available, skipping tag generation");
            return Vec::new();
        };

        match client.complete(description).await {
            Ok(text) => parse_tags(&text),
            Err(err) => {
                tracing::warn!(error = %err, "error generating tags");
                Vec::new()
            }
        }
    }
}

impl OpenAiClient {
    async fn complete(&self, description: &str) -> Result<String, reqwest::Error> {
        let prompt = format!(
            "Generate relevant UI/UX tags for the following screenshot description, return only \
             the tags separated by commas without any other text: {description}"
        );
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.7,
            max_tokens: 150,
        };

        let response: ChatResponse = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

pub fn parse_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prompt text describing a screenshot from its metadata.
pub fn describe_screenshot(screenshot: &NewScreenshot) -> String {
    format!(
        "This is a {} screen from a {} app called {}. {} It contains UI elements like {}.",
        screenshot.screen_task,
        screenshot.genre,
        screenshot.app,
        screenshot.description.as_deref().unwrap_or_default(),
        screenshot.ui_elements.join(", "),
    )
}
