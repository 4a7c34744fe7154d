use super::{ensure_success, http_client, ChatJudge};
use crate::error::{RaterError, Result};
use crate::types::config::JudgeConfig;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
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
    #[serde(default)]
    content: String,
}

/// Chat-completions client for an OpenAI-compatible endpoint.
pub struct HttpChatJudge {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key_env: String,
}

impl HttpChatJudge {
    pub fn new(cfg: &JudgeConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(cfg.timeout())?,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key_env: cfg.api_key_env.clone(),
        })
    }
}

impl ChatJudge for HttpChatJudge {
    fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = std::env::var(&self.api_key_env).map_err(|_| {
            RaterError::ConfigParse(format!("{} is not set", self.api_key_env))
        })?;
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream: false,
        };

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "judge POST");
        let response = ensure_success(
            self.client
                .post(&self.endpoint)
                .header(AUTHORIZATION, format!("Bearer {api_key}"))
                .json(&body)
                .send()?,
        )?;
        let parsed: ChatResponse = response.json()?;
        first_reply(parsed)
    }
}

fn first_reply(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| RaterError::JudgeResponse("response contained no choices".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reply_takes_first_choice_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Final Response -- Status Code : 1"}}]}"#,
        )
        .expect("response should parse");
        assert_eq!(
            first_reply(response).expect("reply should exist"),
            "Final Response -- Status Code : 1"
        );
    }

    #[test]
    fn first_reply_rejects_empty_choices() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[]}"#).expect("response should parse");
        assert!(matches!(
            first_reply(response),
            Err(RaterError::JudgeResponse(_))
        ));
    }

    #[test]
    fn request_serializes_single_user_message() {
        let body = ChatRequest {
            model: "llama3.3:70b",
            messages: [ChatMessage {
                role: "user",
                content: "hello",
            }],
            stream: false,
        };
        let json = serde_json::to_value(&body).expect("request should serialize");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["stream"], false);
    }
}
