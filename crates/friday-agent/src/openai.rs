use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::provider::{ApiError, AssistantApi, Run, ThreadMessage};

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";

/// OpenAI Assistants API (v2) over reqwest.
pub struct OpenAiAssistants {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiAssistants {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| "https://api.openai.com".to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/v1{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER, BETA_VALUE)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/v1{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER, BETA_VALUE)
    }
}

/// Turn a non-2xx response into [`ApiError::Api`], otherwise decode JSON.
async fn decode<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %text, "assistants API error");
        return Err(ApiError::Api {
            status: status.as_u16(),
            message: text,
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

#[derive(Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Deserialize)]
struct MessageObject {
    role: String,
    #[serde(default)]
    created_at: i64,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<TextPart>,
}

#[derive(Deserialize)]
struct TextPart {
    value: String,
}

impl From<MessageObject> for ThreadMessage {
    fn from(m: MessageObject) -> Self {
        ThreadMessage {
            role: m.role,
            created_at: m.created_at,
            text: m
                .content
                .into_iter()
                .next()
                .and_then(|p| p.text)
                .map(|t| t.value),
        }
    }
}

#[async_trait]
impl AssistantApi for OpenAiAssistants {
    async fn create_thread(&self) -> Result<String, ApiError> {
        let resp = self.post("/threads").json(&serde_json::json!({})).send().await?;
        let thread: ThreadObject = decode(resp).await?;
        debug!(thread_id = %thread.id, "thread created");
        Ok(thread.id)
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<(), ApiError> {
        let resp = self
            .post(&format!("/threads/{thread_id}/messages"))
            .json(&serde_json::json!({ "role": "user", "content": content }))
            .send()
            .await?;
        let _: serde_json::Value = decode(resp).await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: &str,
    ) -> Result<Run, ApiError> {
        let resp = self
            .post(&format!("/threads/{thread_id}/runs"))
            .json(&serde_json::json!({
                "assistant_id": assistant_id,
                "additional_instructions": instructions,
            }))
            .send()
            .await?;
        decode(resp).await
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ApiError> {
        let resp = self
            .get(&format!("/threads/{thread_id}/runs/{run_id}"))
            .send()
            .await?;
        decode(resp).await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError> {
        let resp = self
            .get(&format!("/threads/{thread_id}/messages"))
            .send()
            .await?;
        let list: MessageList = decode(resp).await?;
        Ok(list.data.into_iter().map(ThreadMessage::from).collect())
    }
}
