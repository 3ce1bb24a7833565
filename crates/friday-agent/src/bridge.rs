use std::sync::Arc;
use std::time::Duration;

use friday_core::config::AssistantConfig;
use tracing::{debug, info, instrument, warn};

use crate::openai::OpenAiAssistants;
use crate::provider::{AssistantApi, AssistantError};

/// Used when the newest assistant entry has no text part.
pub const FALLBACK_REPLY: &str = "מצטער, לא הצלחתי לענות על השאלה.";

/// One-shot question/answer over an [`AssistantApi`].
///
/// Every call opens a fresh thread; nothing carries over between questions.
pub struct AssistantBridge {
    api: Arc<dyn AssistantApi>,
    assistant_id: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl AssistantBridge {
    pub fn new(
        api: Arc<dyn AssistantApi>,
        assistant_id: impl Into<String>,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Self {
        Self {
            api,
            assistant_id: assistant_id.into(),
            poll_interval,
            max_polls,
        }
    }

    /// Create thread, submit, run, poll, fetch. No step is retried.
    #[instrument(skip(self, question, instructions), fields(assistant = %self.assistant_id))]
    pub async fn ask(&self, question: &str, instructions: &str) -> Result<String, AssistantError> {
        let thread_id = self
            .api
            .create_thread()
            .await
            .map_err(AssistantError::CreateThread)?;

        self.api
            .add_message(&thread_id, question)
            .await
            .map_err(AssistantError::SubmitMessage)?;

        let run = self
            .api
            .create_run(&thread_id, &self.assistant_id, instructions)
            .await
            .map_err(AssistantError::StartRun)?;

        let mut status = run.status;
        let mut attempts = 0u32;
        while status.is_pending() {
            if attempts >= self.max_polls {
                warn!(%thread_id, attempts, "run did not finish in time");
                return Err(AssistantError::Timeout { attempts });
            }
            tokio::time::sleep(self.poll_interval).await;
            attempts += 1;
            status = self
                .api
                .get_run(&thread_id, &run.id)
                .await
                .map_err(AssistantError::Poll)?
                .status;
        }
        debug!(?status, attempts, "run settled");

        if status != crate::provider::RunStatus::Completed {
            return Err(AssistantError::RunFailed(status));
        }

        let messages = self
            .api
            .list_messages(&thread_id)
            .await
            .map_err(AssistantError::FetchMessages)?;

        let latest = messages
            .into_iter()
            .filter(|m| m.role == "assistant")
            .max_by_key(|m| m.created_at)
            .ok_or(AssistantError::EmptyReply)?;

        Ok(latest
            .text
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }
}

/// The configured assistant, or which setting is missing.
pub enum AssistantSlot {
    Ready(AssistantBridge),
    MissingApiKey,
    MissingAssistantId,
}

impl AssistantSlot {
    /// Build the OpenAI-backed bridge from config. Missing credentials are
    /// not an error here; requests that need the assistant report them.
    pub fn from_config(cfg: &AssistantConfig) -> Self {
        let Some(api_key) = cfg.api_key.clone().filter(|k| !k.is_empty()) else {
            warn!("assistant.api_key not set; chat replies disabled");
            return AssistantSlot::MissingApiKey;
        };
        let Some(assistant_id) = cfg.assistant_id.clone().filter(|id| !id.is_empty()) else {
            warn!("assistant.assistant_id not set; chat replies disabled");
            return AssistantSlot::MissingAssistantId;
        };
        info!(base_url = %cfg.base_url, "assistant bridge ready");
        let api = OpenAiAssistants::new(api_key, Some(cfg.base_url.clone()));
        AssistantSlot::Ready(AssistantBridge::new(
            Arc::new(api),
            assistant_id,
            Duration::from_millis(cfg.poll_interval_ms),
            cfg.max_polls,
        ))
    }

    pub fn bridge(&self) -> Option<&AssistantBridge> {
        match self {
            AssistantSlot::Ready(b) => Some(b),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::{ApiError, Run, RunStatus, ThreadMessage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted assistant service. Records every call in order.
    pub(crate) struct FakeApi {
        pub fail_at: Option<&'static str>,
        /// Statuses returned by successive `get_run` calls; the last repeats.
        pub statuses: Vec<RunStatus>,
        pub initial: RunStatus,
        pub messages: Vec<ThreadMessage>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                fail_at: None,
                statuses: vec![RunStatus::Completed],
                initial: RunStatus::Queued,
                messages: vec![
                    ThreadMessage {
                        role: "user".into(),
                        created_at: 100,
                        text: Some("q".into()),
                    },
                    ThreadMessage {
                        role: "assistant".into(),
                        created_at: 101,
                        text: Some(text.into()),
                    },
                ],
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing_at(stage: &'static str) -> Self {
            Self {
                fail_at: Some(stage),
                ..Self::replying("unused")
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call.to_string());
            if self.fail_at == Some(call) {
                return Err(ApiError::Api {
                    status: 500,
                    message: format!("{call} exploded"),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AssistantApi for FakeApi {
        async fn create_thread(&self) -> Result<String, ApiError> {
            self.record("create_thread")?;
            Ok("thread_1".into())
        }

        async fn add_message(&self, _thread_id: &str, content: &str) -> Result<(), ApiError> {
            self.record("add_message")?;
            self.calls.lock().unwrap().push(format!("content:{content}"));
            Ok(())
        }

        async fn create_run(
            &self,
            _thread_id: &str,
            assistant_id: &str,
            _instructions: &str,
        ) -> Result<Run, ApiError> {
            self.record("create_run")?;
            assert_eq!(assistant_id, "asst_test");
            Ok(Run {
                id: "run_1".into(),
                status: self.initial,
            })
        }

        async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<Run, ApiError> {
            self.record("get_run")?;
            let polls = self
                .calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| *c == "get_run")
                .count();
            let status = self
                .statuses
                .get(polls - 1)
                .or(self.statuses.last())
                .copied()
                .unwrap_or(RunStatus::Completed);
            Ok(Run {
                id: "run_1".into(),
                status,
            })
        }

        async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError> {
            self.record("list_messages")?;
            Ok(self.messages.clone())
        }
    }

    pub(crate) fn bridge(api: Arc<FakeApi>) -> AssistantBridge {
        AssistantBridge::new(api, "asst_test", Duration::from_millis(1), 30)
    }

    #[tokio::test]
    async fn happy_path_runs_stages_in_order() {
        let api = Arc::new(FakeApi::replying("Yellow Friday מחכה לך! 🎉"));
        let reply = bridge(api.clone()).ask("מה המחיר?", "be nice").await.unwrap();
        assert_eq!(reply, "Yellow Friday מחכה לך! 🎉");
        assert_eq!(
            api.calls(),
            vec![
                "create_thread",
                "add_message",
                "content:מה המחיר?",
                "create_run",
                "get_run",
                "list_messages"
            ]
        );
    }

    #[tokio::test]
    async fn newest_assistant_message_wins() {
        let mut api = FakeApi::replying("old");
        api.messages.push(ThreadMessage {
            role: "assistant".into(),
            created_at: 500,
            text: Some("new".into()),
        });
        api.messages.push(ThreadMessage {
            role: "user".into(),
            created_at: 900,
            text: Some("later user".into()),
        });
        let reply = bridge(Arc::new(api)).ask("q", "").await.unwrap();
        assert_eq!(reply, "new");
    }

    #[tokio::test]
    async fn each_stage_failure_is_distinct() {
        for (stage, code) in [
            ("create_thread", "THREAD_CREATE_FAILED"),
            ("add_message", "MESSAGE_SUBMIT_FAILED"),
            ("create_run", "RUN_START_FAILED"),
            ("get_run", "RUN_FAILED"),
            ("list_messages", "FETCH_FAILED"),
        ] {
            let api = Arc::new(FakeApi::failing_at(stage));
            let err = bridge(api.clone()).ask("q", "").await.unwrap_err();
            assert_eq!(err.code(), code, "stage {stage}");
            assert_eq!(api.calls().last().map(String::as_str), Some(stage));
        }
    }

    #[tokio::test]
    async fn pending_run_times_out_after_max_polls() {
        let mut api = FakeApi::replying("x");
        api.statuses = vec![RunStatus::InProgress];
        let api = Arc::new(api);
        let b = AssistantBridge::new(api.clone(), "asst_test", Duration::from_millis(1), 3);
        let err = b.ask("q", "").await.unwrap_err();
        assert!(matches!(err, AssistantError::Timeout { attempts: 3 }));
        assert_eq!(api.calls().iter().filter(|c| *c == "get_run").count(), 3);
    }

    #[tokio::test]
    async fn terminal_failure_status_is_reported() {
        let mut api = FakeApi::replying("x");
        api.statuses = vec![RunStatus::InProgress, RunStatus::Failed];
        let err = bridge(Arc::new(api)).ask("q", "").await.unwrap_err();
        assert!(matches!(err, AssistantError::RunFailed(RunStatus::Failed)));
        assert_eq!(err.user_message(), "שגיאה בקבלת תשובה");
    }

    #[tokio::test]
    async fn no_assistant_entry_is_empty_reply() {
        let mut api = FakeApi::replying("x");
        api.messages.retain(|m| m.role != "assistant");
        let err = bridge(Arc::new(api)).ask("q", "").await.unwrap_err();
        assert!(matches!(err, AssistantError::EmptyReply));
    }

    #[tokio::test]
    async fn textless_reply_uses_fallback() {
        let mut api = FakeApi::replying("x");
        api.messages[1].text = None;
        let reply = bridge(Arc::new(api)).ask("q", "").await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[test]
    fn slot_reports_missing_settings() {
        let mut cfg = AssistantConfig::default();
        assert!(matches!(AssistantSlot::from_config(&cfg), AssistantSlot::MissingApiKey));
        cfg.api_key = Some("sk-test".into());
        assert!(matches!(
            AssistantSlot::from_config(&cfg),
            AssistantSlot::MissingAssistantId
        ));
        cfg.assistant_id = Some("asst_1".into());
        assert!(AssistantSlot::from_config(&cfg).bridge().is_some());
    }
}
