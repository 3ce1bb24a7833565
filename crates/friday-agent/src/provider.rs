use async_trait::async_trait;
use serde::Deserialize;

/// Lifecycle state of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Still worth polling.
    pub fn is_pending(&self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
}

/// One entry of a thread, flattened to what the bridge needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadMessage {
    pub role: String,
    /// Unix seconds.
    pub created_at: i64,
    /// Text of the first content part, when it is a text part.
    pub text: Option<String>,
}

/// Thread/run operations of an assistant service.
///
/// Sessions are owned by the service; callers hold the ids only for the
/// duration of one request.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_thread(&self) -> Result<String, ApiError>;

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<(), ApiError>;

    /// Start a run with `instructions` appended to the assistant's own.
    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        instructions: &str,
    ) -> Result<Run, ApiError>;

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<Run, ApiError>;

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>, ApiError>;
}

/// Transport-level failure of a single API call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Bridge failure, one variant per protocol stage. All of them reach the
/// end user as the same retry prompt; the stage is kept for logs.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("thread creation failed: {0}")]
    CreateThread(#[source] ApiError),

    #[error("message submission failed: {0}")]
    SubmitMessage(#[source] ApiError),

    #[error("run start failed: {0}")]
    StartRun(#[source] ApiError),

    #[error("run still pending after {attempts} polls")]
    Timeout { attempts: u32 },

    #[error("run status poll failed: {0}")]
    Poll(#[source] ApiError),

    #[error("run ended with status {0:?}")]
    RunFailed(RunStatus),

    #[error("fetching thread messages failed: {0}")]
    FetchMessages(#[source] ApiError),

    #[error("thread has no assistant reply")]
    EmptyReply,
}

impl AssistantError {
    pub fn code(&self) -> &'static str {
        match self {
            AssistantError::CreateThread(_) => "THREAD_CREATE_FAILED",
            AssistantError::SubmitMessage(_) => "MESSAGE_SUBMIT_FAILED",
            AssistantError::StartRun(_) => "RUN_START_FAILED",
            AssistantError::Timeout { .. } => "RUN_TIMEOUT",
            AssistantError::Poll(_) | AssistantError::RunFailed(_) => "RUN_FAILED",
            AssistantError::FetchMessages(_) => "FETCH_FAILED",
            AssistantError::EmptyReply => "EMPTY_REPLY",
        }
    }

    /// Localised description of the failed stage.
    pub fn user_message(&self) -> &'static str {
        match self {
            AssistantError::CreateThread(_) => "שגיאה ביצירת שיחה עם AI",
            AssistantError::SubmitMessage(_) => "שגיאה בשליחת הודעה",
            AssistantError::StartRun(_) => "שגיאה בהרצת Assistant",
            AssistantError::Timeout { .. } => "תשובה לוקחת יותר מדי זמן",
            AssistantError::Poll(_)
            | AssistantError::RunFailed(_)
            | AssistantError::FetchMessages(_) => "שגיאה בקבלת תשובה",
            AssistantError::EmptyReply => "לא התקבלה תשובה",
        }
    }
}
