use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::backend::{BackendClient, BackendError, HealthResponse};

/// Shown in place of a sentence whenever generation fails, whatever the cause
pub const GENERATION_ERROR_MESSAGE: &str =
    "Could not generate a sentence. Please check that the backend server is running.";

/// How long a status message stays on the info line
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Interval between background health probes
const HEALTH_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Button,
}

/// What the last health probe told us about the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendHealth {
    Unknown,
    Online(String),
    Offline,
}

pub struct App {
    pub focus: Focus,

    // Component state
    pub seed_word: String,
    pub generated_text: String,
    pub loading: bool,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    pub backend_health: BackendHealth,

    client: BackendClient,
    generation: Option<JoinHandle<Result<String, BackendError>>>,
    health_probe: Option<JoinHandle<Result<HealthResponse, BackendError>>>,
    last_health_check: Option<Instant>,
}

impl App {
    pub fn new(client: BackendClient, seed_word: impl Into<String>) -> Self {
        Self {
            focus: Focus::Input,

            seed_word: seed_word.into(),
            generated_text: String::new(),
            loading: false,

            status_message: None,
            status_message_time: None,

            backend_health: BackendHealth::Unknown,

            client,
            generation: None,
            health_probe: None,
            last_health_check: None,
        }
    }

    pub fn backend_url(&self) -> &str {
        self.client.base_url()
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.request_generation(),

            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Input => Focus::Button,
                    Focus::Button => Focus::Input,
                };
            }

            KeyCode::Char(' ') if self.focus == Focus::Button => self.request_generation(),

            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.focus == Focus::Input {
                    self.seed_word.clear();
                }
            }

            KeyCode::Char(c) if self.focus == Focus::Input => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.seed_word.push(c);
                }
            }

            KeyCode::Backspace if self.focus == Focus::Input => {
                self.seed_word.pop();
            }

            _ => {}
        }
    }

    fn request_generation(&mut self) {
        if !self.trigger_generation() {
            self.set_status("Still generating...");
        }
    }

    /// Start generating a sentence from the current seed word without
    /// blocking. Returns false, and does nothing, while a request is already
    /// in flight.
    pub fn trigger_generation(&mut self) -> bool {
        if self.loading {
            tracing::debug!("Generation already in flight, ignoring trigger");
            return false;
        }

        self.loading = true;
        self.generated_text.clear();

        let client = self.client.clone();
        let seed_word = self.seed_word.clone();
        tracing::info!(start_word = %seed_word, backend = %client.base_url(), "Generating sentence");

        self.generation = Some(tokio::spawn(async move { client.generate(&seed_word).await }));
        true
    }

    /// Apply the outcome of the in-flight request if it has finished
    pub async fn poll_generation(&mut self) {
        let finished = self
            .generation
            .as_ref()
            .map(|handle| handle.is_finished())
            .unwrap_or(false);

        if finished {
            if let Some(outcome) = self.take_outcome().await {
                self.apply_outcome(&outcome);
            }
        }
    }

    /// Wait for the in-flight request, if any, and hand back its result
    async fn take_outcome(&mut self) -> Option<Result<String, BackendError>> {
        let handle = self.generation.take()?;

        Some(
            handle
                .await
                .unwrap_or_else(|e| Err(BackendError::Transport(format!("task join error: {}", e)))),
        )
    }

    /// Store a finished request's result. The loading flag is cleared
    /// whatever the outcome.
    fn apply_outcome(&mut self, outcome: &Result<String, BackendError>) {
        match outcome {
            Ok(sentence) => {
                tracing::info!(sentence = %sentence, "Sentence generated");
                self.generated_text = sentence.clone();
            }
            Err(e) => {
                tracing::error!(error = %e, "Sentence generation failed");
                self.generated_text = GENERATION_ERROR_MESSAGE.to_string();
            }
        }

        self.loading = false;
    }

    /// Trigger a generation and wait for it
    pub async fn generate_now(&mut self) -> Result<(), BackendError> {
        if !self.trigger_generation() {
            return Ok(());
        }

        let Some(outcome) = self.take_outcome().await else {
            self.loading = false;
            return Ok(());
        };
        self.apply_outcome(&outcome);
        outcome.map(|_| ())
    }

    pub async fn tick(&mut self) {
        self.poll_generation().await;

        // Clear status message after timeout
        if let Some(time) = self.status_message_time {
            if time.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        self.poll_health().await;
    }

    /// Collect a finished health probe, or start a new one when due
    async fn poll_health(&mut self) {
        if let Some(handle) = self.health_probe.take() {
            if !handle.is_finished() {
                self.health_probe = Some(handle);
                return;
            }

            self.backend_health = match handle.await {
                Ok(Ok(health)) => BackendHealth::Online(health.message),
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "Backend health probe failed");
                    BackendHealth::Offline
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Backend health probe task failed");
                    BackendHealth::Offline
                }
            };
            self.last_health_check = Some(Instant::now());
            return;
        }

        let due = self
            .last_health_check
            .map(|t| t.elapsed() >= HEALTH_INTERVAL)
            .unwrap_or(true);

        if due {
            let client = self.client.clone();
            self.health_probe = Some(tokio::spawn(async move { client.health().await }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{self, Behaviour, MockBackend};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_for(url: &str, seed: &str) -> App {
        App::new(BackendClient::new(url), seed)
    }

    async fn wait_until_idle(app: &mut App) {
        while app.loading {
            app.poll_generation().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[test]
    fn starts_idle_with_seed_word() {
        let app = app_for("http://127.0.0.1:8000", "romeo");
        assert_eq!(app.seed_word, "romeo");
        assert!(app.generated_text.is_empty());
        assert!(!app.loading);
        assert_eq!(app.focus, Focus::Input);
    }

    #[test]
    fn typing_edits_seed_word() {
        let mut app = app_for("http://127.0.0.1:8000", "rom");
        app.handle_key(key(KeyCode::Char('e')));
        app.handle_key(key(KeyCode::Char('o')));
        assert_eq!(app.seed_word, "romeo");

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.seed_word, "rome");

        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(app.seed_word, "");
    }

    #[test]
    fn typing_is_ignored_on_button() {
        let mut app = app_for("http://127.0.0.1:8000", "romeo");
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Button);

        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(app.seed_word, "romeo");

        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focus, Focus::Input);
    }

    #[tokio::test]
    async fn success_replaces_generated_text() {
        let backend = MockBackend::start(Behaviour::sentence("Romeo is a man.")).await;
        let mut app = app_for(&backend.url, "romeo");
        app.generated_text = "an older sentence".to_string();

        app.generate_now().await.unwrap();

        assert_eq!(app.generated_text, "Romeo is a man.");
        assert!(!app.loading);
        assert_eq!(backend.start_words(), vec!["romeo"]);
    }

    #[tokio::test]
    async fn backend_error_sentence_is_shown_verbatim() {
        let backend =
            MockBackend::start(Behaviour::sentence("Error: 'xyzzy' is not in the vocabulary.")).await;
        let mut app = app_for(&backend.url, "xyzzy");

        app.generate_now().await.unwrap();

        assert_eq!(app.generated_text, "Error: 'xyzzy' is not in the vocabulary.");
    }

    #[tokio::test]
    async fn server_error_shows_fixed_message() {
        let backend = MockBackend::start(Behaviour::Status(500)).await;
        let mut app = app_for(&backend.url, "romeo");

        let err = app.generate_now().await.unwrap_err();

        assert!(matches!(err, BackendError::Network { status: 500 }));
        assert_eq!(app.generated_text, GENERATION_ERROR_MESSAGE);
        assert!(!app.loading);
    }

    #[tokio::test]
    async fn connection_refused_shows_fixed_message() {
        let mut app = app_for(&mock::unreachable_url(), "romeo");

        let err = app.generate_now().await.unwrap_err();

        assert!(matches!(err, BackendError::Transport(_)));
        assert_eq!(app.generated_text, GENERATION_ERROR_MESSAGE);
        assert!(!app.loading);
    }

    #[tokio::test]
    async fn malformed_reply_shows_fixed_message() {
        let backend = MockBackend::start(Behaviour::Garbage).await;
        let mut app = app_for(&backend.url, "romeo");

        assert!(app.generate_now().await.is_err());
        assert_eq!(app.generated_text, GENERATION_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn each_trigger_sends_one_request_with_seed_verbatim() {
        let backend = MockBackend::start(Behaviour::sentence("ok")).await;
        let words = ["", "romeo", "  two words ", "\"quoted\"", "\\slash", "日本語", "{\"start_word\":1}"];

        for word in words {
            let mut app = app_for(&backend.url, word);
            app.generate_now().await.unwrap();
        }

        assert_eq!(backend.request_count(), words.len());
        assert_eq!(backend.start_words(), words);
    }

    #[tokio::test]
    async fn loading_spans_the_request_and_blocks_retriggers() {
        let release = Arc::new(Notify::new());
        let backend = MockBackend::start(Behaviour::Held {
            release: release.clone(),
            sentence: "Romeo is a man.".to_string(),
        })
        .await;
        let mut app = app_for(&backend.url, "romeo");
        app.generated_text = "previous".to_string();

        assert!(app.trigger_generation());
        assert!(app.loading);
        assert!(app.generated_text.is_empty());

        // A second trigger while loading is ignored
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.status_message.as_deref(), Some("Still generating..."));
        assert!(!app.trigger_generation());

        // Still loading until the backend answers
        app.poll_generation().await;
        assert!(app.loading);

        release.notify_one();
        wait_until_idle(&mut app).await;

        assert_eq!(app.generated_text, "Romeo is a man.");
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn space_on_button_triggers_generation() {
        let backend = MockBackend::start(Behaviour::sentence("Romeo is a man.")).await;
        let mut app = app_for(&backend.url, "romeo");

        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.loading);

        wait_until_idle(&mut app).await;
        assert_eq!(app.generated_text, "Romeo is a man.");
        assert_eq!(app.seed_word, "romeo");
    }

    #[tokio::test]
    async fn app_stays_usable_after_failure() {
        let mut app = app_for(&mock::unreachable_url(), "romeo");
        assert!(app.generate_now().await.is_err());

        let backend = MockBackend::start(Behaviour::sentence("Romeo is a man.")).await;
        app.client = BackendClient::new(&backend.url);

        app.generate_now().await.unwrap();
        assert_eq!(app.generated_text, "Romeo is a man.");
    }

    #[tokio::test]
    async fn loading_never_set_without_trigger() {
        let backend = MockBackend::start(Behaviour::sentence("ok")).await;
        let mut app = app_for(&backend.url, "romeo");

        for _ in 0..3 {
            app.tick().await;
            assert!(!app.loading);
        }
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn health_probe_marks_backend_online() {
        let backend = MockBackend::start(Behaviour::sentence("ok")).await;
        let mut app = app_for(&backend.url, "romeo");

        while app.backend_health == BackendHealth::Unknown {
            app.tick().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(
            app.backend_health,
            BackendHealth::Online("Shakespeare API is running".to_string())
        );
    }

    #[tokio::test]
    async fn status_message_expires() {
        let mut app = app_for(&mock::unreachable_url(), "romeo");
        app.set_status("Still generating...");

        app.tick().await;
        assert_eq!(app.status_message.as_deref(), Some("Still generating..."));

        app.status_message_time = Some(Instant::now() - STATUS_TIMEOUT);
        app.tick().await;

        assert!(app.status_message.is_none());
        assert!(app.status_message_time.is_none());
    }

    #[tokio::test]
    async fn health_probe_reruns_after_interval() {
        let backend = MockBackend::start(Behaviour::sentence("ok")).await;
        let mut app = app_for(&backend.url, "romeo");

        while app.backend_health == BackendHealth::Unknown {
            app.tick().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(matches!(app.backend_health, BackendHealth::Online(_)));

        // Not due yet
        app.tick().await;
        assert!(app.health_probe.is_none());

        // Backend goes away; the next probe notices once the interval passes
        app.client = BackendClient::new(mock::unreachable_url());
        app.last_health_check = Some(Instant::now() - HEALTH_INTERVAL);
        app.tick().await;
        assert!(app.health_probe.is_some());

        while app.backend_health != BackendHealth::Offline {
            app.tick().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!app.loading);
    }

    #[tokio::test]
    async fn health_probe_marks_backend_offline() {
        let mut app = app_for(&mock::unreachable_url(), "romeo");

        while app.backend_health == BackendHealth::Unknown {
            app.tick().await;
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(app.backend_health, BackendHealth::Offline);
        assert!(!app.loading);
    }
}
