//! Review Controller — the bounded-retry loop behind the streaming endpoint.
//!
//! Flow per attempt: draw params → compose prompt → LLM call → extract.
//! A success emits a `review` event; any failure is logged and costs one unit
//! of the attempt budget. The loop ends when the requested count is reached,
//! the budget (2 × requested) is spent, or the consumer disconnects.
//!
//! Counters live on the controller value, one per request, so concurrent
//! requests never share state.

use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::generation::composer::compose;
use crate::generation::events::{Disconnected, StreamEmitter, StreamEvent};
use crate::generation::extractor::{extract, ExtractionFailure};
use crate::generation::params::draw;
use crate::llm_client::{CompletionClient, LlmError};

/// Hard ceiling on reviews per request, whatever the caller asks for.
pub const MAX_REVIEWS: usize = 5;
/// Attempt budget is this many times the clamped requested count.
pub const ATTEMPT_BUDGET_FACTOR: usize = 2;
/// Fixed pause between attempts. Not a backoff.
pub const INTER_ATTEMPT_PAUSE: Duration = Duration::from_millis(200);

/// Message sent in the `error` event when nothing could be generated.
pub const ALL_ATTEMPTS_FAILED: &str = "生成失败，请稍后重试";

/// Clamps any caller-supplied count into `1..=MAX_REVIEWS`.
pub fn clamp_count(count: i64) -> usize {
    count.clamp(1, MAX_REVIEWS as i64) as usize
}

/// Terminal summary of one controller run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub generated: usize,
    pub requested: usize,
    pub attempts_made: usize,
    /// True when the loop stopped because the consumer went away.
    pub cancelled: bool,
}

#[derive(Debug, Error)]
enum AttemptError {
    #[error("prompt rejected: {0}")]
    Prompt(#[from] ConfigError),

    #[error("completion call failed: {0}")]
    Transport(#[from] LlmError),

    #[error("unrecognised response shape: {0}")]
    Extraction(#[from] ExtractionFailure),
}

pub struct ReviewController {
    requested: usize,
    description: String,
    attempts_made: usize,
    generated: usize,
    review_counter: u64,
    pause: Duration,
    rng: StdRng,
}

impl ReviewController {
    /// Creates a controller for one request. Rejects an empty description
    /// up front so no attempt is ever spent on it.
    pub fn new(count: i64, description: impl Into<String>) -> Result<Self, ConfigError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ConfigError::EmptyDescription);
        }

        Ok(Self {
            requested: clamp_count(count),
            description,
            attempts_made: 0,
            generated: 0,
            review_counter: 0,
            pause: INTER_ATTEMPT_PAUSE,
            rng: StdRng::from_entropy(),
        })
    }

    #[cfg(test)]
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    #[cfg(test)]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn attempt_budget(&self) -> usize {
        ATTEMPT_BUDGET_FACTOR * self.requested
    }

    /// Runs the loop to completion, emitting every lifecycle event.
    ///
    /// The stream always ends with `completed`, preceded by `error` when no
    /// review was produced, unless the consumer disconnected first.
    pub async fn run(
        mut self,
        client: &dyn CompletionClient,
        emitter: &StreamEmitter,
    ) -> GenerationOutcome {
        info!(
            "Generating {} reviews (attempt budget {})",
            self.requested,
            self.attempt_budget()
        );

        match self.drive(client, emitter).await {
            Ok(()) => {
                info!(
                    "Generation finished: {}/{} reviews in {} attempts",
                    self.generated, self.requested, self.attempts_made
                );
                self.outcome(false)
            }
            Err(Disconnected) => {
                warn!(
                    "Consumer disconnected after {} attempts ({} reviews sent), stopping",
                    self.attempts_made, self.generated
                );
                self.outcome(true)
            }
        }
    }

    async fn drive(
        &mut self,
        client: &dyn CompletionClient,
        emitter: &StreamEmitter,
    ) -> Result<(), Disconnected> {
        emitter
            .emit(StreamEvent::Total {
                total: self.requested,
            })
            .await?;

        while self.generated < self.requested && self.attempts_made < self.attempt_budget() {
            if self.attempts_made > 0 && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            // failed attempts emit nothing, so a hang-up must be checked for directly
            if emitter.is_closed() {
                return Err(Disconnected);
            }
            self.attempts_made += 1;

            let result = tokio::select! {
                result = self.attempt(client) => result,
                _ = emitter.closed() => return Err(Disconnected),
            };

            match result {
                Ok(content) => {
                    self.generated += 1;
                    let id = self.next_review_id();
                    emitter.emit(StreamEvent::Review { id, content }).await?;
                }
                Err(e) => {
                    warn!("Attempt {}/{}: {e}", self.attempts_made, self.attempt_budget());
                }
            }
        }

        if self.generated == 0 {
            emitter
                .emit(StreamEvent::Error {
                    message: ALL_ATTEMPTS_FAILED.to_string(),
                })
                .await?;
        }

        emitter
            .emit(StreamEvent::Completed {
                generated: self.generated,
            })
            .await
    }

    async fn attempt(&mut self, client: &dyn CompletionClient) -> Result<String, AttemptError> {
        let params = draw(&mut self.rng);
        let prompt = compose(&params, &self.description)?;
        let raw = client
            .complete(&prompt.system_instruction, &prompt.user_instruction)
            .await?;
        Ok(extract(&raw)?)
    }

    /// Millisecond timestamp plus a per-request counter, so ids never repeat
    /// within a request even when two reviews land in the same millisecond.
    fn next_review_id(&mut self) -> String {
        self.review_counter += 1;
        format!("{}-{}", Utc::now().timestamp_millis(), self.review_counter)
    }

    fn outcome(&self, cancelled: bool) -> GenerationOutcome {
        GenerationOutcome {
            generated: self.generated,
            requested: self.requested,
            attempts_made: self.attempts_made,
            cancelled,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rand::Rng;
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::llm_client::RawCompletion;

    pub(crate) fn chat_reply(text: &str) -> RawCompletion {
        RawCompletion::new(json!({"choices": [{"message": {"role": "assistant", "content": text}}]}))
    }

    pub(crate) fn api_failure() -> LlmError {
        LlmError::Api {
            status: 503,
            message: "upstream overloaded".to_string(),
        }
    }

    /// Replays a fixed script of replies, then fails every further call.
    pub(crate) struct ScriptedClient {
        script: Mutex<VecDeque<Result<RawCompletion, LlmError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        pub(crate) fn new(script: Vec<Result<RawCompletion, LlmError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn succeeding(n: usize) -> Self {
            Self::new(
                (1..=n)
                    .map(|i| Ok(chat_reply(&format!("第{i}条点评，味道一级棒"))))
                    .collect(),
            )
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _system: &str, _user: &str) -> Result<RawCompletion, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(api_failure()))
        }
    }

    fn controller(count: i64) -> ReviewController {
        ReviewController::new(count, "老街烧烤，营业到凌晨两点")
            .unwrap()
            .with_pause(Duration::ZERO)
            .with_rng(StdRng::seed_from_u64(11))
    }

    async fn run_collect(
        controller: ReviewController,
        client: &ScriptedClient,
    ) -> (GenerationOutcome, Vec<StreamEvent>) {
        let (emitter, mut rx) = StreamEmitter::channel();
        let outcome = controller.run(client, &emitter).await;
        drop(emitter);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (outcome, events)
    }

    fn review_ids(events: &[StreamEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Review { id, .. } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_clamp_count() {
        assert_eq!(clamp_count(12), 5);
        assert_eq!(clamp_count(5), 5);
        assert_eq!(clamp_count(3), 3);
        assert_eq!(clamp_count(0), 1);
        assert_eq!(clamp_count(-4), 1);
        assert_eq!(controller(99).attempt_budget(), 10);
    }

    #[test]
    fn test_empty_description_rejected_before_any_attempt() {
        assert_eq!(
            ReviewController::new(3, "  \n").err(),
            Some(ConfigError::EmptyDescription)
        );
    }

    #[tokio::test]
    async fn test_all_attempts_succeed() {
        let client = ScriptedClient::succeeding(5);
        let (outcome, events) = run_collect(controller(5), &client).await;

        assert_eq!(outcome.generated, 5);
        assert_eq!(outcome.attempts_made, 5);
        assert!(!outcome.cancelled);
        assert_eq!(events.first(), Some(&StreamEvent::Total { total: 5 }));
        assert_eq!(events.last(), Some(&StreamEvent::Completed { generated: 5 }));
        assert_eq!(review_ids(&events).len(), 5);
        assert!(!events
            .iter()
            .any(|e| matches!(e, StreamEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_every_attempt_fails() {
        let client = ScriptedClient::new(vec![]);
        let (outcome, events) = run_collect(controller(3), &client).await;

        assert_eq!(outcome.generated, 0);
        assert_eq!(outcome.attempts_made, 6);
        assert_eq!(client.calls(), 6);
        assert_eq!(
            events,
            vec![
                StreamEvent::Total { total: 3 },
                StreamEvent::Error {
                    message: ALL_ATTEMPTS_FAILED.to_string()
                },
                StreamEvent::Completed { generated: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_two_failures_then_three_successes() {
        let client = ScriptedClient::new(vec![
            Err(api_failure()),
            Err(LlmError::Timeout { millis: 30_000 }),
            Ok(chat_reply("一")),
            Ok(chat_reply("二")),
            Ok(chat_reply("三")),
        ]);
        let (outcome, events) = run_collect(controller(3), &client).await;

        assert_eq!(outcome.generated, 3);
        assert_eq!(outcome.attempts_made, 5);
        assert!(outcome.attempts_made <= 6);
        assert_eq!(review_ids(&events).len(), 3);
        assert_eq!(events.last(), Some(&StreamEvent::Completed { generated: 3 }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, StreamEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_legacy_shape_extracts_same_content() {
        let client = ScriptedClient::new(vec![Ok(RawCompletion::new(
            json!({"choices": [{"text": "菜量挺足的"}]}),
        ))]);
        let (outcome, events) = run_collect(controller(1), &client).await;

        assert_eq!(outcome.generated, 1);
        assert!(matches!(
            &events[1],
            StreamEvent::Review { content, .. } if content == "菜量挺足的"
        ));
    }

    #[tokio::test]
    async fn test_extraction_failures_consume_budget() {
        let client = ScriptedClient::new(vec![
            Ok(RawCompletion::new(json!({"choices": []}))),
            Ok(RawCompletion::new(json!({"unexpected": true}))),
        ]);
        let (outcome, events) = run_collect(controller(1), &client).await;

        assert_eq!(outcome.attempts_made, 2);
        assert_eq!(outcome.generated, 0);
        assert!(events
            .iter()
            .any(|e| matches!(e, StreamEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_partial_success_has_no_error_event() {
        let client = ScriptedClient::new(vec![Ok(chat_reply("只成功了一条"))]);
        let (outcome, events) = run_collect(controller(2), &client).await;

        assert_eq!(outcome.generated, 1);
        assert_eq!(outcome.attempts_made, 4);
        assert_eq!(
            events.last(),
            Some(&StreamEvent::Completed { generated: 1 })
        );
        assert!(!events
            .iter()
            .any(|e| matches!(e, StreamEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_budget_holds_for_random_failure_patterns() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let count = rng.gen_range(-2..9);
            let script = (0..12)
                .map(|i| {
                    if rng.gen_bool(0.5) {
                        Ok(chat_reply(&format!("点评{i}")))
                    } else {
                        Err(api_failure())
                    }
                })
                .collect();
            let client = ScriptedClient::new(script);
            let (outcome, events) = run_collect(controller(count), &client).await;

            assert!(outcome.requested <= MAX_REVIEWS);
            assert!(outcome.generated <= outcome.requested);
            assert!(outcome.attempts_made <= 2 * outcome.requested);

            let ids = review_ids(&events);
            let unique: HashSet<_> = ids.iter().collect();
            assert_eq!(unique.len(), ids.len());
            assert_eq!(ids.len(), outcome.generated);

            // nothing after the terminal event
            assert!(matches!(events.last(), Some(StreamEvent::Completed { .. })));
        }
    }

    /// Drops the consumer side of the stream during its first call.
    struct DisconnectingClient {
        rx: Mutex<Option<mpsc::Receiver<StreamEvent>>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for DisconnectingClient {
        async fn complete(&self, _system: &str, _user: &str) -> Result<RawCompletion, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rx.lock().unwrap().take();
            Ok(chat_reply("没人看了"))
        }
    }

    /// Drops the consumer side of the stream during its first call, then fails.
    struct DisconnectThenFailClient {
        rx: Mutex<Option<mpsc::Receiver<StreamEvent>>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for DisconnectThenFailClient {
        async fn complete(&self, _system: &str, _user: &str) -> Result<RawCompletion, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.rx.lock().unwrap().take();
            Err(api_failure())
        }
    }

    #[tokio::test]
    async fn test_disconnect_during_failed_attempt_stops_loop() {
        let (emitter, rx) = StreamEmitter::channel();
        let client = DisconnectThenFailClient {
            rx: Mutex::new(Some(rx)),
            calls: AtomicUsize::new(0),
        };

        let outcome = controller(5).run(&client, &emitter).await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.attempts_made, 1);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    /// Never answers.
    struct HangingClient;

    #[async_trait]
    impl CompletionClient for HangingClient {
        async fn complete(&self, _system: &str, _user: &str) -> Result<RawCompletion, LlmError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_disconnect_abandons_in_flight_call() {
        let (emitter, rx) = StreamEmitter::channel();
        let task = tokio::spawn(async move { controller(5).run(&HangingClient, &emitter).await });

        tokio::task::yield_now().await;
        drop(rx);

        let outcome = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("controller kept waiting on a dropped stream")
            .unwrap();
        assert!(outcome.cancelled);
        assert!(outcome.attempts_made <= 1);
        assert_eq!(outcome.generated, 0);
    }

    #[tokio::test]
    async fn test_disconnect_stops_loop() {
        let (emitter, rx) = StreamEmitter::channel();
        let client = DisconnectingClient {
            rx: Mutex::new(Some(rx)),
            calls: AtomicUsize::new(0),
        };

        let outcome = controller(5).run(&client, &emitter).await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.attempts_made, 1);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
