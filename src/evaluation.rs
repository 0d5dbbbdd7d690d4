//! Post-session evaluation.
//!
//! A session's final statistics are turned into a grade, a title and a short
//! comment. A remote text-generation backend is used when an API key is
//! configured; every failure on that path resolves to the deterministic local
//! grader, so callers always get a result.

use crate::{config::EvaluatorConfig, stats::SessionStatistics};
use serde::{Deserialize, Serialize};
use std::sync::{
    mpsc::{self, Receiver, Sender, TryRecvError},
    Arc,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Placeholder some setups ship instead of a real key
const PLACEHOLDER_KEY: &str = "YOUR_API_KEY";

pub const SCORING_THRESHOLDS: &str = "\
- S: throughput > 50 and fails < 1
- A: throughput > 35 and fails < 3
- B: throughput > 20
- C: throughput > 10
- D: throughput <= 10
- F: fails > 5 (overrides everything else)";

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Some(Grade::S),
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            "F" => Some(Grade::F),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub grade: Grade,
    pub title: String,
    pub comment: String,
    /// Produced by the local grader rather than the remote backend
    pub is_offline: bool,
}

/// The figures an evaluation is based on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationInput {
    pub elapsed_secs: f64,
    pub completed: u32,
    pub failed: u32,
    /// Completions per minute, rounded to a whole number
    pub throughput_per_minute: f64,
}

impl EvaluationInput {
    pub fn from_stats(stats: &SessionStatistics) -> Self {
        let elapsed_secs = stats.duration_secs();
        let throughput = if elapsed_secs > 0.0 {
            stats.completed_stratagems as f64 / (elapsed_secs / 60.0)
        } else {
            0.0
        };
        Self {
            elapsed_secs,
            completed: stats.completed_stratagems,
            failed: stats.failed_stratagems,
            throughput_per_minute: throughput.round(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    #[error("backend answered with status {0}")]
    Status(u16),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("backend returned no text")]
    EmptyResponse,

    #[error("grade {0:?} is not one of S, A, B, C, D, F")]
    InvalidGrade(String),
}

/// Strategy turning final statistics into an evaluation
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, stats: &SessionStatistics) -> Result<EvaluationResult, EvalError>;
}

/// Threshold grading on throughput `t` and failure count `f`. First match wins.
pub fn local_grade(t: f64, f: u32) -> Grade {
    if f > 5 {
        Grade::F
    } else if t > 50.0 && f < 1 {
        Grade::S
    } else if t > 35.0 && f < 3 {
        Grade::A
    } else if t > 10.0 {
        Grade::C
    } else if t <= 10.0 {
        Grade::D
    } else {
        Grade::B
    }
}

fn local_title_and_comment(grade: Grade) -> (&'static str, &'static str) {
    match grade {
        Grade::S => (
            "Hero of Super Earth",
            "Unbelievable speed! Even General Brasch would approve of this output of managed democracy.",
        ),
        Grade::A => (
            "Super Citizen",
            "Well done, Helldiver! Precision like this strikes fear into the bugs. Victory is ours!",
        ),
        Grade::B => (
            "Qualified Helldiver",
            "Acceptable. Only the finest Helldivers make it home from the front. Keep training.",
        ),
        Grade::C => (
            "Fresh Recruit",
            "Barely passing. On a real battlefield hesitation means defeat. You need more practice.",
        ),
        Grade::D => (
            "Civilian",
            "Too slow! By the time your code is in, the bugs have picked you clean. Speed it up!",
        ),
        Grade::F => (
            "Automaton Spy",
            "Horrifying. Were your fingers hacked by the Automatons? Report to the Ministry of Truth.",
        ),
    }
}

/// Deterministic offline grader
#[derive(Debug, Clone, Default)]
pub struct LocalEvaluator {
    delay: Duration,
}

impl LocalEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause before answering, so the report screen has a visible loading state
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn assess(&self, input: &EvaluationInput) -> EvaluationResult {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let grade = local_grade(input.throughput_per_minute, input.failed);
        let (title, comment) = local_title_and_comment(grade);
        EvaluationResult {
            grade,
            title: title.to_string(),
            comment: comment.to_string(),
            is_offline: true,
        }
    }
}

impl Evaluator for LocalEvaluator {
    fn evaluate(&self, stats: &SessionStatistics) -> Result<EvaluationResult, EvalError> {
        Ok(self.assess(&EvaluationInput::from_stats(stats)))
    }
}

#[derive(Debug, Deserialize)]
struct RemoteVerdict {
    grade: String,
    title: String,
    comment: String,
}

/// Client for a `generateContent`-style text generation endpoint
pub struct RemoteEvaluator {
    endpoint: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl RemoteEvaluator {
    pub fn new(config: &EvaluatorConfig, api_key: String) -> Result<Self, EvalError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EvalError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            timeout_secs: config.timeout_secs,
            client,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

pub fn build_prompt(input: &EvaluationInput) -> String {
    format!(
        "You are General Brasch, the drill instructor of Super Earth's Helldivers.\n\
         Grade this Helldiver's stratagem input training session.\n\n\
         Training data:\n\
         - Total time: {:.1} seconds\n\
         - Codes completed: {}\n\
         - Input mistakes: {}\n\
         - Throughput (codes per minute): {}\n\n\
         Scoring thresholds:\n{}\n\n\
         Answer with a JSON object with these fields:\n\
         1. grade: one of S, A, B, C, D, F\n\
         2. title: a short, punchy honorary title for this session\n\
         3. comment: the General's remark in a fierce, patriotic tone, at most 80 characters",
        input.elapsed_secs,
        input.completed,
        input.failed,
        input.throughput_per_minute,
        SCORING_THRESHOLDS,
    )
}

pub fn request_body(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "grade": { "type": "STRING" },
                    "title": { "type": "STRING" },
                    "comment": { "type": "STRING" },
                },
                "required": ["grade", "title", "comment"],
            },
        },
    })
}

/// Drop markdown code fences the model sometimes wraps JSON in
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Pull the verdict out of a `generateContent` response
pub fn parse_response(response: &serde_json::Value) -> Result<EvaluationResult, EvalError> {
    let text = response
        .get("candidates")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.get("parts"))
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("text"))
        .and_then(|v| v.as_str())
        .filter(|t| !t.trim().is_empty())
        .ok_or(EvalError::EmptyResponse)?;

    let verdict: RemoteVerdict = serde_json::from_str(strip_code_fences(text))
        .map_err(|e| EvalError::InvalidJson(e.to_string()))?;
    let grade = Grade::parse(&verdict.grade).ok_or(EvalError::InvalidGrade(verdict.grade))?;

    Ok(EvaluationResult {
        grade,
        title: verdict.title,
        comment: verdict.comment,
        is_offline: false,
    })
}

impl Evaluator for RemoteEvaluator {
    fn evaluate(&self, stats: &SessionStatistics) -> Result<EvaluationResult, EvalError> {
        let input = EvaluationInput::from_stats(stats);
        let body = request_body(&build_prompt(&input));

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EvalError::Timeout(self.timeout_secs)
                } else {
                    EvalError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(EvalError::Status(response.status().as_u16()));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| EvalError::InvalidJson(e.to_string()))?;
        parse_response(&json)
    }
}

/// Picks the remote backend when one is configured and falls back to the
/// local grader on any failure.
pub struct EvaluationAdapter {
    remote: Option<Box<dyn Evaluator>>,
    local: LocalEvaluator,
}

/// True when `key` can be sent to the backend
pub fn usable_api_key(key: Option<&str>) -> bool {
    matches!(key, Some(k) if !k.trim().is_empty() && !k.contains(PLACEHOLDER_KEY))
}

impl EvaluationAdapter {
    pub fn offline(local: LocalEvaluator) -> Self {
        Self {
            remote: None,
            local,
        }
    }

    pub fn with_remote(remote: Box<dyn Evaluator>, local: LocalEvaluator) -> Self {
        Self {
            remote: Some(remote),
            local,
        }
    }

    /// Decide once, at startup, whether the remote backend is used. A missing
    /// key is a normal mode of operation.
    pub fn from_config(config: &EvaluatorConfig, local: LocalEvaluator) -> Self {
        let key = std::env::var(&config.api_key_env).ok();
        if !usable_api_key(key.as_deref()) {
            info!(env = %config.api_key_env, "no API key, using offline evaluation");
            return Self::offline(local);
        }

        match RemoteEvaluator::new(config, key.unwrap_or_default()) {
            Ok(remote) => {
                info!(model = %config.model, "remote evaluation enabled");
                Self::with_remote(Box::new(remote), local)
            }
            Err(e) => {
                warn!("remote evaluator unavailable: {}", e);
                Self::offline(local)
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn evaluate(&self, stats: &SessionStatistics) -> EvaluationResult {
        let input = EvaluationInput::from_stats(stats);
        if let Some(remote) = &self.remote {
            match remote.evaluate(stats) {
                Ok(result) => return result,
                Err(e) => warn!("remote evaluation failed, switching to local: {}", e),
            }
        }
        self.local.assess(&input)
    }
}

/// What the report view should show
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvaluationStatus<'a> {
    Idle,
    Pending,
    Ready(&'a EvaluationResult),
}

#[derive(Debug)]
enum TaskState {
    Idle,
    Pending,
    Ready(EvaluationResult),
}

/// Runs one evaluation per session end on a worker thread.
///
/// Results are tagged with the generation they were requested in; `dismiss`
/// moves to a new generation so a late answer for a closed report is dropped.
pub struct EvaluationTask {
    adapter: Arc<EvaluationAdapter>,
    generation: u64,
    state: TaskState,
    tx: Sender<(u64, EvaluationResult)>,
    rx: Receiver<(u64, EvaluationResult)>,
}

impl EvaluationTask {
    pub fn new(adapter: EvaluationAdapter) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            adapter: Arc::new(adapter),
            generation: 0,
            state: TaskState::Idle,
            tx,
            rx,
        }
    }

    pub fn adapter(&self) -> &EvaluationAdapter {
        &self.adapter
    }

    /// Start evaluating `stats`. Returns false, without starting anything, when
    /// an evaluation is already pending or resolved for this report, or when
    /// the session has not ended.
    pub fn request(&mut self, stats: SessionStatistics) -> bool {
        if !matches!(self.state, TaskState::Idle) || !stats.has_ended() {
            return false;
        }
        self.state = TaskState::Pending;

        let adapter = Arc::clone(&self.adapter);
        let tx = self.tx.clone();
        let generation = self.generation;
        std::thread::spawn(move || {
            let result = adapter.evaluate(&stats);
            let _ = tx.send((generation, result));
        });
        true
    }

    /// Collect a finished evaluation, if any, and report the current state
    pub fn poll(&mut self) -> EvaluationStatus<'_> {
        loop {
            match self.rx.try_recv() {
                Ok((generation, result)) => {
                    if generation == self.generation && matches!(self.state, TaskState::Pending)
                    {
                        self.state = TaskState::Ready(result);
                    } else {
                        debug!(generation, "discarding stale evaluation");
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.status()
    }

    pub fn status(&self) -> EvaluationStatus<'_> {
        match &self.state {
            TaskState::Idle => EvaluationStatus::Idle,
            TaskState::Pending => EvaluationStatus::Pending,
            TaskState::Ready(result) => EvaluationStatus::Ready(result),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, TaskState::Pending)
    }

    /// Close the report. Anything still in flight is ignored when it lands.
    pub fn dismiss(&mut self) {
        self.generation += 1;
        self.state = TaskState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::stats::SessionTracker;
    use std::sync::Mutex;
    use std::time::Instant;

    fn session(completed: u32, failed: u32, secs: u64) -> SessionStatistics {
        let clock = ManualClock::default();
        let mut tracker = SessionTracker::new();
        tracker.start(clock.now());
        for _ in 0..completed {
            tracker.record_completion();
        }
        for _ in 0..failed {
            tracker.record_failure();
        }
        clock.advance_ms(secs * 1000);
        tracker.stop(clock.now())
    }

    struct FailingEvaluator;

    impl Evaluator for FailingEvaluator {
        fn evaluate(&self, _stats: &SessionStatistics) -> Result<EvaluationResult, EvalError> {
            Err(EvalError::EmptyResponse)
        }
    }

    struct FixedEvaluator(EvaluationResult);

    impl Evaluator for FixedEvaluator {
        fn evaluate(&self, _stats: &SessionStatistics) -> Result<EvaluationResult, EvalError> {
            Ok(self.0.clone())
        }
    }

    /// Blocks each call until the test hands it a result
    struct GatedEvaluator(Mutex<Receiver<EvaluationResult>>);

    impl Evaluator for GatedEvaluator {
        fn evaluate(&self, _stats: &SessionStatistics) -> Result<EvaluationResult, EvalError> {
            let rx = self.0.lock().unwrap();
            rx.recv().map_err(|_| EvalError::EmptyResponse)
        }
    }

    fn remote_result(title: &str) -> EvaluationResult {
        EvaluationResult {
            grade: Grade::A,
            title: title.to_string(),
            comment: "For Super Earth!".to_string(),
            is_offline: false,
        }
    }

    fn wait_ready(task: &mut EvaluationTask) -> EvaluationResult {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let EvaluationStatus::Ready(result) = task.poll() {
                return result.clone();
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("evaluation did not resolve");
    }

    #[test]
    fn sixty_per_minute_without_fails_is_s() {
        let input = EvaluationInput::from_stats(&session(60, 0, 60));
        assert_eq!(input.throughput_per_minute, 60.0);
        assert_eq!(local_grade(input.throughput_per_minute, input.failed), Grade::S);
    }

    #[test]
    fn twenty_per_minute_with_four_fails_is_c() {
        let input = EvaluationInput::from_stats(&session(20, 4, 60));
        assert_eq!(input.throughput_per_minute, 20.0);
        assert_eq!(local_grade(input.throughput_per_minute, input.failed), Grade::C);
    }

    #[test]
    fn more_than_five_fails_is_always_f() {
        for t in [0.0, 10.0, 36.0, 51.0, 500.0] {
            assert_eq!(local_grade(t, 6), Grade::F);
        }
        assert_eq!(local_grade(51.0, 5), Grade::C);
    }

    #[test]
    fn threshold_edges() {
        assert_eq!(local_grade(51.0, 0), Grade::S);
        assert_eq!(local_grade(50.0, 0), Grade::A);
        assert_eq!(local_grade(51.0, 1), Grade::A);
        assert_eq!(local_grade(36.0, 2), Grade::A);
        assert_eq!(local_grade(36.0, 3), Grade::C);
        assert_eq!(local_grade(35.0, 0), Grade::C);
        assert_eq!(local_grade(11.0, 0), Grade::C);
        assert_eq!(local_grade(10.0, 0), Grade::D);
        assert_eq!(local_grade(0.0, 0), Grade::D);
    }

    #[test]
    fn local_grade_is_deterministic() {
        let local = LocalEvaluator::new();
        let stats = session(40, 1, 60);
        let first = local.evaluate(&stats).unwrap();
        for _ in 0..10 {
            assert_eq!(local.evaluate(&stats).unwrap(), first);
        }
        assert_eq!(first.grade, Grade::A);
        assert!(first.is_offline);
    }

    #[test]
    fn zero_length_session_grades_d() {
        let stats = session(3, 0, 0);
        let input = EvaluationInput::from_stats(&stats);
        assert_eq!(input.throughput_per_minute, 0.0);
        assert_eq!(LocalEvaluator::new().assess(&input).grade, Grade::D);
    }

    #[test]
    fn grade_parse_accepts_case_and_whitespace() {
        assert_eq!(Grade::parse(" s "), Some(Grade::S));
        assert_eq!(Grade::parse("F"), Some(Grade::F));
        assert_eq!(Grade::parse("S+"), None);
        assert_eq!(Grade::parse(""), None);
    }

    #[test]
    fn placeholder_and_missing_keys_are_unusable() {
        assert!(!usable_api_key(None));
        assert!(!usable_api_key(Some("")));
        assert!(!usable_api_key(Some("  ")));
        assert!(!usable_api_key(Some("YOUR_API_KEY_HERE")));
        assert!(usable_api_key(Some("abc123")));
    }

    #[test]
    fn strip_code_fences_variants() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {} "), "{}");
    }

    #[test]
    fn parse_response_reads_first_candidate() {
        let response = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{
                    "text": "```json\n{\"grade\":\"b\",\"title\":\"Shield of Democracy\",\"comment\":\"Adequate.\"}\n```"
                }]}
            }]
        });
        let result = parse_response(&response).unwrap();
        assert_eq!(result.grade, Grade::B);
        assert_eq!(result.title, "Shield of Democracy");
        assert_eq!(result.comment, "Adequate.");
        assert!(!result.is_offline);
    }

    #[test]
    fn parse_response_failures() {
        let empty = serde_json::json!({ "candidates": [] });
        assert!(matches!(
            parse_response(&empty),
            Err(EvalError::EmptyResponse)
        ));

        let missing_field = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"grade\":\"S\",\"title\":\"x\"}" }]}}]
        });
        assert!(matches!(
            parse_response(&missing_field),
            Err(EvalError::InvalidJson(_))
        ));

        let bad_grade = serde_json::json!({
            "candidates": [{ "content": { "parts": [{
                "text": "{\"grade\":\"Z\",\"title\":\"x\",\"comment\":\"y\"}"
            }]}}]
        });
        assert!(matches!(
            parse_response(&bad_grade),
            Err(EvalError::InvalidGrade(g)) if g == "Z"
        ));
    }

    #[test]
    fn prompt_carries_session_figures() {
        let input = EvaluationInput::from_stats(&session(30, 2, 60));
        let prompt = build_prompt(&input);
        assert!(prompt.contains("60.0 seconds"));
        assert!(prompt.contains("Codes completed: 30"));
        assert!(prompt.contains("Input mistakes: 2"));
        assert!(prompt.contains("Throughput (codes per minute): 30"));
        assert!(prompt.contains(SCORING_THRESHOLDS));

        let body = request_body(&prompt);
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            serde_json::json!(["grade", "title", "comment"])
        );
    }

    #[test]
    fn adapter_falls_back_on_remote_error() {
        let adapter =
            EvaluationAdapter::with_remote(Box::new(FailingEvaluator), LocalEvaluator::new());
        assert!(adapter.is_remote());
        let result = adapter.evaluate(&session(60, 0, 60));
        assert!(result.is_offline);
        assert_eq!(result.grade, Grade::S);
    }

    #[test]
    fn adapter_prefers_remote_result() {
        let adapter = EvaluationAdapter::with_remote(
            Box::new(FixedEvaluator(remote_result("Light Speed Fingers"))),
            LocalEvaluator::new(),
        );
        let result = adapter.evaluate(&session(1, 0, 60));
        assert!(!result.is_offline);
        assert_eq!(result.title, "Light Speed Fingers");
    }

    #[test]
    fn unreachable_backend_falls_back() {
        let config = EvaluatorConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..EvaluatorConfig::default()
        };
        let remote = RemoteEvaluator::new(&config, "test-key".to_string()).unwrap();
        let adapter = EvaluationAdapter::with_remote(Box::new(remote), LocalEvaluator::new());

        let result = adapter.evaluate(&session(20, 6, 60));
        assert!(result.is_offline);
        assert_eq!(result.grade, Grade::F);
    }

    #[test]
    fn missing_key_env_selects_offline() {
        let config = EvaluatorConfig {
            api_key_env: "STRATAGEM_HERO_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..EvaluatorConfig::default()
        };
        let adapter = EvaluationAdapter::from_config(&config, LocalEvaluator::new());
        assert!(!adapter.is_remote());
    }

    #[test]
    fn task_runs_once_per_session_end() {
        let mut task = EvaluationTask::new(EvaluationAdapter::offline(LocalEvaluator::new()));
        assert_eq!(task.poll(), EvaluationStatus::Idle);

        let stats = session(60, 0, 60);
        assert!(task.request(stats));
        assert!(!task.request(stats), "second request while pending");

        let result = wait_ready(&mut task);
        assert_eq!(result.grade, Grade::S);
        assert!(!task.request(stats), "already resolved");

        task.dismiss();
        assert_eq!(task.poll(), EvaluationStatus::Idle);
        assert!(task.request(stats));
        assert_eq!(wait_ready(&mut task).grade, Grade::S);
    }

    #[test]
    fn task_ignores_running_session() {
        let clock = ManualClock::default();
        let mut tracker = SessionTracker::new();
        tracker.start(clock.now());

        let mut task = EvaluationTask::new(EvaluationAdapter::offline(LocalEvaluator::new()));
        assert!(!task.request(tracker.snapshot()));
        assert!(!task.is_pending());
    }

    #[test]
    fn late_result_after_dismiss_is_discarded() {
        let (gate_tx, gate_rx) = mpsc::channel();
        let adapter = EvaluationAdapter::with_remote(
            Box::new(GatedEvaluator(Mutex::new(gate_rx))),
            LocalEvaluator::new(),
        );
        let mut task = EvaluationTask::new(adapter);
        let stats = session(10, 0, 60);

        assert!(task.request(stats));
        assert_eq!(task.poll(), EvaluationStatus::Pending);
        task.dismiss();

        gate_tx.send(remote_result("stale")).unwrap();
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(task.poll(), EvaluationStatus::Idle);

        assert!(task.request(stats));
        gate_tx.send(remote_result("fresh")).unwrap();
        assert_eq!(wait_ready(&mut task).title, "fresh");
    }
}
