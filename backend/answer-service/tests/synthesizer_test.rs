//! Answer Synthesizer Policy Tests
//!
//! Backends are scripted in-process so each dispatch outcome can be forced:
//! 1. Both answer -> merged reply, drafts in fixed A/B order
//! 2. One answers -> that raw answer
//! 3. Neither answers -> SynthesisFailure
//! 4. Merge fails -> A's raw answer
//! 5. Cancellation drops in-flight calls and returns promptly
//!
//! Run: cargo test -p answer-service --test synthesizer_test

use answer_service::{
    Answer, AnswerSynthesizer, AskError, BackendClient, BackendError, BackendResult,
    CancellationToken, SynthesisSettings,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone)]
enum Script {
    Reply(&'static str),
    Fail(BackendError),
    Hang,
}

/// Counts live calls; decremented when the call future is dropped or finishes
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct ScriptedBackend {
    name: &'static str,
    script: Script,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
    in_flight: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    fn new(name: &'static str, script: Script) -> Arc<Self> {
        Self::delayed(name, script, Duration::ZERO)
    }

    fn delayed(name: &'static str, script: Script, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            name,
            script,
            delay,
            prompts: Mutex::new(Vec::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl BackendClient for ScriptedBackend {
    async fn ask(&self, prompt: &str, _timeout: Duration) -> BackendResult<Answer> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let _guard = InFlight::enter(&self.in_flight);

        tokio::time::sleep(self.delay).await;
        match &self.script {
            Script::Reply(text) => Ok(Answer::new(*text)),
            Script::Fail(err) => Err(err.clone()),
            Script::Hang => std::future::pending().await,
        }
    }

    fn name(&self) -> &str {
        self.name
    }
}

fn settings() -> SynthesisSettings {
    SynthesisSettings {
        backend_timeout: Duration::from_millis(200),
        merge_timeout: Duration::from_millis(200),
        assistant_name: "Firebox".to_string(),
    }
}

fn synthesizer(
    a: &Arc<ScriptedBackend>,
    b: &Arc<ScriptedBackend>,
    merger: &Arc<ScriptedBackend>,
) -> AnswerSynthesizer {
    AnswerSynthesizer::new(a.clone(), b.clone(), settings()).with_merger(merger.clone())
}

fn timeout_error() -> BackendError {
    BackendError::Timeout(Duration::from_millis(200))
}

// ==================== Dispatch Outcomes ====================

#[tokio::test]
async fn test_both_ok_returns_merged_answer() {
    let a = ScriptedBackend::new("a", Script::Reply("Rust is a systems language."));
    let b = ScriptedBackend::new("b", Script::Reply("Rust guarantees memory safety."));
    let merger = ScriptedBackend::new("merger", Script::Reply("Rust is a safe systems language."));

    let answer = synthesizer(&a, &b, &merger)
        .ask("What is Rust?", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.text(), "Rust is a safe systems language.");
    assert_eq!(merger.calls(), 1);

    let merge_prompt = merger.last_prompt();
    assert!(merge_prompt.contains("Response A: Rust is a systems language."));
    assert!(merge_prompt.contains("Response B: Rust guarantees memory safety."));
    assert!(merge_prompt.contains("What is Rust?"));
}

#[tokio::test]
async fn test_default_merger_is_backend_a() {
    let a = ScriptedBackend::new("a", Script::Reply("draft"));
    let b = ScriptedBackend::new("b", Script::Reply("other draft"));

    let synthesizer = AnswerSynthesizer::new(a.clone(), b.clone(), settings());
    synthesizer
        .ask("question", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(a.calls(), 2);
    assert_eq!(b.calls(), 1);
}

#[tokio::test]
async fn test_a_timeout_returns_b_raw_answer() {
    let a = ScriptedBackend::new("a", Script::Fail(timeout_error()));
    let b = ScriptedBackend::new("b", Script::Reply("from b"));
    let merger = ScriptedBackend::new("merger", Script::Reply("merged"));

    let answer = synthesizer(&a, &b, &merger)
        .ask("question", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.text(), "from b");
    assert_eq!(merger.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_backend_hits_shared_deadline() {
    let a = ScriptedBackend::delayed("a", Script::Reply("too late"), Duration::from_secs(5));
    let b = ScriptedBackend::new("b", Script::Reply("from b"));
    let merger = ScriptedBackend::new("merger", Script::Reply("merged"));

    let started = Instant::now();
    let answer = synthesizer(&a, &b, &merger)
        .ask("question", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.text(), "from b");
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(a.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_b_failure_returns_a_raw_answer() {
    let a = ScriptedBackend::new("a", Script::Reply("from a"));
    let b = ScriptedBackend::new(
        "b",
        Script::Fail(BackendError::NonSuccess {
            status: 503,
            body: "overloaded".to_string(),
        }),
    );
    let merger = ScriptedBackend::new("merger", Script::Reply("merged"));

    let answer = synthesizer(&a, &b, &merger)
        .ask("question", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.text(), "from a");
    assert_eq!(merger.calls(), 0);
}

#[tokio::test]
async fn test_both_failed_is_synthesis_failure() {
    let a = ScriptedBackend::new("a", Script::Fail(timeout_error()));
    let b = ScriptedBackend::new(
        "b",
        Script::Fail(BackendError::MalformedResponse("partial text".to_string())),
    );
    let merger = ScriptedBackend::new("merger", Script::Reply("merged"));

    let err = synthesizer(&a, &b, &merger)
        .ask("question", &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err, AskError::SynthesisFailure);
    assert!(!err.to_string().contains("partial text"));
    assert_eq!(merger.calls(), 0);
}

#[tokio::test]
async fn test_merge_failure_falls_back_to_a() {
    let a = ScriptedBackend::new("a", Script::Reply("from a"));
    let b = ScriptedBackend::new("b", Script::Reply("from b"));
    let merger = ScriptedBackend::new(
        "merger",
        Script::Fail(BackendError::Transport("connection reset".to_string())),
    );

    let answer = synthesizer(&a, &b, &merger)
        .ask("question", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(answer.text(), "from a");
    assert_eq!(merger.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_merge_order_ignores_response_order() {
    // B answers well before A
    let a = ScriptedBackend::delayed("a", Script::Reply("slow a"), Duration::from_millis(150));
    let b = ScriptedBackend::new("b", Script::Reply("fast b"));
    let merger = ScriptedBackend::new("merger", Script::Reply("merged"));

    synthesizer(&a, &b, &merger)
        .ask("question", &CancellationToken::new())
        .await
        .unwrap();

    let prompt = merger.last_prompt();
    let pos_a = prompt.find("Response A: slow a").unwrap();
    let pos_b = prompt.find("Response B: fast b").unwrap();
    assert!(pos_a < pos_b);
}

#[tokio::test(start_paused = true)]
async fn test_backends_run_in_parallel() {
    let a = ScriptedBackend::delayed("a", Script::Reply("a"), Duration::from_millis(150));
    let b = ScriptedBackend::delayed("b", Script::Reply("b"), Duration::from_millis(150));
    let merger = ScriptedBackend::new("merger", Script::Reply("merged"));

    let started = Instant::now();
    synthesizer(&a, &b, &merger)
        .ask("question", &CancellationToken::new())
        .await
        .unwrap();

    // Sequential calls would need 300ms, past the 200ms shared deadline
    assert!(started.elapsed() < Duration::from_millis(200));
}

// ==================== Input & Cancellation ====================

#[tokio::test]
async fn test_blank_prompt_rejected_before_dispatch() {
    let a = ScriptedBackend::new("a", Script::Reply("a"));
    let b = ScriptedBackend::new("b", Script::Reply("b"));
    let merger = ScriptedBackend::new("merger", Script::Reply("merged"));

    let err = synthesizer(&a, &b, &merger)
        .ask("   ", &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err, AskError::EmptyPrompt);
    assert_eq!(a.calls() + b.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_dispatch() {
    let a = ScriptedBackend::new("a", Script::Hang);
    let b = ScriptedBackend::new("b", Script::Hang);
    let merger = ScriptedBackend::new("merger", Script::Reply("merged"));
    let synthesizer = AnswerSynthesizer::new(
        a.clone(),
        b.clone(),
        SynthesisSettings {
            backend_timeout: Duration::from_secs(60),
            ..settings()
        },
    )
    .with_merger(merger.clone());

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = synthesizer.ask("question", &token).await.unwrap_err();

    assert_eq!(err, AskError::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(1));
    // Outstanding calls were dropped, not leaked
    assert_eq!(a.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(b.in_flight.load(Ordering::SeqCst), 0);
    assert_eq!(merger.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_merge() {
    let a = ScriptedBackend::new("a", Script::Reply("a"));
    let b = ScriptedBackend::new("b", Script::Reply("b"));
    let merger = ScriptedBackend::new("merger", Script::Hang);
    let synthesizer = AnswerSynthesizer::new(
        a.clone(),
        b.clone(),
        SynthesisSettings {
            merge_timeout: Duration::from_secs(60),
            ..settings()
        },
    )
    .with_merger(merger.clone());

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = synthesizer.ask("question", &token).await.unwrap_err();
    assert_eq!(err, AskError::Cancelled);
    assert_eq!(merger.in_flight.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_already_cancelled_token() {
    let a = ScriptedBackend::new("a", Script::Reply("a"));
    let b = ScriptedBackend::new("b", Script::Reply("b"));
    let merger = ScriptedBackend::new("merger", Script::Reply("merged"));

    let token = CancellationToken::new();
    token.cancel();

    let err = synthesizer(&a, &b, &merger)
        .ask("question", &token)
        .await
        .unwrap_err();
    assert_eq!(err, AskError::Cancelled);
}
