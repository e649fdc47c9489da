use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use super::merge_prompt;
use crate::config::{AnswerConfig, MergerChoice};
use crate::error::{AskError, BackendError, BackendResult};
use crate::providers::{Answer, BackendClient, GeminiClient, LlamaClient};

/// Timing and naming for one synthesizer instance
#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    /// Shared deadline for the two parallel backend calls
    pub backend_timeout: Duration,
    /// Deadline for the merge call
    pub merge_timeout: Duration,
    /// Voice the merged answer is written in
    pub assistant_name: String,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            backend_timeout: Duration::from_secs(30),
            merge_timeout: Duration::from_secs(30),
            assistant_name: "Firebox".to_string(),
        }
    }
}

/// Which backends produced an answer in the dispatch phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    BothOk { a: Answer, b: Answer },
    OnlyAOk(Answer),
    OnlyBOk(Answer),
    BothFailed,
}

impl DispatchOutcome {
    pub fn classify(a: BackendResult<Answer>, b: BackendResult<Answer>) -> Self {
        match (a, b) {
            (Ok(a), Ok(b)) => DispatchOutcome::BothOk { a, b },
            (Ok(a), Err(_)) => DispatchOutcome::OnlyAOk(a),
            (Err(_), Ok(b)) => DispatchOutcome::OnlyBOk(b),
            (Err(_), Err(_)) => DispatchOutcome::BothFailed,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::BothOk { .. } => "both_ok",
            DispatchOutcome::OnlyAOk(_) => "only_a_ok",
            DispatchOutcome::OnlyBOk(_) => "only_b_ok",
            DispatchOutcome::BothFailed => "both_failed",
        }
    }
}

/// Two-backend answer pipeline
///
/// Flow per request:
/// 1. Dispatch the prompt to backend A and backend B concurrently under one
///    shared deadline; a failure on one side never affects the other.
/// 2. Both answered: one merge call turns the two drafts into a single reply.
///    If the merge call fails, A's raw answer is returned.
/// 3. One answered: that raw answer is returned.
/// 4. Neither answered: `AskError::SynthesisFailure`.
///
/// Cancelling the token drops every in-flight backend future and returns
/// `AskError::Cancelled`.
pub struct AnswerSynthesizer {
    backend_a: Arc<dyn BackendClient>,
    backend_b: Arc<dyn BackendClient>,
    merger: Arc<dyn BackendClient>,
    settings: SynthesisSettings,
}

impl AnswerSynthesizer {
    /// Merge calls go to backend A
    pub fn new(
        backend_a: Arc<dyn BackendClient>,
        backend_b: Arc<dyn BackendClient>,
        settings: SynthesisSettings,
    ) -> Self {
        Self {
            merger: backend_a.clone(),
            backend_a,
            backend_b,
            settings,
        }
    }

    pub fn with_merger(mut self, merger: Arc<dyn BackendClient>) -> Self {
        self.merger = merger;
        self
    }

    /// Gemini as A, LLaMA as B, wired from configuration
    pub fn from_config(config: &AnswerConfig) -> Self {
        let http = reqwest::Client::new();
        let params = config.generation_params();

        let gemini: Arc<dyn BackendClient> = Arc::new(
            GeminiClient::with_client(
                http.clone(),
                &config.gemini_endpoint,
                &config.gemini_model,
                &config.gemini_api_key,
            )
            .with_params(params),
        );
        let llama: Arc<dyn BackendClient> = Arc::new(
            LlamaClient::with_client(http, &config.llama_endpoint, &config.llama_model)
                .with_api_key(config.llama_api_key.clone())
                .with_params(params),
        );

        let synthesizer = Self::new(gemini, llama.clone(), config.synthesis_settings());
        match config.answer_merger {
            MergerChoice::A => synthesizer,
            MergerChoice::B => synthesizer.with_merger(llama),
        }
    }

    pub async fn ask(&self, prompt: &str, cancel: &CancellationToken) -> Result<Answer, AskError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AskError::EmptyPrompt);
        }

        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("ask", %request_id);

        async {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Ask cancelled during dispatch");
                    return Err(AskError::Cancelled);
                }
                outcome = self.dispatch(prompt) => outcome,
            };

            info!("Dispatch finished: {}", outcome.label());

            match outcome {
                DispatchOutcome::BothOk { a, b } => self.merge(prompt, a, b, cancel).await,
                DispatchOutcome::OnlyAOk(a) => Ok(a),
                DispatchOutcome::OnlyBOk(b) => Ok(b),
                DispatchOutcome::BothFailed => Err(AskError::SynthesisFailure),
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch(&self, prompt: &str) -> DispatchOutcome {
        let deadline = self.settings.backend_timeout;
        let (a, b) = tokio::join!(
            call_backend(self.backend_a.as_ref(), prompt, deadline),
            call_backend(self.backend_b.as_ref(), prompt, deadline),
        );
        DispatchOutcome::classify(a, b)
    }

    async fn merge(
        &self,
        question: &str,
        a: Answer,
        b: Answer,
        cancel: &CancellationToken,
    ) -> Result<Answer, AskError> {
        let merge_prompt = merge_prompt::build(&self.settings.assistant_name, question, &a, &b);

        let merged = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Ask cancelled during merge");
                return Err(AskError::Cancelled);
            }
            merged = call_backend(self.merger.as_ref(), &merge_prompt, self.settings.merge_timeout) => merged,
        };

        match merged {
            Ok(answer) => Ok(answer),
            Err(e) => {
                warn!("Merge failed, falling back to backend A answer: {}", e);
                Ok(a)
            }
        }
    }
}

/// One backend call, bounded by `deadline` even if the client ignores it
async fn call_backend(
    client: &dyn BackendClient,
    prompt: &str,
    deadline: Duration,
) -> BackendResult<Answer> {
    let result = tokio::time::timeout(deadline, client.ask(prompt, deadline))
        .await
        .unwrap_or(Err(BackendError::Timeout(deadline)));

    match &result {
        Ok(answer) => debug!("{} answered ({} chars)", client.name(), answer.text().len()),
        Err(e) => warn!("{} failed: {}", client.name(), e),
    }
    result
}
