//! Completion gateway: adapter selection, retry, fallback, cost tracking.
//!
//! One `complete()` call validates the request, runs the primary
//! adapter through the retry policy, and on exhaustion tries the
//! alternate adapter exactly once. Cost is tracked only for successful
//! completions; every attempt outcome is logged with structured fields.

use std::sync::Arc;
use std::time::Instant;

use colloquy_types::error::{GatewayError, ProviderFailure};
use colloquy_types::llm::{
    CompletionMetadata, CompletionOptions, CompletionResult, Message, ProviderKind,
    ProviderRequest,
};

use crate::cost::CostTracker;

use super::box_provider::BoxLlmProvider;
use super::retry::RetryPolicy;

/// Per-provider request defaults, applied when the caller passes no
/// override.
#[derive(Debug, Clone)]
pub struct ProviderDefaults {
    pub model: String,
    pub temperature: Option<f64>,
    pub max_tokens: u32,
}

/// Dispatches completions across the two providers.
pub struct CompletionGateway {
    openai: BoxLlmProvider,
    anthropic: BoxLlmProvider,
    openai_defaults: ProviderDefaults,
    anthropic_defaults: ProviderDefaults,
    retry: RetryPolicy,
    cost_tracker: Option<Arc<CostTracker>>,
}

impl CompletionGateway {
    pub fn new(
        openai: BoxLlmProvider,
        openai_defaults: ProviderDefaults,
        anthropic: BoxLlmProvider,
        anthropic_defaults: ProviderDefaults,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            openai,
            anthropic,
            openai_defaults,
            anthropic_defaults,
            retry,
            cost_tracker: None,
        }
    }

    /// Enable cost tracking with the given tracker.
    pub fn with_cost_tracker(mut self, tracker: Arc<CostTracker>) -> Self {
        self.cost_tracker = Some(tracker);
        self
    }

    /// The tracker, when cost tracking is enabled.
    pub fn cost_tracker(&self) -> Option<&Arc<CostTracker>> {
        self.cost_tracker.as_ref()
    }

    /// Generate a completion, retrying transient failures and falling
    /// back to the alternate provider when the primary is exhausted.
    pub async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult, GatewayError> {
        validate(messages, options)?;

        let primary = options.provider;
        let primary_failure = match self.complete_on(primary, messages, options).await {
            Ok(result) => return Ok(result),
            Err(failure) => failure,
        };

        if !options.fallback {
            return Err(GatewayError::CompletionFailed {
                primary: primary_failure,
                fallback: None,
            });
        }

        let alternate = primary.other();
        tracing::warn!(
            primary = %primary,
            fallback = %alternate,
            error = %primary_failure.error,
            "primary provider failed, falling back"
        );

        match self.complete_on(alternate, messages, options).await {
            Ok(result) => Ok(result),
            Err(fallback_failure) => {
                tracing::error!(
                    primary = %primary,
                    fallback = %alternate,
                    primary_error = %primary_failure.error,
                    fallback_error = %fallback_failure.error,
                    "fallback provider failed"
                );
                Err(GatewayError::CompletionFailed {
                    primary: primary_failure,
                    fallback: Some(fallback_failure),
                })
            }
        }
    }

    /// Run one provider through the retry policy and build the result.
    async fn complete_on(
        &self,
        kind: ProviderKind,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<CompletionResult, ProviderFailure> {
        let (provider, defaults) = self.select(kind);
        let request = ProviderRequest {
            model: options.model.clone().unwrap_or_else(|| defaults.model.clone()),
            messages: messages.to_vec(),
            system: None,
            temperature: options.temperature.or(defaults.temperature),
            max_tokens: options.max_tokens.unwrap_or(defaults.max_tokens),
        };

        tracing::info!(
            provider = %kind,
            model = %request.model,
            message_count = messages.len(),
            "completion request started"
        );
        let start = Instant::now();

        match self.retry.run(|| provider.complete(&request)).await {
            Ok(response) => {
                let duration_ms = start.elapsed().as_millis() as u64;

                if let Some(tracker) = &self.cost_tracker {
                    tracker.track_usage(
                        &response.model,
                        response.usage.input_tokens,
                        response.usage.output_tokens,
                        kind,
                    );
                }

                tracing::info!(
                    provider = %kind,
                    model = %response.model,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    duration_ms,
                    "completion request completed"
                );

                Ok(CompletionResult {
                    content: response.content,
                    model: response.model,
                    provider: kind,
                    usage: response.usage,
                    metadata: CompletionMetadata {
                        finish_reason: response.finish_reason,
                        stop_reason: response.stop_reason,
                        duration_ms,
                    },
                })
            }
            Err(retry_err) => {
                let attempts = retry_err.attempts();
                let error = retry_err.into_inner();
                tracing::error!(
                    provider = %kind,
                    model = %request.model,
                    attempts,
                    error = %error,
                    "completion request failed"
                );
                Err(ProviderFailure {
                    provider: kind,
                    attempts,
                    error,
                })
            }
        }
    }

    fn select(&self, kind: ProviderKind) -> (&BoxLlmProvider, &ProviderDefaults) {
        match kind {
            ProviderKind::OpenAi => (&self.openai, &self.openai_defaults),
            ProviderKind::Anthropic => (&self.anthropic, &self.anthropic_defaults),
        }
    }
}

/// Reject malformed requests before any provider is contacted.
fn validate(messages: &[Message], options: &CompletionOptions) -> Result<(), GatewayError> {
    if messages.is_empty() {
        return Err(GatewayError::Validation("messages must not be empty".into()));
    }
    if let Some(temperature) = options.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(GatewayError::Validation(format!(
                "temperature must be between 0.0 and 2.0, got {temperature}"
            )));
        }
    }
    if options.max_tokens == Some(0) {
        return Err(GatewayError::Validation("max_tokens must be greater than zero".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use colloquy_types::llm::{LlmError, MessageRole, ProviderResponse, Usage};

    use crate::llm::provider::LlmProvider;

    // --- Mock providers ---

    /// Scripted provider: fails `failures` times, then succeeds (or
    /// always fails when the script says so).
    struct MockProvider {
        kind: ProviderKind,
        script: Script,
        calls: Arc<AtomicU32>,
    }

    #[derive(Clone)]
    enum Script {
        Succeed { content: String, usage: Usage },
        FailThenSucceed { failures: u32, content: String, usage: Usage },
        AlwaysTransient,
        AlwaysPermanent,
    }

    impl MockProvider {
        fn new(kind: ProviderKind, script: Script) -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            (
                Self {
                    kind,
                    script,
                    calls: Arc::clone(&calls),
                },
                calls,
            )
        }

        fn ok_response(&self, content: &str, usage: Usage) -> ProviderResponse {
            ProviderResponse {
                content: content.to_string(),
                model: format!("{}-model", self.kind),
                usage,
                finish_reason: (self.kind == ProviderKind::OpenAi).then(|| "stop".to_string()),
                stop_reason: (self.kind == ProviderKind::Anthropic)
                    .then(|| "end_turn".to_string()),
            }
        }
    }

    impl LlmProvider for MockProvider {
        fn name(&self) -> &str {
            match self.kind {
                ProviderKind::OpenAi => "openai",
                ProviderKind::Anthropic => "anthropic",
            }
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        async fn complete(
            &self,
            _request: &ProviderRequest,
        ) -> Result<ProviderResponse, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Succeed { content, usage } => Ok(self.ok_response(content, *usage)),
                Script::FailThenSucceed { failures, content, usage } => {
                    if n < *failures {
                        Err(LlmError::Timeout("deadline elapsed".into()))
                    } else {
                        Ok(self.ok_response(content, *usage))
                    }
                }
                Script::AlwaysTransient => Err(LlmError::Api {
                    status: 503,
                    message: "service unavailable".into(),
                }),
                Script::AlwaysPermanent => Err(LlmError::AuthenticationFailed),
            }
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2))
    }

    fn defaults(model: &str) -> ProviderDefaults {
        ProviderDefaults {
            model: model.to_string(),
            temperature: Some(0.7),
            max_tokens: 2000,
        }
    }

    fn gateway(
        openai_script: Script,
        anthropic_script: Script,
    ) -> (CompletionGateway, Arc<AtomicU32>, Arc<AtomicU32>) {
        let (openai, openai_calls) = MockProvider::new(ProviderKind::OpenAi, openai_script);
        let (anthropic, anthropic_calls) =
            MockProvider::new(ProviderKind::Anthropic, anthropic_script);
        let gateway = CompletionGateway::new(
            BoxLlmProvider::new(openai),
            defaults("gpt-4"),
            BoxLlmProvider::new(anthropic),
            defaults("claude-3-sonnet-20240229"),
            fast_retry(),
        );
        (gateway, openai_calls, anthropic_calls)
    }

    fn chat() -> Vec<Message> {
        vec![Message::system("You are Bot"), Message::user("Hi")]
    }

    #[tokio::test]
    async fn test_happy_path_primary_succeeds() {
        let (gateway, openai_calls, anthropic_calls) = gateway(
            Script::Succeed { content: "Hello!".into(), usage: Usage::new(10, 5) },
            Script::AlwaysTransient,
        );

        let result = gateway
            .complete(&chat(), &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(result.content, "Hello!");
        assert_eq!(result.provider, ProviderKind::OpenAi);
        assert_eq!(result.usage.total_tokens, 15);
        assert_eq!(result.metadata.finish_reason.as_deref(), Some("stop"));
        assert_eq!(openai_calls.load(Ordering::SeqCst), 1);
        assert_eq!(anthropic_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transient_failures_retried_then_succeed() {
        let (gateway, openai_calls, _) = gateway(
            Script::FailThenSucceed {
                failures: 2,
                content: "recovered".into(),
                usage: Usage::new(8, 4),
            },
            Script::AlwaysTransient,
        );
        let tracker = Arc::new(CostTracker::new(100.0));
        let gateway = gateway.with_cost_tracker(Arc::clone(&tracker));

        let result = gateway
            .complete(&chat(), &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(result.content, "recovered");
        assert_eq!(openai_calls.load(Ordering::SeqCst), 3);
        // Exactly one usage entry despite three attempts.
        assert_eq!(tracker.stats().total_requests, 1);
    }

    #[tokio::test]
    async fn test_fallback_scenario_primary_transient_three_times() {
        // messages=[system,user], primary fails transiently 3x, fallback
        // succeeds with "Hello!" and usage {10, 5}.
        let (gateway, openai_calls, anthropic_calls) = gateway(
            Script::AlwaysTransient,
            Script::Succeed { content: "Hello!".into(), usage: Usage::new(10, 5) },
        );
        let tracker = Arc::new(CostTracker::new(100.0));
        let gateway = gateway.with_cost_tracker(Arc::clone(&tracker));

        let result = gateway
            .complete(&chat(), &CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(result.content, "Hello!");
        assert_eq!(result.provider, ProviderKind::Anthropic);
        assert_eq!(result.usage.input_tokens, 10);
        assert_eq!(result.usage.output_tokens, 5);
        assert_eq!(result.usage.total_tokens, 15);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 3);
        assert_eq!(anthropic_calls.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.stats().total_requests, 1);
    }

    #[tokio::test]
    async fn test_permanent_error_one_attempt_per_provider() {
        let (gateway, openai_calls, anthropic_calls) =
            gateway(Script::AlwaysPermanent, Script::AlwaysPermanent);

        let err = gateway
            .complete(&chat(), &CompletionOptions::default())
            .await
            .unwrap_err();

        assert_eq!(openai_calls.load(Ordering::SeqCst), 1);
        assert_eq!(anthropic_calls.load(Ordering::SeqCst), 1);
        match err {
            GatewayError::CompletionFailed { primary, fallback } => {
                assert_eq!(primary.provider, ProviderKind::OpenAi);
                assert_eq!(primary.attempts, 1);
                let fallback = fallback.expect("fallback failure recorded");
                assert_eq!(fallback.provider, ProviderKind::Anthropic);
                assert_eq!(fallback.attempts, 1);
            }
            other => panic!("expected CompletionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fallback_disabled_fails_after_primary() {
        let (gateway, _, anthropic_calls) = gateway(
            Script::AlwaysTransient,
            Script::Succeed { content: "unused".into(), usage: Usage::new(1, 1) },
        );

        let options = CompletionOptions {
            fallback: false,
            ..CompletionOptions::default()
        };
        let err = gateway.complete(&chat(), &options).await.unwrap_err();

        assert_eq!(anthropic_calls.load(Ordering::SeqCst), 0);
        match err {
            GatewayError::CompletionFailed { primary, fallback } => {
                assert_eq!(primary.attempts, 3);
                assert!(fallback.is_none());
            }
            other => panic!("expected CompletionFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_cost_tracked_on_failure() {
        let (gateway, _, _) = gateway(Script::AlwaysTransient, Script::AlwaysTransient);
        let tracker = Arc::new(CostTracker::new(100.0));
        let gateway = gateway.with_cost_tracker(Arc::clone(&tracker));

        let _ = gateway.complete(&chat(), &CompletionOptions::default()).await;

        assert_eq!(tracker.stats().total_requests, 0);
        assert!(tracker.total_cost().abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_anthropic_as_primary_falls_back_to_openai() {
        let (gateway, openai_calls, anthropic_calls) = gateway(
            Script::Succeed { content: "from openai".into(), usage: Usage::new(3, 2) },
            Script::AlwaysTransient,
        );

        let options = CompletionOptions {
            provider: ProviderKind::Anthropic,
            ..CompletionOptions::default()
        };
        let result = gateway.complete(&chat(), &options).await.unwrap();

        assert_eq!(result.provider, ProviderKind::OpenAi);
        assert_eq!(anthropic_calls.load(Ordering::SeqCst), 3);
        assert_eq!(openai_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_model_override_reaches_result() {
        struct EchoModel;
        impl LlmProvider for EchoModel {
            fn name(&self) -> &str {
                "openai"
            }
            fn kind(&self) -> ProviderKind {
                ProviderKind::OpenAi
            }
            async fn complete(
                &self,
                request: &ProviderRequest,
            ) -> Result<ProviderResponse, LlmError> {
                Ok(ProviderResponse {
                    content: "ok".into(),
                    model: request.model.clone(),
                    usage: Usage::new(1, 1),
                    finish_reason: Some("stop".into()),
                    stop_reason: None,
                })
            }
        }

        let (anthropic, _) = MockProvider::new(ProviderKind::Anthropic, Script::AlwaysTransient);
        let gateway = CompletionGateway::new(
            BoxLlmProvider::new(EchoModel),
            defaults("gpt-4"),
            BoxLlmProvider::new(anthropic),
            defaults("claude-3-sonnet-20240229"),
            fast_retry(),
        );

        let options = CompletionOptions {
            model: Some("gpt-4-turbo".into()),
            ..CompletionOptions::default()
        };
        let result = gateway.complete(&chat(), &options).await.unwrap();
        assert_eq!(result.model, "gpt-4-turbo");
    }

    #[tokio::test]
    async fn test_validation_empty_messages() {
        let (gateway, openai_calls, _) = gateway(
            Script::Succeed { content: "unused".into(), usage: Usage::default() },
            Script::AlwaysTransient,
        );

        let err = gateway
            .complete(&[], &CompletionOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(openai_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validation_temperature_range() {
        let (gateway, _, _) = gateway(
            Script::Succeed { content: "unused".into(), usage: Usage::default() },
            Script::AlwaysTransient,
        );

        for temperature in [-0.1, 2.5] {
            let options = CompletionOptions {
                temperature: Some(temperature),
                ..CompletionOptions::default()
            };
            let err = gateway.complete(&chat(), &options).await.unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)), "temp {temperature}");
        }
    }

    #[tokio::test]
    async fn test_validation_zero_max_tokens() {
        let (gateway, _, _) = gateway(
            Script::Succeed { content: "unused".into(), usage: Usage::default() },
            Script::AlwaysTransient,
        );

        let options = CompletionOptions {
            max_tokens: Some(0),
            ..CompletionOptions::default()
        };
        let err = gateway.complete(&chat(), &options).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[test]
    fn test_validation_accepts_boundary_temperatures() {
        let messages = vec![Message::new(MessageRole::User, "hi")];
        for temperature in [0.0, 2.0] {
            let options = CompletionOptions {
                temperature: Some(temperature),
                ..CompletionOptions::default()
            };
            assert!(validate(&messages, &options).is_ok(), "temp {temperature}");
        }
    }
}
