//! LLM classifier seam and the three-tier fallback chain: fast router
//! -> LLM classifier -> keyword fallback -> hardcoded unknown. Grounded
//! on `conductor.py`'s `_classify_intent`/`_fallback_classification`
//! and SPEC_FULL.md §4.8.

use std::sync::Arc;

use async_trait::async_trait;

use orc_domain::{ClassifiedIntent, Error};
use orc_resilience::{CircuitBreaker, RetryConfig};

use crate::fast::FastIntentRouter;
use crate::keyword_fallback::classify_by_keyword;

#[derive(Debug, Clone, Default)]
pub struct ClassifierHints {
    pub sender_id: Option<String>,
    pub recent_summary: Option<String>,
}

/// Seam for an LLM-backed intent classifier. Implementations call out
/// to whatever provider is configured; this crate has no opinion on
/// which one.
#[async_trait]
pub trait LlmIntentClassifier: Send + Sync {
    async fn classify(&self, message: &str, hints: &ClassifierHints) -> Result<ClassifiedIntent, Error>;
}

/// Orchestrates the fast router plus the optional LLM/keyword fallback
/// tiers. Holding the LLM classifier as `Option` means a deployment
/// with no provider configured still works end to end on the fast
/// router and keyword tier alone.
pub struct IntentClassificationPipeline {
    fast_router: FastIntentRouter,
    llm_classifier: Option<Arc<dyn LlmIntentClassifier>>,
    circuit: Option<Arc<CircuitBreaker>>,
    retry_config: RetryConfig,
}

impl IntentClassificationPipeline {
    pub fn new(llm_fallback_threshold: f64) -> Self {
        Self {
            fast_router: FastIntentRouter::new(llm_fallback_threshold),
            llm_classifier: None,
            circuit: None,
            retry_config: RetryConfig::default(),
        }
    }

    pub fn with_llm_classifier(
        mut self,
        classifier: Arc<dyn LlmIntentClassifier>,
        circuit: Arc<CircuitBreaker>,
    ) -> Self {
        self.llm_classifier = Some(classifier);
        self.circuit = Some(circuit);
        self
    }

    pub async fn classify(&self, message: &str, hints: &ClassifierHints) -> ClassifiedIntent {
        let fast_result = self.fast_router.classify(message);
        if !fast_result.needs_llm_fallback {
            return fast_result;
        }

        let Some(classifier) = &self.llm_classifier else {
            return classify_by_keyword(message);
        };

        let outcome = orc_resilience::with_retry(
            || classifier.classify(message, hints),
            Some("llm_classifier"),
            self.circuit.as_ref(),
            &self.retry_config,
        )
        .await;

        match outcome {
            Ok(intent) => intent,
            Err(err) => {
                tracing::warn!(%err, "llm classifier unreachable, falling back to keyword tier");
                classify_by_keyword(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_domain::{CapabilityCategory, IntentType};

    struct AlwaysFailsClassifier;

    #[async_trait]
    impl LlmIntentClassifier for AlwaysFailsClassifier {
        async fn classify(&self, _message: &str, _hints: &ClassifierHints) -> Result<ClassifiedIntent, Error> {
            Err(Error::RetryableTransport {
                service: "llm".into(),
                message: "timeout".into(),
            })
        }
    }

    struct EchoClassifier;

    #[async_trait]
    impl LlmIntentClassifier for EchoClassifier {
        async fn classify(&self, _message: &str, _hints: &ClassifierHints) -> Result<ClassifiedIntent, Error> {
            Ok(ClassifiedIntent {
                category: CapabilityCategory::Information,
                intent_type: IntentType::Research,
                confidence: 0.95,
                entities: serde_json::Map::new(),
                requires_coordination: false,
                target_agents: Vec::new(),
                needs_llm_fallback: false,
            })
        }
    }

    #[tokio::test]
    async fn high_confidence_fast_match_skips_llm() {
        let pipeline = IntentClassificationPipeline::new(0.6);
        let intent = pipeline.classify("what's the weather today", &ClassifierHints::default()).await;
        assert_eq!(intent.intent_type, IntentType::Weather);
    }

    #[tokio::test]
    async fn llm_failure_falls_back_to_keyword_tier() {
        let circuit = Arc::new(CircuitBreaker::new("llm", 5, 60.0));
        let pipeline = IntentClassificationPipeline::new(0.6)
            .with_llm_classifier(Arc::new(AlwaysFailsClassifier), circuit);
        let config = RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        };
        let pipeline = IntentClassificationPipeline {
            retry_config: config,
            ..pipeline
        };
        let intent = pipeline.classify("zzz unmatched gibberish", &ClassifierHints::default()).await;
        assert_eq!(intent.intent_type, IntentType::Unknown);
    }

    #[tokio::test]
    async fn llm_success_is_used_when_fast_router_defers() {
        let circuit = Arc::new(CircuitBreaker::new("llm", 5, 60.0));
        let pipeline =
            IntentClassificationPipeline::new(0.6).with_llm_classifier(Arc::new(EchoClassifier), circuit);
        let intent = pipeline.classify("zzz unmatched gibberish", &ClassifierHints::default()).await;
        assert_eq!(intent.intent_type, IntentType::Research);
        assert_eq!(intent.confidence, 0.95);
    }
}
