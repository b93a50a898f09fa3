pub mod classifier;
pub mod fast;
pub mod keyword_fallback;
pub mod patterns;

pub use classifier::{ClassifierHints, IntentClassificationPipeline, LlmIntentClassifier};
pub use fast::FastIntentRouter;
pub use keyword_fallback::classify_by_keyword;
