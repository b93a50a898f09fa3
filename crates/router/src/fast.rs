//! Fast, pattern-based intent router. Grounded on
//! `intent_router.py::IntentRouter.classify`.

use std::sync::OnceLock;

use regex::Regex;

use orc_domain::{CapabilityCategory, ClassifiedIntent, IntentType};

use crate::patterns::{
    PatternRule, COORDINATION_PATTERNS, INTENT_PATTERNS, TIME_PATTERNS_DATE, TIME_PATTERNS_TIME,
};

struct CompiledRule {
    patterns: Vec<Regex>,
    rule: &'static PatternRule,
}

struct CompiledTables {
    rules: Vec<CompiledRule>,
    coordination: Vec<Regex>,
    date: Vec<Regex>,
    time: Vec<Regex>,
}

fn compiled() -> &'static CompiledTables {
    static TABLES: OnceLock<CompiledTables> = OnceLock::new();
    TABLES.get_or_init(|| CompiledTables {
        rules: INTENT_PATTERNS
            .iter()
            .map(|rule| CompiledRule {
                patterns: rule
                    .patterns
                    .iter()
                    .map(|p| Regex::new(&format!("(?i){p}")).expect("static pattern compiles"))
                    .collect(),
                rule,
            })
            .collect(),
        coordination: COORDINATION_PATTERNS
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("static pattern compiles"))
            .collect(),
        date: TIME_PATTERNS_DATE
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("static pattern compiles"))
            .collect(),
        time: TIME_PATTERNS_TIME
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("static pattern compiles"))
            .collect(),
    })
}

/// Compiles the pattern-rule table once and classifies messages against
/// it with no LLM involvement.
pub struct FastIntentRouter {
    llm_fallback_threshold: f64,
}

impl FastIntentRouter {
    pub fn new(llm_fallback_threshold: f64) -> Self {
        let _ = compiled();
        Self {
            llm_fallback_threshold,
        }
    }

    pub fn classify(&self, message: &str) -> ClassifiedIntent {
        let tables = compiled();
        let message_lower = message.to_lowercase();

        let mut best: Option<(&'static PatternRule, f64)> = None;

        for compiled_rule in &tables.rules {
            for pattern in &compiled_rule.patterns {
                if pattern.is_match(&message_lower) {
                    if best.map(|(_, c)| compiled_rule.rule.confidence > c).unwrap_or(true) {
                        best = Some((compiled_rule.rule, compiled_rule.rule.confidence));
                    }
                    break;
                }
            }
        }

        let requires_coordination = self.check_coordination(&message_lower);

        let Some((rule, confidence)) = best.filter(|(_, c)| *c >= self.llm_fallback_threshold) else {
            let mut entities = serde_json::Map::new();
            extract_time_entities(message, &mut entities);
            return ClassifiedIntent {
                category: CapabilityCategory::System,
                intent_type: IntentType::Unknown,
                confidence: 0.3,
                entities,
                requires_coordination,
                target_agents: Vec::new(),
                needs_llm_fallback: true,
            };
        };

        let mut entities = serde_json::Map::new();
        extract_entities(message, rule.entity_extractors, &mut entities);
        extract_time_entities(message, &mut entities);

        ClassifiedIntent {
            category: rule.category,
            intent_type: rule.intent_type,
            confidence,
            entities,
            requires_coordination,
            target_agents: Vec::new(),
            needs_llm_fallback: confidence < 0.8,
        }
    }

    fn check_coordination(&self, message_lower: &str) -> bool {
        compiled().coordination.iter().any(|p| p.is_match(message_lower))
    }
}

fn extract_entities(
    message: &str,
    extractors: &[(&str, &str)],
    out: &mut serde_json::Map<String, serde_json::Value>,
) {
    for (name, pattern) in extractors {
        if let Ok(re) = Regex::new(&format!("(?i){pattern}")) {
            if let Some(caps) = re.captures(message) {
                if let Some(m) = caps.get(1) {
                    out.insert(name.to_string(), serde_json::Value::String(m.as_str().trim().to_string()));
                }
            }
        }
    }
}

fn extract_time_entities(message: &str, out: &mut serde_json::Map<String, serde_json::Value>) {
    let tables = compiled();
    for pattern in &tables.date {
        if let Some(m) = pattern.find(message) {
            out.insert("date".to_string(), serde_json::Value::String(m.as_str().trim().to_string()));
            break;
        }
    }
    for pattern in &tables.time {
        if let Some(m) = pattern.find(message) {
            out.insert("time".to_string(), serde_json::Value::String(m.as_str().trim().to_string()));
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_weather_with_high_confidence_no_fallback() {
        let router = FastIntentRouter::new(0.6);
        let intent = router.classify("what's the weather tomorrow?");
        assert_eq!(intent.intent_type, IntentType::Weather);
        assert_eq!(intent.category, CapabilityCategory::Information);
        assert!(!intent.needs_llm_fallback);
    }

    #[test]
    fn unmatched_message_falls_back_to_unknown() {
        let router = FastIntentRouter::new(0.6);
        let intent = router.classify("asdkj qwoei zzxcv");
        assert_eq!(intent.intent_type, IntentType::Unknown);
        assert_eq!(intent.confidence, 0.3);
        assert!(intent.needs_llm_fallback);
    }

    #[test]
    fn low_confidence_match_still_flags_soft_fallback() {
        let router = FastIntentRouter::new(0.6);
        let intent = router.classify("search for the nearest coffee shop");
        assert_eq!(intent.intent_type, IntentType::Search);
        assert!(intent.needs_llm_fallback);
    }

    #[test]
    fn coordination_patterns_detected() {
        let router = FastIntentRouter::new(0.6);
        let intent = router.classify("text mom and then remind me to call dad");
        assert!(intent.requires_coordination);
    }

    #[test]
    fn send_message_extracts_recipient_entity() {
        let router = FastIntentRouter::new(0.6);
        let intent = router.classify("tell sarah that I'll be late");
        assert_eq!(intent.intent_type, IntentType::SendMessage);
        assert_eq!(
            intent.entities.get("recipient").and_then(|v| v.as_str()),
            Some("sarah")
        );
    }

    #[test]
    fn time_entity_extracted_alongside_intent() {
        let router = FastIntentRouter::new(0.6);
        let intent = router.classify("remind me to call the dentist tomorrow at 3pm");
        assert_eq!(intent.intent_type, IntentType::SetReminder);
        assert!(intent.entities.contains_key("date"));
    }
}
