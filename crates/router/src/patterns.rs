//! Pattern rule table for the fast intent router. Grounded verbatim on
//! `intent_router.py`'s `INTENT_PATTERNS`, `COORDINATION_PATTERNS` and
//! `TIME_PATTERNS`, minus the `prediction`/`omi` rules that fall outside
//! the closed category and intent sets this runtime carries.

use orc_domain::{CapabilityCategory, IntentType};

pub struct PatternRule {
    pub patterns: &'static [&'static str],
    pub category: CapabilityCategory,
    pub intent_type: IntentType,
    pub confidence: f64,
    pub requires_memory: bool,
    pub entity_extractors: &'static [(&'static str, &'static str)],
}

macro_rules! rule {
    ($patterns:expr, $category:expr, $intent:expr, $confidence:expr) => {
        PatternRule {
            patterns: $patterns,
            category: $category,
            intent_type: $intent,
            confidence: $confidence,
            requires_memory: false,
            entity_extractors: &[],
        }
    };
    ($patterns:expr, $category:expr, $intent:expr, $confidence:expr, memory) => {
        PatternRule {
            patterns: $patterns,
            category: $category,
            intent_type: $intent,
            confidence: $confidence,
            requires_memory: true,
            entity_extractors: &[],
        }
    };
    ($patterns:expr, $category:expr, $intent:expr, $confidence:expr, entities = $entities:expr) => {
        PatternRule {
            patterns: $patterns,
            category: $category,
            intent_type: $intent,
            confidence: $confidence,
            requires_memory: false,
            entity_extractors: $entities,
        }
    };
}

pub static INTENT_PATTERNS: &[PatternRule] = &[
    rule!(
        &[
            r"\b(text|sms|message|send)\b.*(to|for)\s+(\w+)",
            r"\btell\s+(\w+)\s+that\b",
            r"\blet\s+(\w+)\s+know\b",
            r"\bsend\s+(\w+)\s+(a\s+)?(message|text)\b",
        ],
        CapabilityCategory::Communication,
        IntentType::SendMessage,
        0.9,
        entities = &[("recipient", r"(?:to|tell|let)\s+(\w+)")]
    ),
    rule!(
        &[r"\bcheck[\s-]?in\b", r"\bhow\s+is\s+(\w+)\b(?!.*weather)"],
        CapabilityCategory::Communication,
        IntentType::CheckIn,
        0.85
    ),
    rule!(
        &[r"\b(configure|setup|set\s+up)\s+check[\s-]?in\b"],
        CapabilityCategory::Communication,
        IntentType::ConfigureCheckin,
        0.9
    ),
    rule!(
        &[
            r"\b(find|look\s*up|get|what('?s|\s+is))\s+\w+('?s)?\s+(phone|number|contact|email)\b",
            r"\bcontact\s+(info|information)\s+(for|of)\b",
        ],
        CapabilityCategory::Communication,
        IntentType::ContactLookup,
        0.85
    ),
    rule!(
        &[
            r"\b(what('?s|\s+is)|show|check|look\s+at)\s+(my\s+)?(calendar|schedule|agenda)\b",
            r"\bwhat\s+(do\s+i\s+have|am\s+i\s+doing)\s+(today|tomorrow|this\s+week)\b",
            r"\b(any|do\s+i\s+have)\s+(meetings?|appointments?|events?)\b",
        ],
        CapabilityCategory::Scheduling,
        IntentType::CalendarQuery,
        0.9
    ),
    rule!(
        &[
            r"\b(schedule|create|add|book|set\s+up)\s+(a\s+)?(meeting|appointment|event|call)\b",
            r"\bput\s+(a\s+)?(\w+)\s+on\s+(my\s+)?calendar\b",
        ],
        CapabilityCategory::Scheduling,
        IntentType::CreateEvent,
        0.9,
        entities = &[("event_title", r"(?:meeting|appointment|event|call)\s+(?:with\s+)?(\w+)")]
    ),
    rule!(
        &[r"\b(move|reschedule|change|update)\s+(the\s+)?(meeting|appointment|event)\b"],
        CapabilityCategory::Scheduling,
        IntentType::UpdateEvent,
        0.85
    ),
    rule!(
        &[r"\b(cancel|delete|remove)\s+(the\s+)?(meeting|appointment|event)\b"],
        CapabilityCategory::Scheduling,
        IntentType::DeleteEvent,
        0.85
    ),
    rule!(
        &[
            r"\bremind\s+me\b",
            r"\bset\s+(a\s+)?reminder\b",
            r"\bdon'?t\s+let\s+me\s+forget\b",
        ],
        CapabilityCategory::Scheduling,
        IntentType::SetReminder,
        0.9,
        entities = &[(
            "reminder_text",
            r"remind\s+me\s+(?:to\s+)?(.+?)(?:\s+(?:at|in|on|tomorrow|today)|$)"
        )]
    ),
    rule!(
        &[r"\b(cancel|delete|remove)\s+(the\s+)?reminder\b"],
        CapabilityCategory::Scheduling,
        IntentType::CancelReminder,
        0.85
    ),
    rule!(
        &[
            r"\b(add|create|new)\s+(a\s+)?task\b",
            r"\bi\s+need\s+to\b(?!.*buy|.*grocery)",
            r"\badd\s+to\s+(my\s+)?(to-?do|task)\s*list\b",
        ],
        CapabilityCategory::TaskManagement,
        IntentType::AddTask,
        0.85,
        entities = &[("task_name", r"(?:add|create)\s+(?:a\s+)?task\s*:?\s*(.+)")]
    ),
    rule!(
        &[r"\b(update|change|edit|modify)\s+(the\s+)?task\b"],
        CapabilityCategory::TaskManagement,
        IntentType::UpdateTask,
        0.85
    ),
    rule!(
        &[
            r"\b(complete|finish|done|mark\s+as\s+done|check\s+off)\s+(the\s+)?task\b",
            r"\bi\s+(finished|completed|did)\s+",
        ],
        CapabilityCategory::TaskManagement,
        IntentType::CompleteTask,
        0.85
    ),
    rule!(
        &[r"\b(delete|remove)\s+(the\s+)?task\b"],
        CapabilityCategory::TaskManagement,
        IntentType::DeleteTask,
        0.85
    ),
    rule!(
        &[
            r"\b(show|what('?s|\s+are)|list|view)\s+(my\s+)?(tasks?|to-?dos?)\b",
            r"\bwhat\s+(do\s+i\s+have|should\s+i)\s+to\s+do\b",
        ],
        CapabilityCategory::TaskManagement,
        IntentType::ViewTasks,
        0.9
    ),
    rule!(
        &[
            r"\b(search|look\s*up|find|google)\s+(for\s+)?",
            r"\bwhat\s+is\s+(a|an|the)\s+\w+\b",
            r"\bwho\s+is\b",
            r"\bwhere\s+is\b",
            r"\bhow\s+(do|does|to|can|much)\b",
        ],
        CapabilityCategory::Information,
        IntentType::Search,
        0.75,
        entities = &[("search_query", r"(?:search|look\s*up|find|google)\s+(?:for\s+)?(.+)")]
    ),
    rule!(
        &[
            r"\bresearch\b",
            r"\btell\s+me\s+(more\s+)?about\b",
            r"\bexplain\b",
            r"\bwhat\s+do\s+you\s+know\s+about\b",
        ],
        CapabilityCategory::Information,
        IntentType::Research,
        0.8,
        memory
    ),
    rule!(
        &[
            r"\b(what('?s|\s+is)|how('?s|\s+is))\s+(the\s+)?weather\b",
            r"\bweather\s+(in|for|today|tomorrow)\b",
            r"\bis\s+it\s+(going\s+to\s+)?(rain|snow|cold|hot|warm)\b",
            r"\bdo\s+i\s+need\s+(an?\s+)?(umbrella|jacket|coat)\b",
        ],
        CapabilityCategory::Information,
        IntentType::Weather,
        0.95
    ),
    rule!(
        &[
            r"\bwhat\s+time\s+is\s+it\b",
            r"\bwhat('?s|\s+is)\s+the\s+time\b",
            r"\bcurrent\s+time\b",
        ],
        CapabilityCategory::Information,
        IntentType::Time,
        0.95
    ),
    rule!(
        &[
            r"\bdo\s+you\s+remember\b",
            r"\bwhat\s+did\s+(i|we)\s+(say|talk|discuss|mention)\b",
            r"\brecall\b",
            r"\bwhat\s+do\s+you\s+know\s+about\s+(me|my)\b",
        ],
        CapabilityCategory::Memory,
        IntentType::RecallFact,
        0.85,
        memory
    ),
    rule!(
        &[
            r"\b(search|look\s+through)\s+(my\s+)?(history|memories|past)\b",
            r"\bwhen\s+did\s+(i|we)\s+(last|first)\b",
        ],
        CapabilityCategory::Memory,
        IntentType::SearchHistory,
        0.85,
        memory
    ),
    rule!(
        &[
            r"\b(lifelog|pendant|recording)\b",
            r"\bwhat\s+(did\s+)?(i|we)\s+(talk|discuss|say)\s+about\b",
            r"\b(conversation|meeting)\s+recording\b",
            r"\bwhat\s+was\s+(said|discussed)\s+(in|during)\b",
        ],
        CapabilityCategory::Memory,
        IntentType::LifelogQuery,
        0.9,
        memory
    ),
    rule!(
        &[
            r"\bremember\s+(that|this)\b",
            r"\bsave\s+(this|that)\s+(to\s+)?memory\b",
            r"\bdon'?t\s+forget\s+that\b",
            r"\bnote\s+that\b",
        ],
        CapabilityCategory::Memory,
        IntentType::SaveMemory,
        0.9
    ),
    rule!(
        &[
            r"\badd\s+(.+)\s+to\s+(the\s+)?(grocery|shopping)\s+list\b",
            r"\b(need|get|buy)\s+(.+)\s+(from|at)\s+(the\s+)?(store|grocery|market)\b",
            r"\bput\s+(.+)\s+on\s+(the\s+)?(grocery|shopping)\s+list\b",
        ],
        CapabilityCategory::Grocery,
        IntentType::AddItem,
        0.9,
        entities = &[("item_name", r"(?:add|need|get|buy|put)\s+(.+?)\s+(?:to|from|on|at)")]
    ),
    rule!(
        &[
            r"\b(show|what('?s|\s+is)|check)\s+(the\s+)?(grocery|shopping)\s+list\b",
            r"\bwhat\s+do\s+(i|we)\s+need\s+(to\s+buy|from\s+the\s+store)\b",
        ],
        CapabilityCategory::Grocery,
        IntentType::CheckList,
        0.9
    ),
    rule!(
        &[
            r"\b(got|bought|purchased|crossed\s+off)\s+(.+)\b",
            r"\bmark\s+(.+)\s+as\s+(bought|purchased|done)\b",
        ],
        CapabilityCategory::Grocery,
        IntentType::MarkPurchased,
        0.85
    ),
    rule!(
        &[r"\b(remove|delete|take\s+off)\s+(.+)\s+from\s+(the\s+)?(grocery|shopping)\s+list\b"],
        CapabilityCategory::Grocery,
        IntentType::RemoveItem,
        0.85
    ),
    rule!(
        &[r"\bclear\s+(the\s+)?(grocery|shopping)\s+list\b"],
        CapabilityCategory::Grocery,
        IntentType::ClearList,
        0.9
    ),
    rule!(
        &[
            r"\b(update|change|set)\s+(my\s+)?preference\b",
            r"\bi\s+(prefer|like|don'?t\s+like)\b",
        ],
        CapabilityCategory::Profile,
        IntentType::PreferenceUpdate,
        0.85
    ),
    rule!(
        &[r"\b(what('?s|\s+are)|show)\s+(my\s+)?(profile|preferences|settings)\b"],
        CapabilityCategory::Profile,
        IntentType::ProfileQuery,
        0.85
    ),
    rule!(
        &[r"\b(read|open|show\s+me)\s+(the\s+)?file\b"],
        CapabilityCategory::Profile,
        IntentType::ReadFile,
        0.85
    ),
    rule!(
        &[r"\b(write|save|create)\s+(a\s+)?file\b"],
        CapabilityCategory::Profile,
        IntentType::WriteFile,
        0.85
    ),
    rule!(
        &[
            r"\b(morning|daily)\s+(briefing|brief|update|summary)\b",
            r"\bbrief\s+me\b",
            r"\bwhat('?s|\s+is)\s+(on\s+)?(my\s+)?(agenda|schedule)\s+(for\s+)?today\b",
            r"\bgood\s+morning\b",
        ],
        CapabilityCategory::System,
        IntentType::MorningBriefing,
        0.9
    ),
    rule!(
        &[r"\b(system\s+)?status\b", r"\bare\s+you\s+(working|running|online)\b"],
        CapabilityCategory::System,
        IntentType::StatusCheck,
        0.9
    ),
    rule!(
        &[
            r"\bhelp\b",
            r"\bwhat\s+can\s+you\s+do\b",
            r"\bwhat\s+are\s+your\s+(capabilities|features)\b",
            r"\bhow\s+do\s+(i|you)\s+use\b",
        ],
        CapabilityCategory::System,
        IntentType::Help,
        0.9
    ),
];

pub static COORDINATION_PATTERNS: &[&str] = &[
    r"\b(and|also|then|after\s+that)\b",
    r"\b(first|second|third)\b.*\b(then|next|after)\b",
];

pub static TIME_PATTERNS_DATE: &[&str] = &[
    r"\b(today|tomorrow|yesterday)\b",
    r"\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    r"\b(\d{1,2}[/-]\d{1,2}(?:[/-]\d{2,4})?)\b",
    r"\b(next|this|last)\s+(week|month|year)\b",
    r"\b(in\s+)?(\d+)\s+(minute|hour|day|week|month)s?\b",
];

pub static TIME_PATTERNS_TIME: &[&str] = &[
    r"\b(\d{1,2}:\d{2})\s*(am|pm)?\b",
    r"\b(\d{1,2})\s*(am|pm)\b",
    r"\b(noon|midnight|morning|afternoon|evening|night)\b",
    r"\bin\s+(\d+)\s+(minute|hour)s?\b",
];
