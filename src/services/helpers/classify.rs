//! Keyword and regex heuristics over normalized email text.
//!
//! Every function here is pure: given the same body and subject it always
//! produces the same output (deadline timestamps aside), so results are
//! reproducible across runs.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Email classification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Urgent,
    Meeting,
    Project,
    Invoice,
    Personal,
    Newsletter,
    Support,
    /// No category keywords matched
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Meeting => "meeting",
            Self::Project => "project",
            Self::Invoice => "invoice",
            Self::Personal => "personal",
            Self::Newsletter => "newsletter",
            Self::Support => "support",
            Self::General => "general",
        }
    }

    fn base_priority(&self) -> u8 {
        match self {
            Self::Urgent => 5,
            Self::Support => 4,
            Self::Meeting => 4,
            Self::Project => 3,
            Self::Invoice => 3,
            Self::Personal => 2,
            Self::Newsletter => 1,
            Self::General => 2,
        }
    }
}

/// Overall tone of a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

/// Urgency tag attached to an extracted deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlinePriority {
    High,
    Medium,
}

/// A deadline phrase found in the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deadline {
    pub text: String,
    pub extracted_at: DateTime<Utc>,
    pub priority: DeadlinePriority,
}

/// Aggregate output of one classification pass.
#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub category: Category,
    pub sentiment: Sentiment,
    pub priority: u8,
    pub action_items: Vec<String>,
    pub deadlines: Vec<Deadline>,
    pub suggested_response: String,
}

// ---------------------------------------------------------------------------
// Keyword tables
// ---------------------------------------------------------------------------

// Table order is the tie-break order: the first category reaching the
// maximum score wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Urgent,
        &["urgent", "asap", "immediately", "deadline", "critical"],
    ),
    (
        Category::Meeting,
        &["meeting", "call", "conference", "zoom", "teams"],
    ),
    (
        Category::Project,
        &["project", "task", "deliverable", "milestone"],
    ),
    (
        Category::Invoice,
        &["invoice", "payment", "billing", "receipt"],
    ),
    (Category::Personal, &["personal", "family", "friend"]),
    (
        Category::Newsletter,
        &["newsletter", "unsubscribe", "marketing"],
    ),
    (
        Category::Support,
        &["support", "help", "issue", "problem", "bug"],
    ),
];

const POSITIVE_WORDS: &[&str] = &["thank", "great", "excellent", "good", "pleased", "happy"];
const NEGATIVE_WORDS: &[&str] = &["urgent", "problem", "issue", "concern", "disappointed", "angry"];

const DEADLINE_URGENCY_WORDS: &[&str] = &["urgent", "asap", "immediately"];

const MAX_ACTION_ITEMS: usize = 5;
const MAX_DEADLINES: usize = 3;
const MAX_RESPONSE_ACTION_ITEMS: usize = 3;

// ---------------------------------------------------------------------------
// Regex patterns
// ---------------------------------------------------------------------------

static ACTION_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        // Polite or obligation requests, up to a sentence terminator
        Regex::new(r"(?:please|can you|could you|need to|should|must|have to)\s+([^.!?]*)")
            .expect("valid action regex"),
        // Explicit prefixes
        Regex::new(r"(?:action item|todo|task):\s*([^.!?\n]*)").expect("valid action regex"),
        // Follow-up verbs
        Regex::new(r"(?:follow up|complete|finish|deliver)\s+([^.!?]*)")
            .expect("valid action regex"),
    ]
});

static DEADLINE_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        // "by friday", "due 12/03/2026", "before 3 march", "deadline march 3"
        Regex::new(r"(?:by|due|deadline|before)\s+(\w+day|\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}|\d{1,2}\s+\w+|\w+\s+\d{1,2})")
            .expect("valid deadline regex"),
        // "friday at 15:00" -- two groups, joined with a space
        Regex::new(r"(\w+day)\s+(?:at|by)\s+(\d{1,2}:\d{2})").expect("valid deadline regex"),
        // "end of monday", "eod today"
        Regex::new(r"(?:end of|eod)\s+(\w+day|\w+)").expect("valid deadline regex"),
    ]
});

// ---------------------------------------------------------------------------
// Classification passes
// ---------------------------------------------------------------------------

/// Score each category as the number of its keywords present in the
/// lowercased body+subject; first category with the maximum score wins.
/// All-zero scores fall back to [`Category::General`].
pub fn categorize(body: &str, subject: &str) -> Category {
    let text = format!("{} {}", body, subject).to_lowercase();

    let mut best = Category::General;
    let mut best_score = 0;
    for (category, keywords) in CATEGORY_KEYWORDS {
        let score = keywords.iter().filter(|&&kw| text.contains(kw)).count();
        if score > best_score {
            best = *category;
            best_score = score;
        }
    }
    best
}

/// Compare presence counts of positive and negative keywords in the body.
pub fn analyze_sentiment(body: &str) -> Sentiment {
    let text = body.to_lowercase();

    let positive = POSITIVE_WORDS.iter().filter(|&&w| text.contains(w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|&&w| text.contains(w)).count();

    if positive > negative {
        Sentiment::Positive
    } else if negative > positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Extract request clauses from the body: trigger phrase followed by text up
/// to a sentence terminator. Deduplicated, capped at 5.
pub fn extract_action_items(body: &str) -> Vec<String> {
    let text = body.to_lowercase();

    let mut seen = HashSet::new();
    let mut actions = Vec::new();
    for pattern in ACTION_PATTERNS.iter() {
        for caps in pattern.captures_iter(&text) {
            let item = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
            if item.is_empty() {
                continue;
            }
            if seen.insert(item.to_string()) {
                actions.push(item.to_string());
            }
        }
    }

    actions.truncate(MAX_ACTION_ITEMS);
    actions
}

/// Extract deadline phrases from the body, capped at 3 in pattern-then-scan
/// order. A deadline containing an urgency word is tagged high priority.
pub fn extract_deadlines(body: &str) -> Vec<Deadline> {
    let text = body.to_lowercase();

    let mut deadlines = Vec::new();
    for pattern in DEADLINE_PATTERNS.iter() {
        for caps in pattern.captures_iter(&text) {
            let deadline_text = match (caps.get(1), caps.get(2)) {
                (Some(a), Some(b)) => format!("{} {}", a.as_str(), b.as_str()),
                (Some(a), None) => a.as_str().to_string(),
                _ => continue,
            };

            let priority = if DEADLINE_URGENCY_WORDS
                .iter()
                .any(|w| deadline_text.contains(w))
            {
                DeadlinePriority::High
            } else {
                DeadlinePriority::Medium
            };

            deadlines.push(Deadline {
                text: deadline_text,
                extracted_at: Utc::now(),
                priority,
            });

            if deadlines.len() == MAX_DEADLINES {
                return deadlines;
            }
        }
    }
    deadlines
}

/// Category base score, bumped for negative sentiment and for the presence
/// of any deadline, clamped to 5.
pub fn calculate_priority(category: Category, sentiment: Sentiment, has_deadlines: bool) -> u8 {
    let mut priority = category.base_priority();
    if sentiment == Sentiment::Negative {
        priority += 1;
    }
    if has_deadlines {
        priority += 1;
    }
    priority.min(5)
}

/// Build a canned reply for the category, appending up to the first three
/// action items. Returns an empty string when response generation is off.
pub fn response_template(category: Category, action_items: &[String], enabled: bool) -> String {
    if !enabled {
        return String::new();
    }

    let base = match category {
        Category::Urgent => {
            "Thank you for your urgent message. I understand the importance and will prioritize this accordingly."
        }
        Category::Meeting => {
            "Thank you for the meeting invitation/request. I'll check my calendar and get back to you shortly."
        }
        Category::Support => {
            "Thank you for reaching out. I'll look into this issue and provide an update as soon as possible."
        }
        Category::Invoice => {
            "Thank you for the invoice/billing information. I'll process this accordingly."
        }
        Category::Project => {
            "Thank you for the project update. I'll review the details and respond with any questions or next steps."
        }
        _ => "Thank you for your email. I'll review this and get back to you soon.",
    };

    if action_items.is_empty() {
        return base.to_string();
    }

    let mut response = String::from(base);
    response.push_str("\n\nI note the following action items:");
    for item in action_items.iter().take(MAX_RESPONSE_ACTION_ITEMS) {
        response.push_str("\n- ");
        response.push_str(item);
    }
    response
}

/// Run all passes in data-dependency order: priority needs category,
/// sentiment, and the deadline flag.
pub fn classify(body: &str, subject: &str, response_enabled: bool) -> ClassificationResult {
    let category = categorize(body, subject);
    let action_items = extract_action_items(body);
    let deadlines = extract_deadlines(body);
    let sentiment = analyze_sentiment(body);
    let priority = calculate_priority(category, sentiment, !deadlines.is_empty());
    let suggested_response = response_template(category, &action_items, response_enabled);

    ClassificationResult {
        category,
        sentiment,
        priority,
        action_items,
        deadlines,
        suggested_response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_invoice_outranks_urgent() {
        // "invoice" + "payment" score 2 for invoice, "urgent" scores 1
        let category = categorize(
            "Please send the invoice by Friday, this is urgent!",
            "Payment needed",
        );
        assert_eq!(category, Category::Invoice);
    }

    #[test]
    fn test_categorize_tie_break_uses_table_order() {
        // One keyword each for urgent and meeting; urgent is first in the table
        assert_eq!(categorize("urgent meeting", ""), Category::Urgent);
    }

    #[test]
    fn test_categorize_no_keywords_is_general() {
        assert_eq!(categorize("hello there, how are you", ""), Category::General);
        assert_eq!(categorize("", ""), Category::General);
    }

    #[test]
    fn test_categorize_uses_subject() {
        assert_eq!(categorize("see attached", "Invoice for March"), Category::Invoice);
    }

    #[test]
    fn test_sentiment_positive() {
        assert_eq!(analyze_sentiment("thank you, great work"), Sentiment::Positive);
    }

    #[test]
    fn test_sentiment_negative() {
        assert_eq!(
            analyze_sentiment("this is urgent, we have a problem"),
            Sentiment::Negative
        );
    }

    #[test]
    fn test_sentiment_neutral_on_tie() {
        // one positive word, one negative word
        assert_eq!(analyze_sentiment("thank you, but there is an issue"), Sentiment::Neutral);
        assert_eq!(analyze_sentiment(""), Sentiment::Neutral);
    }

    #[test]
    fn test_action_items_request_clause() {
        let items = extract_action_items("Please review the attached document. Thanks!");
        assert_eq!(items, vec!["review the attached document"]);
    }

    #[test]
    fn test_action_items_explicit_prefix() {
        let items = extract_action_items("TODO: update the report\nAction item: ping legal");
        assert!(items.contains(&"update the report".to_string()));
        assert!(items.contains(&"ping legal".to_string()));
    }

    #[test]
    fn test_action_items_deduplicated() {
        let items = extract_action_items("Please review the doc. Please review the doc.");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_action_items_capped_at_five() {
        let body = "Please do a. Please do b. Please do c. Please do d. Please do e. Please do f.";
        assert_eq!(extract_action_items(body).len(), 5);
    }

    #[test]
    fn test_action_items_empty_body() {
        assert!(extract_action_items("").is_empty());
    }

    #[test]
    fn test_deadline_by_weekday() {
        let deadlines = extract_deadlines("send the invoice by friday please");
        assert_eq!(deadlines.len(), 1);
        assert_eq!(deadlines[0].text, "friday");
        assert_eq!(deadlines[0].priority, DeadlinePriority::Medium);
    }

    #[test]
    fn test_deadline_numeric_date() {
        let deadlines = extract_deadlines("the report is due 12/03/2026");
        assert_eq!(deadlines.len(), 1);
        assert_eq!(deadlines[0].text, "12/03/2026");
    }

    #[test]
    fn test_deadline_weekday_with_time_joins_groups() {
        let deadlines = extract_deadlines("team sync monday at 15:00");
        assert_eq!(deadlines.len(), 1);
        assert_eq!(deadlines[0].text, "monday 15:00");
    }

    #[test]
    fn test_deadline_end_of_day() {
        let deadlines = extract_deadlines("need the numbers eod today");
        assert_eq!(deadlines.len(), 1);
        assert_eq!(deadlines[0].text, "today");
    }

    #[test]
    fn test_deadline_urgency_tag() {
        let deadlines = extract_deadlines("need the numbers eod asap");
        assert_eq!(deadlines.len(), 1);
        assert_eq!(deadlines[0].text, "asap");
        assert_eq!(deadlines[0].priority, DeadlinePriority::High);
    }

    #[test]
    fn test_deadlines_capped_at_three() {
        let body = "by monday. by tuesday. by wednesday. by thursday. by friday.";
        assert_eq!(extract_deadlines(body).len(), 3);
    }

    #[test]
    fn test_priority_base_values() {
        assert_eq!(calculate_priority(Category::Urgent, Sentiment::Neutral, false), 5);
        assert_eq!(calculate_priority(Category::Newsletter, Sentiment::Neutral, false), 1);
        assert_eq!(calculate_priority(Category::General, Sentiment::Neutral, false), 2);
    }

    #[test]
    fn test_priority_bumps_and_clamp() {
        assert_eq!(calculate_priority(Category::Invoice, Sentiment::Negative, true), 5);
        // 5 + 1 + 1 clamps to 5
        assert_eq!(calculate_priority(Category::Urgent, Sentiment::Negative, true), 5);
    }

    #[test]
    fn test_priority_always_in_range() {
        let categories = [
            Category::Urgent,
            Category::Meeting,
            Category::Project,
            Category::Invoice,
            Category::Personal,
            Category::Newsletter,
            Category::Support,
            Category::General,
        ];
        let sentiments = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];
        for category in categories {
            for sentiment in sentiments {
                for has_deadlines in [false, true] {
                    let p = calculate_priority(category, sentiment, has_deadlines);
                    assert!((1..=5).contains(&p), "priority {} out of range", p);
                }
            }
        }
    }

    #[test]
    fn test_response_disabled() {
        assert_eq!(response_template(Category::Urgent, &[], false), "");
    }

    #[test]
    fn test_response_generic_fallback() {
        let response = response_template(Category::General, &[], true);
        assert!(response.starts_with("Thank you for your email."));
    }

    #[test]
    fn test_response_appends_first_three_action_items() {
        let items: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let response = response_template(Category::Invoice, &items, true);
        assert!(response.contains("I note the following action items:"));
        assert!(response.contains("\n- a"));
        assert!(response.contains("\n- c"));
        assert!(!response.contains("\n- d"));
    }

    #[test]
    fn test_classify_invoice_example() {
        let result = classify(
            "Please send the invoice by Friday, this is urgent!",
            "Payment needed",
            true,
        );
        assert_eq!(result.category, Category::Invoice);
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.deadlines.len(), 1);
        // base 3 + 1 negative + 1 deadline
        assert_eq!(result.priority, 5);
        assert!(!result.action_items.is_empty());
    }

    #[test]
    fn test_classify_empty_message() {
        let result = classify("", "", true);
        assert_eq!(result.category, Category::General);
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.priority, 2);
        assert!(result.action_items.is_empty());
        assert!(result.deadlines.is_empty());
    }

    #[test]
    fn test_classify_deterministic() {
        let body = "Please finish the deliverable by Monday, this project is critical.";
        let a = classify(body, "Project status", true);
        let b = classify(body, "Project status", true);
        assert_eq!(a.category, b.category);
        assert_eq!(a.sentiment, b.sentiment);
        assert_eq!(a.priority, b.priority);
        assert_eq!(a.action_items, b.action_items);
        assert_eq!(
            a.deadlines.iter().map(|d| &d.text).collect::<Vec<_>>(),
            b.deadlines.iter().map(|d| &d.text).collect::<Vec<_>>()
        );
    }
}
