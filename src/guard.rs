//! Three-layer validation gate: user input, assembled prompt, model output.
//!
//! Each layer is a pure check over a declarative rule table; the tables are
//! compiled once and evaluated in a fixed priority order. The first match
//! fixes the diagnostic reason, but any match is a rejection. Rejections are
//! logged with a truncated snippet for audit purposes only.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::config::GuardConfig;

/// Why a text was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardReason {
    Length,
    SensitiveWord,
    SqlPattern,
    XssPattern,
    CmdInjectionPattern,
    PromptInjectionPattern,
    JailbreakConfirmation,
    SensitiveLeak,
}

impl fmt::Display for GuardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Length => "input exceeds the maximum length",
            Self::SensitiveWord => "input contains a sensitive word",
            Self::SqlPattern => "input matches a SQL injection pattern",
            Self::XssPattern => "input matches a cross-site scripting pattern",
            Self::CmdInjectionPattern => "input matches a command injection pattern",
            Self::PromptInjectionPattern => "prompt matches an injection pattern",
            Self::JailbreakConfirmation => "output confirms a jailbreak attempt",
            Self::SensitiveLeak => "output leaks a sensitive word",
        };
        write!(f, "{name}")
    }
}

/// Outcome of a single guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardVerdict {
    pub safe: bool,
    pub reason: Option<GuardReason>,
}

impl GuardVerdict {
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            safe: true,
            reason: None,
        }
    }

    #[must_use]
    pub const fn reject(reason: GuardReason) -> Self {
        Self {
            safe: false,
            reason: Some(reason),
        }
    }
}

/// One entry of a rule table: a compiled pattern and the reason it reports.
struct GuardRule {
    pattern: Regex,
    reason: GuardReason,
}

impl GuardRule {
    fn new(pattern: &str, reason: GuardReason) -> Self {
        Self {
            // Table patterns are fixed literals; a failure here is a build bug.
            pattern: Regex::new(pattern).expect("invalid guard rule pattern"),
            reason,
        }
    }
}

lazy_static! {
    /// Attack patterns checked against raw user input, in priority order:
    /// SQL injection, then XSS, then command injection.
    static ref INPUT_RULES: Vec<GuardRule> = vec![
        // SQL keywords (DML/DDL verbs)
        GuardRule::new(
            r"(?i)\b(select|union|insert|drop|delete|update|alter|create|truncate)\b",
            GuardReason::SqlPattern,
        ),
        // Classic quoted tautology, e.g. ' or '1'='1
        GuardRule::new(
            r#"('|")\s*(?i:or|and)\s*('|")\d('|")\s*=\s*('|")\d"#,
            GuardReason::SqlPattern,
        ),
        // Timing-attack functions
        GuardRule::new(
            r"(?i)\b(sleep|benchmark|waitfor\s+delay)\b",
            GuardReason::SqlPattern,
        ),
        // Comment tokens
        GuardRule::new(r"(--|#|/\*|\*/)", GuardReason::SqlPattern),
        // Script tags, inline event handlers, javascript: hrefs
        GuardRule::new(r"(?i)<script", GuardReason::XssPattern),
        GuardRule::new(r"(?i)onerror=", GuardReason::XssPattern),
        GuardRule::new(r"(?i)onload=", GuardReason::XssPattern),
        GuardRule::new(r"(?i)onmouseover=", GuardReason::XssPattern),
        GuardRule::new(r#"(?i)href=[\s"']*javascript:"#, GuardReason::XssPattern),
        // Shell metacharacters: &&, ||, ;, backtick, $(
        GuardRule::new(r"(&&|\|\||;|`|\$\()", GuardReason::CmdInjectionPattern),
        // Common command names
        GuardRule::new(
            r"(?i)\b(ls|cat|rm|whoami|sh|bash|powershell|wget|curl)\b",
            GuardReason::CmdInjectionPattern,
        ),
    ];

    /// Injection patterns checked against the fully assembled prompt:
    /// role-override phrasing, system-prompt disclosure, role reassignment.
    static ref PROMPT_RULES: Vec<GuardRule> = vec![
        GuardRule::new(
            r"(?i)(ignore|disregard|forget)\s+(all|your)\s+(previous|prior)\s+(instructions|directives|context)",
            GuardReason::PromptInjectionPattern,
        ),
        GuardRule::new(
            r"(?i)(you|your)\s+(are|role|task)\s+(now|is)\s+",
            GuardReason::PromptInjectionPattern,
        ),
        GuardRule::new(r"(?i)system\s+prompt", GuardReason::PromptInjectionPattern),
        GuardRule::new(r"(?i)output\s+only", GuardReason::PromptInjectionPattern),
        GuardRule::new(
            r"(?i)(what|repeat|tell|show)\s+(are|me)\s+(your|the)\s+(instructions|directives|prompt|rules)",
            GuardReason::PromptInjectionPattern,
        ),
        GuardRule::new(r"(?i)(act|respond)\s+as", GuardReason::PromptInjectionPattern),
        GuardRule::new(r"(?i)new\s+set\s+of\s+rules", GuardReason::PromptInjectionPattern),
    ];

    /// Jailbreak-confirmation patterns checked against the model's raw reply.
    static ref OUTPUT_RULES: Vec<GuardRule> = vec![
        GuardRule::new(r"(?i)forgot(ten)?\s+previous", GuardReason::JailbreakConfirmation),
        GuardRule::new(r"(?i)ignore(d)?\s+instructions", GuardReason::JailbreakConfirmation),
        GuardRule::new(r"(?i)new\s+role", GuardReason::JailbreakConfirmation),
        GuardRule::new(r"(?i)i\s+will\s+now", GuardReason::JailbreakConfirmation),
    ];
}

/// Stateless validator applied to raw user text, to the assembled prompt,
/// and to the model's raw output.
#[derive(Debug, Clone)]
pub struct Guard {
    max_input_length: usize,
    sensitive_words: Vec<String>,
}

impl Guard {
    #[must_use]
    pub fn new(max_input_length: usize, sensitive_words: Vec<String>) -> Self {
        let sensitive_words = sensitive_words
            .into_iter()
            .map(|word| word.to_lowercase())
            .collect();
        Self {
            max_input_length,
            sensitive_words,
        }
    }

    #[must_use]
    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(config.max_input_length, config.sensitive_words.clone())
    }

    /// First defense layer: length, sensitive literals, attack patterns.
    #[must_use]
    pub fn validate_input(&self, user_input: &str) -> GuardVerdict {
        if user_input.chars().count() > self.max_input_length {
            return rejected("input", user_input, GuardReason::Length, "length bound");
        }

        if let Some(word) = self.find_sensitive_word(user_input) {
            return rejected("input", user_input, GuardReason::SensitiveWord, &word);
        }

        if let Some(rule) = first_match(&INPUT_RULES, user_input) {
            return rejected("input", user_input, rule.reason, rule.pattern.as_str());
        }

        GuardVerdict::pass()
    }

    /// Second defense layer, applied to the fully assembled prompt before
    /// it is sent for generation.
    #[must_use]
    pub fn validate_prompt(&self, prompt: &str) -> GuardVerdict {
        if let Some(rule) = first_match(&PROMPT_RULES, prompt) {
            return rejected("prompt", prompt, rule.reason, rule.pattern.as_str());
        }

        GuardVerdict::pass()
    }

    /// Third defense layer over the model's raw reply: jailbreak
    /// confirmations, then sensitive-literal leakage.
    #[must_use]
    pub fn validate_output(&self, response: &str) -> GuardVerdict {
        if let Some(rule) = first_match(&OUTPUT_RULES, response) {
            return rejected("output", response, rule.reason, rule.pattern.as_str());
        }

        if let Some(word) = self.find_sensitive_word(response) {
            return rejected("output", response, GuardReason::SensitiveLeak, &word);
        }

        GuardVerdict::pass()
    }

    fn find_sensitive_word(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        self.sensitive_words
            .iter()
            .find(|word| lowered.contains(word.as_str()))
            .cloned()
    }
}

/// Log the rejection with a truncated snippet, then build the verdict.
/// Logging is for audit only and never drives control flow.
fn rejected(layer: &str, text: &str, reason: GuardReason, matched: &str) -> GuardVerdict {
    warn!(
        "{} validation failed: {} (matched: {}). Text: {}",
        layer,
        reason,
        matched,
        snippet(text, 80)
    );
    GuardVerdict::reject(reason)
}

fn first_match<'a>(rules: &'a [GuardRule], text: &str) -> Option<&'a GuardRule> {
    rules.iter().find(|rule| rule.pattern.is_match(text))
}

/// Char-safe truncation for audit logs.
fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}
