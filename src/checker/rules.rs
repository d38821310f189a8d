//! RuleSet - ordered regex rules for the Correction Source
//!
//! Each rule is a case-insensitive pattern, a suggestion template and a
//! human-readable explanation. Rules run independently: every rule collects
//! all of its own non-overlapping matches, so two rules may report
//! overlapping spans and consumers have to tolerate that.
//!
//! Suggestion templates use `regex` expansion syntax, e.g. `it's ${1}`.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::correction::{Correction, CorrectionOrigin};
use crate::error::CheckError;
use crate::offsets::Utf16Index;

// ==================== TYPE DEFINITIONS ====================

/// Uncompiled rule definition
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RuleSpec {
    pub id: String,
    pub pattern: String,
    pub suggestion: String,
    pub explanation: String,
}

impl RuleSpec {
    pub fn new(id: &str, pattern: &str, suggestion: &str, explanation: &str) -> Self {
        Self {
            id: id.to_string(),
            pattern: pattern.to_string(),
            suggestion: suggestion.to_string(),
            explanation: explanation.to_string(),
        }
    }
}

/// (id, pattern, suggestion, explanation)
const BUILTIN_RULES: &[(&str, &str, &str, &str)] = &[
    ("teh", r"\bteh\b", "the", r#"Common typo: "teh" should be "the""#),
    ("recieve", r"\brecieve\b", "receive", r#"Spelling: "i before e except after c""#),
    ("occured", r"\boccured\b", "occurred", r#"Double "r" needed in past tense of "occur""#),
    ("their-are", r"\btheir\s+are\b", "there are", r#""Their" = possessive; "there" = location/existence"#),
    ("your-right", r"\byour\s+right\b", "you're right", r#""You're" = you are (contraction)"#),
    ("its", r"\bits\s+(\w+)\b", "it's ${1}", r#""It's" = it is (contraction); "its" = possessive"#),
    ("definately", r"\bdefinately\b", "definitely", r#"Spelling: "definitely" has no "a""#),
    ("seperate", r"\bseperate\b", "separate", r#""Separate" is spelled with "a" not "e""#),
    ("accomodate", r"\baccomodate\b", "accommodate", r#"Double "m" and double "d" in accommodate"#),
    ("affect-vs-effect", r"\baffect\s+vs\s+effect\b", "effect", r#""Effect" = noun (result); "affect" = verb (influence)"#),
];

/// A compiled rule
#[derive(Clone, Debug)]
pub struct Rule {
    pub id: String,
    regex: Regex,
    suggestion: String,
    explanation: String,
}

impl Rule {
    pub fn compile(spec: &RuleSpec) -> Result<Self, CheckError> {
        let regex = RegexBuilder::new(&spec.pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| CheckError::InvalidPattern {
                id: spec.id.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            id: spec.id.clone(),
            regex,
            suggestion: spec.suggestion.clone(),
            explanation: spec.explanation.clone(),
        })
    }

    /// All non-overlapping matches of this rule, leftmost first
    fn matches(&self, text: &str, index: &Utf16Index, out: &mut Vec<Correction>) {
        for caps in self.regex.captures_iter(text) {
            let Some(full) = caps.get(0) else { continue };
            // Match boundaries are always char boundaries, so both convert
            let (Some(start), Some(end)) = (index.to_utf16(full.start()), index.to_utf16(full.end()))
            else {
                continue;
            };
            if start == end {
                continue;
            }

            let mut suggested = String::new();
            caps.expand(&self.suggestion, &mut suggested);

            out.push(Correction {
                original_text: full.as_str().to_string(),
                suggested_text: suggested,
                explanation: self.explanation.clone(),
                start_offset: start,
                end_offset: end,
                origin: CorrectionOrigin::Rule,
            });
        }
    }
}

// ==================== MAIN IMPLEMENTATION ====================

/// Ordered collection of compiled rules
#[derive(Clone, Debug)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// The built-in English rules
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|&(id, pattern, suggestion, explanation)| {
                Rule::compile(&RuleSpec::new(id, pattern, suggestion, explanation))
                    .expect("built-in rule pattern compiles")
            })
            .collect();
        Self { rules }
    }

    /// Compile custom rules, keeping their order
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self, CheckError> {
        let rules = specs.iter().map(Rule::compile).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Built-in rule definitions, for callers that want to extend them
    pub fn builtin_specs() -> Vec<RuleSpec> {
        BUILTIN_RULES
            .iter()
            .map(|&(id, pattern, suggestion, explanation)| {
                RuleSpec::new(id, pattern, suggestion, explanation)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }

    /// Run every rule in order and collect their matches, unsorted
    pub fn find_all(&self, text: &str) -> Vec<Correction> {
        let index = Utf16Index::new(text);
        let mut out = Vec::new();
        for rule in &self.rules {
            rule.matches(text, &index, &mut out);
        }
        out
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

// ==================== TESTS ====================
