//! GrammarChecker - the Correction Source
//!
//! Evaluates the RuleSet against a text. A placeholder for a remote model
//! call: the result is a pure function of the input, and callers must not
//! rely on the order of the returned corrections.
//!
//! The simulated network latency lives at the JS boundary
//! (`LinguistChecker.checkDelayed`), never here.

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;
use wasm_bindgen::prelude::*;

use super::correction::{Correction, CorrectionOrigin};
use super::rules::{RuleSet, RuleSpec};
use crate::config::LinguistConfig;
use crate::error::CheckError;
use crate::offsets::len16;

const FALLBACK_EXPLANATION: &str = "Consider capitalizing the first word of your sentence.";

/// Words this short never get a fallback suggestion
const FALLBACK_MIN_GRAPHEMES: usize = 4;

/// Anything that turns text into corrections
pub trait CorrectionSource {
    fn check(&self, text: &str) -> Result<Vec<Correction>, CheckError>;
}

// =============================================================================
// GrammarChecker
// =============================================================================

#[derive(Clone, Debug)]
pub struct GrammarChecker {
    rules: RuleSet,
    fallback: bool,
    first_word_re: Regex,
}

impl Default for GrammarChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarChecker {
    pub fn new() -> Self {
        Self::with_rules(RuleSet::builtin())
    }

    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            rules,
            fallback: true,
            first_word_re: Regex::new(r"^\s*(\S+)").expect("first-word pattern compiles"),
        }
    }

    pub fn from_config(config: &LinguistConfig) -> Self {
        Self::new().with_fallback(config.fallback_suggestion)
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback = enabled;
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Capitalization hint for the first word, used when no rule matched
    fn fallback_for(&self, text: &str) -> Option<Correction> {
        if text.trim().is_empty() {
            return None;
        }

        let word = self.first_word_re.captures(text)?.get(1)?;
        let mut graphemes = word.as_str().graphemes(true);
        if word.as_str().graphemes(true).count() < FALLBACK_MIN_GRAPHEMES {
            return None;
        }

        let first = graphemes.next()?;
        let rest: String = graphemes.collect();
        let suggested = format!("{}{}", first.to_uppercase(), rest.to_lowercase());

        let start = len16(&text[..word.start()]);
        Some(Correction {
            original_text: word.as_str().to_string(),
            suggested_text: suggested,
            explanation: FALLBACK_EXPLANATION.to_string(),
            start_offset: start,
            end_offset: start + len16(word.as_str()),
            origin: CorrectionOrigin::Fallback,
        })
    }
}

impl CorrectionSource for GrammarChecker {
    fn check(&self, text: &str) -> Result<Vec<Correction>, CheckError> {
        let mut corrections = self.rules.find_all(text);

        if corrections.is_empty() && self.fallback {
            corrections.extend(self.fallback_for(text));
        }

        Ok(corrections)
    }
}

// =============================================================================
// WASM Bindings
// =============================================================================

/// JS-facing checker
#[wasm_bindgen]
pub struct LinguistChecker {
    inner: GrammarChecker,
    latency_ms: u32,
}

impl Default for LinguistChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl LinguistChecker {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let config = LinguistConfig::default();
        Self {
            inner: GrammarChecker::from_config(&config),
            latency_ms: config.check_latency_ms,
        }
    }

    /// Create with a (partial) config object, e.g. `{ fallbackSuggestion: false }`
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue) -> Result<LinguistChecker, JsValue> {
        let config: LinguistConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(Self {
            inner: GrammarChecker::from_config(&config),
            latency_ms: config.check_latency_ms,
        })
    }

    /// Replace the rule list. Expects an array of `{ id, pattern, suggestion, explanation }`
    #[wasm_bindgen(js_name = setRules)]
    pub fn set_rules(&mut self, rules: JsValue) -> Result<(), JsValue> {
        let specs: Vec<RuleSpec> = serde_wasm_bindgen::from_value(rules)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse rules: {}", e)))?;
        let rules = RuleSet::from_specs(&specs).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let fallback = self.inner.fallback;
        self.inner = GrammarChecker::with_rules(rules).with_fallback(fallback);
        Ok(())
    }

    /// Synchronous check. Returns an array of Correction objects.
    #[wasm_bindgen]
    pub fn check(&self, text: &str) -> Result<JsValue, JsValue> {
        let corrections = self
            .inner
            .check(text)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        serde_wasm_bindgen::to_value(&corrections)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Check after the configured latency, emulating a network round trip
    #[cfg(target_arch = "wasm32")]
    #[wasm_bindgen(js_name = checkDelayed)]
    pub fn check_delayed(&self, text: String) -> js_sys::Promise {
        let checker = self.inner.clone();
        let latency = self.latency_ms;
        wasm_bindgen_futures::future_to_promise(async move {
            crate::web::sleep(latency).await?;
            let corrections = checker
                .check(&text)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            serde_wasm_bindgen::to_value(&corrections)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
        })
    }

    #[wasm_bindgen(js_name = ruleCount)]
    pub fn rule_count(&self) -> usize {
        self.inner.rule_count()
    }

    #[wasm_bindgen(js_name = latencyMs)]
    pub fn latency_ms(&self) -> u32 {
        self.latency_ms
    }
}

// =============================================================================
// Tests
// =============================================================================
