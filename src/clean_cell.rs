use std::sync::LazyLock;

use regex::Regex;

use crate::brackets::repair_brackets;
use crate::error::ExtractError;
use crate::model::FieldContext;
use crate::rules::CleaningRules;
use crate::segment::Segmenter;
use crate::watermark::{CharScan, is_cjk};

const CONTENT_PUNCT: &str = "，。、；：（）【】《》！？·-—";
const INGREDIENT_PUNCT: &str = "，。、；：（）【】《》！？·";
const MIN_CONFIRMED_RATIO: f64 = 0.3;
const MAX_SETTLE_PASSES: usize = 8;

static POINT_BETWEEN_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9])\.+([0-9])").expect("static regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));
static EDGE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[,，、;；:：\s]+|[,，、;；:：\s]+$").expect("static regex")
});
static NUMERIC_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.?[0-9]+(?:\.[0-9]*)?[A-Za-z]*").expect("static regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanPolicy {
    pub numeric_protection: bool,
    pub bracket_repair: bool,
    /// Ingredient entries get a character filter only, never watermark removal.
    pub raw_ingredients: bool,
}

impl CleanPolicy {
    pub const REFINED: Self = Self {
        numeric_protection: true,
        bracket_repair: true,
        raw_ingredients: true,
    };
    pub const LEGACY: Self = Self {
        numeric_protection: false,
        bracket_repair: false,
        raw_ingredients: false,
    };
}

impl Default for CleanPolicy {
    fn default() -> Self {
        Self::REFINED
    }
}

#[derive(Debug)]
struct WatermarkPatterns {
    before_number: Regex,
    after_number: Regex,
    inside_decimal: Regex,
    after_point: Regex,
    between_digits: Regex,
    leading: Regex,
    trailing: Regex,
}

impl WatermarkPatterns {
    fn compile(rules: &CleaningRules, policy: CleanPolicy) -> Result<Self, ExtractError> {
        let mark = rules.watermark_class();
        let number = if policy.numeric_protection {
            r"[0-9]+\.?[0-9]*"
        } else {
            r"[0-9]+"
        };
        Ok(Self {
            before_number: Regex::new(&format!("{mark}({number})"))?,
            after_number: Regex::new(&format!("({number}){mark}"))?,
            inside_decimal: Regex::new(&format!(r"([0-9]){mark}+(\.[0-9]+)"))?,
            after_point: Regex::new(&format!(r"([0-9]+\.){mark}+([0-9])"))?,
            between_digits: Regex::new(&format!(r"([0-9]){mark}+([0-9])"))?,
            leading: Regex::new(&format!("^{mark}+"))?,
            trailing: Regex::new(&format!("{mark}+$"))?,
        })
    }
}

pub struct CellCleaner<'a> {
    rules: &'a CleaningRules,
    segmenter: &'a dyn Segmenter,
    policy: CleanPolicy,
    patterns: WatermarkPatterns,
}

impl<'a> CellCleaner<'a> {
    pub fn new(
        rules: &'a CleaningRules,
        segmenter: &'a dyn Segmenter,
        policy: CleanPolicy,
    ) -> Result<Self, ExtractError> {
        rules.validate()?;
        Ok(Self {
            rules,
            segmenter,
            policy,
            patterns: WatermarkPatterns::compile(rules, policy)?,
        })
    }

    #[must_use]
    pub fn rules(&self) -> &'a CleaningRules {
        self.rules
    }

    #[must_use]
    pub fn segmenter(&self) -> &'a dyn Segmenter {
        self.segmenter
    }

    #[must_use]
    pub fn policy(&self) -> CleanPolicy {
        self.policy
    }

    /// Cleans `cell` until another pass no longer changes it, so cleaning
    /// an already-clean value returns it unchanged.
    pub fn clean(&self, cell: Option<&str>, context: FieldContext) -> String {
        let Some(cell) = cell else {
            return String::new();
        };

        let mut text = self.clean_pass(cell, context);
        for _ in 0..MAX_SETTLE_PASSES {
            let again = self.clean_pass(&text, context);
            if again == text {
                break;
            }
            text = again;
        }
        text
    }

    fn clean_pass(&self, cell: &str, context: FieldContext) -> String {
        let mut text = self.filter_chars(cell);
        if self.policy.numeric_protection {
            text = guard_decimal_points(&text);
        }
        if !context.keeps_watermark() {
            text = self.split_watermark_tokens(&text);
        }
        let text = self.reformat_field_label(text.trim());
        if text.is_empty() {
            return String::new();
        }

        if context.accepts_single_char() && text.chars().count() == 1 {
            return text;
        }

        let surviving_tokens = if context.keeps_watermark() {
            Vec::new()
        } else {
            self.segmenter
                .tokenize(&text)
                .into_iter()
                .filter(|token| !self.rules.is_all_watermark(token))
                .collect::<Vec<_>>()
        };

        let chars = text.chars().collect::<Vec<_>>();
        let scan = CharScan {
            chars: &chars,
            surviving_tokens: &surviving_tokens,
            context,
            rules: self.rules,
            segmenter: self.segmenter,
            numeric_protection: self.policy.numeric_protection,
        };
        let resolved = chars
            .iter()
            .enumerate()
            .filter(|(index, _)| scan.resolve(*index).is_keep())
            .map(|(_, ch)| *ch)
            .collect::<String>();

        let confirmed = surviving_tokens
            .iter()
            .map(|token| token.chars().count())
            .sum::<usize>();
        let normalized = self.normalize(&resolved, context);
        self.gate(normalized, confirmed, context)
    }

    #[must_use]
    pub fn filter_ingredient_chars(&self, text: &str) -> String {
        text.chars()
            .filter(|ch| {
                is_cjk(*ch)
                    || ch.is_ascii_alphanumeric()
                    || INGREDIENT_PUNCT.contains(*ch)
                    || is_inline_space(*ch)
            })
            .collect::<String>()
            .trim()
            .to_string()
    }

    #[must_use]
    pub fn strip_leading_watermark(&self, text: &str) -> String {
        self.patterns.leading.replace(text, "").trim().to_string()
    }

    fn filter_chars(&self, cell: &str) -> String {
        cell.chars()
            .filter(|ch| {
                is_cjk(*ch)
                    || ch.is_ascii_alphanumeric()
                    || CONTENT_PUNCT.contains(*ch)
                    || is_inline_space(*ch)
                    || (self.policy.numeric_protection && *ch == '.')
            })
            .collect::<String>()
            .trim()
            .to_string()
    }

    fn split_watermark_tokens(&self, text: &str) -> String {
        let mut merged = String::with_capacity(text.len());
        for token in self.segmenter.tokenize(text) {
            if self.rules.is_all_watermark(token) {
                continue;
            }
            let total = token.chars().count();
            let marks = token
                .chars()
                .filter(|ch| self.rules.is_watermark(*ch))
                .count();
            let keep_marks = marks * 2 <= total;
            let kept = token
                .chars()
                .filter(|ch| keep_marks || !self.rules.is_watermark(*ch))
                .collect::<String>();
            merged.push_str(kept.trim());
        }

        let patterns = &self.patterns;
        let mut merged = patterns.before_number.replace_all(&merged, "$1").into_owned();
        merged = patterns.after_number.replace_all(&merged, "$1").into_owned();
        if self.policy.numeric_protection {
            merged = patterns
                .inside_decimal
                .replace_all(&merged, "$1$2")
                .into_owned();
            merged = patterns.after_point.replace_all(&merged, "$1$2").into_owned();
        }
        merged
    }

    /// `…label3g rest` → `label（3g）rest`; text before the label is dropped.
    fn reformat_field_label(&self, text: &str) -> String {
        let Some(label) = self.rules.find_field_label(text) else {
            return text.to_string();
        };
        let Some(at) = text.find(label) else {
            return text.to_string();
        };
        let after = &text[at + label.len()..];
        match NUMERIC_UNIT.find(after) {
            Some(quantity) => format!(
                "{label}（{}）{}",
                quantity.as_str(),
                &after[quantity.end()..]
            ),
            None => format!("{label}{after}"),
        }
    }

    fn normalize(&self, text: &str, context: FieldContext) -> String {
        let mut text = WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned();

        if self.policy.bracket_repair {
            text = repair_brackets(&text);
        }

        if self.policy.numeric_protection {
            if !context.keeps_watermark() {
                let patterns = &self.patterns;
                text = POINT_BETWEEN_DIGITS.replace_all(&text, "$1.$2").into_owned();
                text = patterns.between_digits.replace_all(&text, "$1$2").into_owned();
                text = patterns.inside_decimal.replace_all(&text, "$1$2").into_owned();
                text = patterns.after_point.replace_all(&text, "$1$2").into_owned();
            }
            // bracket repair can strand a point: `（1.步` -> `（1）.步`
            text = guard_decimal_points(&text);
        }
        EDGE_SEPARATORS.replace_all(&text, "").into_owned()
    }

    fn gate(&self, mut text: String, confirmed: usize, context: FieldContext) -> String {
        if text.is_empty() || self.rules.is_whitelisted(&text) || context.keeps_watermark() {
            return text;
        }

        if context == FieldContext::CookingMethod {
            let stripped = self.patterns.leading.replace(&text, "").into_owned();
            text = self.patterns.trailing.replace(&stripped, "").trim().to_string();
            if text.is_empty() || self.rules.is_whitelisted(&text) {
                return text;
            }
        }

        let length = text.chars().count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = confirmed as f64 / length as f64;
        if ratio < MIN_CONFIRMED_RATIO && !self.rules.contains_field_label(&text) {
            return String::new();
        }
        if length == 1 && self.rules.is_all_watermark(&text) {
            return String::new();
        }
        text
    }
}

fn is_inline_space(ch: char) -> bool {
    ch.is_whitespace() && !matches!(ch, '\n' | '\r')
}

fn guard_decimal_points(text: &str) -> String {
    let mut collapsed = Vec::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '.' && collapsed.last() == Some(&'.') {
            continue;
        }
        collapsed.push(ch);
    }

    collapsed
        .iter()
        .enumerate()
        .filter(|&(index, &ch)| {
            if ch != '.' {
                return true;
            }
            let prev_digit = index
                .checked_sub(1)
                .is_some_and(|prev| collapsed[prev].is_ascii_digit());
            let next_digit = collapsed
                .get(index + 1)
                .is_some_and(char::is_ascii_digit);
            prev_digit || next_digit
        })
        .map(|(_, ch)| *ch)
        .collect()
}
