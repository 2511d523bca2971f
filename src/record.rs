use tracing::debug;

use crate::brackets::repair_brackets;
use crate::clean_cell::CellCleaner;
use crate::model::{FieldContext, LogicalTable, ParsedDish};
use crate::rules::CleaningRules;

const INGREDIENT_SEPARATORS: [char; 2] = ['、', '，'];
const LABEL_COLONS: [char; 2] = [':', '：'];
const VALUE_TERMINATORS: &str = "，。；：";
const STEP_BODY_MIN_CHARS: usize = 10;

/// Splits an ingredient list on `、`/`，` outside parentheses.
#[must_use]
pub fn split_ingredients(text: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0;

    for (at, ch) in text.char_indices() {
        match ch {
            '（' => depth += 1,
            '）' => depth = depth.saturating_sub(1),
            ch if depth == 0 && INGREDIENT_SEPARATORS.contains(&ch) => {
                push_entry(&mut entries, &text[start..at]);
                start = at + ch.len_utf8();
            }
            _ => {}
        }
    }
    push_entry(&mut entries, &text[start..]);
    entries
}

fn push_entry(entries: &mut Vec<String>, entry: &str) {
    let entry = entry.trim();
    if !entry.is_empty() {
        entries.push(entry.to_string());
    }
}

/// `label[:：]? value` inside a single cell; the value stops at whitespace
/// or list punctuation.
fn embedded_value<'t>(cell: &'t str, label: &str) -> Option<&'t str> {
    let at = cell.find(label)?;
    let rest = &cell[at + label.len()..];
    let rest = rest.strip_prefix(LABEL_COLONS).unwrap_or(rest).trim_start();
    let end = rest
        .find(|ch: char| ch.is_whitespace() || VALUE_TERMINATORS.contains(ch))
        .unwrap_or(rest.len());
    Some(&rest[..end]).filter(|value| !value.is_empty())
}

fn strip_label(fragment: &str, label: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;
    while let Some(at) = rest.find(label) {
        out.push_str(&rest[..at]);
        rest = &rest[at + label.len()..];
        rest = rest.strip_prefix(LABEL_COLONS).unwrap_or(rest);
    }
    out.push_str(rest);
    out.trim().to_string()
}

fn is_step_cell(cell: &str) -> bool {
    cell.chars().next().is_some_and(|ch| ch.is_ascii_digit())
        || cell.chars().count() > STEP_BODY_MIN_CHARS
}

struct RecordScan<'c, 'a> {
    cleaner: &'c CellCleaner<'a>,
    dish: ParsedDish,
    fragments: Vec<String>,
}

impl<'a> RecordScan<'_, 'a> {
    fn rules(&self) -> &'a CleaningRules {
        self.cleaner.rules()
    }

    fn scan_row(&mut self, cells: &[&str]) {
        let labels = &self.rules().labels;

        if self.dish.basic_info.name.is_none() && cells[0].contains(labels.identity_header.as_str())
        {
            self.dish.basic_info.name = cells[1..]
                .iter()
                .find(|cell| !self.rules().contains_field_label(cell))
                .map(|cell| (*cell).to_string());
        }

        for (idx, cell) in cells.iter().enumerate() {
            let next = cells.get(idx + 1).copied();
            self.scan_cell(cell, next);
        }

        let is_process_row = cells[0].contains(labels.process_header.as_str())
            || cells
                .iter()
                .any(|cell| cell.contains(labels.process_steps.as_str()));
        let is_label_free = !cells
            .iter()
            .any(|cell| self.rules().contains_field_label(cell));
        if is_process_row || is_label_free {
            self.collect_steps(cells);
        }
    }

    fn scan_cell(&mut self, cell: &str, next: Option<&str>) {
        let labels = &self.rules().labels;

        if cell == labels.sensory_profile {
            if let Some(value) = self.clean_value(next, FieldContext::SensoryProfile) {
                self.dish.basic_info.sensory_profile = Some(value);
            }
        } else if cell == labels.freshness_window {
            if let Some(value) = self.clean_value(next, FieldContext::FreshnessWindow) {
                self.dish.basic_info.freshness_window = Some(value);
            }
        } else if cell == labels.grade {
            if let Some(value) = self.clean_value(next, FieldContext::Grade) {
                self.dish.basic_info.grade = Some(value);
            }
        } else if cell == labels.ingredients
            && let Some(value) = next
        {
            let ingredients = self.ingredient_entries(value);
            if !ingredients.is_empty() {
                self.dish.basic_info.ingredients = ingredients;
            }
        }

        if self.dish.process.cooking_method.is_some() {
            return;
        }
        let label = labels.cooking_method.as_str();
        let candidate = if cell == label {
            next.filter(|value| !self.rules().is_field_label(value))
        } else if cell.contains(label) {
            embedded_value(cell, label)
        } else {
            None
        };
        if let Some(method) = candidate.and_then(|value| self.cooking_method(value)) {
            self.dish.process.cooking_method = Some(method);
        }
    }

    fn clean_value(&self, value: Option<&str>, context: FieldContext) -> Option<String> {
        let value = self.cleaner.clean(value, context);
        (!value.is_empty()).then_some(value)
    }

    fn cooking_method(&self, value: &str) -> Option<String> {
        let cleaned = self.cleaner.clean(Some(value), FieldContext::CookingMethod);
        let method = self.cleaner.strip_leading_watermark(&cleaned);
        (!method.is_empty() && !self.rules().is_field_label(&method)).then_some(method)
    }

    fn ingredient_entries(&self, value: &str) -> Vec<String> {
        if !self.cleaner.policy().raw_ingredients {
            return split_ingredients(value)
                .iter()
                .map(|entry| self.cleaner.clean(Some(entry.as_str()), FieldContext::None))
                .filter(|entry| !entry.is_empty())
                .collect();
        }

        let mut text = self.cleaner.filter_ingredient_chars(value);
        if self.cleaner.policy().bracket_repair {
            text = repair_brackets(&text);
        }
        split_ingredients(&text)
    }

    fn collect_steps(&mut self, cells: &[&str]) {
        let labels = &self.rules().labels;
        let steps_label = labels.process_steps.as_str();
        let cooking_label = labels.cooking_method.as_str();

        let mut row_steps = Vec::new();
        for &cell in cells {
            let mentions_label = cell.contains(steps_label) || cell.contains(cooking_label);
            if !mentions_label && !is_step_cell(cell) {
                continue;
            }
            let fragment = self.cleaner.clean(Some(cell), FieldContext::ProcessSteps);
            if fragment.is_empty() {
                continue;
            }

            if fragment.contains(steps_label) {
                let steps = strip_label(&fragment, steps_label);
                if !steps.is_empty() {
                    row_steps.push(steps);
                }
            } else if !fragment.contains(cooking_label) {
                row_steps.push(fragment.clone());
            }
            self.fragments.push(fragment);
        }

        if row_steps.is_empty() {
            return;
        }
        let mut joined = row_steps.join(" ");
        if self.cleaner.policy().bracket_repair {
            joined = repair_brackets(&joined);
        }
        match &mut self.dish.process.steps {
            Some(steps) => {
                steps.push(' ');
                steps.push_str(&joined);
            }
            None => self.dish.process.steps = Some(joined),
        }
    }

    fn cooking_method_fallback(&self) -> Option<String> {
        let text = self.fragments.join(" ");
        self.cleaner
            .segmenter()
            .tokenize(&text)
            .into_iter()
            .find(|token| self.rules().is_whitelisted(token))
            .map(ToString::to_string)
    }

    fn finish(mut self) -> ParsedDish {
        if self.dish.process.cooking_method.is_none() {
            self.dish.process.cooking_method = self.cooking_method_fallback();
            if let Some(method) = &self.dish.process.cooking_method {
                debug!(method = %method, "cooking method taken from process text");
            }
        }
        self.dish
    }
}

/// Harvests the identity and process fields of one table.
#[must_use]
pub fn extract_record(table: &LogicalTable, cleaner: &CellCleaner<'_>) -> ParsedDish {
    let mut scan = RecordScan {
        cleaner,
        dish: ParsedDish::default(),
        fragments: Vec::new(),
    };

    for row in &table.rows {
        let cells = row
            .iter()
            .map(String::as_str)
            .filter(|cell| !cell.is_empty())
            .collect::<Vec<_>>();
        if cells.is_empty() {
            continue;
        }
        scan.scan_row(&cells);
    }

    scan.finish()
}
