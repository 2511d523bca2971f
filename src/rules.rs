use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

const WATERMARK_CHARS: &str = "告报源溯品鸡乡老菜验证合格";
const SINGLE_CHAR_WHITELIST: &str = "炒蒸煮炸烤炖焖烩拌卤腌煎焗咸鲜甜辣酸麻淡冷热";
const INGREDIENT_GLYPHS: &str = "菜鸡汤油肉盐";
const FIELD_LABELS: [&str; 15] = [
    "基本信息",
    "品名",
    "味型",
    "最佳风味期",
    "加工等级",
    "配料",
    "原料来源",
    "原料加工",
    "原料配送",
    "配送方式",
    "配送周期",
    "餐厅操作工艺",
    "烹饪方式",
    "制作工艺",
    "操作工艺",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLabels {
    pub identity_header: String,
    pub name: String,
    pub sensory_profile: String,
    pub freshness_window: String,
    pub grade: String,
    pub ingredients: String,
    pub process_header: String,
    pub cooking_method: String,
    pub process_steps: String,
}

impl Default for FieldLabels {
    fn default() -> Self {
        Self {
            identity_header: "基本信息".to_string(),
            name: "品名".to_string(),
            sensory_profile: "味型".to_string(),
            freshness_window: "最佳风味期".to_string(),
            grade: "加工等级".to_string(),
            ingredients: "配料".to_string(),
            process_header: "餐厅操作工艺".to_string(),
            cooking_method: "烹饪方式".to_string(),
            process_steps: "制作工艺".to_string(),
        }
    }
}

impl FieldLabels {
    fn roles(&self) -> [&str; 9] {
        [
            &self.identity_header,
            &self.name,
            &self.sensory_profile,
            &self.freshness_window,
            &self.grade,
            &self.ingredients,
            &self.process_header,
            &self.cooking_method,
            &self.process_steps,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningRules {
    pub watermark_chars: BTreeSet<char>,
    pub single_char_whitelist: BTreeSet<char>,
    pub field_labels: Vec<String>,
    /// Glyphs that mark a cell as ingredient text during merging.
    pub ingredient_glyphs: BTreeSet<char>,
    pub labels: FieldLabels,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            watermark_chars: WATERMARK_CHARS.chars().collect(),
            single_char_whitelist: SINGLE_CHAR_WHITELIST.chars().collect(),
            field_labels: FIELD_LABELS.iter().map(ToString::to_string).collect(),
            ingredient_glyphs: INGREDIENT_GLYPHS.chars().collect(),
            labels: FieldLabels::default(),
        }
    }
}

impl CleaningRules {
    pub fn from_json_path(path: &Path) -> Result<Self, ExtractError> {
        let text = std::fs::read_to_string(path)?;
        let rules: Self = serde_json::from_str(&text)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.watermark_chars.is_empty() {
            return Err(ExtractError::InvalidRules(
                "watermark_chars must not be empty".to_string(),
            ));
        }
        if let Some(role) = self.labels.roles().iter().find(|label| label.is_empty()) {
            return Err(ExtractError::InvalidRules(format!(
                "role label '{role}' must not be empty"
            )));
        }
        if self.field_labels.iter().any(String::is_empty) {
            return Err(ExtractError::InvalidRules(
                "field_labels must not contain empty labels".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_watermark(&self, ch: char) -> bool {
        self.watermark_chars.contains(&ch)
    }

    #[must_use]
    pub fn is_all_watermark(&self, text: &str) -> bool {
        text.chars().all(|ch| self.is_watermark(ch))
    }

    #[must_use]
    pub fn is_whitelisted(&self, text: &str) -> bool {
        let mut chars = text.chars();
        matches!(
            (chars.next(), chars.next()),
            (Some(ch), None) if self.single_char_whitelist.contains(&ch)
        )
    }

    #[must_use]
    pub fn is_field_label(&self, text: &str) -> bool {
        self.field_labels.iter().any(|label| label == text)
    }

    #[must_use]
    pub fn contains_field_label(&self, text: &str) -> bool {
        self.field_labels
            .iter()
            .any(|label| text.contains(label.as_str()))
    }

    /// Longest field label contained in `text`; ties go to the earlier label.
    #[must_use]
    pub fn find_field_label(&self, text: &str) -> Option<&str> {
        let mut best: Option<&str> = None;
        for label in &self.field_labels {
            if text.contains(label.as_str())
                && best.is_none_or(|current| label.chars().count() > current.chars().count())
            {
                best = Some(label);
            }
        }
        best
    }

    pub(crate) fn watermark_class(&self) -> String {
        let body = self
            .watermark_chars
            .iter()
            .map(|ch| regex::escape(ch.encode_utf8(&mut [0; 4])))
            .collect::<String>();
        format!("[{body}]")
    }
}

#[cfg(test)]
mod tests {
    use super::CleaningRules;

    #[test]
    fn default_rules_validate() {
        let rules = CleaningRules::default();
        assert!(rules.validate().is_ok());
        assert!(rules.is_watermark('鸡'));
        assert!(!rules.is_watermark('汤'));
    }

    #[test]
    fn prefers_longest_contained_label() {
        let rules = CleaningRules::default();
        assert_eq!(rules.find_field_label("餐厅操作工艺"), Some("餐厅操作工艺"));
        assert_eq!(rules.find_field_label("制作工艺1.下锅"), Some("制作工艺"));
        assert_eq!(rules.find_field_label("老鸡汤"), None);
    }

    #[test]
    fn whitelist_matches_single_characters_only() {
        let rules = CleaningRules::default();
        assert!(rules.is_whitelisted("炒"));
        assert!(!rules.is_whitelisted("炒菜"));
        assert!(!rules.is_whitelisted(""));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let rules: CleaningRules =
            serde_json::from_str(r#"{"watermark_chars": ["印"]}"#).expect("rules should parse");
        assert!(rules.is_watermark('印'));
        assert!(!rules.is_watermark('鸡'));
        assert_eq!(rules.labels.ingredients, "配料");
        assert!(rules.is_field_label("烹饪方式"));
    }

    #[test]
    fn rejects_empty_watermark_set() {
        let rules: CleaningRules =
            serde_json::from_str(r#"{"watermark_chars": []}"#).expect("rules should parse");
        assert!(rules.validate().is_err());
    }

    #[test]
    fn watermark_class_compiles() {
        let class = CleaningRules::default().watermark_class();
        let pattern = regex::Regex::new(&class).expect("class should compile");
        assert!(pattern.is_match("老"));
        assert!(!pattern.is_match("汤"));
    }
}
