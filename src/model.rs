use serde::{Deserialize, Serialize};

pub type RawCell = Option<String>;
pub type RawRow = Vec<RawCell>;
pub type RawGrid = Vec<RawRow>;

pub type CleanedRow = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldContext {
    #[default]
    None,
    SensoryProfile,
    FreshnessWindow,
    Grade,
    CookingMethod,
    Ingredients,
    ProcessSteps,
}

impl FieldContext {
    #[must_use]
    pub const fn keeps_watermark(self) -> bool {
        matches!(self, Self::Ingredients)
    }

    #[must_use]
    pub const fn accepts_single_char(self) -> bool {
        matches!(self, Self::CookingMethod | Self::SensoryProfile)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalTable {
    pub rows: Vec<CleanedRow>,
    /// Page on which the first row appeared.
    pub start_page: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicInfo {
    #[serde(rename = "品名", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "味型", default, skip_serializing_if = "Option::is_none")]
    pub sensory_profile: Option<String>,
    #[serde(rename = "最佳风味期", default, skip_serializing_if = "Option::is_none")]
    pub freshness_window: Option<String>,
    #[serde(rename = "加工等级", default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(rename = "配料", default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitchenProcess {
    #[serde(rename = "烹饪方式", default, skip_serializing_if = "Option::is_none")]
    pub cooking_method: Option<String>,
    #[serde(rename = "制作工艺", default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDish {
    pub basic_info: BasicInfo,
    pub process: KitchenProcess,
}

impl ParsedDish {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.basic_info
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishRecord {
    #[serde(rename = "基本信息")]
    pub basic_info: BasicInfo,
    #[serde(rename = "餐厅操作工艺")]
    pub process: KitchenProcess,
    #[serde(rename = "图片")]
    pub image: String,
    #[serde(rename = "类别")]
    pub category: String,
}

impl DishRecord {
    #[must_use]
    pub fn new(parsed: ParsedDish, category: String, image: String) -> Self {
        Self {
            basic_info: parsed.basic_info,
            process: parsed.process,
            image,
            category,
        }
    }
}
