use std::str::FromStr;

use crate::options::{ImagePathOptions, LabelKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub display: String,
    pub machine: String,
}

impl Category {
    #[must_use]
    pub fn new(display: impl Into<String>, machine: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            machine: machine.into(),
        }
    }

    #[must_use]
    pub fn label(&self, kind: LabelKind) -> &str {
        match kind {
            LabelKind::Machine => &self.machine,
            LabelKind::Display => &self.display,
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (display, machine) = text
            .split_once(':')
            .ok_or_else(|| format!("invalid category '{text}', expected display:machine"))?;
        let display = display.trim();
        let machine = machine.trim();
        if display.is_empty() || machine.is_empty() {
            return Err(format!(
                "invalid category '{text}', both labels must be non-empty"
            ));
        }
        Ok(Self::new(display, machine))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRange {
    pub start: u32,
    pub end: u32,
    pub category: Category,
}

impl CategoryRange {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

impl FromStr for CategoryRange {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (range, category) = text.split_once(':').ok_or_else(|| {
            format!("invalid category range '{text}', expected start-end:display:machine")
        })?;
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| format!("invalid category range '{range}', expected start-end"))?;
        let start: u32 = start
            .trim()
            .parse()
            .map_err(|_| format!("invalid category range start: '{start}'"))?;
        let end: u32 = end
            .trim()
            .parse()
            .map_err(|_| format!("invalid category range end: '{end}'"))?;
        if start == 0 {
            return Err("pages are 1-based".to_string());
        }
        if end < start {
            return Err(format!(
                "invalid category range '{range}': end is smaller than start"
            ));
        }

        Ok(Self {
            start,
            end,
            category: category.parse()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    ranges: Vec<CategoryRange>,
    default: Category,
}

impl CategoryTable {
    #[must_use]
    pub fn new(ranges: Vec<CategoryRange>, default: Category) -> Self {
        Self { ranges, default }
    }

    #[must_use]
    pub fn ranges(&self) -> &[CategoryRange] {
        &self.ranges
    }

    #[must_use]
    pub fn category_for(&self, page: u32) -> &Category {
        self.ranges
            .iter()
            .find(|range| range.contains(page))
            .map_or(&self.default, |range| &range.category)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let range = |start, end, display, machine| CategoryRange {
            start,
            end,
            category: Category::new(display, machine),
        };
        Self {
            ranges: vec![
                range(14, 138, "正餐菜品", "main"),
                range(139, 150, "炸品", "fried"),
                range(151, 186, "主食", "staple"),
                range(187, 207, "早餐", "breakfast"),
                range(208, 210, "饮品", "beverage"),
            ],
            default: Category::new("其他", "other"),
        }
    }
}

/// `<base_dir>/<label>_page_<page>_img.<extension>`
#[must_use]
pub fn image_path(options: &ImagePathOptions, category: &Category, page: u32) -> String {
    let base_dir = options.base_dir.trim_end_matches('/');
    let label = category.label(options.label);
    let extension = options.extension.trim_start_matches('.');
    if base_dir.is_empty() {
        format!("{label}_page_{page}_img.{extension}")
    } else {
        format!("{base_dir}/{label}_page_{page}_img.{extension}")
    }
}
