use std::ops::RangeInclusive;
use std::str::FromStr;

use tracing::warn;

use crate::category::CategoryTable;
use crate::clean_cell::CleanPolicy;
use crate::error::ExtractError;
use crate::merge::MergePolicy;
use crate::warning::{ExtractWarning, WarningCode};

/// Scan bounds, 1-based and inclusive. An open end runs to the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl Default for PageRange {
    fn default() -> Self {
        Self {
            start: 14,
            end: Some(210),
        }
    }
}

impl PageRange {
    #[must_use]
    pub const fn all() -> Self {
        Self {
            start: 1,
            end: None,
        }
    }

    pub fn resolve(
        &self,
        page_count: u32,
        warnings: &mut Vec<ExtractWarning>,
    ) -> Result<RangeInclusive<u32>, ExtractError> {
        if page_count == 0 {
            return Err(ExtractError::NoPagesSelected);
        }

        let mut start = self.start;
        if start < 1 {
            warn!(start, "scan start raised to page 1");
            warnings.push(
                ExtractWarning::new(WarningCode::PageOutOfRange, "scan start raised to page 1")
                    .with_page(1),
            );
            start = 1;
        }
        if start > page_count {
            return Err(ExtractError::InvalidPageRange(format!(
                "start page {start} is beyond the last page {page_count}"
            )));
        }

        let end = match self.end {
            Some(end) if end > page_count => {
                warn!(end, page_count, "scan end clamped to the last page");
                warnings.push(
                    ExtractWarning::new(
                        WarningCode::PageOutOfRange,
                        format!("scan end {end} clamped to the last page {page_count}"),
                    )
                    .with_page(page_count),
                );
                page_count
            }
            Some(end) => end,
            None => page_count,
        };

        if end < start {
            warn!(start, end, "scan range reversed; swapping bounds");
            warnings.push(ExtractWarning::new(
                WarningCode::PageOutOfRange,
                format!("scan range {start}-{end} reversed; swapped"),
            ));
            return Ok(end.max(1)..=start);
        }

        Ok(start..=end)
    }
}

impl FromStr for PageRange {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let parse = |value: &str, what: &str| {
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid page range {what}: '{value}'"))
        };

        match text.split_once('-') {
            Some((start, end)) => {
                let start = parse(start, "start")?;
                let end = if end.trim().is_empty() {
                    None
                } else {
                    Some(parse(end, "end")?)
                };
                Ok(Self { start, end })
            }
            None if text.is_empty() => Err("page range cannot be empty".to_string()),
            None => {
                let page = parse(text, "page")?;
                Ok(Self {
                    start: page,
                    end: Some(page),
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelKind {
    #[default]
    Machine,
    Display,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePathOptions {
    pub base_dir: String,
    pub extension: String,
    pub label: LabelKind,
}

impl Default for ImagePathOptions {
    fn default() -> Self {
        Self {
            base_dir: "./images".to_string(),
            extension: "png".to_string(),
            label: LabelKind::Machine,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Refined,
    Legacy,
}

impl Profile {
    #[must_use]
    pub const fn clean_policy(self) -> CleanPolicy {
        match self {
            Self::Refined => CleanPolicy::REFINED,
            Self::Legacy => CleanPolicy::LEGACY,
        }
    }

    #[must_use]
    pub const fn merge_policy(self) -> MergePolicy {
        match self {
            Self::Refined => MergePolicy::REFINED,
            Self::Legacy => MergePolicy::LEGACY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown output format '{other}', expected json or csv")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractOptions {
    pub pages: PageRange,
    pub categories: CategoryTable,
    pub image_paths: ImagePathOptions,
    pub profile: Profile,
    pub format: OutputFormat,
}
