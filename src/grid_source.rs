use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ExtractError;
use crate::model::RawGrid;

/// Yields the raw table grid of each page.
pub trait GridSource {
    fn page_count(&self) -> u32;

    fn raw_grid(&self, page_number: u32) -> Result<Option<RawGrid>, ExtractError>;
}

#[derive(Debug, Deserialize)]
struct PageGrid {
    page: u32,
    rows: RawGrid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridPages {
    pages: BTreeMap<u32, RawGrid>,
    page_count: u32,
}

impl GridPages {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page_number: u32, grid: RawGrid) {
        self.page_count = self.page_count.max(page_number);
        self.pages.insert(page_number, grid);
    }

    #[must_use]
    pub fn with_page_count(mut self, page_count: u32) -> Self {
        self.page_count = self.page_count.max(page_count);
        self
    }

    /// Parses `[{"page": n, "rows": [[cell | null, ...], ...]}, ...]`.
    pub fn from_json_str(text: &str) -> Result<Self, ExtractError> {
        let entries: Vec<PageGrid> = serde_json::from_str(text)?;
        let mut pages = Self::new();
        for entry in entries {
            if entry.page == 0 {
                return Err(ExtractError::InvalidPageRange(
                    "grid pages are 1-based".to_string(),
                ));
            }
            pages.insert(entry.page, entry.rows);
        }
        Ok(pages)
    }

    pub fn from_json_path(path: &Path) -> Result<Self, ExtractError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }
}

impl<const N: usize> From<[(u32, RawGrid); N]> for GridPages {
    fn from(entries: [(u32, RawGrid); N]) -> Self {
        let mut pages = Self::new();
        for (page_number, grid) in entries {
            pages.insert(page_number, grid);
        }
        pages
    }
}

impl GridSource for GridPages {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn raw_grid(&self, page_number: u32) -> Result<Option<RawGrid>, ExtractError> {
        Ok(self
            .pages
            .get(&page_number)
            .filter(|grid| !grid.is_empty())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::{GridPages, GridSource};

    #[test]
    fn parses_json_grids_with_null_cells() {
        let pages = GridPages::from_json_str(
            r#"[{"page": 2, "rows": [["基本信息", null, "老鸡汤"]]}, {"page": 4, "rows": []}]"#,
        )
        .expect("grids should parse");

        assert_eq!(pages.page_count(), 4);
        let grid = pages
            .raw_grid(2)
            .expect("lookup should succeed")
            .expect("page 2 has a grid");
        assert_eq!(grid[0][1], None);
        assert_eq!(grid[0][2].as_deref(), Some("老鸡汤"));
        assert_eq!(pages.raw_grid(3).expect("lookup should succeed"), None);
        assert_eq!(pages.raw_grid(4).expect("lookup should succeed"), None);
    }

    #[test]
    fn rejects_page_zero() {
        assert!(GridPages::from_json_str(r#"[{"page": 0, "rows": []}]"#).is_err());
    }

    #[test]
    fn declared_page_count_extends_the_document() {
        let pages = GridPages::from([(1, Vec::new())]).with_page_count(5);
        assert_eq!(pages.page_count(), 5);
    }
}
