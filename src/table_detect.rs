use std::path::Path;

use tracing::debug;

use crate::error::ExtractError;
use crate::grid_source::GridSource;
use crate::model::{RawGrid, RawRow};
use crate::pdf_reader::{PageText, PdfInput, read_pdf_pages};
use crate::table_parse::split_row;

const MIN_TABLE_COLS: usize = 2;
const MIN_TABLE_LINES: usize = 2;

pub(crate) fn detect_grid(text: &str) -> Option<RawGrid> {
    let rows = text
        .lines()
        .map(split_row)
        .filter(|cells| !cells.is_empty())
        .collect::<Vec<_>>();

    let multi_cell_lines = rows
        .iter()
        .filter(|cells| cells.len() >= MIN_TABLE_COLS)
        .count();
    if multi_cell_lines < MIN_TABLE_LINES {
        return None;
    }

    let first = rows
        .iter()
        .position(|cells| cells.len() >= MIN_TABLE_COLS)?;
    Some(
        rows.into_iter()
            .skip(first)
            .map(|cells| cells.into_iter().map(Some).collect::<RawRow>())
            .collect(),
    )
}

#[derive(Debug, Clone)]
pub struct PdfGridSource {
    pages: Vec<PageText>,
}

impl PdfGridSource {
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        Self::read(PdfInput::Path(path))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExtractError> {
        Self::read(PdfInput::Bytes(bytes))
    }

    fn read(input: PdfInput<'_>) -> Result<Self, ExtractError> {
        let pages = read_pdf_pages(input)?;
        debug!(pages = pages.len(), "PDF text loaded");
        Ok(Self { pages })
    }
}

impl GridSource for PdfGridSource {
    fn page_count(&self) -> u32 {
        self.pages
            .iter()
            .map(|page| page.page_number)
            .max()
            .unwrap_or_default()
    }

    fn raw_grid(&self, page_number: u32) -> Result<Option<RawGrid>, ExtractError> {
        Ok(self
            .pages
            .iter()
            .find(|page| page.page_number == page_number)
            .and_then(|page| detect_grid(&page.text)))
    }
}
