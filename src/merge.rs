use std::num::NonZeroU32;

use tracing::debug;

use crate::clean_cell::CellCleaner;
use crate::model::{CleanedRow, FieldContext, LogicalTable, RawGrid, RawRow};
use crate::rules::CleaningRules;

const SHORT_CELL_CHARS: usize = 3;
const INGREDIENT_MARKERS: [char; 4] = ['、', '，', '（', '）'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    /// Largest allowed difference in non-empty cell counts between the last
    /// row of a table and the first row of the next page. `None` accepts any
    /// label-free first row as a continuation.
    pub column_tolerance: Option<usize>,
    pub detect_cell_roles: bool,
}

impl MergePolicy {
    pub const REFINED: Self = Self {
        column_tolerance: Some(1),
        detect_cell_roles: true,
    };
    pub const LEGACY: Self = Self {
        column_tolerance: None,
        detect_cell_roles: false,
    };
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::REFINED
    }
}

pub(crate) fn cell_context(rules: &CleaningRules, row_text: &str, cell: &str) -> FieldContext {
    let labels = &rules.labels;
    let ingredients_label = labels.ingredients.as_str();

    let mut is_ingredient = if cell.contains(ingredients_label) {
        true
    } else if row_text.contains(ingredients_label) {
        cell.contains(INGREDIENT_MARKERS) || cell.chars().count() > SHORT_CELL_CHARS
    } else {
        false
    };

    if !is_ingredient
        && cell.chars().any(|ch| rules.ingredient_glyphs.contains(&ch))
        && !rules.contains_field_label(cell)
    {
        is_ingredient = true;
    }

    let identity_header = labels.identity_header.as_str();
    let is_name = !is_ingredient
        && row_text.contains(identity_header)
        && !cell.contains(identity_header)
        && !rules.contains_field_label(cell);

    // names keep their watermark glyphs like ingredient text does
    if is_ingredient || is_name {
        FieldContext::Ingredients
    } else {
        FieldContext::None
    }
}

fn non_empty_count(row: &[String]) -> usize {
    row.iter().filter(|cell| !cell.is_empty()).count()
}

/// Stitches per-page grids into logical tables.
///
/// Pages must be pushed in increasing order: whether a page continues the
/// current table depends on the last row of the page before it.
pub struct TableMerger<'c, 'a> {
    cleaner: &'c CellCleaner<'a>,
    policy: MergePolicy,
    current: Vec<CleanedRow>,
    current_start_page: Option<NonZeroU32>,
    finalized: Vec<LogicalTable>,
    orphaned: usize,
}

impl<'c, 'a> TableMerger<'c, 'a> {
    #[must_use]
    pub fn new(cleaner: &'c CellCleaner<'a>, policy: MergePolicy) -> Self {
        Self {
            cleaner,
            policy,
            current: Vec::new(),
            current_start_page: None,
            finalized: Vec::new(),
            orphaned: 0,
        }
    }

    pub fn push_page(&mut self, page_number: u32, grid: Option<&RawGrid>) {
        let Some(grid) = grid.filter(|grid| !grid.is_empty()) else {
            debug!(page = page_number, "no table on page");
            self.finalize_current();
            return;
        };

        let rows = self.clean_rows(grid);
        if self.is_continuation(&rows) {
            debug!(
                page = page_number,
                rows = rows.len(),
                start_page = self.current_start_page.map(NonZeroU32::get),
                "page continues the current table"
            );
            self.current.extend(rows);
            return;
        }

        self.finalize_current();
        debug!(page = page_number, rows = rows.len(), "new table starts");
        self.current = rows;
        self.current_start_page = NonZeroU32::new(page_number);
    }

    /// Tables completed so far. Safe to read after aborting a scan at any
    /// page boundary; the in-flight table is not included.
    #[must_use]
    pub fn finalized(&self) -> &[LogicalTable] {
        &self.finalized
    }

    #[must_use]
    pub fn orphaned(&self) -> usize {
        self.orphaned
    }

    #[must_use]
    pub fn finish(mut self) -> (Vec<LogicalTable>, usize) {
        self.finalize_current();
        (self.finalized, self.orphaned)
    }

    fn finalize_current(&mut self) {
        let rows = std::mem::take(&mut self.current);
        let start_page = self.current_start_page.take();
        if rows.is_empty() {
            return;
        }

        match start_page {
            Some(start_page) => self.finalized.push(LogicalTable {
                rows,
                start_page: start_page.get(),
            }),
            None => {
                debug!(rows = rows.len(), "dropping table without a start page");
                self.orphaned += 1;
            }
        }
    }

    fn clean_rows(&self, grid: &RawGrid) -> Vec<CleanedRow> {
        grid.iter()
            .map(|row| self.clean_row(row))
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect()
    }

    fn clean_row(&self, row: &RawRow) -> CleanedRow {
        let rules = self.cleaner.rules();
        let row_text = row
            .iter()
            .map(|cell| cell.as_deref().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ");

        row.iter()
            .map(|cell| match cell.as_deref() {
                Some(text) if !text.is_empty() => {
                    let context = if self.policy.detect_cell_roles {
                        cell_context(rules, &row_text, text)
                    } else {
                        FieldContext::None
                    };
                    self.cleaner.clean(Some(text), context)
                }
                _ => String::new(),
            })
            .collect()
    }

    fn is_continuation(&self, rows: &[CleanedRow]) -> bool {
        let (Some(last), Some(first)) = (self.current.last(), rows.first()) else {
            return false;
        };
        if self.cleaner.rules().contains_field_label(&first.concat()) {
            return false;
        }
        self.policy
            .column_tolerance
            .is_none_or(|tolerance| {
                non_empty_count(last).abs_diff(non_empty_count(first)) <= tolerance
            })
    }
}

pub fn merge_pages<I>(
    cleaner: &CellCleaner<'_>,
    policy: MergePolicy,
    pages: I,
) -> (Vec<LogicalTable>, usize)
where
    I: IntoIterator<Item = (u32, Option<RawGrid>)>,
{
    let mut merger = TableMerger::new(cleaner, policy);
    for (page_number, grid) in pages {
        merger.push_page(page_number, grid.as_ref());
    }
    merger.finish()
}
