mod brackets;
mod category;
mod clean_cell;
mod error;
mod grid_source;
mod merge;
mod model;
mod options;
mod output;
mod pdf_reader;
mod record;
mod rules;
mod segment;
mod table_detect;
mod table_parse;
#[cfg(test)]
mod test_inputs;
mod warning;
mod watermark;

use std::path::Path;

use tracing::{info, warn};

use crate::category::image_path;
use crate::output::{records_to_string, write_records};
use crate::warning::WarningCode;

pub use brackets::repair_brackets;
pub use category::{Category, CategoryRange, CategoryTable};
pub use clean_cell::{CellCleaner, CleanPolicy};
pub use error::ExtractError;
pub use grid_source::{GridPages, GridSource};
pub use merge::{MergePolicy, TableMerger, merge_pages};
pub use model::{
    BasicInfo, CleanedRow, DishRecord, FieldContext, KitchenProcess, LogicalTable, ParsedDish,
    RawCell, RawGrid, RawRow,
};
pub use options::{ExtractOptions, ImagePathOptions, LabelKind, OutputFormat, PageRange, Profile};
pub use record::{extract_record, split_ingredients};
pub use rules::{CleaningRules, FieldLabels};
#[cfg(feature = "jieba")]
pub use segment::JiebaSegmenter;
pub use segment::{DictionarySegmenter, Segmenter};
pub use table_detect::PdfGridSource;
pub use warning::{ExtractWarning, WarningCode as ExtractWarningCode};
pub use watermark::{KeepReason, Verdict};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionReport {
    pub accepted: usize,
    pub dropped: usize,
    pub table_count: usize,
    pub warnings: Vec<ExtractWarning>,
}

/// Scans the selected pages of `source` and builds one record per named
/// logical table.
pub fn extract_dishes(
    source: &dyn GridSource,
    options: &ExtractOptions,
    rules: &CleaningRules,
    segmenter: &dyn Segmenter,
) -> Result<(Vec<DishRecord>, ExtractionReport), ExtractError> {
    let cleaner = CellCleaner::new(rules, segmenter, options.profile.clean_policy())?;
    let mut warnings = Vec::new();
    let pages = options.pages.resolve(source.page_count(), &mut warnings)?;
    info!(
        start = pages.start(),
        end = pages.end(),
        profile = ?options.profile,
        "scanning pages"
    );

    let mut merger = TableMerger::new(&cleaner, options.profile.merge_policy());
    for page_number in pages {
        let grid = source.raw_grid(page_number)?;
        merger.push_page(page_number, grid.as_ref());
    }
    let (tables, orphaned) = merger.finish();
    info!(tables = tables.len(), "logical tables merged");

    if orphaned > 0 {
        warnings.push(ExtractWarning::new(
            WarningCode::MissingStartPage,
            format!("{orphaned} table(s) without a start page were skipped"),
        ));
    }
    if tables.is_empty() {
        warnings.push(ExtractWarning::new(
            WarningCode::NoTablesDetected,
            "no tables were detected in the selected pages",
        ));
    }

    let mut records = Vec::new();
    let mut dropped = 0;
    for (index, table) in tables.iter().enumerate() {
        let parsed = extract_record(table, &cleaner);
        let Some(name) = parsed.name().map(str::to_string) else {
            dropped += 1;
            warn!(
                table = index + 1,
                page = table.start_page,
                "table has no dish name; dropped"
            );
            warnings.push(
                ExtractWarning::new(WarningCode::UnnamedTableDropped, "table has no dish name")
                    .with_page(table.start_page)
                    .with_table_index(index + 1),
            );
            continue;
        };

        let category = options.categories.category_for(table.start_page);
        let image = image_path(&options.image_paths, category, table.start_page);
        info!(
            table = index + 1,
            name = %name,
            category = %category.display,
            image = %image,
            "record accepted"
        );
        records.push(DishRecord::new(parsed, category.display.clone(), image));
    }

    let report = ExtractionReport {
        accepted: records.len(),
        dropped,
        table_count: tables.len(),
        warnings,
    };
    Ok((records, report))
}

pub fn extract_to_file(
    source: &dyn GridSource,
    output: &Path,
    options: &ExtractOptions,
    rules: &CleaningRules,
    segmenter: &dyn Segmenter,
) -> Result<ExtractionReport, ExtractError> {
    let (records, report) = extract_dishes(source, options, rules, segmenter)?;
    write_records(output, &records, options.format)?;
    Ok(report)
}

pub fn extract_pdf_to_file(
    input_pdf: &Path,
    output: &Path,
    options: &ExtractOptions,
    rules: &CleaningRules,
    segmenter: &dyn Segmenter,
) -> Result<ExtractionReport, ExtractError> {
    let source = PdfGridSource::open(input_pdf)?;
    extract_to_file(&source, output, options, rules, segmenter)
}

pub fn extract_pdf_bytes_to_string(
    input_pdf: &[u8],
    options: &ExtractOptions,
    rules: &CleaningRules,
    segmenter: &dyn Segmenter,
) -> Result<(String, ExtractionReport), ExtractError> {
    let source = PdfGridSource::from_bytes(input_pdf)?;
    let (records, report) = extract_dishes(&source, options, rules, segmenter)?;
    Ok((records_to_string(&records, options.format)?, report))
}
