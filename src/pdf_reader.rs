use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::{BIG5, Encoding, GBK, UTF_16BE};
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::ExtractError;
use crate::table_parse::split_row;
use crate::watermark::is_cjk;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageText {
    pub page_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum PdfInput<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

impl PdfInput<'_> {
    fn load(self) -> Result<Document, ExtractError> {
        Ok(match self {
            Self::Path(path) => Document::load(path)?,
            Self::Bytes(bytes) => Document::load_mem(bytes)?,
        })
    }

    fn extract_whole_text(self) -> Option<String> {
        match self {
            Self::Path(path) => pdf_extract::extract_text(path).ok(),
            Self::Bytes(bytes) => pdf_extract::extract_text_from_mem(bytes).ok(),
        }
    }
}

fn form_feed_pages(text: &str) -> Vec<&str> {
    let text = text.strip_suffix('\u{000C}').unwrap_or(text);
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\u{000C}').collect()
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }

    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();
    let cjk_count = text
        .chars()
        .filter(|ch| is_cjk(*ch) || ('\u{3400}'..='\u{4DBF}').contains(ch))
        .count();
    let ext_a_count = text
        .chars()
        .filter(|ch| ('\u{3400}'..='\u{4DBF}').contains(ch))
        .count();

    replacement * 8 > total
        || control * 5 > total
        || (cjk_count > 20 && ext_a_count * 4 > cjk_count)
}

// font encoding name fragments, tried in order
fn hinted_codecs(font_encoding: &str) -> impl Iterator<Item = &'static Encoding> + '_ {
    [
        (&["utf16", "ucs2", "identity-h", "unicode"][..], UTF_16BE),
        (&["gbk", "gb2312", "gbpc"][..], GBK),
        (&["big5", "b5", "eten", "cns"][..], BIG5),
    ]
    .into_iter()
    .filter(move |(fragments, _)| {
        fragments
            .iter()
            .any(|fragment| font_encoding.contains(fragment))
    })
    .map(|(_, codec)| codec)
}

fn decode_strict(codec: &'static Encoding, bytes: &[u8]) -> Option<String> {
    let (text, had_errors) = codec.decode_without_bom_handling(bytes);
    (!had_errors && !text.is_empty()).then(|| text.into_owned())
}

fn decode_pdf_bytes(font_encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(font_encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if let Some(body) = bytes
        .strip_prefix(&[0xFE, 0xFF])
        .or_else(|| bytes.strip_prefix(&[0xFF, 0xFE]))
        && let Some(text) = decode_strict(UTF_16BE, body)
    {
        return text;
    }

    let hint = font_encoding.map(str::to_ascii_lowercase).unwrap_or_default();
    hinted_codecs(&hint)
        .find_map(|codec| decode_strict(codec, bytes))
        .unwrap_or_else(|| String::from_utf8_lossy(bytes).into_owned())
}

/// Higher is better: many multi-cell lines and CJK content, no mojibake.
fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut multi_cell_lines = 0_i64;
    let mut cjk_lines = 0_i64;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        non_empty_lines += 1;
        if split_row(line).len() >= 2 {
            multi_cell_lines += 1;
        }
        if line.chars().any(is_cjk) {
            cjk_lines += 1;
        }
    }

    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };
    multi_cell_lines * 50 + cjk_lines * 15 + non_empty_lines - broken_penalty
}

/// Lines shown by the text operators of one content stream.
struct ContentText<'d> {
    fonts: BTreeMap<Vec<u8>, &'d str>,
    encoding: Option<&'d str>,
    lines: Vec<String>,
    current: String,
}

impl<'d> ContentText<'d> {
    fn new(fonts: BTreeMap<Vec<u8>, &'d str>) -> Self {
        Self {
            fonts,
            encoding: None,
            lines: Vec::new(),
            current: String::new(),
        }
    }

    fn select_font(&mut self, operand: Option<&Object>) {
        if let Some(name) = operand.and_then(|operand| operand.as_name().ok()) {
            self.encoding = self.fonts.get(name).copied();
        }
    }

    fn show(&mut self, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    let text = decode_pdf_bytes(self.encoding, bytes);
                    self.current.push_str(&text);
                }
                Object::Array(items) => {
                    self.show(items);
                    self.current.push(' ');
                }
                // large negative kerning separates words
                Object::Integer(offset) if *offset < -100 => self.current.push(' '),
                _ => {}
            }
        }
    }

    fn break_line(&mut self) {
        if !self.current.trim().is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
        self.current.clear();
    }

    fn finish(mut self) -> Option<String> {
        self.break_line();
        (!self.lines.is_empty()).then(|| self.lines.join("\n"))
    }
}

fn page_content_text(document: &Document, page_id: ObjectId) -> Option<String> {
    let content = Content::decode(&document.get_page_content(page_id).ok()?).ok()?;
    let fonts = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect();

    let mut text = ContentText::new(fonts);
    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tf" => text.select_font(operation.operands.first()),
            "Tj" | "TJ" | "'" | "\"" => text.show(&operation.operands),
            "T*" | "Td" | "TD" | "ET" => text.break_line(),
            _ => {}
        }
    }
    text.finish()
}

pub(crate) fn read_pdf_pages(input: PdfInput<'_>) -> Result<Vec<PageText>, ExtractError> {
    let document = input.load()?;
    let page_ids = document.get_pages();
    if page_ids.is_empty() {
        return Err(ExtractError::NoPagesSelected);
    }

    let whole_text = input.extract_whole_text().unwrap_or_default();
    let mut whole_pages = form_feed_pages(&whole_text);
    if whole_pages.len() != page_ids.len() {
        debug!(
            split = whole_pages.len(),
            expected = page_ids.len(),
            "whole-document text does not split into pages"
        );
        whole_pages.clear();
    }

    let pages = page_ids
        .iter()
        .enumerate()
        .map(|(index, (&page_number, &page_id))| {
            let candidates = [
                whole_pages.get(index).map(|text| (*text).to_string()),
                page_content_text(&document, page_id),
                document.extract_text(&[page_number]).ok(),
            ];
            let count = candidates.iter().flatten().count();
            let text = candidates
                .into_iter()
                .flatten()
                .filter(|text| !text.trim().is_empty())
                .max_by_key(|text| extraction_quality_score(text))
                .unwrap_or_default();
            debug!(page = page_number, candidates = count, "page text read");
            PageText { page_number, text }
        })
        .collect();
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::{decode_pdf_bytes, extraction_quality_score, form_feed_pages};

    #[test]
    fn splits_form_feed_delimited_pages() {
        assert_eq!(form_feed_pages("p1\u{000C}p2\u{000C}"), vec!["p1", "p2"]);
        assert_eq!(form_feed_pages("p1\u{000C}\u{000C}"), vec!["p1", ""]);
        assert!(form_feed_pages("").is_empty());
    }

    #[test]
    fn decodes_big5_when_encoding_hint_is_present() {
        let (bytes, _, had_errors) = encoding_rs::BIG5.encode("測試");
        assert!(!had_errors);
        let decoded = decode_pdf_bytes(Some("ETen-B5-H"), &bytes);
        assert_eq!(decoded, "測試");
    }

    #[test]
    fn decodes_gbk_when_encoding_hint_is_present() {
        let (bytes, _, had_errors) = encoding_rs::GBK.encode("老鸡汤");
        assert!(!had_errors);
        let decoded = decode_pdf_bytes(Some("GBK-EUC-H"), &bytes);
        assert_eq!(decoded, "老鸡汤");
    }

    #[test]
    fn prefers_tabular_cjk_text() {
        let tabular = "基本信息  老鸡汤\n味型  咸鲜";
        let flat = "basic info";
        assert!(extraction_quality_score(tabular) > extraction_quality_score(flat));
    }
}
