const SENTENCE_ENDINGS: [char; 5] = ['.', '!', '?', '。', '！'];
const MAX_SOFT_CELLS: usize = 6;

/// Splits on tabs and on runs of two or more spaces.
pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut whitespace_run = 0_usize;

    for ch in trimmed.chars() {
        if ch == '\t' {
            if !current.trim().is_empty() {
                cells.push(current.trim().to_string());
                current.clear();
            }
            whitespace_run = 0;
            continue;
        }

        if ch.is_whitespace() {
            whitespace_run += 1;
            if whitespace_run >= 2 {
                if !current.trim().is_empty() {
                    cells.push(current.trim().to_string());
                    current.clear();
                }
                continue;
            }
            current.push(' ');
            continue;
        }

        whitespace_run = 0;
        current.push(ch);
    }

    if !current.trim().is_empty() {
        cells.push(current.trim().to_string());
    }

    cells
}

pub(crate) fn soft_split_line_into_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Cells of one rendered line.
pub(crate) fn split_row(line: &str) -> Vec<String> {
    let cells = split_line_into_cells(line);
    if cells.len() >= 2 {
        return cells;
    }

    let soft_cells = soft_split_line_into_cells(line);
    let looks_like_sentence = line.trim_end().ends_with(SENTENCE_ENDINGS);
    if soft_cells.len() >= 2 && soft_cells.len() <= MAX_SOFT_CELLS && !looks_like_sentence {
        soft_cells
    } else {
        cells
    }
}
