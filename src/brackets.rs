const OPEN: char = '（';
const CLOSE: char = '）';
const SEPARATORS: [char; 2] = ['，', '；'];

pub fn repair_brackets(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut chars = text.chars().collect::<Vec<_>>();
    repair_quantity_closers(&mut chars);
    repair_trailing_closers(&mut chars);
    let chars = drop_stray_closers(&chars);
    close_unmatched_openers(chars).into_iter().collect()
}

fn closes_before_next_open(chars: &[char], from: usize) -> bool {
    chars
        .iter()
        .skip(from)
        .take_while(|ch| **ch != OPEN)
        .any(|ch| *ch == CLOSE)
}

fn run_end(chars: &[char], from: usize, keep: impl Fn(char) -> bool) -> usize {
    chars[from..]
        .iter()
        .position(|ch| !keep(*ch))
        .map_or(chars.len(), |offset| from + offset)
}

fn number_end(chars: &[char], from: usize) -> usize {
    let int_end = run_end(chars, from, |ch| ch.is_ascii_digit());
    if int_end > from
        && chars.get(int_end) == Some(&'.')
        && chars.get(int_end + 1).is_some_and(char::is_ascii_digit)
    {
        return run_end(chars, int_end + 1, |ch| ch.is_ascii_digit());
    }
    int_end
}

/// `（<number><letters><sep>` → `（<number><letters>）`
fn repair_quantity_closers(chars: &mut [char]) {
    for open in 0..chars.len() {
        if chars[open] != OPEN {
            continue;
        }
        let digits_end = number_end(chars, open + 1);
        if digits_end == open + 1 {
            continue;
        }
        let unit_end = run_end(chars, digits_end, |ch| ch.is_ascii_alphabetic());
        if unit_end < chars.len()
            && SEPARATORS.contains(&chars[unit_end])
            && !closes_before_next_open(chars, unit_end + 1)
        {
            chars[unit_end] = CLOSE;
        }
    }
}

/// `（<content><sep>` at a whitespace or string boundary → `（<content>）`
fn repair_trailing_closers(chars: &mut [char]) {
    for open in 0..chars.len() {
        if chars[open] != OPEN {
            continue;
        }
        let separator = (open + 2..chars.len())
            .take_while(|&index| !matches!(chars[index], OPEN | CLOSE))
            .find(|&index| {
                SEPARATORS.contains(&chars[index])
                    && chars.get(index + 1).is_none_or(|next| next.is_whitespace())
            });
        if let Some(index) = separator
            && chars[open + 1] != CLOSE
            && !closes_before_next_open(chars, index + 1)
        {
            chars[index] = CLOSE;
        }
    }
}

fn drop_stray_closers(chars: &[char]) -> Vec<char> {
    let mut depth = 0_usize;
    let mut out = Vec::with_capacity(chars.len());
    for &ch in chars {
        match ch {
            OPEN => depth += 1,
            CLOSE if depth == 0 => continue,
            CLOSE => depth -= 1,
            _ => {}
        }
        out.push(ch);
    }
    out
}

fn close_unmatched_openers(mut chars: Vec<char>) -> Vec<char> {
    let mut unmatched = Vec::new();
    for (index, ch) in chars.iter().enumerate() {
        match ch {
            &OPEN => unmatched.push(index),
            &CLOSE => {
                unmatched.pop();
            }
            _ => {}
        }
    }

    for open in unmatched.into_iter().rev() {
        let insert_at = token_end_after(&chars, open + 1).unwrap_or(chars.len());
        chars.insert(insert_at, CLOSE);
    }
    chars
}

fn token_end_after(chars: &[char], from: usize) -> Option<usize> {
    let start = from + chars[from..].iter().position(char::is_ascii_alphanumeric)?;
    let end = if chars[start].is_ascii_digit() {
        let digits_end = number_end(chars, start);
        run_end(chars, digits_end, |ch| ch.is_ascii_alphabetic())
    } else {
        let letters_end = run_end(chars, start, |ch| ch.is_ascii_alphabetic());
        run_end(chars, letters_end, |ch| ch.is_ascii_digit())
    };
    Some(end)
}
