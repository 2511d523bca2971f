use crate::model::FieldContext;
use crate::rules::CleaningRules;
use crate::segment::Segmenter;

const STRUCTURAL_PUNCT: &str = "，。、；：（）【】";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    NotWatermark,
    ContentField,
    NumericLiteral,
    NeighborWord,
    InsideToken,
    WhitelistedValue,
    StructuralNeighbor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep(KeepReason),
    Drop,
}

impl Verdict {
    #[must_use]
    pub const fn is_keep(self) -> bool {
        matches!(self, Self::Keep(_))
    }
}

pub(crate) fn is_cjk(ch: char) -> bool {
    ('\u{4E00}'..='\u{9FA5}').contains(&ch)
}

fn is_digit_or_point(ch: char) -> bool {
    ch.is_ascii_digit() || ch == '.'
}

#[derive(Clone, Copy)]
pub struct CharScan<'a> {
    pub chars: &'a [char],
    /// Oracle tokens of the cell that are not made only of watermark glyphs.
    pub surviving_tokens: &'a [&'a str],
    pub context: FieldContext,
    pub rules: &'a CleaningRules,
    pub segmenter: &'a dyn Segmenter,
    pub numeric_protection: bool,
}

impl CharScan<'_> {
    fn prev(&self, index: usize) -> Option<char> {
        index.checked_sub(1).map(|prev| self.chars[prev])
    }

    fn next(&self, index: usize) -> Option<char> {
        self.chars.get(index + 1).copied()
    }

    fn is_structural(&self, ch: char) -> bool {
        is_cjk(ch)
            || ch.is_ascii_alphanumeric()
            || STRUCTURAL_PUNCT.contains(ch)
            || (self.numeric_protection && ch == '.')
    }

    pub fn resolve(&self, index: usize) -> Verdict {
        let ch = self.chars[index];
        if !self.rules.is_watermark(ch) {
            return Verdict::Keep(KeepReason::NotWatermark);
        }
        if self.context.keeps_watermark() {
            return Verdict::Keep(KeepReason::ContentField);
        }
        if self.numeric_protection && self.in_numeric_literal(index) {
            return Verdict::Keep(KeepReason::NumericLiteral);
        }
        if self.forms_word_with_neighbors(index) {
            return Verdict::Keep(KeepReason::NeighborWord);
        }
        if self.inside_surviving_token(index) {
            return Verdict::Keep(KeepReason::InsideToken);
        }
        if self.chars.len() == 1 && self.rules.single_char_whitelist.contains(&ch) {
            return Verdict::Keep(KeepReason::WhitelistedValue);
        }
        let prev_ok = self.prev(index).is_some_and(|ch| self.is_structural(ch));
        let next_ok = self.next(index).is_some_and(|ch| self.is_structural(ch));
        if prev_ok || next_ok {
            Verdict::Keep(KeepReason::StructuralNeighbor)
        } else {
            Verdict::Drop
        }
    }

    fn in_numeric_literal(&self, index: usize) -> bool {
        self.prev(index).is_some_and(is_digit_or_point)
            && self.next(index).is_some_and(is_digit_or_point)
    }

    fn forms_word_with_neighbors(&self, index: usize) -> bool {
        let ch = self.chars[index];
        let prev = self.prev(index);
        let next = self.next(index);

        let mut phrases = Vec::with_capacity(3);
        if let Some(prev) = prev {
            phrases.push([prev, ch].iter().collect::<String>());
        }
        if let Some(next) = next {
            phrases.push([ch, next].iter().collect::<String>());
        }
        if let (Some(prev), Some(next)) = (prev, next) {
            phrases.push([prev, ch, next].iter().collect::<String>());
        }

        phrases.iter().any(|phrase| self.segmenter.is_word(phrase))
    }

    fn inside_surviving_token(&self, index: usize) -> bool {
        let ch = self.chars[index];
        let prev = self.prev(index);
        let next = self.next(index);

        self.surviving_tokens.iter().any(|token| {
            let token = token.chars().collect::<Vec<_>>();
            if token.len() < 2 {
                return false;
            }
            let Some(at) = token.iter().position(|candidate| *candidate == ch) else {
                return false;
            };
            (at > 0 && prev == Some(token[at - 1]))
                || (at + 1 < token.len() && next == Some(token[at + 1]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CharScan, KeepReason, Verdict};
    use crate::model::FieldContext;
    use crate::rules::CleaningRules;
    use crate::segment::DictionarySegmenter;

    fn verdict(text: &str, index: usize, tokens: &[&str], context: FieldContext) -> Verdict {
        let rules = CleaningRules::default();
        let segmenter = DictionarySegmenter::new(["老母鸡", "鸡汤", "菜心"]);
        let chars = text.chars().collect::<Vec<_>>();
        CharScan {
            chars: &chars,
            surviving_tokens: tokens,
            context,
            rules: &rules,
            segmenter: &segmenter,
            numeric_protection: true,
        }
        .resolve(index)
    }

    #[test]
    fn ordinary_glyphs_are_kept() {
        assert_eq!(
            verdict("汤", 0, &[], FieldContext::None),
            Verdict::Keep(KeepReason::NotWatermark)
        );
    }

    #[test]
    fn ingredient_context_keeps_everything() {
        assert_eq!(
            verdict("鸡", 0, &[], FieldContext::Ingredients),
            Verdict::Keep(KeepReason::ContentField)
        );
    }

    #[test]
    fn glyph_between_digits_is_numeric() {
        assert_eq!(
            verdict("1老.5", 1, &[], FieldContext::None),
            Verdict::Keep(KeepReason::NumericLiteral)
        );
    }

    #[test]
    fn glyph_forming_a_word_is_kept() {
        assert_eq!(
            verdict("熬鸡汤", 1, &[], FieldContext::None),
            Verdict::Keep(KeepReason::NeighborWord)
        );
    }

    #[test]
    fn glyph_matching_a_surviving_token_is_kept() {
        assert_eq!(
            verdict("腊乡肠", 1, &["腊乡肠"], FieldContext::None),
            Verdict::Keep(KeepReason::InsideToken)
        );
    }

    #[test]
    fn isolated_glyph_is_dropped() {
        assert_eq!(verdict(" 老 ", 1, &[], FieldContext::None), Verdict::Drop);
        assert_eq!(verdict("老", 0, &[], FieldContext::None), Verdict::Drop);
    }

    #[test]
    fn glyph_next_to_content_is_kept() {
        assert_eq!(
            verdict("老 ", 0, &[], FieldContext::None),
            Verdict::Drop
        );
        assert_eq!(
            verdict("切老", 1, &[], FieldContext::None),
            Verdict::Keep(KeepReason::StructuralNeighbor)
        );
    }
}
