//! Width-bounded text: ellipsis truncation and greedy line wrapping.

use std::borrow::Cow;
use std::iter::Peekable;
use std::str::{Split, SplitWhitespace};

use super::fonts::Measure;

pub const ELLIPSIS: &str = "…";

/// Fit `text` into `max_width` millimetres.
///
/// Returns the text unchanged when it fits. Otherwise returns the longest prefix (with
/// trailing whitespace removed) followed by an ellipsis whose measured width stays within
/// the bound, or an empty string when not even the ellipsis fits. Truncating an already
/// truncated string with the same bound returns it unchanged.
pub fn truncate<'t>(measure: &Measure<'_>, text: &'t str, max_width: f32) -> Cow<'t, str> {
    if measure.width(text) <= max_width {
        return Cow::Borrowed(text);
    }
    if measure.width(ELLIPSIS) > max_width {
        return Cow::Borrowed("");
    }

    let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let candidate = |chars: usize| -> String {
        let end = boundaries.get(chars).copied().unwrap_or(text.len());
        format!("{}{}", text[..end].trim_end(), ELLIPSIS)
    };

    // widths of trimmed prefixes never decrease as the prefix grows
    let (mut low, mut high) = (0usize, boundaries.len());
    while low < high {
        let mid = (low + high + 1) / 2;
        if measure.width(&candidate(mid)) <= max_width {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Cow::Owned(candidate(low))
}

/// Lazily wrap `text` into lines no wider than `max_width`.
///
/// Explicit newlines start a new line. A single word wider than the bound becomes its own
/// truncated line.
pub fn wrap<'t, 'm>(measure: Measure<'m>, text: &'t str, max_width: f32) -> WrapLines<'t, 'm> {
    WrapLines {
        measure,
        max_width,
        paragraphs: text.split('\n'),
        words: None,
    }
}

pub struct WrapLines<'t, 'm> {
    measure: Measure<'m>,
    max_width: f32,
    paragraphs: Split<'t, char>,
    words: Option<Peekable<SplitWhitespace<'t>>>,
}

impl<'t, 'm> Iterator for WrapLines<'t, 'm> {
    type Item = Cow<'t, str>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(words) = self.words.as_mut() {
                if let Some(first) = words.next() {
                    if self.measure.width(first) > self.max_width {
                        return Some(truncate(&self.measure, first, self.max_width));
                    }
                    let mut line = first.to_string();
                    while let Some(word) = words.peek() {
                        let extended = format!("{} {}", line, word);
                        if self.measure.width(&extended) > self.max_width {
                            break;
                        }
                        line = extended;
                        words.next();
                    }
                    return Some(Cow::Owned(line));
                }
                self.words = None;
                continue;
            }

            let paragraph = self.paragraphs.next()?;
            if paragraph.trim().is_empty() {
                return Some(Cow::Borrowed(""));
            }
            self.words = Some(paragraph.split_whitespace().peekable());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::fonts::{FontSet, Weight};

    #[test]
    fn test_short_text_is_returned_unchanged() {
        let fonts = FontSet::builtin();
        let measure = fonts.measure(10.0, Weight::Regular);
        assert_eq!(truncate(&measure, "Yangın", 100.0), "Yangın");
    }

    #[test]
    fn test_truncated_text_fits_and_is_prefix() {
        let fonts = FontSet::builtin();
        let measure = fonts.measure(9.0, Weight::Regular);
        let text = "Parlama, patlama, yangın ve yangından korunma yöntemleri";
        for bound in [5.0_f32, 12.0, 20.0, 33.3, 50.0] {
            let out = truncate(&measure, text, bound);
            assert!(measure.width(&out) <= bound, "bound {bound}");
            if !out.is_empty() {
                let stem = out.strip_suffix(ELLIPSIS).expect("ellipsis");
                assert!(text.starts_with(stem));
            }
        }
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let fonts = FontSet::builtin();
        let measure = fonts.measure(11.0, Weight::Bold);
        let text = "ÖRNEK İNŞAAT SANAYİ VE TİCARET LİMİTED ŞİRKETİ";
        let once = truncate(&measure, text, 40.0).into_owned();
        let twice = truncate(&measure, &once, 40.0).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_bound_smaller_than_ellipsis_yields_empty() {
        let fonts = FontSet::builtin();
        let measure = fonts.measure(10.0, Weight::Regular);
        assert_eq!(truncate(&measure, "Kimyasal", 0.5), "");
    }

    #[test]
    fn test_wrap_respects_width_and_keeps_words() {
        let fonts = FontSet::builtin();
        let measure = fonts.measure(10.0, Weight::Regular);
        let text = "Çalışma alanında yangın söndürücüler hazır bulundurulacak ve kontrol edilecektir";
        let lines: Vec<_> = wrap(measure, text, 40.0).collect();
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(measure.width(line) <= 40.0);
        }
        let joined = lines.join(" ");
        assert_eq!(joined, text);
    }

    #[test]
    fn test_wrap_truncates_single_long_word_and_keeps_newlines() {
        let fonts = FontSet::builtin();
        let measure = fonts.measure(10.0, Weight::Regular);
        let lines: Vec<_> = wrap(measure, "a\n\nSüperuzunkelimeeeeeeeeeeeeeeeeee", 15.0).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "a");
        assert_eq!(lines[1], "");
        assert!(lines[2].ends_with(ELLIPSIS));
    }
}
