//! Greedy line breaking for mixed CJK and Latin text.
//!
//! Lines are built one character at a time against a width oracle. When the
//! next character would overflow, the break is resolved by the script class of
//! that character and of the last character already on the line.

/// Width oracle used while wrapping.
///
/// Implementations must return the rendered width of `text` in pixels and be
/// non-decreasing as characters are appended.
pub trait MeasureText {
    fn measure(&self, text: &str) -> f32;
}

impl<F> MeasureText for F
where
    F: Fn(&str) -> f32,
{
    fn measure(&self, text: &str) -> f32 {
        self(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptClass {
    Cjk,
    Space,
    Other,
}

pub fn classify_char(ch: char) -> ScriptClass {
    if ch == ' ' {
        return ScriptClass::Space;
    }
    if matches!(
        ch as u32,
        0x4E00..=0x9FFF | 0x3040..=0x30FF | 0xAC00..=0xD7AF
    ) {
        ScriptClass::Cjk
    } else {
        ScriptClass::Other
    }
}

/// How an overflowing character is resolved against the current line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakEvent {
    /// The incoming character is CJK: the line is committed as is and the
    /// character starts the next one.
    CjkBoundary,
    /// The incoming character is a space: the line is committed as is and the
    /// space is dropped.
    SpaceBoundary,
    /// The line already ends on a CJK character or a space: the trimmed line
    /// is committed and the incoming character starts the next one.
    NaturalBoundary,
    /// Mid-word: the last character of the line is replaced by `-` and moved
    /// to the next line together with the incoming character.
    Hyphenation,
}

pub fn classify_overflow(next: char, last: char) -> BreakEvent {
    match (classify_char(next), classify_char(last)) {
        (ScriptClass::Cjk, _) => BreakEvent::CjkBoundary,
        (ScriptClass::Space, _) => BreakEvent::SpaceBoundary,
        (_, ScriptClass::Cjk | ScriptClass::Space) => BreakEvent::NaturalBoundary,
        _ => BreakEvent::Hyphenation,
    }
}

/// Wraps `text` into lines no wider than `max_width` according to `measure`.
///
/// Always returns at least one line; empty input yields `[""]`. A single
/// character wider than `max_width` is still placed on its own line.
pub fn break_lines<M>(text: &str, max_width: f32, measure: &M) -> Vec<String>
where
    M: MeasureText + ?Sized,
{
    let mut lines = Vec::new();
    let mut line = String::new();

    for ch in text.chars() {
        let mut candidate = String::with_capacity(line.len() + ch.len_utf8());
        candidate.push_str(&line);
        candidate.push(ch);
        let test_width = measure.measure(&candidate);

        let last = match line.chars().next_back() {
            Some(last) if test_width > max_width => last,
            _ => {
                line = candidate;
                continue;
            }
        };

        match classify_overflow(ch, last) {
            BreakEvent::CjkBoundary => {
                lines.push(std::mem::take(&mut line));
                line.push(ch);
            }
            BreakEvent::SpaceBoundary => {
                lines.push(std::mem::take(&mut line));
            }
            BreakEvent::NaturalBoundary => {
                lines.push(trim_spaces(&line).to_string());
                line.clear();
                line.push(ch);
            }
            BreakEvent::Hyphenation => {
                line.pop();
                let mut committed = std::mem::take(&mut line);
                committed.push('-');
                lines.push(committed);
                line.push(last);
                line.push(ch);
            }
        }
    }

    lines.push(trim_spaces(&line).to_string());
    lines
}

fn trim_spaces(line: &str) -> &str {
    line.trim_matches(' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_px(text: &str) -> f32 {
        text.chars().count() as f32 * 10.0
    }

    /// Walks `text` line by line. Hyphens mark a replaced character that the
    /// next line repeats, and each line boundary may swallow one space.
    fn assert_covers(text: &str, lines: &[String]) {
        let mut rest = text;
        for (index, line) in lines.iter().enumerate() {
            let body = if index + 1 < lines.len() {
                line.strip_suffix('-').unwrap_or(line)
            } else {
                line.as_str()
            };
            if index > 0 {
                rest = rest.strip_prefix(' ').unwrap_or(rest);
            }
            rest = rest
                .strip_prefix(body)
                .unwrap_or_else(|| panic!("{body:?} does not continue {rest:?}"));
        }
        assert!(rest.is_empty(), "uncovered tail {rest:?}");
    }

    #[test]
    fn classifies_scripts() {
        assert_eq!(classify_char('日'), ScriptClass::Cjk);
        assert_eq!(classify_char('あ'), ScriptClass::Cjk);
        assert_eq!(classify_char('テ'), ScriptClass::Cjk);
        assert_eq!(classify_char('한'), ScriptClass::Cjk);
        assert_eq!(classify_char(' '), ScriptClass::Space);
        assert_eq!(classify_char('\t'), ScriptClass::Other);
        assert_eq!(classify_char('a'), ScriptClass::Other);
        assert_eq!(classify_char('7'), ScriptClass::Other);
        assert_eq!(classify_char('。'), ScriptClass::Other);
    }

    #[test]
    fn classifies_overflow_events() {
        assert_eq!(classify_overflow('日', 'a'), BreakEvent::CjkBoundary);
        assert_eq!(classify_overflow('日', ' '), BreakEvent::CjkBoundary);
        assert_eq!(classify_overflow(' ', 'a'), BreakEvent::SpaceBoundary);
        assert_eq!(classify_overflow(' ', '日'), BreakEvent::SpaceBoundary);
        assert_eq!(classify_overflow('a', '日'), BreakEvent::NaturalBoundary);
        assert_eq!(classify_overflow('a', ' '), BreakEvent::NaturalBoundary);
        assert_eq!(classify_overflow('a', 'b'), BreakEvent::Hyphenation);
    }

    #[test]
    fn breaks_at_space() {
        let lines = break_lines("HELLO WORLD", 50.0, &ten_px);
        assert_eq!(lines, vec!["HELLO", "WORLD"]);
    }

    #[test]
    fn breaks_between_cjk_characters() {
        let lines = break_lines("日本語テスト", 30.0, &ten_px);
        assert_eq!(lines, vec!["日本語", "テスト"]);
    }

    #[test]
    fn hyphenates_long_words() {
        let lines = break_lines("supercalifragilistic", 50.0, &ten_px);
        assert_eq!(lines, vec!["supe-", "rcal-", "ifra-", "gili-", "stic"]);
    }

    #[test]
    fn empty_text_yields_single_empty_line() {
        assert_eq!(break_lines("", 100.0, &ten_px), vec![String::new()]);
    }

    #[test]
    fn breaks_after_cjk_before_latin() {
        let lines = break_lines("日本語abc", 30.0, &ten_px);
        assert_eq!(lines, vec!["日本語", "abc"]);
    }

    #[test]
    fn trims_line_ending_in_space() {
        let lines = break_lines("ab cd", 30.0, &ten_px);
        assert_eq!(lines, vec!["ab", "cd"]);
    }

    #[test]
    fn cjk_overflow_keeps_trailing_space() {
        let lines = break_lines("ab 日", 30.0, &ten_px);
        assert_eq!(lines, vec!["ab ", "日"]);
    }

    #[test]
    fn drops_exactly_one_space_per_space_break() {
        let lines = break_lines("abc  de", 30.0, &ten_px);
        // second space starts the next line and is trimmed on the final flush
        assert_eq!(lines, vec!["abc", "de"]);
    }

    #[test]
    fn space_break_commits_line_untrimmed() {
        let lines = break_lines("ab  cd", 30.0, &ten_px);
        assert_eq!(lines, vec!["ab ", "cd"]);
        assert_covers("ab  cd", &lines);
    }

    #[test]
    fn hyphenates_from_a_single_character_line() {
        let lines = break_lines("abc", 15.0, &ten_px);
        assert_eq!(lines, vec!["-", "a-", "bc"]);
        assert_covers("abc", &lines);
    }

    #[test]
    fn final_line_is_trimmed() {
        assert_eq!(break_lines("  hi  ", 100.0, &ten_px), vec!["hi"]);
    }

    #[test]
    fn over_wide_character_is_still_placed() {
        let wide = |text: &str| text.chars().count() as f32 * 100.0;
        assert_eq!(break_lines("a", 50.0, &wide), vec!["a"]);
        assert_eq!(break_lines("日本", 50.0, &wide), vec!["日", "本"]);
    }

    #[test]
    fn non_positive_width_still_terminates() {
        let lines = break_lines("日本語", 0.0, &ten_px);
        assert_eq!(lines, vec!["日", "本", "語"]);
        let lines = break_lines("abc", -5.0, &ten_px);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn accepts_trait_objects() {
        let measure: &dyn MeasureText = &ten_px;
        assert_eq!(break_lines("HELLO WORLD", 50.0, measure), vec!["HELLO", "WORLD"]);
    }

    #[test]
    fn lines_fit_and_cover_mixed_text() {
        let text = "The quick brown fox 日本語のテキスト jumps over 한국어 lazy dogs";
        for max in [30.0_f32, 50.0, 70.0, 120.0, 250.0] {
            let lines = break_lines(text, max, &ten_px);
            assert!(!lines.is_empty());
            for line in &lines {
                assert!(ten_px(line) <= max, "{line:?} exceeds {max}");
            }
            assert_covers(text, &lines);
        }
    }

    #[test]
    fn is_deterministic() {
        let text = "Rust ラスト 러스트 systems";
        let first = break_lines(text, 60.0, &ten_px);
        let second = break_lines(text, 60.0, &ten_px);
        assert_eq!(first, second);
    }
}
