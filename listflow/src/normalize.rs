//! Search-term normalization.
//!
//! Turns a raw listing title into a compact keyword query: blocked terms are
//! removed through the compliance gate, bracket glyphs and symbols become
//! spaces, whitespace collapses, and short low-salience tokens are dropped.

use crate::compliance::ComplianceGate;
use crate::config::SalienceConfig;

const BRACKETS: &[char] = &[
    '【', '】', '「', '」', '『', '』', '(', ')', '（', '）', '［', '］', '[', ']',
];

fn is_kept_char(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || c == '-'
}

fn is_ascii_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_salient(token: &str, salience: SalienceConfig) -> bool {
    let len = token.chars().count();
    if is_ascii_token(token) {
        len >= salience.ascii_min_len
    } else {
        len >= salience.other_min_len
    }
}

/// Replaces brackets and symbols with spaces and collapses whitespace.
#[must_use]
pub fn strip_symbols(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| {
            if BRACKETS.contains(&c) || !is_kept_char(c) {
                ' '
            } else {
                c
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps only salient tokens. Returns the input unchanged if nothing survives.
#[must_use]
pub fn filter_salient(text: &str, salience: SalienceConfig) -> String {
    let kept: Vec<&str> = text
        .split_whitespace()
        .filter(|token| is_salient(token, salience))
        .collect();
    if kept.is_empty() {
        text.to_string()
    } else {
        kept.join(" ")
    }
}

/// Normalizes a raw title into a search term.
///
/// Without a gate the blocked-term step is a pass-through. Applying the
/// function to its own output returns the same string.
#[must_use]
pub fn normalize_term(
    raw: &str,
    gate: Option<&dyn ComplianceGate>,
    salience: SalienceConfig,
) -> String {
    let without_blocked = match gate {
        Some(gate) => gate.remove_blocked_terms(raw),
        None => raw.to_string(),
    };
    filter_salient(&strip_symbols(&without_blocked), salience)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticComplianceGate;
    use pretty_assertions::assert_eq;

    fn normalize(raw: &str) -> String {
        normalize_term(raw, None, SalienceConfig::default())
    }

    #[test]
    fn test_brackets_and_symbols_become_spaces() {
        assert_eq!(strip_symbols("【美品】Nikon F3（ボディ）"), "美品 Nikon F3 ボディ");
        assert_eq!(strip_symbols("Canon★AE-1/Program!!"), "Canon AE-1 Program");
        assert_eq!(normalize("【美品】Nikon F3（ボディ）"), "Nikon F3");
    }

    #[test]
    fn test_salience_filter() {
        // "F" is a one-letter ASCII token; "本体" is a two-char non-ASCII token.
        assert_eq!(normalize("Nikon F 本体 フィルムカメラ"), "Nikon フィルムカメラ");
    }

    #[test]
    fn test_salience_filter_keeps_input_when_nothing_survives() {
        assert_eq!(normalize("a 本体"), "a 本体");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("★☆★"), "");
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let loose = SalienceConfig {
            ascii_min_len: 1,
            other_min_len: 2,
        };
        assert_eq!(normalize_term("Nikon F 本体", None, loose), "Nikon F 本体");
    }

    #[test]
    fn test_gate_removes_blocked_terms() {
        let gate = StaticComplianceGate::new().with_blocked_terms(["ジャンク"]);
        let normalized = normalize_term("ジャンク Olympus OM-1", Some(&gate), SalienceConfig::default());
        assert_eq!(normalized, "Olympus OM-1");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "【美品】Nikon F3（ボディ）",
            "a 本体",
            "  spaced   out  ",
            "Canon★AE-1/Program!!",
            "x",
            "ab 本体 c",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "{sample}");
        }
    }
}
