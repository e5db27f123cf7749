// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Talegraph-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Talegraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Chapter body text normalization.
//!
//! While a chapter is in edit its body is one string. The stored form is a list of
//! paragraphs split on a blank line. Splitting trims every paragraph and drops the empty
//! ones, so runs of three or more newlines collapse and leading/trailing blank paragraphs
//! vanish. The conversion is lossy but stable: normalizing the rejoined text again yields
//! the same paragraphs.

pub const PARAGRAPH_DELIMITER: &str = "\n\n";

/// Splits editable text into stored paragraphs. Never returns an empty list.
pub fn normalize_paragraphs(text: &str) -> Vec<String> {
    let paragraphs = text
        .split(PARAGRAPH_DELIMITER)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();

    if paragraphs.is_empty() {
        return vec![String::new()];
    }
    paragraphs
}

/// Joins stored paragraphs back into editable text.
pub fn paragraphs_to_text<S: AsRef<str>>(paragraphs: &[S]) -> String {
    let mut out = String::new();
    for (idx, paragraph) in paragraphs.iter().enumerate() {
        if idx > 0 {
            out.push_str(PARAGRAPH_DELIMITER);
        }
        out.push_str(paragraph.as_ref());
    }
    out
}

/// Repairs a stored paragraph list so it satisfies the "never empty" rule.
pub(crate) fn ensure_body(mut body: Vec<String>) -> Vec<String> {
    if body.is_empty() {
        body.push(String::new());
    }
    body
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{ensure_body, normalize_paragraphs, paragraphs_to_text};

    #[rstest]
    #[case("", &[""])]
    #[case("   ", &[""])]
    #[case("\n\n\n\n", &[""])]
    #[case("One paragraph.", &["One paragraph."])]
    #[case("First.\n\nSecond.", &["First.", "Second."])]
    #[case("First.\n\n\nSecond.", &["First.", "Second."])]
    #[case("First.\n\n\n\n\nSecond.", &["First.", "Second."])]
    #[case("\n\nLeading.\n\nTrailing.\n\n", &["Leading.", "Trailing."])]
    #[case("Line one\nline two.", &["Line one\nline two."])]
    #[case("  padded  \n\n  also padded ", &["padded", "also padded"])]
    fn normalize_paragraphs_cases(#[case] text: &str, #[case] expected: &[&str]) {
        assert_eq!(normalize_paragraphs(text), expected);
    }

    #[rstest]
    #[case("")]
    #[case("a\n\n\nb")]
    #[case("\n\n\n x \n\n\n\n y\n \n\nz\n\n")]
    #[case("single line\nwith soft break")]
    #[case("trailing newline\n")]
    fn normalization_is_stable_under_repetition(#[case] text: &str) {
        let first = paragraphs_to_text(&normalize_paragraphs(text));
        let second = paragraphs_to_text(&normalize_paragraphs(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn paragraphs_rejoin_with_blank_line() {
        assert_eq!(paragraphs_to_text(&["a", "b", "c"]), "a\n\nb\n\nc");
        assert_eq!(paragraphs_to_text(&[""]), "");
    }

    #[test]
    fn ensure_body_fills_empty_list() {
        assert_eq!(ensure_body(Vec::new()), vec![String::new()]);
        assert_eq!(ensure_body(vec!["x".to_owned()]), vec!["x".to_owned()]);
    }
}
