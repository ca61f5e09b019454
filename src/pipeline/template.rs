//! Manual-extraction scaffold: a standalone Python script per paper.
//!
//! Template mode never calls a model. It writes a script embedding the full
//! staged text as the `PAPER_TEXT` constant, plus two placeholders the user
//! fills in by hand (`SECTION_TEXT` and `REFERENCES`). Running the script
//! lists the citation numbers found in `SECTION_TEXT` next to the matching
//! `REFERENCES` entries.

use crate::document::DocumentKey;

/// Render the scaffold for one staged text.
pub fn render_scaffold(key: &DocumentKey, query: &str, staged_text: &str) -> String {
    let mut out = String::with_capacity(staged_text.len() + SCAFFOLD_BODY.len() + 512);

    out.push_str("#!/usr/bin/env python3\n");
    out.push_str("# Reference extraction worksheet\n");
    out.push_str(&format!("# Paper: {}\n", one_line(key.as_str())));
    out.push_str(&format!("# Query: {}\n", one_line(query)));
    out.push_str("#\n");
    out.push_str("# 1. Copy the passage named by the query from PAPER_TEXT into SECTION_TEXT.\n");
    out.push_str("# 2. For every number the script prints, add the bibliography entry to REFERENCES.\n");
    out.push_str("# 3. Run: python3 this_file.py\n\n");
    out.push_str("import re\n\n");

    out.push_str(&format!("PAPER = {}\n", python_string(key.as_str())));
    out.push_str(&format!("QUERY = {}\n\n", python_string(query)));

    out.push_str("PAPER_TEXT = ");
    out.push_str(&python_block_literal(staged_text));
    out.push_str("\n\n");

    out.push_str(SCAFFOLD_BODY);
    out
}

/// The script shape a model answer should take: the scaffold without the
/// embedded paper, with `PAPER` left for the model to fill in.
pub fn answer_template(query: &str) -> String {
    let mut out = String::with_capacity(SCAFFOLD_BODY.len() + query.len() + 64);
    out.push_str("import re\n\n");
    out.push_str("# Title of the paper.\n");
    out.push_str("PAPER = \"\"\n");
    out.push_str(&format!("QUERY = {}\n\n", python_string(query)));
    out.push_str(SCAFFOLD_BODY);
    out
}

const SCAFFOLD_BODY: &str = r#"# Paste the passage here.
SECTION_TEXT = """
"""

# Citation number -> full bibliography entry, e.g.
#   3: "A. Author, B. Author. Paper title. Venue, 2021.",
REFERENCES = {
}

CITATION = re.compile(r"\[(\d+(?:\s*[,\u2013-]\s*\d+)*)\]")


def cited_numbers(text):
    numbers = set()
    for group in CITATION.findall(text):
        for part in re.split(r"\s*,\s*", group):
            bounds = re.split(r"\s*[\u2013-]\s*", part)
            if len(bounds) == 2:
                low, high = int(bounds[0]), int(bounds[1])
                numbers.update(range(low, high + 1))
            else:
                numbers.add(int(bounds[0]))
    return sorted(numbers)


def main():
    numbers = cited_numbers(SECTION_TEXT)
    print(f"{PAPER}: {QUERY}")
    print(f"{len(numbers)} unique citation(s): {numbers}")
    print("=" * 80)
    missing = []
    for n in numbers:
        entry = REFERENCES.get(n)
        if entry is None:
            missing.append(n)
        else:
            print(f"[{n}] {entry}")
    if missing:
        print(f"\nStill to fill in: {missing}")


if __name__ == "__main__":
    main()
"#;

/// Collapse a value onto one line so it can sit in a `#` comment.
fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A short single-line Python string literal.
fn python_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Embed `text` as a Python triple-quoted raw literal, verbatim when possible.
///
/// A raw literal cannot contain its own delimiter and cannot end in an odd
/// run of backslashes; text that rules out both delimiters falls back to an
/// escaped (non-raw) literal.
fn python_block_literal(text: &str) -> String {
    let ends_with_odd_backslashes = text.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1;

    if !ends_with_odd_backslashes {
        for delim in ["'''", "\"\"\""] {
            let quote = delim.as_bytes()[0] as char;
            if !text.contains(delim) && !text.ends_with(quote) {
                return format!("r{delim}{text}{delim}");
            }
        }
    }

    let mut out = String::with_capacity(text.len() + 8);
    out.push_str("\"\"\"");
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out.push_str("\"\"\"");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAGED: &str = "--- page 1 ---\nRelated Work. Prior methods [2, 4] and [7-9].\n\n--- page 2 ---\nReferences\n[2] A. Author. Title. 2020.\n";

    #[test]
    fn scaffold_embeds_text_verbatim() {
        let s = render_scaffold(&DocumentKey::new("paper"), "Related Work", STAGED);
        assert!(s.contains(&format!("PAPER_TEXT = r'''{STAGED}'''")));
        assert!(s.contains("SECTION_TEXT = \"\"\""));
        assert!(s.contains("REFERENCES = {"));
        assert!(s.contains("if __name__ == \"__main__\":"));
    }

    #[test]
    fn header_names_paper_and_query() {
        let s = render_scaffold(&DocumentKey::new("Wang 2025"), "Intro\nparagraph 2", "x");
        assert!(s.contains("# Paper: Wang 2025\n"));
        assert!(s.contains("# Query: Intro paragraph 2\n"));
        assert!(s.contains("QUERY = \"Intro\\nparagraph 2\"\n"));
    }

    #[test]
    fn answer_template_matches_scaffold_without_paper_text() {
        let answer = answer_template("Related Work");
        let scaffold = render_scaffold(&DocumentKey::new("paper"), "Related Work", STAGED);
        assert!(answer.starts_with("import re\n"));
        assert!(answer.contains("QUERY = \"Related Work\"\n"));
        assert!(!answer.contains("PAPER_TEXT"));
        assert!(scaffold.ends_with(&answer[answer.find("# Paste the passage").unwrap()..]));
    }

    #[test]
    fn falls_back_to_double_quotes() {
        let text = "he wrote '''quoted''' here";
        assert_eq!(python_block_literal(text), format!("r\"\"\"{text}\"\"\""));
    }

    #[test]
    fn trailing_quote_avoids_that_delimiter() {
        let text = "ends with 'quote'";
        assert_eq!(python_block_literal(text), format!("r\"\"\"{text}\"\"\""));
    }

    #[test]
    fn escapes_when_both_delimiters_appear() {
        let text = "a ''' b \"\"\" c \\ d";
        let lit = python_block_literal(text);
        assert!(lit.starts_with("\"\"\""));
        assert!(lit.contains("\\\\ d"));
        assert!(lit.contains("\\\"\\\"\\\""));
    }

    #[test]
    fn trailing_backslash_is_escaped() {
        let lit = python_block_literal("path C:\\");
        assert_eq!(lit, "\"\"\"path C:\\\\\"\"\"");
    }

    #[test]
    fn one_line_collapses_whitespace() {
        assert_eq!(one_line("  a \n b\t c "), "a b c");
    }
}
