//! Prompt text for LLM-based reference extraction.
//!
//! All prompt wording lives here so it can be inspected by unit tests and
//! changed without touching the extraction loop. Callers can replace the
//! instruction via [`crate::config::RunConfig::instructions`]; the query and
//! the paper text are always appended after it.

use crate::pipeline::template::answer_template;

/// Default instruction framing the model's task.
pub const DEFAULT_EXTRACTION_INSTRUCTIONS: &str = r#"You are an expert at extracting bibliographic references from academic papers.

You will receive a TASK written by a researcher and the full text of one paper.
Each page of the paper starts with a line of the form "--- page N ---".

Follow these steps precisely:

1. LOCATE
   - Find the section, subsection or paragraph the TASK refers to
   - If the TASK names no section, use the whole body of the paper

2. COLLECT CITATIONS
   - List every citation marker inside that passage: [3], [2, 5], [4-7], (Smith et al., 2020)
   - Expand numeric ranges ([4-7] means 4, 5, 6, 7)
   - Deduplicate and sort the numbers

3. RESOLVE
   - Look each citation up in the References / Bibliography section
   - Copy the full entry exactly as printed: authors, title, venue, year
   - Do NOT invent entries; mark a citation as "NOT FOUND" when the list has no match

4. ANSWER
   - Reply with one Python code block shaped exactly like the ANSWER TEMPLATE below
   - Put the paper title in PAPER and the passage you used, quoted verbatim, in SECTION_TEXT
   - Add one REFERENCES entry per citation number: 3: "Full reference text",
   - Leave the rest of the script unchanged so it runs as is"#;

/// Build the complete prompt for one paper.
///
/// Layout: instruction, the query verbatim, then the full staged text. The
/// default instruction is followed by the answer script it refers to; a
/// custom instruction brings its own answer format.
pub fn build_extraction_prompt(instructions: Option<&str>, query: &str, paper_text: &str) -> String {
    let framing = match instructions {
        Some(custom) => custom.trim_end().to_string(),
        None => format!(
            "{}\n\nANSWER TEMPLATE:\n```python\n{}```",
            DEFAULT_EXTRACTION_INSTRUCTIONS,
            answer_template(query)
        ),
    };
    format!(
        "{}\n\nTASK: {}\n\nPAPER TEXT:\n\"\"\"\n{}\n\"\"\"\n\nNow carry out the TASK.",
        framing,
        query,
        paper_text.trim_end()
    )
}
