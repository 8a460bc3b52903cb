// src/exec/delimiter.rs

//! Console markers printed around each stage's output.

/// Printed before a stage's process starts: a blank line, then `<label>`.
pub fn start_delimiter(label: &str) -> String {
    format!("\n<{label}>")
}

/// Printed when a stage's process exits: `</name>`, where the name is the
/// label without its parenthetical suffix.
pub fn end_delimiter(label: &str) -> String {
    format!("</{}>", label_name(label))
}

/// `format:prettier(src/a.ts)` -> `format:prettier`.
pub fn label_name(label: &str) -> &str {
    match label.find('(') {
        Some(idx) => &label[..idx],
        None => label,
    }
}
