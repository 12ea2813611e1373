/// One classified physical line of source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// 1-based physical line number, for error reporting
    pub number: usize,
    /// Count of leading whitespace characters before the statement text
    pub indent: usize,
    /// The statement text, comment-stripped and trimmed
    pub text: String,
}

/// Split source text into classified lines: strip end-of-line comments,
/// measure indentation, trim, and drop blank lines so they never affect
/// block boundaries.
///
/// A comment runs from the first `#` to the end of the line. The marker is
/// not escapable, so a `#` inside a string literal truncates the line too.
/// That matches the language as shipped; callers get the quirk, not a fix.
pub fn classify(source: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    for (i, raw) in source.lines().enumerate() {
        let stripped = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let indent = stripped.chars().take_while(|c| c.is_whitespace()).count();
        let text = stripped.trim();
        if text.is_empty() {
            continue;
        }
        lines.push(Line {
            number: i + 1,
            indent,
            text: text.to_string(),
        });
    }
    lines
}
