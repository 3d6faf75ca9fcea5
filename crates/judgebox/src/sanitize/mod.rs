//! Terminal escape stripping for captured runner output and validator diagnostics.

use regex::Regex;
use std::sync::OnceLock;

/// CSI (`ESC [ ... final`), OSC (`ESC ] ... BEL|ST`), 8-bit CSI and two-byte `ESC x` sequences.
const ESCAPE_PATTERN: &str = concat!(
    r"\x1b\[[0-?]*[ -/]*[@-~]",
    r"|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)",
    r"|\x{9b}[0-?]*[ -/]*[@-~]",
    r"|\x1b[ -/]*[0-~]",
);

fn escape_regex() -> Option<&'static Regex> {
    static ESCAPES: OnceLock<Option<Regex>> = OnceLock::new();
    ESCAPES.get_or_init(|| Regex::new(ESCAPE_PATTERN).ok()).as_ref()
}

/// Strip terminal escape sequences and trim surrounding whitespace.
///
/// Stripping repeats until no sequence is left, so `sanitize(sanitize(x)) == sanitize(x)` even
/// when removing one sequence splices together the bytes of another.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let Some(re) = escape_regex() else {
        tracing::error!("escape pattern failed to compile; dropping control characters instead");
        return strip_controls(text);
    };
    let mut current = text.to_string();
    while re.is_match(&current) {
        current = re.replace_all(&current, "").into_owned();
    }
    current.trim().to_string()
}

/// Drop every control character except line breaks and tabs.
///
/// Leaves the printable remainder of escape sequences behind, but never an `ESC` or 8-bit CSI.
fn strip_controls(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect::<String>()
        .trim()
        .to_string()
}
