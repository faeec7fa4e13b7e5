//! HTML to plain-text conversion.

use tracing::debug;

/// Most consecutive blank lines kept in converted text.
const MAX_BLANK_RUN: usize = 2;

/// Converts an HTML body to readable text.
///
/// Returns an empty string for empty input. A conversion failure falls back
/// to the raw markup with whitespace cleaned up.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let text = match htmd::convert(html) {
        Ok(text) => text,
        Err(e) => {
            debug!("HTML conversion failed, keeping markup: {e}");
            html.to_string()
        }
    };
    collapse_blank_lines(&text)
}

/// Caps runs of blank lines and trims the result.
fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run <= MAX_BLANK_RUN {
                out.push("");
            }
        } else {
            blank_run = 0;
            out.push(line.trim_end());
        }
    }
    out.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_markup_to_text() {
        let text = html_to_text("<html><body><p>Hello <b>there</b></p><p>Second</p></body></html>");
        assert!(text.contains("Hello"));
        assert!(text.contains("there"));
        assert!(text.contains("Second"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(html_to_text("   "), "");
    }

    #[test]
    fn blank_runs_are_capped() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb\n\n"), "a\n\n\nb");
    }
}
