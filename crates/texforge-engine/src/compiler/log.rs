//! LaTeX log parsing
//!
//! A failed run is reduced to one line number and one message: the first
//! `l.<digits>` marker and the first `! <text>` banner in the log. Later
//! error blocks are ignored on purpose — the first error is usually the root
//! cause, and the UI shows a single diagnostic. This is a documented
//! limitation, not something to widen silently.

use once_cell::sync::Lazy;
use regex::Regex;

static LINE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^l\.(\d+)").expect("line marker regex"));
static ERROR_BANNER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^! (.*)$").expect("error banner regex"));

/// Line number and message extracted from a compiler log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDiagnosis {
    /// 1-indexed source line, 0 when the log carries no marker.
    pub line: u32,
    pub message: String,
}

/// Scan the log for the first line marker and the first error banner.
pub fn parse_log(text: &str) -> LogDiagnosis {
    let line = LINE_MARKER
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    let message = ERROR_BANNER
        .captures(text)
        .map(|c| c[1].trim_end().to_string())
        .unwrap_or_else(|| "Unknown Error".to_string());

    LogDiagnosis { line, message }
}
