//! Export-line format of a decrypted profile
//!
//! A decrypted profile is UTF-8 text with one `export KEY="VALUE"` line per
//! variable. Values are written verbatim between double quotes; embedded
//! quotes are not escaped.

use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

/// Variables of one profile, in insertion order
pub type EnvVars = IndexMap<String, String>;

fn export_line() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^export ([^=]*)=(.*)$").expect("export line pattern"))
}

fn shell_identifier() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"))
}

/// Render variables as export lines, each terminated by a newline
pub fn render(vars: &EnvVars) -> String {
    vars.iter()
        .map(|(key, value)| format!("export {}=\"{}\"\n", key, value))
        .collect()
}

/// Parse one export line into (key, value)
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let caps = export_line().captures(line)?;
    let key = caps[1].trim();
    if key.is_empty() {
        return None;
    }
    let value = caps[2].trim().trim_matches('"');
    Some((key.to_string(), value.to_string()))
}

/// Parsed profile plus the number of lines that were not export lines
#[derive(Debug, Default)]
pub struct Parsed {
    pub vars: EnvVars,
    pub dropped: usize,
}

/// Parse profile plaintext; a later line for the same key wins.
///
/// Lines that are not export lines are not kept; `dropped` counts the
/// non-blank ones so callers can report the normalization.
pub fn parse(content: &str) -> Parsed {
    let mut parsed = Parsed::default();

    for line in content.lines() {
        match parse_line(line) {
            Some((key, value)) => {
                parsed.vars.insert(key, value);
            }
            None if !line.trim().is_empty() => parsed.dropped += 1,
            None => {}
        }
    }

    parsed
}

/// Whether `key` can be exported by a POSIX shell
pub fn is_valid_key(key: &str) -> bool {
    shell_identifier().is_match(key)
}
