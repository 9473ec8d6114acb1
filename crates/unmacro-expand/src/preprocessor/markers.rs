//! Line marker parsing
//!
//! Preprocessed output interleaves content lines with line markers recording
//! which source file and line the next content line came from. Marker syntax
//! is preprocessor specific, so it is hidden behind [`LineMarkerDialect`].

use regex::Regex;

/// One line of preprocessed output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocessedLine<'a> {
    /// The next content line is line `line` of `file`
    Marker { file: String, line: u32 },
    /// A content line, exactly as emitted
    Content(&'a str),
}

/// Marker syntax of a particular preprocessor
pub trait LineMarkerDialect {
    /// Classify one line of output (without its trailing newline)
    fn parse<'a>(&self, line: &'a str) -> PreprocessedLine<'a>;

    /// Dialect name for diagnostics
    fn name(&self) -> &str;
}

/// GNU-style markers: `# 12 "path/to/file.h" 1 3`
///
/// The `#line 12 "file"` spelling is accepted as well. Trailing flags are
/// ignored.
pub struct GnuLineMarkers {
    marker: Regex,
}

impl GnuLineMarkers {
    pub fn new() -> Self {
        Self {
            marker: Regex::new(r#"^#(?:line)? (\d+) "((?:[^"\\]|\\.)*)""#).unwrap(),
        }
    }
}

impl Default for GnuLineMarkers {
    fn default() -> Self {
        Self::new()
    }
}

impl LineMarkerDialect for GnuLineMarkers {
    fn parse<'a>(&self, line: &'a str) -> PreprocessedLine<'a> {
        if let Some(caps) = self.marker.captures(line) {
            if let Ok(number) = caps[1].parse::<u32>() {
                return PreprocessedLine::Marker {
                    file: unescape(&caps[2]),
                    line: number,
                };
            }
        }
        PreprocessedLine::Content(line)
    }

    fn name(&self) -> &str {
        "gnu"
    }
}

/// Undo the backslash escaping GNU cpp applies to file names
fn unescape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}
