//! Loose dotted-numeric version comparison
//!
//! Versions are compared segment by segment as unbounded integers:
//!
//! - the leading non-digit run is dropped ("v1.2.0" -> "1.2.0")
//! - anything after the first `-` or `+` is ignored ("1.2.0-beta" -> "1.2.0")
//! - a non-numeric or empty segment counts as `0`
//! - shorter versions are padded with zeros ("1.2" == "1.2.0")
//!
//! A string without any digit compares as version `0`, so every pair of
//! inputs has an ordering.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Captures the numeric core: from the first digit up to the first `-` or `+`
static VERSION_CORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^0-9]*([0-9][^+-]*)").unwrap());

/// Version normalized into numeric segments.
///
/// Each segment is stored as its digits without leading zeros, so an empty
/// segment is `0`. Equality follows [`Ord`]: `1.0` equals `1.0.0`.
#[derive(Debug, Clone)]
pub struct LooseVersion {
    segments: Vec<String>,
}

impl LooseVersion {
    pub fn parse(version: &str) -> Self {
        let Some(core) = VERSION_CORE_RE
            .captures(version)
            .and_then(|caps| caps.get(1))
        else {
            return Self {
                segments: Vec::new(),
            };
        };

        let segments = core.as_str().split('.').map(normalize_segment).collect();

        Self { segments }
    }

    /// Number of segments found in the numeric core
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn normalize_segment(segment: &str) -> String {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return String::new();
    }
    segment.trim_start_matches('0').to_string()
}

/// Compare two normalized segments by magnitude
fn cmp_segment(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl Ord for LooseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        let zero = String::new();

        (0..len)
            .map(|i| {
                let a = self.segments.get(i).unwrap_or(&zero);
                let b = other.segments.get(i).unwrap_or(&zero);
                cmp_segment(a, b)
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for LooseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for LooseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for LooseVersion {}

impl fmt::Display for LooseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("0");
        }
        let rendered: Vec<&str> = self
            .segments
            .iter()
            .map(|s| if s.is_empty() { "0" } else { s.as_str() })
            .collect();
        f.write_str(&rendered.join("."))
    }
}
