//! Genomic interval query parsing (`chr1:1,000-2,000`).

use regex::Regex;
use std::sync::OnceLock;

use crate::models::IntervalQuery;

const INTERVAL_PATTERN: &str = r"chr(?P<chrom>\w+):(?P<gstart>[0-9,]+)-(?P<gend>[0-9,]+)";

/// Query prefixes selecting an alternate genome build
const ASSEMBLY_PREFIXES: &[(&str, &str)] = &[("hg19.", "hg19"), ("mm9.", "mm9")];

/// Parser for `chr<chrom>:<start>-<end>` queries
#[derive(Debug, Clone)]
pub struct IntervalQueryParser {
    pattern: Regex,
}

impl IntervalQueryParser {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(INTERVAL_PATTERN).expect("interval pattern must compile"),
        }
    }

    /// Process-wide parser
    pub fn global() -> &'static IntervalQueryParser {
        static PARSER: OnceLock<IntervalQueryParser> = OnceLock::new();
        PARSER.get_or_init(IntervalQueryParser::new)
    }

    /// Parse an interval anywhere in `q`.
    ///
    /// Thousands separators are stripped. `start <= end` is not checked.
    /// The assembly is left unset; see [`assembly_override`].
    pub fn parse(&self, q: &str) -> Option<IntervalQuery> {
        let caps = self.pattern.captures(q)?;
        let start = parse_position(&caps["gstart"])?;
        let end = parse_position(&caps["gend"])?;

        Some(IntervalQuery::new(&caps["chrom"], start, end))
    }
}

impl Default for IntervalQueryParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_position(raw: &str) -> Option<u64> {
    raw.replace(',', "").parse().ok()
}

/// Alternate assembly requested by a `hg19.` or `mm9.` query prefix
pub fn assembly_override(q: &str) -> Option<&'static str> {
    ASSEMBLY_PREFIXES
        .iter()
        .find(|(prefix, _)| q.starts_with(prefix))
        .map(|(_, assembly)| *assembly)
}
