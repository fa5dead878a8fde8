//! Datasource identifier translation.
//!
//! Users write identifiers as `source:value` (`refseq:NM_000546`,
//! `GO:0005634`, `hgnc:1100`). The index stores them under different field
//! names, so free text and `scopes` lists are rewritten before a query is
//! built.

use regex::{NoExpand, Regex, RegexBuilder};
use std::sync::OnceLock;

/// Datasource prefix to canonical field, in application order.
///
/// Replacements are inserted literally into Lucene query-string syntax:
/// `\*` is a wildcard over sub-fields and `\:` an escaped colon. Some
/// sources keep the casing the index stores their ids with.
pub const DATASOURCE_TRANSLATIONS: &[(&str, &str)] = &[
    ("refseq:", r"refseq_agg:"),
    ("accession:", r"accession_agg:"),
    ("reporter:", r"reporter.\*:"),
    ("interpro:", r"interpro.id:"),
    // GO ids look like field queries, so search the id value itself
    ("GO:", r"go.\*.id:go\:"),
    ("homologene:", r"homologene.id:"),
    ("reagent:", r"reagent.\*.id:"),
    ("uniprot:", r"uniprot.\*:"),
    ("wikipedia:", r"wikipedia.\*:"),
    ("ensemblgene:", "ensembl.gene:"),
    ("ensembltranscript:", "ensembl.transcript:"),
    ("ensemblprotein:", "ensembl.protein:"),
    ("hgnc:", r"HGNC:"),
    ("hprd:", r"HPRD:"),
    ("mim:", r"MIM:"),
    ("mgi:", r"MGI:"),
    ("ratmap:", r"RATMAP:"),
    ("rgd:", r"RGD:"),
    ("flybase:", r"FLYBASE:"),
    ("wormbase:", r"WormBase:"),
    ("tair:", r"TAIR:"),
    ("zfin:", r"ZFIN:"),
    ("xenbase:", r"Xenbase:"),
    ("mirbase:", r"miRBase:"),
];

/// One compiled rewrite rule
#[derive(Debug, Clone)]
pub struct TranslationRule {
    pattern: Regex,
    replacement: String,
}

impl TranslationRule {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}

/// Compiled full and trimmed translation tables
#[derive(Debug, Clone)]
pub struct DatasourceTranslator {
    full: Vec<TranslationRule>,
    trimmed: Vec<TranslationRule>,
}

impl DatasourceTranslator {
    /// Compile both tables from a prefix mapping
    pub fn new(mapping: &[(&str, &str)]) -> Result<Self, regex::Error> {
        let mut full = Vec::with_capacity(mapping.len());
        let mut trimmed = Vec::with_capacity(mapping.len());

        for (prefix, field) in mapping {
            full.push(TranslationRule {
                pattern: case_insensitive(&regex::escape(prefix))?,
                replacement: field.to_string(),
            });

            trimmed.push(TranslationRule {
                pattern: case_insensitive(&regex::escape(&trim_field(prefix)))?,
                replacement: trim_field(field),
            });
        }

        Ok(Self { full, trimmed })
    }

    /// Process-wide translator over [`DATASOURCE_TRANSLATIONS`]
    pub fn global() -> &'static DatasourceTranslator {
        static TRANSLATOR: OnceLock<DatasourceTranslator> = OnceLock::new();
        TRANSLATOR.get_or_init(|| {
            // Every pattern is an escaped literal
            DatasourceTranslator::new(DATASOURCE_TRANSLATIONS)
                .expect("datasource translations must compile")
        })
    }

    pub fn full_table(&self) -> &[TranslationRule] {
        &self.full
    }

    pub fn trimmed_table(&self) -> &[TranslationRule] {
        &self.trimmed
    }

    /// Rewrite every `prefix:` occurrence in free text
    pub fn translate_text(&self, text: &str) -> String {
        self.full.iter().fold(text.to_string(), |acc, rule| {
            rule.pattern
                .replace_all(&acc, NoExpand(&rule.replacement))
                .into_owned()
        })
    }

    /// Rewrite a single scope field name.
    ///
    /// A prefix followed by `.` is a longer field name (`refseq.rna`) and is
    /// left alone.
    pub fn translate_scope(&self, scope: &str) -> String {
        self.trimmed.iter().fold(scope.to_string(), |acc, rule| {
            replace_unless_dotted(&rule.pattern, &acc, &rule.replacement)
        })
    }

    /// Rewrite a list of scope field names
    pub fn translate_scopes<S: AsRef<str>>(&self, scopes: &[S]) -> Vec<String> {
        scopes
            .iter()
            .map(|s| self.translate_scope(s.as_ref()))
            .collect()
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Drop everything from the first colon, and any escaping backslashes
fn trim_field(value: &str) -> String {
    let head = value.split(':').next().unwrap_or(value);
    head.replace('\\', "")
}

fn replace_unless_dotted(pattern: &Regex, haystack: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;

    for m in pattern.find_iter(haystack) {
        if haystack[m.end()..].starts_with('.') {
            continue;
        }
        out.push_str(&haystack[last..m.start()]);
        out.push_str(replacement);
        last = m.end();
    }

    out.push_str(&haystack[last..]);
    out
}
