//! # Feature Annotation
//!
//! Reads GFF3 feature tables and answers "which feature covers position p".
//!
//! ## Coordinates
//! ```text
//! GFF3 columns 4/5    1-based inclusive     [s, e]
//! Feature             0-based half-open     [s - 1, e)
//! Interval            1-based inclusive     [start + 1, end]
//! ```
//!
//! ## Lookup order
//! Intervals are keyed by `(start, end)` in insertion order. A later feature
//! with the same range replaces the label but keeps the first slot.
//! `lookup` returns the first interval in that order that contains the
//! position, not the narrowest one.

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use genomevec_core::error::{Error, Result};
use genomevec_core::AnnotationConfig;

/// Sentinel shown for positions without an overlapping feature
pub const NOT_AVAILABLE: &str = "NA";

/// Feature type marking a whole sequence record
pub const REGION_KIND: &str = "region";

/// A parsed feature in 0-based half-open coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub kind: String,
    pub start: u64,
    pub end: u64,
    /// `product` attribute, empty when absent
    pub description: String,
    pub parent: Option<String>,
}

/// Kind and description of an interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLabel {
    pub kind: String,
    pub description: String,
}

/// A 1-based inclusive interval view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval<'a> {
    pub start: u64,
    pub end: u64,
    pub label: &'a FeatureLabel,
}

impl Interval<'_> {
    #[inline]
    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Result of a position lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation<'a> {
    Feature(&'a FeatureLabel),
    NotFound,
}

impl<'a> Annotation<'a> {
    pub fn kind(&self) -> &'a str {
        match *self {
            Annotation::Feature(label) => &label.kind,
            Annotation::NotFound => NOT_AVAILABLE,
        }
    }

    pub fn description(&self) -> &'a str {
        match *self {
            Annotation::Feature(label) => &label.description,
            Annotation::NotFound => NOT_AVAILABLE,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Annotation::Feature(_))
    }
}

/// A feature line dropped while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFeature {
    pub line: usize,
    pub message: String,
}

/// Output of the GFF3 reader
#[derive(Debug, Clone, Default)]
pub struct ParsedFeatures {
    pub features: Vec<Feature>,
    pub skipped: Vec<SkippedFeature>,
}

/// Parse GFF3 text.
///
/// Malformed lines are `AnnotationParse` errors. With `config.strict` the
/// first one aborts; otherwise it is logged and recorded in `skipped`.
pub fn parse_gff3(text: &str, config: &AnnotationConfig) -> Result<ParsedFeatures> {
    let mut parsed = ParsedFeatures::default();

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim_end_matches('\r');
        if line.starts_with("##FASTA") || line.starts_with('>') {
            break;
        }
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_feature_line(line, line_no) {
            Ok(feature) => parsed.features.push(feature),
            Err(err) if config.strict => return Err(err),
            Err(err) => {
                warn!("Skipping annotation line: {}", err);
                parsed.skipped.push(SkippedFeature {
                    line: line_no,
                    message: err.to_string(),
                });
            }
        }
    }

    debug!(
        features = parsed.features.len(),
        skipped = parsed.skipped.len(),
        "Parsed GFF3"
    );
    Ok(parsed)
}

fn parse_feature_line(line: &str, line_no: usize) -> Result<Feature> {
    let parse_err = |message: String| Error::AnnotationParse {
        line: line_no,
        message,
    };

    let cols: Vec<&str> = line.split('\t').collect();
    if cols.len() != 9 {
        return Err(parse_err(format!(
            "expected 9 tab-separated columns, found {}",
            cols.len()
        )));
    }

    let start: u64 = cols[3]
        .trim()
        .parse()
        .map_err(|_| parse_err(format!("invalid start `{}`", cols[3])))?;
    let end: u64 = cols[4]
        .trim()
        .parse()
        .map_err(|_| parse_err(format!("invalid end `{}`", cols[4])))?;
    if start < 1 {
        return Err(parse_err("start must be >= 1".to_string()));
    }
    if start > end {
        return Err(parse_err(format!("start {} is after end {}", start, end)));
    }

    let mut description = String::new();
    let mut parent = None;
    for attr in cols[8].split(';') {
        let Some((key, value)) = attr.trim().split_once('=') else {
            continue;
        };
        match key {
            "product" => {
                let first = value.split(',').next().unwrap_or_default();
                description = percent_decode(first);
            }
            "Parent" => parent = Some(percent_decode(value)),
            _ => {}
        }
    }

    Ok(Feature {
        kind: cols[2].trim().to_string(),
        start: start - 1,
        end,
        description,
        parent,
    })
}

/// Decode GFF3 `%XX` escapes; malformed escapes are kept literally
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Interval set over 1-based inclusive ranges with first-match lookup
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    intervals: IndexMap<(u64, u64), FeatureLabel>,
    skipped: Vec<SkippedFeature>,
}

impl AnnotationIndex {
    /// Build from 0-based half-open features: `start = source_start + 1`,
    /// `end = source_end`.
    pub fn build<I>(features: I, config: &AnnotationConfig) -> Self
    where
        I: IntoIterator<Item = Feature>,
    {
        let mut intervals = IndexMap::new();
        for feature in features {
            if config.skip_region && feature.kind == REGION_KIND {
                continue;
            }
            if config.top_level_only && feature.parent.is_some() {
                continue;
            }
            intervals.insert(
                (feature.start + 1, feature.end),
                FeatureLabel {
                    kind: feature.kind,
                    description: feature.description,
                },
            );
        }
        Self {
            intervals,
            skipped: Vec::new(),
        }
    }

    /// Parse GFF3 text and build the index
    pub fn from_gff3_str(text: &str, config: &AnnotationConfig) -> Result<Self> {
        let parsed = parse_gff3(text, config)?;
        let mut index = Self::build(parsed.features, config);
        index.skipped = parsed.skipped;
        Ok(index)
    }

    /// Load a GFF3 file
    pub fn from_path(path: &Path, config: &AnnotationConfig) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        let index = Self::from_gff3_str(&text, config)?;
        info!(
            "Loaded {} annotation intervals from {} ({} lines skipped)",
            index.len(),
            path.display(),
            index.skipped.len()
        );
        Ok(index)
    }

    /// First interval, in insertion order, containing `position`
    pub fn lookup(&self, position: u64) -> Annotation<'_> {
        self.intervals()
            .find(|interval| interval.contains(position))
            .map_or(Annotation::NotFound, |interval| {
                Annotation::Feature(interval.label)
            })
    }

    pub fn intervals(&self) -> impl Iterator<Item = Interval<'_>> + '_ {
        self.intervals
            .iter()
            .map(|(&(start, end), label)| Interval { start, end, label })
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Malformed lines dropped while parsing
    pub fn skipped(&self) -> &[SkippedFeature] {
        &self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%2Cb"), "a,b");
        assert_eq!(percent_decode("50%"), "50%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("tRNA-Leu%3BCAA"), "tRNA-Leu;CAA");
    }

    #[test]
    fn test_feature_line_converts_to_half_open() {
        let f = parse_feature_line("seq1\tsrc\tgene\t10\t20\t.\t+\t.\tID=g1;product=x", 3).unwrap();
        assert_eq!((f.start, f.end), (9, 20));
        assert_eq!(f.kind, "gene");
        assert_eq!(f.description, "x");
        assert_eq!(f.parent, None);
    }

    #[test]
    fn test_feature_line_errors() {
        let err = parse_feature_line("seq1\tsrc\tgene\t10", 7).unwrap_err();
        assert!(matches!(err, Error::AnnotationParse { line: 7, .. }));
        assert!(parse_feature_line("s\tsrc\tgene\t0\t5\t.\t+\t.\t.", 1).is_err());
        assert!(parse_feature_line("s\tsrc\tgene\t9\t5\t.\t+\t.\t.", 1).is_err());
        assert!(parse_feature_line("s\tsrc\tgene\tx\t5\t.\t+\t.\t.", 1).is_err());
    }
}
