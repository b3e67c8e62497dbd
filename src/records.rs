//! Record loading for reference, hypothesis, shot and evidence files.
//!
//! Every file kind is whitespace-delimited with no header row and a fixed
//! column count. Identifier columns are kept as strings so that leading zeros
//! and mixed formats survive loading.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading input files
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Malformed input in {input} at line {line}: {reason}")]
    MalformedInput {
        input: String,
        line: usize,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Exact identity of a shot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShotKey {
    pub corpus_id: String,
    pub video_id: String,
    pub shot_id: String,
}

impl ShotKey {
    #[must_use]
    pub fn new(corpus_id: &str, video_id: &str, shot_id: &str) -> Self {
        Self {
            corpus_id: corpus_id.to_string(),
            video_id: video_id.to_string(),
            shot_id: shot_id.to_string(),
        }
    }

    /// Borrowed view used for set lookups without cloning
    #[must_use]
    pub fn as_tuple(&self) -> (&str, &str, &str) {
        (&self.corpus_id, &self.video_id, &self.shot_id)
    }
}

impl fmt::Display for ShotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.corpus_id, self.video_id, self.shot_id)
    }
}

/// A row with a fixed whitespace-delimited schema
pub trait Record: Sized {
    /// File kind, used in error messages
    const KIND: &'static str;
    /// Exact number of columns per row
    const COLUMNS: usize;

    /// Build a record from exactly `COLUMNS` fields
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when a field cannot be coerced.
    fn from_fields(fields: &[&str]) -> Result<Self, String>;

    /// `(corpus_id, video_id)` pair used for subset filtering, if any
    fn video(&self) -> Option<(&str, &str)> {
        None
    }
}

/// Ground truth occurrence of a person in a shot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRecord {
    pub corpus_id: String,
    pub video_id: String,
    pub shot_id: String,
    pub person_name: String,
}

impl ReferenceRecord {
    #[must_use]
    pub fn shot_key(&self) -> ShotKey {
        ShotKey::new(&self.corpus_id, &self.video_id, &self.shot_id)
    }
}

impl Record for ReferenceRecord {
    const KIND: &'static str = "reference";
    const COLUMNS: usize = 4;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        Ok(Self {
            corpus_id: fields[0].to_string(),
            video_id: fields[1].to_string(),
            shot_id: fields[2].to_string(),
            person_name: fields[3].to_string(),
        })
    }

    fn video(&self) -> Option<(&str, &str)> {
        Some((&self.corpus_id, &self.video_id))
    }
}

/// Detected occurrence of a person in a shot, with a confidence score.
///
/// Submissions share this schema.
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisRecord {
    pub corpus_id: String,
    pub video_id: String,
    pub shot_id: String,
    pub person_name: String,
    pub confidence: f32,
}

impl HypothesisRecord {
    #[must_use]
    pub fn shot_key(&self) -> ShotKey {
        ShotKey::new(&self.corpus_id, &self.video_id, &self.shot_id)
    }

    #[must_use]
    pub fn shot_tuple(&self) -> (&str, &str, &str) {
        (&self.corpus_id, &self.video_id, &self.shot_id)
    }
}

impl Record for HypothesisRecord {
    const KIND: &'static str = "hypothesis";
    const COLUMNS: usize = 5;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        let confidence = fields[4]
            .parse::<f32>()
            .map_err(|e| format!("invalid confidence '{}': {e}", fields[4]))?;
        if !confidence.is_finite() {
            return Err(format!("non-finite confidence '{}'", fields[4]));
        }

        Ok(Self {
            corpus_id: fields[0].to_string(),
            video_id: fields[1].to_string(),
            shot_id: fields[2].to_string(),
            person_name: fields[3].to_string(),
            confidence,
        })
    }

    fn video(&self) -> Option<(&str, &str)> {
        Some((&self.corpus_id, &self.video_id))
    }
}

/// Shot boundaries
#[derive(Debug, Clone, PartialEq)]
pub struct ShotRecord {
    pub corpus_id: String,
    pub video_id: String,
    pub shot_id: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl ShotRecord {
    #[must_use]
    pub fn shot_key(&self) -> ShotKey {
        ShotKey::new(&self.corpus_id, &self.video_id, &self.shot_id)
    }
}

impl Record for ShotRecord {
    const KIND: &'static str = "shots";
    const COLUMNS: usize = 5;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        let parse_time = |value: &str, name: &str| {
            value
                .parse::<f64>()
                .map_err(|e| format!("invalid {name} '{value}': {e}"))
        };

        Ok(Self {
            corpus_id: fields[0].to_string(),
            video_id: fields[1].to_string(),
            shot_id: fields[2].to_string(),
            start_time: parse_time(fields[3], "start time")?,
            end_time: parse_time(fields[4], "end time")?,
        })
    }

    fn video(&self) -> Option<(&str, &str)> {
        Some((&self.corpus_id, &self.video_id))
    }
}

/// Evidence backing a person name in a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceRecord {
    pub person_name: String,
    pub corpus_id: String,
    pub video_id: String,
    pub modality: String,
    pub timestamp: String,
}

impl Record for EvidenceRecord {
    const KIND: &'static str = "evidence";
    const COLUMNS: usize = 5;

    fn from_fields(fields: &[&str]) -> Result<Self, String> {
        Ok(Self {
            person_name: fields[0].to_string(),
            corpus_id: fields[1].to_string(),
            video_id: fields[2].to_string(),
            modality: fields[3].to_string(),
            timestamp: fields[4].to_string(),
        })
    }

    fn video(&self) -> Option<(&str, &str)> {
        Some((&self.corpus_id, &self.video_id))
    }
}

/// Parse records from file contents
///
/// `source` names the input in error messages.
///
/// # Errors
///
/// Returns `MalformedInput` on the first row whose column count or types do
/// not match the schema.
pub fn parse_records<R: Record>(source: &str, content: &str) -> Result<Vec<R>, LoadError> {
    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }

        if fields.len() != R::COLUMNS {
            return Err(LoadError::MalformedInput {
                input: source.to_string(),
                line: idx + 1,
                reason: format!(
                    "expected {} columns for {} file, found {}",
                    R::COLUMNS,
                    R::KIND,
                    fields.len()
                ),
            });
        }

        let record = R::from_fields(&fields).map_err(|reason| LoadError::MalformedInput {
            input: source.to_string(),
            line: idx + 1,
            reason,
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Load records from a file path
///
/// # Errors
///
/// Returns an error if the file cannot be read or is malformed.
pub fn load_records<R: Record, P: AsRef<Path>>(path: P) -> Result<Vec<R>, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let records = parse_records(&path.display().to_string(), &content)?;

    tracing::debug!(
        path = %path.display(),
        kind = R::KIND,
        rows = records.len(),
        "Loaded records"
    );

    Ok(records)
}

/// Set of `(corpus_id, video_id)` pairs restricting an evaluation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subset {
    videos: HashMap<String, HashSet<String>>,
}

impl Subset {
    #[must_use]
    pub fn new<I, S>(videos: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut subset = Self::default();
        for (corpus_id, video_id) in videos {
            subset.insert(corpus_id.into(), video_id.into());
        }
        subset
    }

    /// Parse a subset list, one `corpus_id video_id` pair per line
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` if a non-blank line does not have two columns.
    pub fn parse(source: &str, content: &str) -> Result<Self, LoadError> {
        let mut subset = Self::default();

        for (idx, line) in content.lines().enumerate() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [] => {}
                [corpus_id, video_id] => {
                    subset.insert((*corpus_id).to_string(), (*video_id).to_string());
                }
                _ => {
                    return Err(LoadError::MalformedInput {
                        input: source.to_string(),
                        line: idx + 1,
                        reason: format!(
                            "expected 2 columns for subset file, found {}",
                            fields.len()
                        ),
                    })
                }
            }
        }

        Ok(subset)
    }

    fn insert(&mut self, corpus_id: String, video_id: String) {
        self.videos.entry(corpus_id).or_default().insert(video_id);
    }

    /// Load a subset list from a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&path.display().to_string(), &content)
    }

    #[must_use]
    pub fn contains(&self, corpus_id: &str, video_id: &str) -> bool {
        self.videos
            .get(corpus_id)
            .is_some_and(|videos| videos.contains(video_id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.videos.values().map(HashSet::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// Keep only records whose video belongs to the subset
    #[must_use]
    pub fn filter<R: Record>(&self, records: Vec<R>) -> Vec<R> {
        records
            .into_iter()
            .filter(|r| r.video().map_or(true, |(c, v)| self.contains(c, v)))
            .collect()
    }
}

/// Load a query list, one person name per line
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_queries<P: AsRef<Path>>(path: P) -> Result<Vec<String>, LoadError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_queries(&content))
}

/// Parse a query list; surrounding whitespace is trimmed and blank lines skipped
#[must_use]
pub fn parse_queries(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(String::from)
        .collect()
}
