//! Submission and evidence validation.
//!
//! Checks run in a fixed order and each stops at its first violation:
//! - person names use only lowercase letters and underscores
//! - every submitted shot belongs to the shot list, when one is given
//! - evidence person names are unique and match the submission names exactly
//! - evidence modality is `written` or `pronounced`
//!
//! ## Example
//!
//! ```rust,ignore
//! use person_discovery_eval::validate::Validator;
//!
//! let validator = Validator::from_shots_file("shots.txt")?;
//! validator.validate_files("submission.txt", Some("evidence.txt"))?;
//! ```

use crate::records::{
    load_records, EvidenceRecord, HypothesisRecord, LoadError, ShotKey, ShotRecord,
};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use thiserror::Error;

/// Evidence modalities accepted in evidence files
pub const ALLOWED_MODALITIES: [&str; 2] = ["written", "pronounced"];

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid person name ({0})")]
    InvalidPersonName(String),

    #[error("Invalid shot ({0})")]
    InvalidShot(ShotKey),

    #[error("Duplicate person name in evidence ({0})")]
    DuplicateEvidence(String),

    #[error("Extra person name in evidence ({0})")]
    ExtraEvidence(String),

    #[error("Missing person name in evidence ({0})")]
    MissingEvidence(String),

    #[error("Incorrect modality in evidence ({0})")]
    InvalidModality(String),

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Whether a person name only uses `a-z` and `_`
#[must_use]
pub fn is_valid_person_name(name: &str) -> bool {
    name.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

/// Submission validator with an optional reference shot list
#[derive(Debug, Clone, Default)]
pub struct Validator {
    shots: Option<HashSet<ShotKey>>,
}

impl Validator {
    #[must_use]
    pub const fn new(shots: Option<HashSet<ShotKey>>) -> Self {
        Self { shots }
    }

    /// Build a validator checking shots against a shot list file
    ///
    /// # Errors
    ///
    /// Returns an error if the shot file cannot be read or is malformed.
    pub fn from_shots_file<P: AsRef<Path>>(path: P) -> Result<Self, ValidationError> {
        let shots: Vec<ShotRecord> = load_records(path)?;
        let shots: HashSet<ShotKey> = shots.iter().map(ShotRecord::shot_key).collect();

        tracing::debug!(shots = shots.len(), "Shot list loaded");
        Ok(Self::new(Some(shots)))
    }

    /// Validate a submission and, optionally, its evidence
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in check order.
    pub fn validate(
        &self,
        submission: &[HypothesisRecord],
        evidence: Option<&[EvidenceRecord]>,
    ) -> Result<(), ValidationError> {
        let result = self.run_checks(submission, evidence);

        if let Err(e) = &result {
            tracing::error!(error = %e, "Submission rejected");
        } else {
            tracing::info!(
                rows = submission.len(),
                evidence = evidence.map(<[EvidenceRecord]>::len),
                "Submission valid"
            );
        }

        result
    }

    fn run_checks(
        &self,
        submission: &[HypothesisRecord],
        evidence: Option<&[EvidenceRecord]>,
    ) -> Result<(), ValidationError> {
        check_person_names(submission)?;

        if let Some(shots) = &self.shots {
            check_shots(submission, shots)?;
        }

        if let Some(evidence) = evidence {
            check_evidence_person_names(submission, evidence)?;
            check_modalities(evidence)?;
        }

        Ok(())
    }

    /// Load and validate a submission file and optional evidence file
    ///
    /// # Errors
    ///
    /// Returns a load error for malformed files, otherwise the first violation.
    pub fn validate_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        submission: P,
        evidence: Option<Q>,
    ) -> Result<(), ValidationError> {
        let submission: Vec<HypothesisRecord> = load_records(submission)?;
        let evidence: Option<Vec<EvidenceRecord>> = match evidence {
            Some(path) => Some(load_records(path)?),
            None => None,
        };

        self.validate(&submission, evidence.as_deref())
    }
}

fn submission_person_names(submission: &[HypothesisRecord]) -> BTreeSet<&str> {
    submission.iter().map(|r| r.person_name.as_str()).collect()
}

fn check_person_names(submission: &[HypothesisRecord]) -> Result<(), ValidationError> {
    match submission_person_names(submission)
        .into_iter()
        .find(|name| !is_valid_person_name(name))
    {
        Some(name) => Err(ValidationError::InvalidPersonName(name.to_string())),
        None => Ok(()),
    }
}

fn check_shots(
    submission: &[HypothesisRecord],
    shots: &HashSet<ShotKey>,
) -> Result<(), ValidationError> {
    let invalid: BTreeSet<ShotKey> = submission
        .iter()
        .map(HypothesisRecord::shot_key)
        .filter(|shot| !shots.contains(shot))
        .collect();

    match invalid.into_iter().next() {
        Some(shot) => Err(ValidationError::InvalidShot(shot)),
        None => Ok(()),
    }
}

fn check_evidence_person_names(
    submission: &[HypothesisRecord],
    evidence: &[EvidenceRecord],
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for record in evidence {
        if !seen.insert(record.person_name.as_str()) {
            return Err(ValidationError::DuplicateEvidence(record.person_name.clone()));
        }
    }

    let submitted = submission_person_names(submission);

    if let Some(extra) = seen.difference(&submitted).next() {
        return Err(ValidationError::ExtraEvidence((*extra).to_string()));
    }

    if let Some(missing) = submitted.difference(&seen).next() {
        return Err(ValidationError::MissingEvidence((*missing).to_string()));
    }

    Ok(())
}

fn check_modalities(evidence: &[EvidenceRecord]) -> Result<(), ValidationError> {
    let invalid: BTreeSet<&str> = evidence
        .iter()
        .map(|r| r.modality.as_str())
        .filter(|m| !ALLOWED_MODALITIES.contains(m))
        .collect();

    match invalid.into_iter().next() {
        Some(modality) => Err(ValidationError::InvalidModality(modality.to_string())),
        None => Ok(()),
    }
}
