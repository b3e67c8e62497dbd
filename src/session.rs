//! Query sessions over one reference grouping and one hypothesis table.
//!
//! The evaluator is built once per reference file. Each hypothesis file gets
//! its own [`QuerySession`], which answers queries strictly one at a time and
//! recomputes every query-scoped value from scratch.
//!
//! ## Example
//!
//! ```rust,ignore
//! use person_discovery_eval::{AveragePrecision, EvalConfig};
//!
//! let evaluator = AveragePrecision::from_file("reference.txt", None, EvalConfig::default())?;
//! let mut session = evaluator.open_file("hypothesis.txt")?;
//! for query in ["herve_bredin", "claude_barras"] {
//!     let result = session.query(query);
//!     println!("{query}: {:?} ({} relevant)", result.values, result.n_relevant);
//! }
//! session.close();
//! ```

use crate::config::EvalConfig;
use crate::metrics::{average_precision, QueryResult};
use crate::ranking::HypothesisTable;
use crate::records::{load_records, HypothesisRecord, LoadError, ReferenceRecord, ShotKey, Subset};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Reference grouping plus evaluation settings
#[derive(Debug, Clone)]
pub struct AveragePrecision {
    /// Person name to the shots where they appear, one entry per reference row
    groups: BTreeMap<String, Vec<ShotKey>>,
    subset: Option<Subset>,
    config: EvalConfig,
}

impl AveragePrecision {
    /// Group reference records by person name
    ///
    /// Records outside `subset` are dropped first. An empty subset restricts
    /// nothing.
    #[must_use]
    pub fn new(
        reference: Vec<ReferenceRecord>,
        subset: Option<Subset>,
        config: EvalConfig,
    ) -> Self {
        let subset = subset.filter(|s| !s.is_empty());
        let reference = match &subset {
            Some(s) => s.filter(reference),
            None => reference,
        };

        let mut groups: BTreeMap<String, Vec<ShotKey>> = BTreeMap::new();
        for record in reference {
            let shot = record.shot_key();
            groups.entry(record.person_name).or_default().push(shot);
        }

        tracing::info!(
            persons = groups.len(),
            subset_videos = subset.as_ref().map(Subset::len),
            cutoffs = ?config.cutoffs,
            denominator = %config.denominator,
            "Reference loaded"
        );

        Self {
            groups,
            subset,
            config,
        }
    }

    /// Load and group a reference file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        subset: Option<Subset>,
        config: EvalConfig,
    ) -> Result<Self, LoadError> {
        let reference: Vec<ReferenceRecord> = load_records(path)?;
        Ok(Self::new(reference, subset, config))
    }

    /// All distinct reference person names, sorted
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    #[must_use]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    #[must_use]
    pub fn cutoffs(&self) -> &[usize] {
        &self.config.cutoffs
    }

    /// Reference shots for a person, if any
    #[must_use]
    pub fn relevant(&self, person_name: &str) -> Option<&[ShotKey]> {
        self.groups.get(person_name).map(Vec::as_slice)
    }

    /// Open a session over hypothesis records
    ///
    /// Records outside the subset are dropped before the table is built.
    #[must_use]
    pub fn open(&self, hypothesis: Vec<HypothesisRecord>) -> QuerySession<'_> {
        let hypothesis = match &self.subset {
            Some(s) => s.filter(hypothesis),
            None => hypothesis,
        };
        self.open_table(HypothesisTable::new(hypothesis))
    }

    /// Open a session over an already built table, used as-is
    #[must_use]
    pub fn open_table(&self, hypothesis: HypothesisTable) -> QuerySession<'_> {
        tracing::debug!(rows = hypothesis.len(), "Query session opened");
        QuerySession {
            evaluator: self,
            hypothesis,
            answered: 0,
        }
    }

    /// Load a hypothesis file and open a session over it
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn open_file<P: AsRef<Path>>(&self, path: P) -> Result<QuerySession<'_>, LoadError> {
        let hypothesis: Vec<HypothesisRecord> = load_records(path)?;
        Ok(self.open(hypothesis))
    }
}

/// Request/response session bound to one hypothesis table
#[derive(Debug)]
pub struct QuerySession<'a> {
    evaluator: &'a AveragePrecision,
    hypothesis: HypothesisTable,
    answered: usize,
}

impl QuerySession<'_> {
    /// Average precision of the hypothesis ranking for `query`
    ///
    /// A query with no reference occurrence scores 1.0 at every cutoff with
    /// `n_relevant = 0`.
    pub fn query(&mut self, query: &str) -> QueryResult {
        self.answered += 1;
        let config = &self.evaluator.config;

        let Some(relevant) = self.evaluator.relevant(query) else {
            tracing::debug!(query, "No reference occurrence, nothing to find");
            return QueryResult::nothing_to_find(&config.cutoffs);
        };

        let shots: HashSet<(&str, &str, &str)> =
            relevant.iter().map(ShotKey::as_tuple).collect();
        let ranked = self
            .hypothesis
            .rank(query, |h| shots.contains(&h.shot_tuple()));
        let relevance: Vec<bool> = ranked.iter().map(|s| s.relevant).collect();

        let result = average_precision(
            &relevance,
            relevant.len(),
            &config.cutoffs,
            config.denominator,
        );

        tracing::debug!(
            query,
            n_relevant = result.n_relevant,
            n_returned = relevance.len(),
            values = ?result.values,
            "Query evaluated"
        );

        result
    }

    #[must_use]
    pub fn hypothesis(&self) -> &HypothesisTable {
        &self.hypothesis
    }

    /// Number of queries answered so far
    #[must_use]
    pub const fn answered(&self) -> usize {
        self.answered
    }

    /// End the session; returns the number of queries answered
    pub fn close(self) -> usize {
        tracing::debug!(answered = self.answered, "Query session closed");
        self.answered
    }
}
