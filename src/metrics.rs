//! Average precision at rank K.
//!
//! For a ranked list with binary relevance `rel[1..n]` and cutoff `k`:
//!
//! ```text
//! k'   = min(n_returned, k)
//! AP_k = Σ_{i ≤ k'} rel[i] · P(i) / min(n_relevant, k')
//! P(i) = Σ_{j ≤ i} rel[j] / i
//! ```
//!
//! A query with no relevant shot has nothing to find and scores 1.0 at every
//! cutoff.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalization policy for AP at rank K
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Denominator {
    /// Divide by `min(n_relevant, min(n_returned, k))`
    #[default]
    Returned,
    /// Only look at the top `min(n_relevant, k)` rows and divide by that
    /// window, even when fewer rows were returned
    RelevantCapped,
}

impl Denominator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Returned => "returned",
            Self::RelevantCapped => "relevant-capped",
        }
    }
}

impl fmt::Display for Denominator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Denominator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "returned" => Ok(Self::Returned),
            "relevant-capped" | "relevant_capped" | "relevant" => Ok(Self::RelevantCapped),
            _ => Err(format!(
                "unknown denominator '{s}' (expected 'returned' or 'relevant-capped')"
            )),
        }
    }
}

/// AP values for one query, aligned with the requested cutoffs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub values: Vec<f64>,
    /// Number of reference occurrences of the query (0 if unseen)
    pub n_relevant: usize,
}

impl QueryResult {
    /// Perfect score for a query absent from the reference
    #[must_use]
    pub fn nothing_to_find(cutoffs: &[usize]) -> Self {
        Self {
            values: vec![1.0; cutoffs.len()],
            n_relevant: 0,
        }
    }
}

/// Compute AP at every cutoff for a ranked relevance list
///
/// `relevance` holds one flag per returned row, in rank order.
#[must_use]
pub fn average_precision(
    relevance: &[bool],
    n_relevant: usize,
    cutoffs: &[usize],
    denominator: Denominator,
) -> QueryResult {
    if n_relevant == 0 {
        return QueryResult::nothing_to_find(cutoffs);
    }

    let precision_terms = precision_terms(relevance);

    let values = cutoffs
        .iter()
        .map(|&k| match denominator {
            Denominator::Returned => {
                let window = relevance.len().min(k);
                ratio(&precision_terms[..window], n_relevant.min(window))
            }
            Denominator::RelevantCapped => {
                let window = n_relevant.min(k);
                let visible = window.min(relevance.len());
                ratio(&precision_terms[..visible], window)
            }
        })
        .collect();

    QueryResult { values, n_relevant }
}

/// `rel[i] · P(i)` for every rank, 0-indexed
#[allow(clippy::cast_precision_loss)]
fn precision_terms(relevance: &[bool]) -> Vec<f64> {
    let mut hits = 0usize;
    relevance
        .iter()
        .enumerate()
        .map(|(i, &relevant)| {
            if relevant {
                hits += 1;
                hits as f64 / (i + 1) as f64
            } else {
                0.0
            }
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn ratio(terms: &[f64], denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    terms.iter().sum::<f64>() / denominator as f64
}

/// Compute mean of samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn compute_mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}
