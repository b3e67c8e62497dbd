//! # Person Discovery Eval
//!
//! Evaluation metric for person discovery in broadcast TV: given a reference
//! list of shots where each person appears and a hypothesis list of detected
//! (shot, person, confidence) rows, compute average precision at rank K for
//! each queried person name.
//!
//! ## Ranking
//!
//! Hypothesis person names are matched to the query fuzzily. Rows are ranked by
//! normalized edit distance to the query, then by confidence, then by a
//! precomputed shot-order tie rank, then by video id. Relevance is exact: a row
//! is relevant iff its (corpus, video, shot) appears in the reference for the
//! queried person.
//!
//! ## Architecture
//!
//! ```text
//! reference.txt ─→ records ─→ AveragePrecision (grouped by person)
//!                                    │
//! hypothesis.txt ─→ records ─→ HypothesisTable (name length, tie rank)
//!                                    │
//!                     query ─→ QuerySession::query
//!                                    │  distance + relevance, fresh per query
//!                                    ↓
//!                              ranking ─→ metrics (AP@K)
//!                                    ↓
//!                              report (AP table, MAP)
//! ```
//!
//! Submission validation (`validate`) is a separate pipeline over the same
//! record types.

pub mod config;
pub mod distance;
pub mod metrics;
pub mod ranking;
pub mod records;
pub mod report;
pub mod session;
pub mod validate;

pub use config::{parse_denominator, ConfigError, EvalConfig, OutputFormat};
pub use distance::{levenshtein, normalized_distance, DistanceScorer};
pub use metrics::{average_precision, compute_mean, Denominator, QueryResult};
pub use ranking::{compute_tie_ranks, HypothesisTable, QueryScratch, RankedHypothesis};
pub use records::{
    load_queries, load_records, parse_queries, parse_records, EvidenceRecord, HypothesisRecord,
    LoadError, Record, ReferenceRecord, ShotKey, ShotRecord, Subset,
};
pub use report::{CutoffValue, EvaluationReport, QueryReport, ReportBuilder, ReportMetadata};
pub use session::{AveragePrecision, QuerySession};
pub use validate::{is_valid_person_name, ValidationError, Validator, ALLOWED_MODALITIES};
