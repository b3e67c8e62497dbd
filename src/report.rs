//! Report generation for evaluation results.
//!
//! One row per query with AP at every cutoff and the number of relevant
//! shots, followed by mean average precision per cutoff.

use crate::config::EvalConfig;
use crate::metrics::{compute_mean, Denominator, QueryResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as FmtWrite;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Style};
use tabled::Table;

/// Full evaluation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Report metadata
    pub metadata: ReportMetadata,
    /// Rank cutoffs, in reporting order
    pub cutoffs: Vec<usize>,
    /// Per-query results
    pub queries: Vec<QueryReport>,
    /// MAP at each cutoff
    pub mean_average_precision: Vec<CutoffValue>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Reference file path
    pub reference: Option<String>,
    /// Hypothesis file path
    pub hypothesis: Option<String>,
    /// Report generation timestamp
    pub generated_at: DateTime<Utc>,
    /// Framework version
    pub framework_version: String,
    /// AP normalization policy
    pub denominator: Denominator,
}

/// AP values for a single query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    pub query: String,
    /// Aligned with the report cutoffs
    pub average_precision: Vec<f64>,
    pub n_relevant: usize,
}

/// A value at one rank cutoff
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CutoffValue {
    pub cutoff: usize,
    pub value: f64,
}

/// Collects query results in evaluation order
pub struct ReportBuilder {
    cutoffs: Vec<usize>,
    denominator: Denominator,
    reference: Option<String>,
    hypothesis: Option<String>,
    queries: Vec<QueryReport>,
}

impl ReportBuilder {
    #[must_use]
    pub fn new(config: &EvalConfig) -> Self {
        Self {
            cutoffs: config.cutoffs.clone(),
            denominator: config.denominator,
            reference: None,
            hypothesis: None,
            queries: Vec::new(),
        }
    }

    /// Record the input files in the report metadata
    #[must_use]
    pub fn with_inputs(mut self, reference: &str, hypothesis: &str) -> Self {
        self.reference = Some(reference.to_string());
        self.hypothesis = Some(hypothesis.to_string());
        self
    }

    pub fn add(&mut self, query: &str, result: QueryResult) {
        self.queries.push(QueryReport {
            query: query.to_string(),
            average_precision: result.values,
            n_relevant: result.n_relevant,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    #[must_use]
    pub fn build(self) -> EvaluationReport {
        let mean_average_precision = self
            .cutoffs
            .iter()
            .enumerate()
            .map(|(i, &cutoff)| {
                let column: Vec<f64> = self
                    .queries
                    .iter()
                    .filter_map(|q| q.average_precision.get(i).copied())
                    .collect();
                CutoffValue {
                    cutoff,
                    value: compute_mean(&column),
                }
            })
            .collect();

        EvaluationReport {
            metadata: ReportMetadata {
                reference: self.reference,
                hypothesis: self.hypothesis,
                generated_at: Utc::now(),
                framework_version: env!("CARGO_PKG_VERSION").to_string(),
                denominator: self.denominator,
            },
            cutoffs: self.cutoffs,
            queries: self.queries,
            mean_average_precision,
        }
    }
}

impl EvaluationReport {
    /// Render report as JSON
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render report as plain text tables
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        let mut table = self.results_table();
        table
            .with(Style::blank())
            .modify(Columns::new(1..), Alignment::right());
        writeln!(output, "{table}").ok();

        writeln!(output).ok();
        writeln!(output, "MEAN AVERAGE PRECISION").ok();

        let mut table = self.map_table();
        table
            .with(Style::blank())
            .modify(Columns::new(1..), Alignment::right());
        writeln!(output, "{table}").ok();

        output
    }

    /// Render report as markdown
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        writeln!(output, "# Person Discovery Evaluation").ok();
        writeln!(output).ok();
        writeln!(
            output,
            "**Generated:** {}",
            self.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
        .ok();
        writeln!(output, "**Denominator:** {}", self.metadata.denominator).ok();
        writeln!(output).ok();

        writeln!(output, "## Average Precision").ok();
        writeln!(output).ok();
        let mut table = self.results_table();
        table.with(Style::markdown());
        writeln!(output, "{table}").ok();
        writeln!(output).ok();

        writeln!(output, "## Mean Average Precision").ok();
        writeln!(output).ok();
        let mut table = self.map_table();
        table.with(Style::markdown());
        writeln!(output, "{table}").ok();

        output
    }

    fn results_table(&self) -> Table {
        let mut builder = Builder::default();

        let mut header = vec!["query".to_string()];
        header.extend(self.cutoffs.iter().map(|k| format!("AP@{k}")));
        header.push("n".to_string());
        builder.push_record(header);

        for q in &self.queries {
            let mut row = vec![q.query.clone()];
            row.extend(q.average_precision.iter().map(|v| format!("{v:.3}")));
            row.push(q.n_relevant.to_string());
            builder.push_record(row);
        }

        builder.build()
    }

    fn map_table(&self) -> Table {
        let mut builder = Builder::default();
        for m in &self.mean_average_precision {
            builder.push_record([format!("MAP@{}", m.cutoff), format!("{:.3}", m.value)]);
        }
        builder.build()
    }
}
