//! Pairwise sample correlation over the filtered gene population.

use crate::extract::{
    CompositeDataExtractor, Destination, ExtractMode, FieldMode, Population, ValueKind,
};
use itertools::Itertools;
use log::info;
use ma_types::{GeneTable, Normalization, SampleId, SampleStore};
use ndarray::Array2;
use stats_utils::linear_correlation;

/// Receives "percent complete" updates from long computations.
pub trait Progress {
    /// Called between units of work.
    fn report(&mut self, percent: u32, msg: &str);
}

impl<F> Progress for F
where
    F: FnMut(u32, &str),
{
    fn report(&mut self, percent: u32, msg: &str) {
        self(percent, msg)
    }
}

/// Writes progress to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn report(&mut self, percent: u32, msg: &str) {
        info!("{percent:>3}% {msg}");
    }
}

/// Symmetric correlation table between the samples with valid data.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    ids: Vec<SampleId>,
    labels: Vec<String>,
    values: Array2<f64>,
    descriptions: Array2<String>,
}

impl CorrelationMatrix {
    /// Number of samples in the table.
    pub fn n(&self) -> usize {
        self.ids.len()
    }

    /// Sample ids in row order.
    pub fn ids(&self) -> &[SampleId] {
        &self.ids
    }

    /// Sample names in row order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Coefficient at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied()
    }

    /// Descriptive string (r, n, t, p) of a pair; empty on the diagonal.
    pub fn description(&self, row: usize, col: usize) -> Option<&str> {
        self.descriptions.get((row, col)).map(String::as_str)
    }

    /// The coefficient matrix.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// True if `M[i][j] == M[j][i]` everywhere.
    pub fn is_symmetric(&self) -> bool {
        self.values == self.values.t()
    }

    /// Tab-separated table: header of sample names, then one row per sample
    /// with 4-decimal coefficients.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        out.push('\t');
        out.push_str(&self.labels.iter().join("\t"));
        out.push('\n');
        for (label, row) in self.labels.iter().zip(self.values.rows()) {
            out.push_str(label);
            out.push('\t');
            out.push_str(&row.iter().map(|v| format!("{v:.4}")).join("\t"));
            out.push('\n');
        }
        out
    }
}

/// Builds the correlation table. O(samples² × genes).
pub struct CorrelationMatrixEngine;

impl CorrelationMatrixEngine {
    /// Correlate every unordered pair of valid samples over the extractor's
    /// filtered population.
    pub fn compute(
        extractor: &CompositeDataExtractor<'_>,
        genes: &mut GeneTable,
        samples: &SampleStore,
        progress: &mut dyn Progress,
    ) -> CorrelationMatrix {
        let ids = samples.valid_ids();
        let labels: Vec<String> = ids
            .iter()
            .filter_map(|&id| samples.get(id))
            .map(|s| s.name().to_string())
            .collect();
        let n = ids.len();
        let mut values = Array2::<f64>::eye(n);
        let mut descriptions = Array2::<String>::default((n, n));

        let mode = ExtractMode {
            normalization: Normalization::Normalized,
            fields: FieldMode::Single,
            kind: ValueKind::Intensity,
        };
        let total_pairs = n * n.saturating_sub(1) / 2;
        let mut done = 0;
        for row in 0..n {
            for col in row + 1..n {
                let pair = extractor.extract_paired(
                    genes,
                    Population::Filtered,
                    ids[row],
                    ids[col],
                    mode,
                    Destination::with_capacity(usize::MAX),
                );
                let corr = linear_correlation(&pair.x, &pair.y);
                values[[row, col]] = corr.r;
                values[[col, row]] = corr.r;
                let text = corr.to_string();
                descriptions[[col, row]] = text.clone();
                descriptions[[row, col]] = text;

                done += 1;
                progress.report(
                    (done * 100 / total_pairs) as u32,
                    &format!("{} vs {}", labels[row], labels[col]),
                );
            }
        }
        info!("correlated {n} samples ({total_pairs} pairs)");
        CorrelationMatrix {
            ids,
            labels,
            values,
            descriptions,
        }
    }
}
