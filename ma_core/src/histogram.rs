//! Ratio and intensity histograms over a fixed bin-edge table.

use ma_types::{GeneList, GeneRef, GeneTable};
use parameters_toml::Parameters;
use std::ops::RangeInclusive;

/// Ratio bin edges, finer near 1.0. Each edge below 1.0 is the reciprocal of
/// the mirrored edge above it.
pub const RATIO_BIN_EDGES: [f64; 39] = [
    0.01, 0.02, 0.033333, 0.05, 0.066667, 0.1, 0.133333, 0.2, 0.25, 0.333333, 0.4, 0.5, 0.571429,
    0.666667, 0.75, 0.8, 0.833333, 0.909091, 0.952381, 1.0, 1.05, 1.1, 1.2, 1.25, 1.333333, 1.5,
    1.75, 2.0, 2.5, 3.0, 4.0, 5.0, 7.5, 10.0, 15.0, 20.0, 30.0, 50.0, 100.0,
];

/// Problems with a bin-edge table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistogramError {
    /// Fewer than two edges.
    #[error("a histogram needs at least two bin edges, got {0}")]
    TooFewEdges(usize),

    /// Edges not strictly ascending.
    #[error("bin edge {index} ({value}) is not above the previous edge")]
    NotAscending {
        /// Position of the offending edge.
        index: usize,
        /// Its value.
        value: f64,
    },

    /// The clamp range reaches outside the table.
    #[error("clamp range [{lo}, {hi}] is not covered by bin edges [{first}, {last}]")]
    RangeNotCovered {
        /// Lower clamp bound.
        lo: f64,
        /// Upper clamp bound.
        hi: f64,
        /// First edge.
        first: f64,
        /// Last edge.
        last: f64,
    },
}

/// How a pair of intensities becomes a clamped ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioRule {
    /// Lower clamp bound.
    pub min_ratio: f64,
    /// Upper clamp bound.
    pub max_ratio: f64,
    /// Ratio for `0 / positive`.
    pub min_sentinel: f64,
    /// Ratio for `positive / 0`.
    pub max_sentinel: f64,
}

impl RatioRule {
    /// Rule from the configured parameters.
    pub fn from_parameters(params: &Parameters) -> Self {
        RatioRule {
            min_ratio: params.min_ratio,
            max_ratio: params.max_ratio,
            min_sentinel: params.min_ratio_sentinel,
            max_sentinel: params.max_ratio_sentinel,
        }
    }

    /// Clamped ratio `g1 / g2`. `None` for `0 / 0` and for non-finite input.
    pub fn ratio(&self, g1: f64, g2: f64) -> Option<f64> {
        if !g1.is_finite() || !g2.is_finite() {
            return None;
        }
        let r = if g1 > 0.0 && g2 == 0.0 {
            self.max_sentinel
        } else if g1 == 0.0 && g2 > 0.0 {
            self.min_sentinel
        } else if g1 == 0.0 && g2 == 0.0 {
            return None;
        } else {
            g1 / g2
        };
        Some(r.clamp(self.min_ratio, self.max_ratio))
    }
}

impl Default for RatioRule {
    fn default() -> Self {
        RatioRule::from_parameters(&Parameters::default())
    }
}

/// Bin counts over an ascending edge table. Counts and the touched range are
/// rebuilt from zero by every batch call.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    edges: Vec<f64>,
    counts: Vec<usize>,
    lo: f64,
    hi: f64,
    touched: Option<(usize, usize)>,
}

impl Histogram {
    /// Histogram over `edges`; values are clamped into `[lo, hi]` before
    /// binning, so the edges must cover that range.
    pub fn with_edges(edges: Vec<f64>, lo: f64, hi: f64) -> Result<Self, HistogramError> {
        if edges.len() < 2 {
            return Err(HistogramError::TooFewEdges(edges.len()));
        }
        for (i, w) in edges.windows(2).enumerate() {
            if w[1] <= w[0] || w[1].is_nan() {
                return Err(HistogramError::NotAscending {
                    index: i + 1,
                    value: w[1],
                });
            }
        }
        let (first, last) = (edges[0], edges[edges.len() - 1]);
        if lo < first || hi > last || lo > hi {
            return Err(HistogramError::RangeNotCovered {
                lo,
                hi,
                first,
                last,
            });
        }
        let n_bins = edges.len() - 1;
        Ok(Histogram {
            edges,
            counts: vec![0; n_bins],
            lo,
            hi,
            touched: None,
        })
    }

    /// The ratio histogram over `RATIO_BIN_EDGES`, clamped to the configured
    /// ratio range.
    pub fn ratio(params: &Parameters) -> Result<Self, HistogramError> {
        Histogram::with_edges(RATIO_BIN_EDGES.to_vec(), params.min_ratio, params.max_ratio)
    }

    /// Log-spaced intensity histogram from the configured geometry.
    pub fn intensity(params: &Parameters) -> Result<Self, HistogramError> {
        let (lo, hi) = (params.intensity_hist_min, params.intensity_hist_max);
        let n = params.intensity_hist_bins;
        let step = (hi / lo).ln() / n as f64;
        let mut edges: Vec<f64> = (0..=n).map(|i| lo * (step * i as f64).exp()).collect();
        // pin the ends against rounding
        edges[0] = lo;
        edges[n] = hi;
        Histogram::with_edges(edges, lo, hi)
    }

    /// Bin each pair `(g1[i], g2[i])` as a clamped ratio. Returns the number
    /// of pairs processed, which always equals the sum of the counts.
    pub fn bin_ratios(&mut self, g1: &[f64], g2: &[f64], rule: &RatioRule) -> usize {
        self.reset();
        let mut processed = 0;
        for (&a, &b) in g1.iter().zip(g2) {
            if let Some(r) = rule.ratio(a, b) {
                processed += self.add(r);
            }
        }
        processed
    }

    /// Bin values directly after clamping. Non-finite values are skipped.
    pub fn bin_values(&mut self, values: &[f64]) -> usize {
        self.reset();
        let mut processed = 0;
        for &v in values {
            if v.is_finite() {
                processed += self.add(v.clamp(self.lo, self.hi));
            }
        }
        processed
    }

    fn reset(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
        self.touched = None;
    }

    fn add(&mut self, v: f64) -> usize {
        let Some(j) = self.bin_index(v) else {
            return 0;
        };
        self.counts[j] += 1;
        self.touched = Some(match self.touched {
            None => (j, j),
            Some((lo, hi)) => (lo.min(j), hi.max(j)),
        });
        1
    }

    /// Bin holding `v`: the first `j` with `edge[j] <= v < edge[j + 1]`, the
    /// last bin also taking `v == last edge`.
    pub fn bin_index(&self, v: f64) -> Option<usize> {
        let n_bins = self.counts.len();
        for j in 0..n_bins {
            if self.edges[j] <= v && v < self.edges[j + 1] {
                return Some(j);
            }
        }
        (v == self.edges[n_bins]).then_some(n_bins - 1)
    }

    /// Count per bin.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Bin edges, one more than the number of bins.
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Lowest and highest bin touched by the last batch.
    pub fn touched_range(&self) -> Option<RangeInclusive<usize>> {
        self.touched.map(|(lo, hi)| lo..=hi)
    }

    /// Text label of a bin, e.g. `[0.95, 1)`. Panics if `j` is not a bin.
    pub fn bin_label(&self, j: usize) -> String {
        let close = if j + 1 == self.n_bins() { ']' } else { ')' };
        format!("[{}, {}{close}", self.edges[j], self.edges[j + 1])
    }

    /// Refill `out`, in the order of `candidates`, with the genes whose
    /// cached ratio falls in `bins`. Returns the number selected.
    pub fn select_genes_in_bins<'a>(
        &self,
        genes: &GeneTable,
        candidates: impl IntoIterator<Item = &'a GeneRef>,
        bins: RangeInclusive<usize>,
        out: &mut GeneList,
    ) -> usize {
        let selected: Vec<GeneRef> = candidates
            .into_iter()
            .filter_map(|gene_ref| genes.get(gene_ref.stable_id))
            .filter(|gene| gene.derived.ratio.is_finite())
            .filter(|gene| {
                self.bin_index(gene.derived.ratio.clamp(self.lo, self.hi))
                    .map_or(false, |j| bins.contains(&j))
            })
            .map(|gene| gene.gene_ref)
            .collect();
        out.refill(selected);
        out.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ma_types::{DerivedValues, Gene, StableId};
    use proptest::prelude::*;

    fn ratio_hist() -> Histogram {
        Histogram::ratio(&Parameters::default()).unwrap()
    }

    #[test]
    fn test_edge_table_is_reciprocal() {
        let n = RATIO_BIN_EDGES.len();
        for k in 0..n {
            let product = RATIO_BIN_EDGES[k] * RATIO_BIN_EDGES[n - 1 - k];
            assert!((product - 1.0).abs() < 1e-4, "edge {k}: {product}");
        }
        assert_eq!(RATIO_BIN_EDGES[n / 2], 1.0);
    }

    #[test]
    fn test_sentinels() {
        let rule = RatioRule::default();
        assert_eq!(rule.ratio(5.0, 0.0), Some(100.0));
        assert_eq!(rule.ratio(0.0, 5.0), Some(0.01));
        assert_eq!(rule.ratio(0.0, 0.0), None);
        assert_eq!(rule.ratio(f64::NAN, 1.0), None);
        assert_eq!(rule.ratio(3.0, 2.0), Some(1.5));
        // sentinels inside the range are not clamped
        let wide = RatioRule {
            max_sentinel: 20.0,
            min_sentinel: 0.05,
            ..rule
        };
        assert_eq!(wide.ratio(5.0, 0.0), Some(20.0));
        assert_eq!(wide.ratio(0.0, 5.0), Some(0.05));
    }

    #[test]
    fn test_binning_boundaries() {
        let h = ratio_hist();
        assert_eq!(h.bin_index(1.0), Some(19));
        assert_eq!(h.bin_index(0.99), Some(18));
        assert_eq!(h.bin_index(0.01), Some(0));
        assert_eq!(h.bin_index(100.0), Some(37));
        assert_eq!(h.bin_index(100.5), None);
        assert_eq!(h.bin_label(19), "[1, 1.05)");
        assert_eq!(h.bin_label(37), "[50, 100]");
    }

    #[test]
    fn test_batch_resets_counts_and_range() {
        let mut h = ratio_hist();
        let rule = RatioRule::default();
        assert_eq!(h.bin_ratios(&[1.0, 2.0, 5.0], &[1.0, 1.0, 0.0], &rule), 3);
        assert_eq!(h.touched_range(), Some(19..=37));
        assert_eq!(h.total(), 3);
        assert_eq!(h.bin_ratios(&[1.0, 0.0], &[1.0, 0.0], &rule), 1);
        assert_eq!(h.total(), 1);
        assert_eq!(h.touched_range(), Some(19..=19));
        assert_eq!(h.bin_ratios(&[], &[], &rule), 0);
        assert_eq!(h.touched_range(), None);
    }

    #[test]
    fn test_intensity_histogram() {
        let params = Parameters {
            intensity_hist_bins: 4,
            intensity_hist_min: 1.0,
            intensity_hist_max: 10_000.0,
            ..Parameters::default()
        };
        let mut h = Histogram::intensity(&params).unwrap();
        assert_eq!(h.n_bins(), 4);
        assert!((h.edges()[2] - 100.0).abs() < 1e-9);
        assert_eq!(h.bin_values(&[0.5, 50.0, 5000.0, 1e9, f64::NAN]), 4);
        assert_eq!(h.counts(), &[1, 1, 0, 2]);
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert_eq!(
            Histogram::with_edges(vec![1.0], 1.0, 1.0),
            Err(HistogramError::TooFewEdges(1))
        );
        assert!(matches!(
            Histogram::with_edges(vec![1.0, 3.0, 2.0], 1.0, 2.0),
            Err(HistogramError::NotAscending { index: 2, .. })
        ));
        assert!(matches!(
            Histogram::with_edges(vec![1.0, 2.0], 0.5, 2.0),
            Err(HistogramError::RangeNotCovered { .. })
        ));
    }

    #[test]
    fn test_select_genes_in_bins() {
        let ratios = [0.5, 1.02, 3.0, 0.0, 1.0];
        let genes = GeneTable::from_genes(ratios.iter().enumerate().map(|(i, &ratio)| {
            let mut g = Gene::new(GeneRef::new(StableId(i), None), "");
            g.derived = DerivedValues {
                ratio,
                ..Default::default()
            };
            g
        }));
        let candidates: Vec<GeneRef> = genes.iter().rev().map(|g| g.gene_ref).collect();
        let h = ratio_hist();
        let mut out = GeneList::new("ratio 1..1.05");
        assert_eq!(h.select_genes_in_bins(&genes, &candidates, 19..=19, &mut out), 2);
        assert_eq!(
            out.iter().map(|g| g.stable_id).collect::<Vec<_>>(),
            vec![StableId(4), StableId(1)]
        );
        // a zero ratio clamps into the lowest bin
        assert_eq!(h.select_genes_in_bins(&genes, &candidates, 0..=0, &mut out), 1);
        assert!(out.contains(StableId(3)));
        assert!(!out.contains(StableId(4)));
    }

    proptest! {
        #[test]
        fn prop_clamped_ratio_in_range(g1 in -1e6f64..1e6, g2 in -1e6f64..1e6) {
            let rule = RatioRule::default();
            if let Some(r) = rule.ratio(g1, g2) {
                prop_assert!((rule.min_ratio..=rule.max_ratio).contains(&r));
                let raw = g1 / g2;
                if g1 != 0.0 && g2 != 0.0 && raw > rule.max_ratio {
                    prop_assert_eq!(r, rule.max_ratio);
                }
                if g1 != 0.0 && g2 != 0.0 && raw < rule.min_ratio {
                    prop_assert_eq!(r, rule.min_ratio);
                }
            }
        }

        #[test]
        fn prop_counts_sum_to_processed(
            pairs in proptest::collection::vec((0f64..1e4, 0f64..1e4), 0..200)
        ) {
            let (g1, g2): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let mut h = ratio_hist();
            let processed = h.bin_ratios(&g1, &g2, &RatioRule::default());
            prop_assert_eq!(h.total(), processed);
            let expected = g1.iter().zip(&g2).filter(|(a, b)| **a != 0.0 || **b != 0.0).count();
            prop_assert_eq!(processed, expected);
        }
    }
}
