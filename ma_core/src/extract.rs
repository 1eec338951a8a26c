//! Pulls filtered, paired or set-averaged intensity vectors out of samples.

use log::debug;
use ma_types::{
    DerivedValues, Gene, GeneFilter, GeneIndexMaps, GeneList, GeneProps, GeneRef, GeneTable,
    Normalization, Sample, SampleId, SampleStore, SpotId, StableId,
};
use stats_utils::{coefficient_of_variation, mean};

/// How the two fields of a duplicate-printed clone are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldMode {
    /// Use the gene's own spot only.
    #[default]
    Single,
    /// Average the gene's spot with its duplicate ("gang") spot.
    Averaged,
}

/// Which extracted vector is the primary one for downstream binning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    /// X / Y.
    #[default]
    Ratio,
    /// X alone.
    Intensity,
}

/// Mode flags of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ExtractMode {
    /// Raw or normalized intensities.
    pub normalization: Normalization,
    /// Single field or duplicate-averaged.
    pub fields: FieldMode,
    /// Ratio or intensity interpretation.
    pub kind: ValueKind,
}

/// Where the candidate genes come from.
#[derive(Debug, Clone, Copy)]
pub enum Population<'a> {
    /// Every gene of the table, tested against the active filter.
    Filtered,
    /// An explicit candidate list, in its own order, still tested against the
    /// active filter.
    List(&'a GeneList),
}

/// Destination buffer shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    /// At most this many genes are emitted; counting continues past it.
    pub capacity: usize,
    /// Also emit genes that fail the filter, with a property vector marking
    /// them `NOT_FILTERED`.
    pub want_props: bool,
}

impl Destination {
    /// Destination of a given capacity without a property vector.
    pub fn with_capacity(capacity: usize) -> Self {
        Destination {
            capacity,
            want_props: false,
        }
    }

    /// Request the property vector as well.
    pub fn with_props(mut self) -> Self {
        self.want_props = true;
        self
    }
}

/// Running minimum and maximum of X and Y over one extraction call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extrema {
    /// Smallest X.
    pub min_x: f64,
    /// Largest X.
    pub max_x: f64,
    /// Smallest Y.
    pub min_y: f64,
    /// Largest Y.
    pub max_y: f64,
}

impl Default for Extrema {
    fn default() -> Self {
        Extrema {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }
}

impl Extrema {
    fn observe(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// True if nothing was observed.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }
}

/// Output of `extract_paired`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PairedExtraction {
    /// Genes logically processed; may exceed the emitted length.
    pub count: usize,
    /// Emitted genes.
    pub genes: Vec<GeneRef>,
    /// X-role values, parallel to `genes`.
    pub x: Vec<f64>,
    /// Y-role values, parallel to `genes`.
    pub y: Vec<f64>,
    /// X / Y, 0 where Y is 0.
    pub ratio: Vec<f64>,
    /// Gene properties, when requested.
    pub props: Option<Vec<GeneProps>>,
    /// X/Y extrema over every processed gene.
    pub extrema: Extrema,
    /// Interpretation of `values()`.
    pub kind: ValueKind,
}

impl PairedExtraction {
    fn empty(kind: ValueKind) -> Self {
        PairedExtraction {
            kind,
            ..Default::default()
        }
    }

    /// The primary vector: `ratio` or `x` depending on the mode.
    pub fn values(&self) -> &[f64] {
        match self.kind {
            ValueKind::Ratio => &self.ratio,
            ValueKind::Intensity => &self.x,
        }
    }

    /// Number of genes written to the vectors.
    pub fn emitted(&self) -> usize {
        self.genes.len()
    }

    /// True if more genes matched than fit.
    pub fn is_truncated(&self) -> bool {
        self.count > self.emitted()
    }
}

/// Per-gene statistics of a group of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetStats {
    /// Mean intensity over the group.
    pub mean: f64,
    /// Coefficient of variation over the group.
    pub cv: f64,
    /// Number of samples that contributed.
    pub n: usize,
}

/// Aggregates one gene's intensity over a group of samples.
pub trait SetAggregator {
    /// Statistics of `gene` over `set`, `None` if no sample contributes.
    fn gene_stats(&self, gene: &GeneRef, set: &[SampleId]) -> Option<SetStats>;
}

/// `SetAggregator` reading straight from the sample store.
pub struct SampleSetAggregator<'a> {
    maps: &'a GeneIndexMaps,
    samples: &'a SampleStore,
    normalization: Normalization,
    fields: FieldMode,
    subtract_background: bool,
}

impl<'a> SampleSetAggregator<'a> {
    /// Aggregator over `samples` with the given read mode.
    pub fn new(
        maps: &'a GeneIndexMaps,
        samples: &'a SampleStore,
        normalization: Normalization,
        fields: FieldMode,
        subtract_background: bool,
    ) -> Self {
        SampleSetAggregator {
            maps,
            samples,
            normalization,
            fields,
            subtract_background,
        }
    }
}

impl SetAggregator for SampleSetAggregator<'_> {
    fn gene_stats(&self, gene: &GeneRef, set: &[SampleId]) -> Option<SetStats> {
        let spot = gene.spot_id?;
        let values: Vec<f64> = set
            .iter()
            .filter_map(|&id| self.samples.get(id))
            .filter(|s| s.has_valid_data())
            .filter_map(|s| {
                field_value(
                    self.maps,
                    s,
                    spot,
                    self.normalization,
                    self.fields,
                    self.subtract_background,
                )
            })
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(SetStats {
            mean: mean(&values),
            cv: coefficient_of_variation(&values),
            n: values.len(),
        })
    }
}

/// Output of `extract_set_mean`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetMeanExtraction {
    /// Genes logically processed; may exceed the emitted length.
    pub count: usize,
    /// Emitted genes.
    pub genes: Vec<GeneRef>,
    /// Mean over the X group.
    pub x_mean: Vec<f64>,
    /// Mean over the Y group.
    pub y_mean: Vec<f64>,
    /// CV over the X group.
    pub x_cv: Vec<f64>,
    /// CV over the Y group.
    pub y_cv: Vec<f64>,
    /// X mean / Y mean, 0 where the Y mean is 0.
    pub ratio: Vec<f64>,
    /// Gene properties, when requested.
    pub props: Option<Vec<GeneProps>>,
    /// Extrema of the group means.
    pub extrema: Extrema,
}

/// Reads genes' values out of one or two samples (or sample groups),
/// honoring the active filter.
pub struct CompositeDataExtractor<'a> {
    maps: &'a GeneIndexMaps,
    samples: &'a SampleStore,
    filter: &'a dyn GeneFilter,
    subtract_background: bool,
}

impl<'a> CompositeDataExtractor<'a> {
    /// Extractor over a layout, its samples and the active filter.
    pub fn new(
        maps: &'a GeneIndexMaps,
        samples: &'a SampleStore,
        filter: &'a dyn GeneFilter,
        subtract_background: bool,
    ) -> Self {
        CompositeDataExtractor {
            maps,
            samples,
            filter,
            subtract_background,
        }
    }

    /// Extract paired X/Y vectors for the population from samples `x` and
    /// `y` (which may be the same sample).
    ///
    /// Every processed gene gets its ratio, X and Y cached in
    /// `Gene::derived`. Returns an empty result, with no side effects, when a
    /// sample is missing or the destination has zero capacity.
    pub fn extract_paired(
        &self,
        genes: &mut GeneTable,
        population: Population<'_>,
        x: SampleId,
        y: SampleId,
        mode: ExtractMode,
        dest: Destination,
    ) -> PairedExtraction {
        let (Some(sx), Some(sy)) = (self.samples.get(x), self.samples.get(y)) else {
            return PairedExtraction::empty(mode.kind);
        };
        if dest.capacity == 0 {
            return PairedExtraction::empty(mode.kind);
        }
        let same_sample_fields = self.maps.fields_per_clone() == 2 && x == y;

        let mut out = PairedExtraction::empty(mode.kind);
        let mut props = dest.want_props.then(Vec::new);
        self.for_each_candidate(genes, population, dest.want_props, |gene, spot, passes| {
            let Some((vx, vy)) = self.pair_values(sx, sy, spot, mode, same_sample_fields) else {
                return;
            };
            let ratio = if vy == 0.0 { 0.0 } else { vx / vy };
            gene.derived = DerivedValues {
                ratio,
                x: vx,
                y: vy,
            };
            out.count += 1;
            out.extrema.observe(vx, vy);
            if out.genes.len() < dest.capacity {
                out.genes.push(gene.gene_ref);
                out.x.push(vx);
                out.y.push(vy);
                out.ratio.push(ratio);
                if let Some(props) = props.as_mut() {
                    props.push(emitted_props(gene, passes));
                }
            }
        });
        out.props = props;
        debug!(
            "extract_paired({}, {}): {} processed, {} emitted",
            sx.name(),
            sy.name(),
            out.count,
            out.emitted()
        );
        out
    }

    /// Extract per-gene group means and coefficients of variation for an X
    /// group and a Y group of samples, delegating the per-gene aggregation.
    pub fn extract_set_mean(
        &self,
        genes: &mut GeneTable,
        population: Population<'_>,
        x_set: &[SampleId],
        y_set: &[SampleId],
        dest: Destination,
        aggregator: &dyn SetAggregator,
    ) -> SetMeanExtraction {
        if x_set.is_empty() || y_set.is_empty() || dest.capacity == 0 {
            return SetMeanExtraction::default();
        }
        let mut out = SetMeanExtraction::default();
        let mut props = dest.want_props.then(Vec::new);
        self.for_each_candidate(genes, population, dest.want_props, |gene, _spot, passes| {
            let (Some(xs), Some(ys)) = (
                aggregator.gene_stats(&gene.gene_ref, x_set),
                aggregator.gene_stats(&gene.gene_ref, y_set),
            ) else {
                return;
            };
            let ratio = if ys.mean == 0.0 {
                0.0
            } else {
                xs.mean / ys.mean
            };
            gene.derived = DerivedValues {
                ratio,
                x: xs.mean,
                y: ys.mean,
            };
            out.count += 1;
            out.extrema.observe(xs.mean, ys.mean);
            if out.genes.len() < dest.capacity {
                out.genes.push(gene.gene_ref);
                out.x_mean.push(xs.mean);
                out.y_mean.push(ys.mean);
                out.x_cv.push(xs.cv);
                out.y_cv.push(ys.cv);
                out.ratio.push(ratio);
                if let Some(props) = props.as_mut() {
                    props.push(emitted_props(gene, passes));
                }
            }
        });
        out.props = props;
        debug!(
            "extract_set_mean({} x {}): {} processed",
            x_set.len(),
            y_set.len(),
            out.count
        );
        out
    }

    /// X and Y of one spot; `None` skips the gene.
    fn pair_values(
        &self,
        sx: &Sample,
        sy: &Sample,
        spot: SpotId,
        mode: ExtractMode,
        same_sample_fields: bool,
    ) -> Option<(f64, f64)> {
        if same_sample_fields {
            // Two fields and one sample: field 1 against field 2.
            let gang = self.maps.gang_of(spot)?;
            let norm = mode.normalization;
            return Some((
                sx.intensity(spot, norm, self.subtract_background)?,
                sx.intensity(gang, norm, self.subtract_background)?,
            ));
        }
        Some((self.value(sx, spot, mode)?, self.value(sy, spot, mode)?))
    }

    fn value(&self, sample: &Sample, spot: SpotId, mode: ExtractMode) -> Option<f64> {
        field_value(
            self.maps,
            sample,
            spot,
            mode.normalization,
            mode.fields,
            self.subtract_background,
        )
    }

    /// Apply the gene-level skip rules in population order and hand each
    /// surviving gene, its spot and whether it passed the filter to `f`.
    fn for_each_candidate<F>(
        &self,
        genes: &mut GeneTable,
        population: Population<'_>,
        keep_failing: bool,
        mut f: F,
    ) where
        F: FnMut(&mut Gene, SpotId, bool),
    {
        let ids: Vec<StableId> = match population {
            Population::Filtered => genes.ids().collect(),
            Population::List(list) => list.iter().map(|g| g.stable_id).collect(),
        };
        for id in ids {
            let Some(gene) = genes.get_mut(id) else {
                continue;
            };
            if gene.is_bad_spot() {
                continue;
            }
            let passes = self.filter.passes(id);
            if !passes && !keep_failing {
                continue;
            }
            let Some(spot) = gene.gene_ref.spot_id else {
                continue;
            };
            f(gene, spot, passes);
        }
    }
}

/// Property bits of an emitted gene, NOT_FILTERED set when it failed the
/// filter.
fn emitted_props(gene: &Gene, passes: bool) -> GeneProps {
    let mut p = gene.props;
    p.set(GeneProps::NOT_FILTERED, !passes);
    p
}

/// Intensity of a gene's spot in one sample, averaged with its duplicate spot
/// when the layout prints more than one field per clone and averaging is on.
fn field_value(
    maps: &GeneIndexMaps,
    sample: &Sample,
    spot: SpotId,
    normalization: Normalization,
    fields: FieldMode,
    subtract_background: bool,
) -> Option<f64> {
    let v = sample.intensity(spot, normalization, subtract_background)?;
    if fields == FieldMode::Averaged && maps.fields_per_clone() > 1 {
        if let Some(g) = maps
            .gang_of(spot)
            .and_then(|gang| sample.intensity(gang, normalization, subtract_background))
        {
            return Some((v + g) / 2.0);
        }
    }
    Some(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ma_types::{AcceptAll, Background, Gene, GridCoords, Sample};

    const RAW: ExtractMode = ExtractMode {
        normalization: Normalization::Raw,
        fields: FieldMode::Single,
        kind: ValueKind::Ratio,
    };

    /// Five genes on spots 0..5, one field, two samples.
    fn fixture() -> (GeneIndexMaps, GeneTable, SampleStore) {
        let maps = GeneIndexMaps::new(
            (0..5).map(|i| Some(SpotId(i))).collect(),
            vec![None; 5],
            (0..5).map(|i| GridCoords::new(1, 1, 1, i as u32 + 1)).collect(),
            1,
        )
        .unwrap();
        let genes = GeneTable::from_genes(
            (0..5).map(|i| Gene::new(maps.gene_ref(StableId(i)), format!("g{i}"))),
        );
        let mut samples = SampleStore::new();
        samples.push(
            Sample::new(
                "x",
                vec![10.0, 20.0, 30.0, 1000.0, 50.0],
                Background::None,
                vec![],
            )
            .unwrap(),
        );
        samples.push(
            Sample::new("y", vec![5.0, 10.0, 0.0, 1.0, 25.0], Background::None, vec![]).unwrap(),
        );
        (maps, genes, samples)
    }

    #[test]
    fn test_bad_spot_excluded() {
        let (maps, mut genes, samples) = fixture();
        genes.get_mut(StableId(3)).unwrap().props |= GeneProps::BAD_SPOT;
        let ex = CompositeDataExtractor::new(&maps, &samples, &AcceptAll, false);
        let out = ex.extract_paired(
            &mut genes,
            Population::Filtered,
            SampleId(0),
            SampleId(1),
            RAW,
            Destination::with_capacity(5),
        );
        assert_eq!(out.count, 4);
        assert_eq!(out.x, vec![10.0, 20.0, 30.0, 50.0]);
        assert_eq!(out.y, vec![5.0, 10.0, 0.0, 25.0]);
        assert_eq!(out.extrema.max_x, 50.0);
        assert_eq!(out.extrema.min_y, 0.0);
        assert_eq!(out.extrema.max_y, 25.0);
        // zero denominator maps to ratio 0
        assert_eq!(out.ratio, vec![2.0, 2.0, 0.0, 2.0]);
        assert_eq!(genes.get(StableId(2)).unwrap().derived.x, 30.0);
        assert_eq!(genes.get(StableId(3)).unwrap().derived, DerivedValues::default());
    }

    #[test]
    fn test_truncation_keeps_counting() {
        let (maps, mut genes, samples) = fixture();
        let ex = CompositeDataExtractor::new(&maps, &samples, &AcceptAll, false);
        let out = ex.extract_paired(
            &mut genes,
            Population::Filtered,
            SampleId(0),
            SampleId(1),
            RAW,
            Destination::with_capacity(2),
        );
        assert_eq!(out.count, 5);
        assert_eq!(out.emitted(), 2);
        assert!(out.is_truncated());
        // extrema cover genes past the capacity
        assert_eq!(out.extrema.max_x, 1000.0);
        assert_eq!(genes.get(StableId(4)).unwrap().derived.ratio, 2.0);
    }

    #[test]
    fn test_filter_and_props_vector() {
        let (maps, mut genes, samples) = fixture();
        let odd = |id: StableId| id.0 % 2 == 1;
        let ex = CompositeDataExtractor::new(&maps, &samples, &odd, false);
        let out = ex.extract_paired(
            &mut genes,
            Population::Filtered,
            SampleId(0),
            SampleId(1),
            RAW,
            Destination::with_capacity(5),
        );
        assert_eq!(out.count, 2);
        assert!(out.props.is_none());

        let out = ex.extract_paired(
            &mut genes,
            Population::Filtered,
            SampleId(0),
            SampleId(1),
            RAW,
            Destination::with_capacity(5).with_props(),
        );
        assert_eq!(out.count, 5);
        let props = out.props.unwrap();
        assert!(props[0].contains(GeneProps::NOT_FILTERED));
        assert!(!props[1].contains(GeneProps::NOT_FILTERED));
    }

    #[test]
    fn test_explicit_list_order_and_unassigned_spot() {
        let maps = GeneIndexMaps::new(
            vec![Some(SpotId(0)), None, Some(SpotId(1))],
            vec![None; 2],
            vec![GridCoords::default(); 2],
            1,
        )
        .unwrap();
        let mut genes =
            GeneTable::from_genes((0..3).map(|i| Gene::new(maps.gene_ref(StableId(i)), "")));
        let mut samples = SampleStore::new();
        let s =
            samples.push(Sample::new("s", vec![1.0, 2.0], Background::None, vec![]).unwrap());
        let mut list = GeneList::new("l");
        list.extend([StableId(2), StableId(1), StableId(0)].map(|id| maps.gene_ref(id)));
        let ex = CompositeDataExtractor::new(&maps, &samples, &AcceptAll, false);
        let out = ex.extract_paired(
            &mut genes,
            Population::List(&list),
            s,
            s,
            RAW,
            Destination::with_capacity(3),
        );
        assert_eq!(out.count, 2);
        assert_eq!(out.x, vec![2.0, 1.0]);
        assert_eq!(out.ratio, vec![1.0, 1.0]);
    }

    #[test]
    fn test_empty_inputs_have_no_side_effects() {
        let (maps, mut genes, samples) = fixture();
        let ex = CompositeDataExtractor::new(&maps, &samples, &AcceptAll, false);
        let out = ex.extract_paired(
            &mut genes,
            Population::Filtered,
            SampleId(0),
            SampleId(9),
            RAW,
            Destination::with_capacity(5),
        );
        assert_eq!(out.count, 0);
        let out = ex.extract_paired(
            &mut genes,
            Population::Filtered,
            SampleId(0),
            SampleId(1),
            RAW,
            Destination::with_capacity(0),
        );
        assert_eq!(out.count, 0);
        assert!(out.extrema.is_empty());
        assert!(genes.iter().all(|g| g.derived == DerivedValues::default()));
    }

    #[test]
    fn test_repeat_extraction_is_identical() {
        let (maps, mut genes, samples) = fixture();
        let ex = CompositeDataExtractor::new(&maps, &samples, &AcceptAll, false);
        let run = |genes: &mut GeneTable| {
            ex.extract_paired(
                genes,
                Population::Filtered,
                SampleId(0),
                SampleId(1),
                RAW,
                Destination::with_capacity(5),
            )
        };
        let a = run(&mut genes);
        let b = run(&mut genes);
        assert_eq!(a, b);
    }

    /// Two fields: gene i on spot i (field 1) with gang spot i + 2 (field 2).
    fn two_field_fixture() -> (GeneIndexMaps, GeneTable, SampleStore) {
        let maps = GeneIndexMaps::new(
            vec![Some(SpotId(0)), Some(SpotId(1))],
            [2, 3, 0, 1].map(|s| Some(SpotId(s))).to_vec(),
            vec![
                GridCoords::new(1, 1, 1, 1),
                GridCoords::new(1, 1, 1, 2),
                GridCoords::new(2, 1, 1, 1),
                GridCoords::new(2, 1, 1, 2),
            ],
            2,
        )
        .unwrap();
        let genes =
            GeneTable::from_genes((0..2).map(|i| Gene::new(maps.gene_ref(StableId(i)), "")));
        let mut samples = SampleStore::new();
        for (name, raw) in [("a", [10.0, 20.0, 30.0, 40.0]), ("b", [1.0, 2.0, 3.0, 4.0])] {
            samples.push(Sample::new(name, raw.to_vec(), Background::None, vec![]).unwrap());
        }
        (maps, genes, samples)
    }

    #[test]
    fn test_same_sample_two_fields_reads_f1_against_f2() {
        let (maps, mut genes, samples) = two_field_fixture();
        let ex = CompositeDataExtractor::new(&maps, &samples, &AcceptAll, false);
        let out = ex.extract_paired(
            &mut genes,
            Population::Filtered,
            SampleId(0),
            SampleId(0),
            RAW,
            Destination::with_capacity(2),
        );
        assert_eq!(out.x, vec![10.0, 20.0]);
        assert_eq!(out.y, vec![30.0, 40.0]);
    }

    #[test]
    fn test_duplicate_field_averaging() {
        let (maps, mut genes, samples) = two_field_fixture();
        let ex = CompositeDataExtractor::new(&maps, &samples, &AcceptAll, false);
        let mode = ExtractMode {
            fields: FieldMode::Averaged,
            kind: ValueKind::Intensity,
            ..RAW
        };
        let out = ex.extract_paired(
            &mut genes,
            Population::Filtered,
            SampleId(0),
            SampleId(1),
            mode,
            Destination::with_capacity(2),
        );
        assert_eq!(out.x, vec![20.0, 30.0]);
        assert_eq!(out.y, vec![2.0, 3.0]);
        assert_eq!(out.values(), &[20.0, 30.0]);
    }

    #[test]
    fn test_set_mean() {
        let (maps, mut genes, samples) = two_field_fixture();
        let agg = SampleSetAggregator::new(
            &maps,
            &samples,
            Normalization::Raw,
            FieldMode::Single,
            false,
        );
        let ex = CompositeDataExtractor::new(&maps, &samples, &AcceptAll, false);
        let out = ex.extract_set_mean(
            &mut genes,
            Population::Filtered,
            &[SampleId(0), SampleId(1)],
            &[SampleId(1)],
            Destination::with_capacity(2),
            &agg,
        );
        assert_eq!(out.count, 2);
        assert_eq!(out.x_mean, vec![5.5, 11.0]);
        assert_eq!(out.y_mean, vec![1.0, 2.0]);
        assert_eq!(out.y_cv, vec![0.0, 0.0]);
        assert_eq!(out.ratio, vec![5.5, 5.5]);
        assert!(out.x_cv[0] > 1.0);
        assert_eq!(genes.get(StableId(1)).unwrap().derived.x, 11.0);

        let empty = ex.extract_set_mean(
            &mut genes,
            Population::Filtered,
            &[],
            &[SampleId(1)],
            Destination::with_capacity(2),
            &agg,
        );
        assert_eq!(empty.count, 0);
    }

    #[test]
    fn test_set_mean_marks_genes_failing_the_filter() {
        let (maps, mut genes, samples) = fixture();
        let agg = SampleSetAggregator::new(
            &maps,
            &samples,
            Normalization::Raw,
            FieldMode::Single,
            false,
        );
        let only_first = |id: StableId| id == StableId(0);
        let ex = CompositeDataExtractor::new(&maps, &samples, &only_first, false);
        let x_set = [SampleId(0)];
        let y_set = [SampleId(1)];

        let out = ex.extract_set_mean(
            &mut genes,
            Population::Filtered,
            &x_set,
            &y_set,
            Destination::with_capacity(10),
            &agg,
        );
        assert_eq!(out.count, 1);
        assert_eq!(out.genes, vec![maps.gene_ref(StableId(0))]);
        assert!(out.props.is_none());

        let out = ex.extract_set_mean(
            &mut genes,
            Population::Filtered,
            &x_set,
            &y_set,
            Destination::with_capacity(10).with_props(),
            &agg,
        );
        assert_eq!(out.count, 5);
        let props = out.props.unwrap();
        assert_eq!(props.len(), out.genes.len());
        assert!(!props[0].contains(GeneProps::NOT_FILTERED));
        assert!(props[1..]
            .iter()
            .all(|p| p.contains(GeneProps::NOT_FILTERED)));
    }
}
