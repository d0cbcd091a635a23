// Markov progression statistics and the shared weighted-selection routine.
//
// Two tables drive chord choice:
// - First order: a 7×7 matrix, previous degree -> next-degree weights.
// - Second order: ordered (prev_prev, prev) pairs for the common pop and
//   cadential progressions. When a pair is present it overrides the first
//   order row; otherwise lookup backs off to the first order.
// An opening row covers the first chord of a progression, where there is no
// previous degree to condition on.
//
// Rows are unnormalized weights; probabilities are computed at use. Both the
// batch generator (progression.rs) and the live suggestion engine
// (suggest.rs) read from the same `ProgressionModel`.

use crate::chord::ScaleDegree;
use crate::tension::tension;
use chordsmith_prng::HarmonyRng;
use std::collections::BTreeMap;

/// Next-degree weights indexed by `ScaleDegree::index()`.
pub type TransitionRow = [f64; 7];

/// How strongly the tension-match term favours degrees near the target.
const TENSION_MATCH_GAIN: f64 = 2.0;

/// Upper bound of the per-degree creativity jitter, as a fraction of creativity.
const CREATIVITY_JITTER: f64 = 0.5;

const FIRST_ORDER: [TransitionRow; 7] = [
    // from I
    [0.05, 0.10, 0.05, 0.30, 0.30, 0.15, 0.05],
    // from ii
    [0.10, 0.02, 0.05, 0.13, 0.50, 0.10, 0.10],
    // from iii
    [0.05, 0.05, 0.02, 0.30, 0.08, 0.45, 0.05],
    // from IV
    [0.30, 0.10, 0.05, 0.03, 0.35, 0.12, 0.05],
    // from V
    [0.55, 0.05, 0.05, 0.10, 0.03, 0.20, 0.02],
    // from vi
    [0.10, 0.25, 0.05, 0.35, 0.15, 0.03, 0.07],
    // from vii
    [0.60, 0.02, 0.15, 0.03, 0.05, 0.13, 0.02],
];

/// (prev_prev, prev) -> next weights.
const SECOND_ORDER: [((u8, u8), TransitionRow); 12] = [
    ((1, 5), [0.15, 0.05, 0.05, 0.25, 0.02, 0.45, 0.03]),
    ((5, 6), [0.10, 0.10, 0.10, 0.55, 0.05, 0.02, 0.08]),
    ((6, 4), [0.50, 0.05, 0.02, 0.03, 0.35, 0.03, 0.02]),
    ((4, 1), [0.05, 0.10, 0.05, 0.25, 0.40, 0.13, 0.02]),
    ((1, 4), [0.20, 0.05, 0.03, 0.02, 0.45, 0.20, 0.05]),
    ((4, 5), [0.55, 0.02, 0.05, 0.05, 0.02, 0.28, 0.03]),
    ((2, 5), [0.70, 0.02, 0.03, 0.05, 0.02, 0.15, 0.03]),
    ((6, 2), [0.10, 0.02, 0.03, 0.15, 0.60, 0.05, 0.05]),
    ((1, 6), [0.05, 0.30, 0.05, 0.45, 0.10, 0.02, 0.03]),
    ((6, 5), [0.25, 0.05, 0.05, 0.40, 0.02, 0.20, 0.03]),
    ((5, 1), [0.05, 0.10, 0.05, 0.35, 0.20, 0.20, 0.05]),
    ((3, 6), [0.05, 0.40, 0.05, 0.40, 0.05, 0.02, 0.03]),
];

/// Weights for the first chord of a progression.
const OPENING: TransitionRow = [0.50, 0.08, 0.02, 0.15, 0.10, 0.15, 0.00];

/// Loaded first- and second-order progression tables.
#[derive(Debug, Clone)]
pub struct ProgressionModel {
    pub first_order: [TransitionRow; 7],
    pub second_order: BTreeMap<(ScaleDegree, ScaleDegree), TransitionRow>,
    pub opening: TransitionRow,
}

impl Default for ProgressionModel {
    fn default() -> Self {
        Self::default_model()
    }
}

impl ProgressionModel {
    /// Built-in tables distilled from common-practice and pop progressions.
    pub fn default_model() -> Self {
        let second_order = SECOND_ORDER
            .iter()
            .map(|&((a, b), row)| ((degree(a), degree(b)), row))
            .collect();

        ProgressionModel {
            first_order: FIRST_ORDER,
            second_order,
            opening: OPENING,
        }
    }

    pub fn first_order_row(&self, from: ScaleDegree) -> &TransitionRow {
        &self.first_order[from.index()]
    }

    pub fn second_order_row(&self, prev_prev: ScaleDegree, prev: ScaleDegree) -> Option<&TransitionRow> {
        self.second_order.get(&(prev_prev, prev))
    }

    /// Row to sample the next degree from, backing off from second order to
    /// first order to the opening row.
    pub fn next_row(&self, prev: Option<ScaleDegree>, prev_prev: Option<ScaleDegree>) -> &TransitionRow {
        match (prev_prev, prev) {
            (Some(pp), Some(p)) => self
                .second_order_row(pp, p)
                .unwrap_or_else(|| self.first_order_row(p)),
            (None, Some(p)) => self.first_order_row(p),
            _ => &self.opening,
        }
    }

    /// Normalized first-order probability of `from -> to`.
    pub fn first_order_probability(&self, from: ScaleDegree, to: ScaleDegree) -> f64 {
        normalize(self.first_order_row(from))[to.index()]
    }

    /// Normalized second-order probability, backing off to first order when
    /// the pair has no entry.
    pub fn second_order_probability(&self, prev_prev: ScaleDegree, prev: ScaleDegree, to: ScaleDegree) -> f64 {
        match self.second_order_row(prev_prev, prev) {
            Some(row) => normalize(row)[to.index()],
            None => self.first_order_probability(prev, to),
        }
    }
}

fn degree(n: u8) -> ScaleDegree {
    ScaleDegree::ALL[(n - 1) as usize]
}

/// Scale a row to sum to 1. An all-zero row stays all zero.
pub fn normalize(row: &TransitionRow) -> TransitionRow {
    let total: f64 = row.iter().sum();
    if total <= 0.0 {
        return [0.0; 7];
    }
    row.map(|w| w / total)
}

/// Apply tension matching and creativity jitter to a transition row.
///
/// Returns `(degree, weight)` pairs in ascending degree order, the order
/// `weighted_select` walks. `creativity` is clamped to 0..=1; NaN counts as 0.
pub fn reweight(
    row: &TransitionRow,
    target_tension: f64,
    creativity: f64,
    rng: &mut HarmonyRng,
) -> Vec<(ScaleDegree, f64)> {
    let creativity = if creativity.is_nan() { 0.0 } else { creativity.clamp(0.0, 1.0) };
    ScaleDegree::ALL
        .iter()
        .map(|&d| {
            let mut weight = row[d.index()];
            weight *= 1.0 + (1.0 - (target_tension - tension(d)).abs()) * TENSION_MATCH_GAIN;
            weight *= 1.0 + rng.range_f64(0.0, creativity * CREATIVITY_JITTER);
            if d == ScaleDegree::III || d == ScaleDegree::VII {
                weight *= 1.0 + creativity;
            }
            (d, weight)
        })
        .collect()
}

/// Draw a degree with probability proportional to its weight.
///
/// Entries are walked in slice order, so callers control tie-breaking by
/// how they order the slice. Non-positive weights are never chosen. If the
/// weights sum to zero the tonic is returned.
pub fn weighted_select(weights: &[(ScaleDegree, f64)], rng: &mut HarmonyRng) -> ScaleDegree {
    let total: f64 = weights.iter().map(|&(_, w)| w.max(0.0)).sum();
    if total <= 0.0 || !total.is_finite() {
        tracing::debug!(entries = weights.len(), "empty weight table, falling back to tonic");
        return ScaleDegree::I;
    }

    let mut remaining = rng.range_f64(0.0, total);
    let mut last = ScaleDegree::I;
    for &(degree, weight) in weights {
        if weight <= 0.0 {
            continue;
        }
        last = degree;
        remaining -= weight;
        if remaining <= 0.0 {
            return degree;
        }
    }
    // Rounding can leave a sliver of `remaining`; it belongs to the last entry.
    last
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(weights: &[(ScaleDegree, f64)], draws: usize, seed: u64) -> [usize; 7] {
        let mut rng = HarmonyRng::new(seed);
        let mut counts = [0usize; 7];
        for _ in 0..draws {
            counts[weighted_select(weights, &mut rng).index()] += 1;
        }
        counts
    }

    #[test]
    fn test_rows_are_distributions() {
        let model = ProgressionModel::default_model();
        for row in model.first_order.iter().chain(model.second_order.values()) {
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "row sums to {sum}");
        }
    }

    #[test]
    fn test_second_order_overrides_first() {
        let model = ProgressionModel::default_model();
        let row = model.next_row(Some(ScaleDegree::V), Some(ScaleDegree::I));
        assert_eq!(row, model.second_order_row(ScaleDegree::I, ScaleDegree::V).unwrap());
    }

    #[test]
    fn test_backoff_to_first_order() {
        let model = ProgressionModel::default_model();
        // (vii, iii) has no second-order entry.
        let row = model.next_row(Some(ScaleDegree::III), Some(ScaleDegree::VII));
        assert_eq!(row, model.first_order_row(ScaleDegree::III));
        assert_eq!(
            model.second_order_probability(ScaleDegree::VII, ScaleDegree::III, ScaleDegree::VI),
            model.first_order_probability(ScaleDegree::III, ScaleDegree::VI)
        );
    }

    #[test]
    fn test_opening_row_without_history() {
        let model = ProgressionModel::default_model();
        assert_eq!(model.next_row(None, None), &model.opening);
    }

    #[test]
    fn test_zero_weights_fall_back_to_tonic() {
        let mut rng = HarmonyRng::new(1);
        let weights: Vec<_> = ScaleDegree::ALL.iter().map(|&d| (d, 0.0)).collect();
        assert_eq!(weighted_select(&weights, &mut rng), ScaleDegree::I);
        assert_eq!(weighted_select(&[], &mut rng), ScaleDegree::I);
    }

    #[test]
    fn test_single_weight_always_selected() {
        let weights = [(ScaleDegree::II, 0.0), (ScaleDegree::VI, 3.0), (ScaleDegree::VII, 0.0)];
        let c = counts(&weights, 500, 3);
        assert_eq!(c[ScaleDegree::VI.index()], 500);
    }

    #[test]
    fn test_reweight_clamps_creativity() {
        let row = ProgressionModel::default_model().first_order[0];
        let at = |creativity: f64| reweight(&row, 0.4, creativity, &mut HarmonyRng::new(19));
        assert_eq!(at(-1.0), at(0.0));
        assert_eq!(at(f64::NAN), at(0.0));
        assert_eq!(at(5.0), at(1.0));
    }

    #[test]
    fn test_selection_frequencies_follow_weights() {
        let weights = [(ScaleDegree::I, 3.0), (ScaleDegree::V, 1.0)];
        let c = counts(&weights, 20_000, 11);
        let ratio = c[ScaleDegree::I.index()] as f64 / 20_000.0;
        assert!((ratio - 0.75).abs() < 0.02, "expected ~0.75, got {ratio}");
    }

    #[test]
    fn test_tension_match_favours_target() {
        let flat = [1.0; 7];
        let mut rng = HarmonyRng::new(5);
        let weights = reweight(&flat, 0.9, 0.0, &mut rng);
        let vii = weights[ScaleDegree::VII.index()].1;
        let tonic = weights[ScaleDegree::I.index()].1;
        assert!((vii - 3.0).abs() < 1e-9);
        assert!(vii > tonic);
    }

    #[test]
    fn test_creativity_boosts_colour_degrees() {
        let flat = [1.0; 7];
        let draws = 2000;
        let mut rng = HarmonyRng::new(8);
        let mut tame = 0.0;
        let mut wild = 0.0;
        for _ in 0..draws {
            tame += reweight(&flat, 0.5, 0.0, &mut rng)[ScaleDegree::III.index()].1;
            wild += reweight(&flat, 0.5, 1.0, &mut rng)[ScaleDegree::III.index()].1;
        }
        assert!(wild / tame > 2.0);
    }
}
