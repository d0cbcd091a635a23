// Live next-chord suggestion from a performer's recent chord history.
//
// Each call scores all seven degrees against the last (up to 20) chords
// played and returns the top few as ranked suggestions. The score for a
// candidate degree is an additive blend of:
//
// - First-order Markov probability from the last chord (0.40 weight).
// - Second-order probability from the last two chords (0.30 weight), backing
//   off to first order for unlisted pairs.
// - Root-motion bonuses: the previous root a fifth or fourth above the
//   candidate, step-wise motion, and a homing bonus for the tonic. The tonic
//   bonus stacks with the interval bonuses.
// - A functional-harmony bonus (dominant -> tonic, subdominant -> dominant,
//   tonic -> subdominant), scaled by 0.7. This can fire together with the
//   fifth bonus for the same transition; both are summed.
// - Creativity jitter so repeated calls do not always rank identically.
//
// The engine holds only static tables; it never remembers past calls. The
// host owns the history log.

use crate::chord::ScaleDegree;
use crate::markov::ProgressionModel;
use chordsmith_prng::HarmonyRng;
use serde::{Deserialize, Serialize};

/// Only this many most-recent entries are considered.
pub const HISTORY_WINDOW: usize = 20;

/// Suggestions returned for a non-empty history.
const MAX_SUGGESTIONS: usize = 4;

/// Suggestions returned for an empty history.
const STARTER_SUGGESTIONS: usize = 3;

/// Transitions more likely than this count as "predictable".
const PREDICTABLE_PROBABILITY: f64 = 0.15;

/// Fixed opening choices offered before anything has been played.
const STARTERS: [(ScaleDegree, f64, &str); 5] = [
    (ScaleDegree::I, 0.35, "Start on the tonic"),
    (ScaleDegree::V, 0.25, "Open on the dominant"),
    (ScaleDegree::IV, 0.20, "Subdominant opening"),
    (ScaleDegree::VI, 0.12, "Relative minor opening"),
    (ScaleDegree::II, 0.08, "Pre-dominant opening"),
];

/// One chord played by the performer. `timestamp` is in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChordHistoryEntry {
    pub degree: ScaleDegree,
    pub timestamp: f64,
}

impl ChordHistoryEntry {
    pub fn new(degree: ScaleDegree, timestamp: f64) -> Self {
        ChordHistoryEntry { degree, timestamp }
    }
}

/// Confidence band of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionCategory {
    Strong,
    Moderate,
    Adventurous,
}

impl SuggestionCategory {
    pub fn from_probability(probability: f64) -> Self {
        if probability > 0.3 {
            SuggestionCategory::Strong
        } else if probability >= 0.15 {
            SuggestionCategory::Moderate
        } else {
            SuggestionCategory::Adventurous
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordSuggestion {
    pub degree: ScaleDegree,
    pub probability: f64,
    /// Plain-text explanation, e.g. "Circle of fifths, Home base".
    pub reason: String,
    pub category: SuggestionCategory,
}

/// Where a played chord appeared among the suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuggestionMatch {
    /// 1-based rank.
    pub rank: usize,
    pub probability: f64,
}

/// Timing and predictability statistics of a performer's recent playing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayingPattern {
    /// Mean time between consecutive chords (ms).
    pub average_interval: f64,
    /// 1 for perfectly even timing, falling to 0 as timing varies.
    pub consistency: f64,
    /// Fraction of transitions the first-order table rates as likely.
    pub predictability: f64,
}

/// Additive weights of the suggestion score. Tunable parameters.
#[derive(Debug, Clone)]
pub struct SuggestionWeights {
    pub first_order: f64,
    pub second_order: f64,

    // Root motion
    pub fifth_above: f64,
    pub fourth_above: f64,
    pub step: f64,
    pub tonic: f64,

    // Functional harmony, scaled by `function_scale`
    pub function_scale: f64,
    pub dominant_to_tonic: f64,
    pub subdominant_to_dominant: f64,
    pub tonic_to_subdominant: f64,

    // Creativity jitter; the bounds are reordered if given high-to-low
    pub jitter_low: f64,
    pub jitter_high: f64,
    pub colour_bonus: f64,

    /// First-order probability at which "Common progression" is reported.
    pub common_threshold: f64,
}

impl Default for SuggestionWeights {
    fn default() -> Self {
        SuggestionWeights {
            first_order: 0.40,
            second_order: 0.30,

            fifth_above: 0.15,
            fourth_above: 0.12,
            step: 0.08,
            tonic: 0.10,

            function_scale: 0.7,
            dominant_to_tonic: 0.20,
            subdominant_to_dominant: 0.15,
            tonic_to_subdominant: 0.12,

            jitter_low: 0.05,
            jitter_high: 0.20,
            colour_bonus: 0.1,

            common_threshold: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
}

fn function_of(degree: ScaleDegree) -> HarmonicFunction {
    match degree.get() {
        1 | 3 | 6 => HarmonicFunction::Tonic,
        2 | 4 => HarmonicFunction::Subdominant,
        _ => HarmonicFunction::Dominant,
    }
}

/// Stateless scorer over caller-supplied chord histories.
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    pub model: ProgressionModel,
    pub weights: SuggestionWeights,
}

impl SuggestionEngine {
    pub fn new(model: ProgressionModel, weights: SuggestionWeights) -> Self {
        SuggestionEngine { model, weights }
    }

    /// Ranked next-chord suggestions for `history`.
    ///
    /// An empty history yields three of the fixed starter choices, picked at
    /// random. Otherwise the four most probable degrees are returned,
    /// highest first, ties broken by ascending degree. `bpm` and `now` (ms)
    /// describe the performance context and are recorded for diagnostics.
    pub fn suggest(
        &self,
        history: &[ChordHistoryEntry],
        bpm: f64,
        now: f64,
        rng: &mut HarmonyRng,
    ) -> Vec<ChordSuggestion> {
        let _span = tracing::debug_span!("suggest", bpm, now, history = history.len()).entered();

        if history.is_empty() {
            return starter_suggestions(rng);
        }

        let scored = self.score_all(window(history), rng);
        let total: f64 = scored.iter().map(|(score, _)| score).sum();

        let mut suggestions: Vec<ChordSuggestion> = ScaleDegree::ALL
            .iter()
            .zip(scored)
            .map(|(&degree, (score, labels))| {
                let probability = score / total;
                ChordSuggestion {
                    degree,
                    probability,
                    reason: if labels.is_empty() {
                        "Possible choice".to_string()
                    } else {
                        labels.join(", ")
                    },
                    category: SuggestionCategory::from_probability(probability),
                }
            })
            .collect();

        // Stable sort keeps ascending degree order among equal probabilities.
        suggestions.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        suggestions.truncate(MAX_SUGGESTIONS);

        tracing::debug!(
            top = %suggestions[0].degree,
            probability = suggestions[0].probability,
            "ranked suggestions"
        );
        suggestions
    }

    /// Probability of every degree (index by `ScaleDegree::index()`), before
    /// truncation to the top suggestions. Sums to 1.
    pub fn distribution(&self, history: &[ChordHistoryEntry], rng: &mut HarmonyRng) -> [f64; 7] {
        let mut probabilities = [0.0; 7];
        if history.is_empty() {
            for (degree, p, _) in STARTERS {
                probabilities[degree.index()] = p;
            }
        } else {
            for (i, (score, _)) in self.score_all(window(history), rng).into_iter().enumerate() {
                probabilities[i] = score;
            }
        }
        let total: f64 = probabilities.iter().sum();
        probabilities.map(|p| p / total)
    }

    /// Timing regularity and harmonic predictability of `history`.
    ///
    /// Like `suggest`, only the last `HISTORY_WINDOW` entries count. Fewer
    /// than three entries yields all zeros.
    pub fn analyze_pattern(&self, history: &[ChordHistoryEntry]) -> PlayingPattern {
        let history = window(history);
        if history.len() < 3 {
            return PlayingPattern::default();
        }

        let intervals: Vec<f64> = history
            .windows(2)
            .map(|pair| pair[1].timestamp - pair[0].timestamp)
            .collect();
        let n = intervals.len() as f64;
        let mean = intervals.iter().sum::<f64>() / n;
        let variance = intervals.iter().map(|iv| (iv - mean).powi(2)).sum::<f64>() / n;
        let consistency = if mean > 0.0 {
            (1.0 - variance.sqrt() / mean).max(0.0)
        } else {
            0.0
        };

        let predictable = history
            .windows(2)
            .filter(|pair| {
                self.model.first_order_probability(pair[0].degree, pair[1].degree) > PREDICTABLE_PROBABILITY
            })
            .count();

        PlayingPattern {
            average_interval: mean,
            consistency,
            predictability: predictable as f64 / n,
        }
    }

    /// Raw score and triggered labels for each degree, in degree order.
    fn score_all(&self, history: &[ChordHistoryEntry], rng: &mut HarmonyRng) -> Vec<(f64, Vec<&'static str>)> {
        let w = &self.weights;
        let jitter_low = w.jitter_low.min(w.jitter_high);
        let jitter_high = w.jitter_low.max(w.jitter_high);
        let last = history[history.len() - 1].degree;
        let before_last = history.len().checked_sub(2).map(|i| history[i].degree);

        ScaleDegree::ALL
            .iter()
            .map(|&candidate| {
                let mut labels = Vec::new();

                let first = self.model.first_order_probability(last, candidate);
                let mut score = w.first_order * first;
                if first >= w.common_threshold {
                    labels.push("Common progression");
                }
                if let Some(prev) = before_last {
                    score += w.second_order * self.model.second_order_probability(prev, last, candidate);
                }

                score += self.root_motion_bonus(last, candidate, &mut labels);
                score += w.function_scale * self.function_bonus(last, candidate, &mut labels);

                score += rng.range_f64(jitter_low, jitter_high);
                if candidate == ScaleDegree::III || candidate == ScaleDegree::VII {
                    score += w.colour_bonus;
                }

                (score, labels)
            })
            .collect()
    }

    /// Interval bonuses. The fifth/fourth is measured from the candidate's
    /// root up to the previous root, so V -> I counts as fifth motion.
    fn root_motion_bonus(&self, last: ScaleDegree, candidate: ScaleDegree, labels: &mut Vec<&'static str>) -> f64 {
        let w = &self.weights;
        let mut bonus = 0.0;

        let above = (last.offset() as i8 - candidate.offset() as i8).rem_euclid(12);
        if above == 7 {
            bonus += w.fifth_above;
            labels.push("Circle of fifths");
        } else if above == 5 {
            bonus += w.fourth_above;
            labels.push("Fourth motion");
        } else if last.get().abs_diff(candidate.get()) == 1 {
            bonus += w.step;
            labels.push("Smooth step");
        }

        if candidate == ScaleDegree::I {
            bonus += w.tonic;
            labels.push("Home base");
        }
        bonus
    }

    fn function_bonus(&self, last: ScaleDegree, candidate: ScaleDegree, labels: &mut Vec<&'static str>) -> f64 {
        use HarmonicFunction::*;
        let w = &self.weights;
        match (function_of(last), function_of(candidate)) {
            (Dominant, Tonic) => {
                labels.push("Dominant resolution");
                w.dominant_to_tonic
            }
            (Subdominant, Dominant) => {
                labels.push("Builds to the dominant");
                w.subdominant_to_dominant
            }
            (Tonic, Subdominant) => {
                labels.push("Moves to the subdominant");
                w.tonic_to_subdominant
            }
            _ => 0.0,
        }
    }
}

/// Look up a played chord among the suggestions.
pub fn match_suggestion(played: ScaleDegree, suggestions: &[ChordSuggestion]) -> Option<SuggestionMatch> {
    suggestions
        .iter()
        .position(|s| s.degree == played)
        .map(|i| SuggestionMatch {
            rank: i + 1,
            probability: suggestions[i].probability,
        })
}

fn window(history: &[ChordHistoryEntry]) -> &[ChordHistoryEntry] {
    &history[history.len().saturating_sub(HISTORY_WINDOW)..]
}

fn starter_suggestions(rng: &mut HarmonyRng) -> Vec<ChordSuggestion> {
    let mut starters = STARTERS;
    rng.shuffle(&mut starters);
    let mut picked: Vec<ChordSuggestion> = starters[..STARTER_SUGGESTIONS]
        .iter()
        .map(|&(degree, probability, reason)| ChordSuggestion {
            degree,
            probability,
            reason: reason.to_string(),
            category: SuggestionCategory::from_probability(probability),
        })
        .collect();
    picked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    picked
}
