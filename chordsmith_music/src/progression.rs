// Batch progression generation.
//
// Turns a `GenerationConfig` into an ordered list of `GenerativeSlot`s:
//
// 1. Precompute the tension curve, density map and phrase labels. These are
//    independent of chord choice and are read by index.
// 2. Walk the slots left to right. Rest slots are emitted as-is; chord slots
//    draw a degree from the Markov tables (second order when the last two
//    chords have an entry, first order otherwise), reweighted toward the
//    slot's target tension and jittered by creativity.
// 3. Cadence pass: if the last chord is neither I nor V, resolve it to I
//    with probability 0.6.
//
// The chord loop is strictly sequential, each choice conditioning on the
// previous two. All randomness comes from the caller's `HarmonyRng`, so a
// (config, seed) pair always yields the same progression.

use crate::chord::ScaleDegree;
use crate::config::{GenerationConfig, RhythmicStyle};
use crate::error::Result;
use crate::markov::{ProgressionModel, reweight, weighted_select};
use crate::rhythm::{density_map, tension_curve};
use crate::structure::phrase_sections;
use crate::tension::tension;
use chordsmith_prng::HarmonyRng;
use serde::{Deserialize, Serialize};

/// Probability that a non-cadential final chord is replaced by the tonic.
const CADENCE_PROBABILITY: f64 = 0.6;

/// Probability that a chord followed by a rest is held through it.
const HOLD_PROBABILITY: f64 = 0.5;

const VELOCITY_DOWNBEAT: f64 = 0.85;
const VELOCITY_OFFBEAT: f64 = 0.75;
const VELOCITY_WEAK: f64 = 0.70;
const VELOCITY_TENSION_GAIN: f64 = 0.15;
const VELOCITY_JITTER: f64 = 0.05;

/// One slot of a generated progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeSlot {
    /// Zero-based slot index.
    pub position: usize,
    /// Chord degree, or `None` for a rest.
    pub degree: Option<ScaleDegree>,
    /// 0.0-1.0; zero for rests.
    pub velocity: f64,
    /// Length in slots (1 or 2).
    pub duration: u32,
    /// Static tension of the chosen degree, or the curve target for rests.
    pub tension: f64,
    /// Timing offset in slot units, -1.0..=1.0.
    pub swing: f64,
    /// Note-spread amount for strummed playback, 0.0..=1.0.
    pub stagger: f64,
    /// Phrase-section label this slot belongs to.
    pub section: char,
}

impl GenerativeSlot {
    pub fn is_rest(&self) -> bool {
        self.degree.is_none()
    }
}

/// Generate a full progression for `config`.
pub fn generate_progression(
    config: &GenerationConfig,
    model: &ProgressionModel,
    rng: &mut HarmonyRng,
) -> Result<Vec<GenerativeSlot>> {
    config.validate()?;

    let mut slots = draft_progression(config, model, rng);
    let resolved = apply_final_cadence(&mut slots, rng);

    tracing::debug!(
        slots = slots.len(),
        chords = slots.iter().filter(|s| !s.is_rest()).count(),
        cadence_resolved = resolved,
        "generated progression"
    );
    Ok(slots)
}

/// Everything except the cadence pass.
fn draft_progression(
    config: &GenerationConfig,
    model: &ProgressionModel,
    rng: &mut HarmonyRng,
) -> Vec<GenerativeSlot> {
    let length = config.slots;
    let curve = tension_curve(length, config.tension_curve, rng);
    let density = density_map(length, config.density, config.rhythmic_style, rng);
    let sections = phrase_sections(config.phrase_structure, length);

    let mut slots = Vec::with_capacity(length);
    let mut prev: Option<ScaleDegree> = None;
    let mut prev_prev: Option<ScaleDegree> = None;

    for i in 0..length {
        if !density[i] {
            slots.push(GenerativeSlot {
                position: i,
                degree: None,
                velocity: 0.0,
                duration: 1,
                tension: curve[i],
                swing: 0.0,
                stagger: 0.0,
                section: sections[i],
            });
            continue;
        }

        let row = model.next_row(prev, prev_prev);
        let weights = reweight(row, curve[i], config.creativity, rng);
        let degree = weighted_select(&weights, rng);

        let base = if i % 4 == 0 {
            VELOCITY_DOWNBEAT
        } else if i % 2 == 0 {
            VELOCITY_OFFBEAT
        } else {
            VELOCITY_WEAK
        };
        let velocity = (base + curve[i] * VELOCITY_TENSION_GAIN + rng.jitter(VELOCITY_JITTER)).clamp(0.5, 1.0);

        let next_is_rest = i + 1 < length && !density[i + 1];
        let duration = if next_is_rest && rng.random_bool(HOLD_PROBABILITY) { 2 } else { 1 };

        slots.push(GenerativeSlot {
            position: i,
            degree: Some(degree),
            velocity,
            duration,
            tension: tension(degree),
            swing: swing(config.rhythmic_style, i, rng),
            stagger: stagger(config.rhythmic_style, rng),
            section: sections[i],
        });

        prev_prev = prev;
        prev = Some(degree);
    }

    slots
}

fn swing(style: RhythmicStyle, i: usize, rng: &mut HarmonyRng) -> f64 {
    match style {
        RhythmicStyle::Syncopated if i % 2 == 1 => 0.15,
        RhythmicStyle::Random => rng.jitter(0.1),
        _ => 0.0,
    }
}

fn stagger(style: RhythmicStyle, rng: &mut HarmonyRng) -> f64 {
    match style {
        RhythmicStyle::Steady => 0.3,
        RhythmicStyle::Syncopated | RhythmicStyle::Euclidean => 0.6,
        RhythmicStyle::Sparse => 0.4,
        RhythmicStyle::Random => rng.range_f64(0.2, 0.8),
    }
}

/// Resolve a weak final chord to the tonic.
///
/// Finds the last non-rest slot; if its degree is neither I nor V it becomes
/// I with probability 0.6. Returns whether a replacement happened.
pub fn apply_final_cadence(slots: &mut [GenerativeSlot], rng: &mut HarmonyRng) -> bool {
    let Some(last) = slots.iter_mut().rev().find(|s| !s.is_rest()) else {
        return false;
    };
    if matches!(last.degree, Some(ScaleDegree::I) | Some(ScaleDegree::V)) {
        return false;
    }
    if !rng.random_bool(CADENCE_PROBABILITY) {
        return false;
    }
    last.degree = Some(ScaleDegree::I);
    last.tension = tension(ScaleDegree::I);
    true
}
