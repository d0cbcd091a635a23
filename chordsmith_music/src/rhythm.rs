// Rhythm and density shaping for the batch generator.
//
// Three independent, precomputable pieces:
// - Tension curves: the target tension for every slot of a progression.
// - Euclidean rhythm: pulses spread as evenly as possible across steps.
// - Density maps: which slots carry a chord and which rest, per rhythmic style.
//
// Nothing here depends on the chord-selection loop, so progression.rs builds
// both arrays once up front and reads them by index.

use crate::config::{RhythmicStyle, TensionCurve};
use chordsmith_prng::HarmonyRng;
use std::f64::consts::PI;

/// Amplitude of the noise added to the `Random` tension curve.
const RANDOM_CURVE_NOISE: f64 = 0.15;

/// Tension used when a curve cannot be shaped (single slot, flat fallback).
const NEUTRAL_TENSION: f64 = 0.5;

/// Offbeat-heavy template for syncopated progressions (16-slot bar).
const SYNCOPATED_OFFSETS: [usize; 6] = [1, 3, 6, 9, 11, 13];

/// Downbeat template for sparse progressions (16-slot bar).
const SPARSE_OFFSETS: [usize; 4] = [0, 4, 8, 12];

/// Target tension for every slot of a progression of `length` slots.
///
/// A single-slot progression has no shape to follow and gets the neutral
/// tension for every curve type.
pub fn tension_curve(length: usize, curve: TensionCurve, rng: &mut HarmonyRng) -> Vec<f64> {
    if length == 1 {
        return vec![NEUTRAL_TENSION];
    }
    (0..length)
        .map(|i| tension_at(i, length, curve, rng))
        .collect()
}

fn tension_at(i: usize, length: usize, curve: TensionCurve, rng: &mut HarmonyRng) -> f64 {
    let x = i as f64 / (length - 1) as f64;
    match curve {
        TensionCurve::Arc => (PI * x).sin(),
        TensionCurve::Wave => ((2.0 * PI * x).sin() + 1.0) / 2.0,
        TensionCurve::Buildup => x,
        TensionCurve::Release => 1.0 - x,
        TensionCurve::Random => {
            let base = ((3.0 * PI * i as f64 / length as f64).sin() + 1.0) / 2.0;
            (base + rng.jitter(RANDOM_CURVE_NOISE)).clamp(0.0, 1.0)
        }
        TensionCurve::Flat => NEUTRAL_TENSION,
    }
}

/// Euclidean rhythm of `pulses` onsets over `steps` slots.
///
/// Slot `i` is an onset when `floor(i * pulses / steps)` differs from the
/// previous slot's bucket, which yields exactly `pulses` onsets starting on
/// slot 0.
pub fn euclid(steps: usize, pulses: usize) -> Vec<bool> {
    if pulses == 0 {
        return vec![false; steps];
    }
    if pulses >= steps {
        return vec![true; steps];
    }

    let mut pattern = Vec::with_capacity(steps);
    let mut previous: Option<usize> = None;
    for i in 0..steps {
        let bucket = i * pulses / steps;
        pattern.push(previous != Some(bucket));
        previous = Some(bucket);
    }
    pattern
}

/// Which of `length` slots carry a chord for the given density and style.
pub fn density_map(length: usize, density: f64, style: RhythmicStyle, rng: &mut HarmonyRng) -> Vec<bool> {
    let pulse_count = ((length as f64 * density).round() as usize).max(1);

    match style {
        RhythmicStyle::Steady | RhythmicStyle::Euclidean => euclid(length, pulse_count),
        RhythmicStyle::Syncopated => from_template(length, pulse_count, &SYNCOPATED_OFFSETS),
        RhythmicStyle::Sparse => from_template(length, pulse_count, &SPARSE_OFFSETS),
        RhythmicStyle::Random => (0..length).map(|_| rng.random_bool(density)).collect(),
    }
}

fn from_template(length: usize, pulse_count: usize, offsets: &[usize]) -> Vec<bool> {
    let mut map = vec![false; length];
    for &offset in offsets.iter().take(pulse_count.min(offsets.len())) {
        if let Some(slot) = map.get_mut(offset) {
            *slot = true;
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn onsets(pattern: &[bool]) -> Vec<usize> {
        pattern.iter().enumerate().filter(|(_, on)| **on).map(|(i, _)| i).collect()
    }

    #[test]
    fn test_euclid_reference_patterns() {
        assert_eq!(onsets(&euclid(16, 0)), Vec::<usize>::new());
        assert_eq!(onsets(&euclid(16, 4)), vec![0, 4, 8, 12]);
        assert_eq!(onsets(&euclid(16, 8)), vec![0, 2, 4, 6, 8, 10, 12, 14]);
        assert_eq!(onsets(&euclid(16, 16)), (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_euclid_tresillo() {
        assert_eq!(euclid(8, 3), vec![true, false, false, true, false, false, true, false]);
    }

    #[test]
    fn test_euclid_more_pulses_than_steps() {
        assert_eq!(euclid(4, 9), vec![true; 4]);
        assert!(euclid(0, 3).is_empty());
    }

    #[test]
    fn test_arc_endpoints_and_peak() {
        let mut rng = HarmonyRng::new(0);
        let curve = tension_curve(9, TensionCurve::Arc, &mut rng);
        assert!(curve[0].abs() < 1e-9);
        assert!(curve[8].abs() < 1e-9);
        assert!((curve[4] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_buildup_and_release_are_linear() {
        let mut rng = HarmonyRng::new(0);
        let up = tension_curve(5, TensionCurve::Buildup, &mut rng);
        let down = tension_curve(5, TensionCurve::Release, &mut rng);
        assert_eq!(up, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(down, vec![1.0, 0.75, 0.5, 0.25, 0.0]);
    }

    #[test]
    fn test_wave_stays_in_unit_range() {
        let mut rng = HarmonyRng::new(0);
        let wave = tension_curve(16, TensionCurve::Wave, &mut rng);
        assert!((wave[0] - 0.5).abs() < 1e-9);
        assert!(wave.iter().all(|t| (0.0..=1.0).contains(t)));
    }

    #[test]
    fn test_random_curve_clamped() {
        let mut rng = HarmonyRng::new(21);
        for _ in 0..50 {
            let curve = tension_curve(32, TensionCurve::Random, &mut rng);
            assert!(curve.iter().all(|t| (0.0..=1.0).contains(t)));
        }
    }

    #[test]
    fn test_single_slot_is_neutral() {
        let mut rng = HarmonyRng::new(0);
        for curve in [TensionCurve::Arc, TensionCurve::Buildup, TensionCurve::Random] {
            assert_eq!(tension_curve(1, curve, &mut rng), vec![0.5]);
        }
        assert!(tension_curve(0, TensionCurve::Arc, &mut rng).is_empty());
    }

    #[test]
    fn test_flat_curve() {
        let mut rng = HarmonyRng::new(0);
        assert_eq!(tension_curve(3, TensionCurve::Flat, &mut rng), vec![0.5; 3]);
    }

    #[test]
    fn test_density_map_styles() {
        let mut rng = HarmonyRng::new(2);
        let steady = density_map(16, 0.25, RhythmicStyle::Steady, &mut rng);
        assert_eq!(onsets(&steady), vec![0, 4, 8, 12]);

        let syncopated = density_map(16, 0.5, RhythmicStyle::Syncopated, &mut rng);
        assert_eq!(onsets(&syncopated), vec![1, 3, 6, 9, 11, 13]);

        let sparse = density_map(16, 0.1, RhythmicStyle::Sparse, &mut rng);
        assert_eq!(onsets(&sparse), vec![0, 4]);
    }

    #[test]
    fn test_density_map_has_at_least_one_pulse() {
        let mut rng = HarmonyRng::new(2);
        let map = density_map(16, 0.0, RhythmicStyle::Steady, &mut rng);
        assert_eq!(onsets(&map), vec![0]);
    }

    #[test]
    fn test_template_skips_offsets_past_length() {
        let mut rng = HarmonyRng::new(2);
        let map = density_map(8, 1.0, RhythmicStyle::Syncopated, &mut rng);
        assert_eq!(onsets(&map), vec![1, 3, 6]);
    }

    #[test]
    fn test_random_density_tracks_probability() {
        let mut rng = HarmonyRng::new(13);
        let map = density_map(10_000, 0.3, RhythmicStyle::Random, &mut rng);
        let ratio = map.iter().filter(|on| **on).count() as f64 / 10_000.0;
        assert!((ratio - 0.3).abs() < 0.03, "got {ratio}");
    }
}
