// Static harmonic tension per scale degree.
//
// Shared by the batch generator (tension-match reweighting, slot tension) and
// the live suggestion engine. Values rise with instability: tonic-function
// chords sit low, the dominant and leading-tone chords sit high.

use crate::chord::ScaleDegree;

/// Tension of degrees I..vii, indexed by `ScaleDegree::index()`.
pub const DEGREE_TENSION: [f64; 7] = [0.1, 0.4, 0.3, 0.5, 0.8, 0.2, 0.9];

pub fn tension(degree: ScaleDegree) -> f64 {
    DEGREE_TENSION[degree.index()]
}
