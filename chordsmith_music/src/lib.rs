// Chordsmith: diatonic chord progression generation and live suggestion.
//
// Two consumers share one set of harmonic tables. The batch generator turns a
// `GenerationConfig` into a sequence of slots (chord or rest, with velocity,
// duration, tension and feel). The suggestion engine ranks likely next
// chords from a performer's recent history. Neither keeps state between
// calls; all randomness comes from a caller-supplied `HarmonyRng`, so output
// is reproducible from a seed.
//
// Architecture:
// - error.rs: `HarmonyError`, the crate-wide error type
// - chord.rs: Keys, scale degrees, chord qualities and MIDI voicing
// - tension.rs: Fixed per-degree harmonic tension
// - markov.rs: First/second-order transition tables, reweighting and
//   weighted selection
// - rhythm.rs: Tension curves, Euclidean rhythm and density maps
// - structure.rs: Phrase-form section planning (AABA, ABAB, ...)
// - config.rs: Generation parameters, named presets and JSON preset merging
// - progression.rs: The batch generator and final-cadence pass
// - suggest.rs: Live next-chord suggestion and playing-pattern analysis

pub mod chord;
pub mod config;
pub mod error;
pub mod markov;
pub mod progression;
pub mod rhythm;
pub mod structure;
pub mod suggest;
pub mod tension;

pub use chord::{ChordModification, ChordQuality, Key, ScaleDegree, chord, chord_name};
pub use config::{GenerationConfig, PhraseStructure, RhythmicStyle, TensionCurve};
pub use error::{HarmonyError, Result};
pub use markov::ProgressionModel;
pub use progression::{GenerativeSlot, generate_progression};
pub use suggest::{ChordHistoryEntry, ChordSuggestion, SuggestionCategory, SuggestionEngine, match_suggestion};
