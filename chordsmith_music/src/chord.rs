// Diatonic chord model: keys, scale degrees, qualities and voicings.
//
// Everything downstream of the generators speaks in scale degrees (Nashville
// numbers 1-7 over a major scale). This module is the only place those degrees
// become concrete MIDI pitches, via `chord()`, or display names, via
// `chord_name()`.
//
// Quality modifications (`ChordModification`) are a fixed lookup table from
// quality to quality. Pairs the table does not define leave the quality
// unchanged; that fallback is part of the contract, not an error.

use crate::error::{HarmonyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semitone offset of each major-scale degree from the tonic.
pub const MAJOR_SCALE_OFFSETS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the twelve chromatic pitch classes, used as the tonic of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Key::C,
        Key::CSharp,
        Key::D,
        Key::DSharp,
        Key::E,
        Key::F,
        Key::FSharp,
        Key::G,
        Key::GSharp,
        Key::A,
        Key::ASharp,
        Key::B,
    ];

    /// Pitch class 0-11 (C = 0).
    pub fn pitch_class(self) -> u8 {
        self as u8
    }

    pub fn from_pitch_class(pc: u8) -> Key {
        Key::ALL[(pc % 12) as usize]
    }

    pub fn name(self) -> &'static str {
        SHARP_NAMES[self as usize]
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Key {
    type Err = HarmonyError;

    /// Accepts sharp and flat spellings ("F#", "Gb"), case-insensitive letter.
    fn from_str(s: &str) -> Result<Self> {
        let unknown = || HarmonyError::UnknownEnum {
            kind: "key",
            value: s.to_string(),
        };
        let mut chars = s.trim().chars();
        let letter = chars.next().ok_or_else(unknown)?;
        let natural: i8 = match letter.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(unknown()),
        };
        let accidental: i8 = match chars.as_str() {
            "" => 0,
            "#" | "♯" => 1,
            "b" | "♭" => -1,
            _ => return Err(unknown()),
        };
        Ok(Key::from_pitch_class((natural + accidental).rem_euclid(12) as u8))
    }
}

/// A Nashville-number scale degree, guaranteed to lie in 1..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ScaleDegree(u8);

impl ScaleDegree {
    pub const I: ScaleDegree = ScaleDegree(1);
    pub const II: ScaleDegree = ScaleDegree(2);
    pub const III: ScaleDegree = ScaleDegree(3);
    pub const IV: ScaleDegree = ScaleDegree(4);
    pub const V: ScaleDegree = ScaleDegree(5);
    pub const VI: ScaleDegree = ScaleDegree(6);
    pub const VII: ScaleDegree = ScaleDegree(7);

    /// All seven degrees in ascending order. This order is the tie-break
    /// order everywhere a ranking or weighted walk needs one.
    pub const ALL: [ScaleDegree; 7] = [
        ScaleDegree::I,
        ScaleDegree::II,
        ScaleDegree::III,
        ScaleDegree::IV,
        ScaleDegree::V,
        ScaleDegree::VI,
        ScaleDegree::VII,
    ];

    pub fn new(degree: u8) -> Result<Self> {
        if (1..=7).contains(&degree) {
            Ok(ScaleDegree(degree))
        } else {
            Err(HarmonyError::InvalidDegree(degree))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index for table lookups.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Semitones above the tonic in the major scale.
    pub fn offset(self) -> u8 {
        MAJOR_SCALE_OFFSETS[self.index()]
    }

    /// The diatonic triad quality of this degree in a major key.
    pub fn default_quality(self) -> ChordQuality {
        match self.0 {
            1 | 4 | 5 => ChordQuality::Major,
            7 => ChordQuality::Dim,
            _ => ChordQuality::Minor,
        }
    }

    /// Roman numeral with case reflecting the diatonic quality.
    pub fn roman(self) -> &'static str {
        ["I", "ii", "iii", "IV", "V", "vi", "vii°"][self.index()]
    }
}

impl TryFrom<u8> for ScaleDegree {
    type Error = HarmonyError;

    fn try_from(value: u8) -> Result<Self> {
        ScaleDegree::new(value)
    }
}

impl From<ScaleDegree> for u8 {
    fn from(degree: ScaleDegree) -> u8 {
        degree.0
    }
}

impl fmt::Display for ScaleDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.roman())
    }
}

/// Chord qualities the instrument can voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordQuality {
    Major,
    Minor,
    Dom7,
    Maj7,
    Min7,
    Sus2,
    Sus4,
    Aug,
    Dim,
    Maj9,
    Min9,
    Maj6,
}

impl ChordQuality {
    /// Ascending semitone offsets from the chord root.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Dom7 => &[0, 4, 7, 10],
            ChordQuality::Maj7 => &[0, 4, 7, 11],
            ChordQuality::Min7 => &[0, 3, 7, 10],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
            ChordQuality::Aug => &[0, 4, 8],
            ChordQuality::Dim => &[0, 3, 6],
            ChordQuality::Maj9 => &[0, 4, 7, 11, 14],
            ChordQuality::Min9 => &[0, 3, 7, 10, 14],
            ChordQuality::Maj6 => &[0, 4, 7, 9],
        }
    }

    /// Suffix appended to the root name in chord symbols.
    pub fn label(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Dom7 => "7",
            ChordQuality::Maj7 => "maj7",
            ChordQuality::Min7 => "m7",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Aug => "aug",
            ChordQuality::Dim => "dim",
            ChordQuality::Maj9 => "maj9",
            ChordQuality::Min9 => "m9",
            ChordQuality::Maj6 => "6",
        }
    }
}

/// Performer-facing transforms applied on top of a chord's base quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordModification {
    /// Swap major and minor colour ("maj/min").
    #[serde(rename = "maj/min")]
    MajMin,
    #[serde(rename = "7")]
    Seventh,
    #[serde(rename = "maj7")]
    MajorSeventh,
    #[serde(rename = "sus2")]
    Sus2,
    #[serde(rename = "sus4")]
    Sus4,
    #[serde(rename = "aug")]
    Augmented,
    #[serde(rename = "9")]
    Ninth,
    #[serde(rename = "6")]
    Sixth,
}

impl ChordModification {
    pub const ALL: [ChordModification; 8] = [
        ChordModification::MajMin,
        ChordModification::Seventh,
        ChordModification::MajorSeventh,
        ChordModification::Sus2,
        ChordModification::Sus4,
        ChordModification::Augmented,
        ChordModification::Ninth,
        ChordModification::Sixth,
    ];
}

/// Look up the quality produced by applying `modification` to `base`.
///
/// Returns `base` unchanged when the table has no entry for the pair.
pub fn apply_modification(base: ChordQuality, modification: ChordModification) -> ChordQuality {
    use ChordModification as M;
    use ChordQuality as Q;

    let mapped = match (modification, base) {
        (M::MajMin, Q::Major) => Some(Q::Minor),
        (M::MajMin, Q::Minor) => Some(Q::Major),
        (M::MajMin, Q::Dom7) => Some(Q::Min7),
        (M::MajMin, Q::Min7) => Some(Q::Dom7),
        (M::MajMin, Q::Maj9) => Some(Q::Min9),
        (M::MajMin, Q::Min9) => Some(Q::Maj9),

        (M::Seventh, Q::Major) => Some(Q::Dom7),
        (M::Seventh, Q::Minor) => Some(Q::Min7),
        (M::Seventh, Q::Sus4) => Some(Q::Dom7),

        (M::MajorSeventh, Q::Major) => Some(Q::Maj7),
        (M::MajorSeventh, Q::Dom7) => Some(Q::Maj7),

        (M::Sus2, Q::Major) => Some(Q::Sus2),
        (M::Sus2, Q::Minor) => Some(Q::Sus2),

        (M::Sus4, Q::Major) => Some(Q::Sus4),
        (M::Sus4, Q::Minor) => Some(Q::Sus4),
        (M::Sus4, Q::Dom7) => Some(Q::Sus4),

        (M::Augmented, Q::Major) => Some(Q::Aug),

        (M::Ninth, Q::Major) => Some(Q::Maj9),
        (M::Ninth, Q::Maj7) => Some(Q::Maj9),
        (M::Ninth, Q::Minor) => Some(Q::Min9),
        (M::Ninth, Q::Min7) => Some(Q::Min9),

        (M::Sixth, Q::Major) => Some(Q::Maj6),

        _ => None,
    };
    mapped.unwrap_or(base)
}

/// Build the MIDI pitches of a diatonic chord.
///
/// `quality` defaults to the degree's diatonic triad. Each inversion step
/// lifts the lowest pitch by an octave; inversions beyond the chord's size
/// are clamped to the highest available inversion. `octave` follows the
/// MIDI convention where octave 4 starts at middle C (60).
pub fn chord(
    key: Key,
    degree: ScaleDegree,
    quality: Option<ChordQuality>,
    inversion: usize,
    octave: u8,
) -> Result<Vec<u8>> {
    let quality = quality.unwrap_or_else(|| degree.default_quality());
    let root_pc = (key.pitch_class() + degree.offset()) % 12;
    let base = (octave as u16 + 1) * 12;

    let mut pitches = Vec::with_capacity(quality.intervals().len());
    for &interval in quality.intervals() {
        let raw = (root_pc + interval) as u16;
        let pitch = base + raw % 12 + 12 * (raw / 12);
        pitches.push(pitch);
    }

    let inversion = inversion.min(pitches.len() - 1);
    for _ in 0..inversion {
        let lowest = pitches.remove(0);
        pitches.push(lowest + 12);
    }

    pitches
        .into_iter()
        .map(|p| u8::try_from(p).ok().filter(|&p| p <= 127).ok_or(HarmonyError::PitchOutOfRange(p)))
        .collect()
}

/// Chord symbol such as "Am" or "G7" for a degree in `key`.
pub fn chord_name(key: Key, degree: ScaleDegree, quality: Option<ChordQuality>) -> String {
    let quality = quality.unwrap_or_else(|| degree.default_quality());
    let root = Key::from_pitch_class(key.pitch_class() + degree.offset());
    format!("{}{}", root.name(), quality.label())
}
