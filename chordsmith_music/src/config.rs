// Generation parameters for the batch progression generator.
//
// `GenerationConfig` carries every stylistic knob as a closed enum or a
// bounded scalar. Presets are plain JSON fragments shallow-merged over the
// default config (`GenerationConfig::merged`), and a handful of named presets
// (`ballad`, `driving`, `ambient`, `jazzy`) tune the same parameter set for
// different feels.
//
// Enum parsing is strict: an unrecognized rhythmic style or phrase structure
// is an `UnknownEnum` error. The single exception is the tension curve, where
// an unknown name degrades to the flat curve (logged at `warn`).

use crate::error::{HarmonyError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Shape of the target tension across a progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TensionCurve {
    Arc,
    Wave,
    Buildup,
    Release,
    Random,
    /// Constant 0.5; the fallback for unrecognized curve names.
    Flat,
}

impl TensionCurve {
    pub const ALL: [TensionCurve; 6] = [
        TensionCurve::Arc,
        TensionCurve::Wave,
        TensionCurve::Buildup,
        TensionCurve::Release,
        TensionCurve::Random,
        TensionCurve::Flat,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TensionCurve::Arc => "arc",
            TensionCurve::Wave => "wave",
            TensionCurve::Buildup => "buildup",
            TensionCurve::Release => "release",
            TensionCurve::Random => "random",
            TensionCurve::Flat => "flat",
        }
    }

    /// Parse a curve name, falling back to `Flat` for anything unknown.
    pub fn parse_lenient(name: &str) -> TensionCurve {
        let wanted = name.trim().to_ascii_lowercase();
        match Self::ALL.into_iter().find(|c| c.name() == wanted) {
            Some(curve) => curve,
            None => {
                tracing::warn!(curve = name, "unknown tension curve, using flat");
                TensionCurve::Flat
            }
        }
    }
}

impl From<String> for TensionCurve {
    fn from(name: String) -> Self {
        TensionCurve::parse_lenient(&name)
    }
}

/// How chords are placed in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RhythmicStyle {
    Steady,
    Syncopated,
    Sparse,
    Euclidean,
    Random,
}

impl RhythmicStyle {
    pub const ALL: [RhythmicStyle; 5] = [
        RhythmicStyle::Steady,
        RhythmicStyle::Syncopated,
        RhythmicStyle::Sparse,
        RhythmicStyle::Euclidean,
        RhythmicStyle::Random,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RhythmicStyle::Steady => "steady",
            RhythmicStyle::Syncopated => "syncopated",
            RhythmicStyle::Sparse => "sparse",
            RhythmicStyle::Euclidean => "euclidean",
            RhythmicStyle::Random => "random",
        }
    }
}

impl FromStr for RhythmicStyle {
    type Err = HarmonyError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.name() == wanted)
            .ok_or_else(|| HarmonyError::UnknownEnum {
                kind: "rhythmic style",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for RhythmicStyle {
    type Error = HarmonyError;

    fn try_from(name: String) -> Result<Self> {
        name.parse()
    }
}

/// Phrase form used to group slots into sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PhraseStructure {
    #[serde(rename = "AABA")]
    Aaba,
    #[serde(rename = "ABAB")]
    Abab,
    #[serde(rename = "ABAC")]
    Abac,
    #[serde(rename = "question-answer")]
    QuestionAnswer,
    #[serde(rename = "through-composed")]
    ThroughComposed,
}

impl PhraseStructure {
    pub const ALL: [PhraseStructure; 5] = [
        PhraseStructure::Aaba,
        PhraseStructure::Abab,
        PhraseStructure::Abac,
        PhraseStructure::QuestionAnswer,
        PhraseStructure::ThroughComposed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PhraseStructure::Aaba => "AABA",
            PhraseStructure::Abab => "ABAB",
            PhraseStructure::Abac => "ABAC",
            PhraseStructure::QuestionAnswer => "question-answer",
            PhraseStructure::ThroughComposed => "through-composed",
        }
    }
}

impl FromStr for PhraseStructure {
    type Err = HarmonyError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|form| form.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| HarmonyError::UnknownEnum {
                kind: "phrase structure",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for PhraseStructure {
    type Error = HarmonyError;

    fn try_from(name: String) -> Result<Self> {
        name.parse()
    }
}

/// Parameters for one batch generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerationConfig {
    /// Number of slots to generate (at least 1).
    pub slots: usize,
    /// Fraction of slots that carry a chord (0.0-1.0).
    pub density: f64,
    pub tension_curve: TensionCurve,
    pub rhythmic_style: RhythmicStyle,
    pub phrase_structure: PhraseStructure,
    /// How far selection strays from the Markov tables (0.0-1.0).
    pub creativity: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            slots: 16,
            density: 0.5,
            tension_curve: TensionCurve::Arc,
            rhythmic_style: RhythmicStyle::Steady,
            phrase_structure: PhraseStructure::Abab,
            creativity: 0.5,
        }
    }
}

impl GenerationConfig {
    /// Slow, spacious changes on the downbeats.
    pub fn ballad() -> Self {
        GenerationConfig {
            density: 0.25,
            rhythmic_style: RhythmicStyle::Sparse,
            phrase_structure: PhraseStructure::Aaba,
            creativity: 0.3,
            ..Default::default()
        }
    }

    /// A chord on every slot, climbing toward the end.
    pub fn driving() -> Self {
        GenerationConfig {
            density: 1.0,
            tension_curve: TensionCurve::Buildup,
            creativity: 0.2,
            ..Default::default()
        }
    }

    /// Long, loosely placed, wandering progression.
    pub fn ambient() -> Self {
        GenerationConfig {
            slots: 32,
            density: 0.3,
            tension_curve: TensionCurve::Wave,
            rhythmic_style: RhythmicStyle::Random,
            phrase_structure: PhraseStructure::ThroughComposed,
            creativity: 0.6,
        }
    }

    /// Offbeat placement with adventurous colour chords.
    pub fn jazzy() -> Self {
        GenerationConfig {
            density: 0.6,
            tension_curve: TensionCurve::Wave,
            rhythmic_style: RhythmicStyle::Syncopated,
            phrase_structure: PhraseStructure::Abac,
            creativity: 0.8,
            ..Default::default()
        }
    }

    /// Look up a named preset.
    pub fn preset(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::default()),
            "ballad" => Ok(Self::ballad()),
            "driving" => Ok(Self::driving()),
            "ambient" => Ok(Self::ambient()),
            "jazzy" => Ok(Self::jazzy()),
            _ => Err(HarmonyError::UnknownEnum {
                kind: "preset",
                value: name.to_string(),
            }),
        }
    }

    /// Shallow-merge a JSON object fragment over this config.
    ///
    /// Keys use the camelCase field names (`tensionCurve`, `rhythmicStyle`,
    /// ...). The merged result is validated before it is returned.
    pub fn merged(&self, fragment: &serde_json::Value) -> Result<Self> {
        let patch = fragment
            .as_object()
            .ok_or_else(|| HarmonyError::InvalidConfig("preset must be a JSON object".into()))?;

        // Deserialization goes through the same `FromStr`, but serde would wrap
        // its error in a message. Parse first so callers get UnknownEnum.
        if let Some(style) = patch.get("rhythmicStyle").and_then(|v| v.as_str()) {
            style.parse::<RhythmicStyle>()?;
        }
        if let Some(form) = patch.get("phraseStructure").and_then(|v| v.as_str()) {
            form.parse::<PhraseStructure>()?;
        }

        let mut base = serde_json::to_value(self)?;
        if let Some(fields) = base.as_object_mut() {
            for (key, value) in patch {
                fields.insert(key.clone(), value.clone());
            }
        }
        let config: GenerationConfig = serde_json::from_value(base)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON fragment and merge it over the default config.
    pub fn from_preset_json(json: &str) -> Result<Self> {
        let fragment: serde_json::Value = serde_json::from_str(json)?;
        Self::default().merged(&fragment)
    }

    /// Check scalar bounds. Enum fields are valid by construction.
    pub fn validate(&self) -> Result<()> {
        if self.slots == 0 {
            return Err(HarmonyError::InvalidConfig("slots must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.density) {
            return Err(HarmonyError::InvalidConfig(format!(
                "density {} is outside 0..=1",
                self.density
            )));
        }
        if !(0.0..=1.0).contains(&self.creativity) {
            return Err(HarmonyError::InvalidConfig(format!(
                "creativity {} is outside 0..=1",
                self.creativity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_values() {
        let config = GenerationConfig::default();
        assert_eq!(config.slots, 16);
        assert_eq!(config.density, 0.5);
        assert_eq!(config.tension_curve, TensionCurve::Arc);
        assert_eq!(config.rhythmic_style, RhythmicStyle::Steady);
        assert_eq!(config.phrase_structure, PhraseStructure::Abab);
        assert_eq!(config.creativity, 0.5);
    }

    #[test]
    fn test_fragment_merge_overrides_only_given_keys() {
        let merged = GenerationConfig::default()
            .merged(&json!({ "density": 0.8, "rhythmicStyle": "syncopated" }))
            .unwrap();
        assert_eq!(merged.density, 0.8);
        assert_eq!(merged.rhythmic_style, RhythmicStyle::Syncopated);
        assert_eq!(merged.slots, 16);
        assert_eq!(merged.phrase_structure, PhraseStructure::Abab);
    }

    #[test]
    fn test_unknown_style_fails_fast() {
        let err = GenerationConfig::from_preset_json(r#"{"rhythmicStyle": "swing"}"#).unwrap_err();
        assert!(matches!(err, HarmonyError::UnknownEnum { kind: "rhythmic style", .. }));

        let err = GenerationConfig::from_preset_json(r#"{"phraseStructure": "rondo"}"#).unwrap_err();
        assert!(matches!(err, HarmonyError::UnknownEnum { kind: "phrase structure", .. }));
    }

    #[test]
    fn test_unknown_curve_falls_back_to_flat() {
        let config = GenerationConfig::from_preset_json(r#"{"tensionCurve": "zigzag"}"#).unwrap();
        assert_eq!(config.tension_curve, TensionCurve::Flat);

        let config = GenerationConfig::from_preset_json(r#"{"tensionCurve": "buildup"}"#).unwrap();
        assert_eq!(config.tension_curve, TensionCurve::Buildup);
    }

    #[test]
    fn test_out_of_range_scalars_rejected() {
        assert!(GenerationConfig::from_preset_json(r#"{"slots": 0}"#).is_err());
        assert!(GenerationConfig::from_preset_json(r#"{"density": 1.5}"#).is_err());
        assert!(GenerationConfig::from_preset_json(r#"{"creativity": -0.1}"#).is_err());
        assert!(GenerationConfig::from_preset_json("[1, 2]").is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = GenerationConfig::from_preset_json(r#"{"tempo": 120}"#).unwrap_err();
        assert!(matches!(err, HarmonyError::Preset(_)));
    }

    #[test]
    fn test_serialized_names() {
        let value = serde_json::to_value(GenerationConfig::default()).unwrap();
        assert_eq!(value["tensionCurve"], "arc");
        assert_eq!(value["rhythmicStyle"], "steady");
        assert_eq!(value["phraseStructure"], "ABAB");
        let form: PhraseStructure = serde_json::from_str("\"question-answer\"").unwrap();
        assert_eq!(form, PhraseStructure::QuestionAnswer);
    }

    #[test]
    fn test_named_presets_are_valid() {
        for name in ["default", "ballad", "driving", "ambient", "jazzy"] {
            GenerationConfig::preset(name).unwrap().validate().unwrap();
        }
        assert!(GenerationConfig::preset("polka").is_err());
    }

    #[test]
    fn test_merge_accepts_any_case_enum_names() {
        let merged = GenerationConfig::default()
            .merged(&json!({ "rhythmicStyle": "Euclidean", "phraseStructure": "aaba" }))
            .unwrap();
        assert_eq!(merged.rhythmic_style, RhythmicStyle::Euclidean);
        assert_eq!(merged.phrase_structure, PhraseStructure::Aaba);

        let form: PhraseStructure = serde_json::from_str("\"Question-Answer\"").unwrap();
        assert_eq!(form, PhraseStructure::QuestionAnswer);
        let style: RhythmicStyle = serde_json::from_str("\"SPARSE\"").unwrap();
        assert_eq!(style, RhythmicStyle::Sparse);
    }

    #[test]
    fn test_merge_reports_unknown_enum_names() {
        let err = GenerationConfig::default()
            .merged(&json!({ "rhythmicStyle": "Bossa" }))
            .unwrap_err();
        assert!(matches!(err, HarmonyError::UnknownEnum { kind: "rhythmic style", ref value } if value == "Bossa"));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("Euclidean".parse::<RhythmicStyle>().unwrap(), RhythmicStyle::Euclidean);
        assert_eq!("aaba".parse::<PhraseStructure>().unwrap(), PhraseStructure::Aaba);
        assert_eq!(TensionCurve::parse_lenient("WAVE"), TensionCurve::Wave);
    }
}
