// Chordsmith CLI entry point.
//
// Generates one chord progression and prints it slot by slot, optionally
// followed by next-chord suggestions for a given history.
//
// Usage:
//   cargo run -p chordsmith_music -- [--preset NAME] [--preset-json PATH]
//     [--slots N] [--density F] [--curve NAME] [--style NAME] [--phrase NAME]
//     [--creativity F] [--seed N] [--key NAME] [--octave N]
//     [--suggest 1,5,6] [--bpm F]
//
// Individual flags override the preset. Log level comes from CHORDSMITH_LOG
// (e.g. CHORDSMITH_LOG=chordsmith_music=debug); logs go to stderr.

use chordsmith_music::chord::{Key, ScaleDegree, chord, chord_name};
use chordsmith_music::config::GenerationConfig;
use chordsmith_music::markov::ProgressionModel;
use chordsmith_music::progression::{GenerativeSlot, generate_progression};
use chordsmith_music::suggest::{ChordHistoryEntry, SuggestionEngine};
use chordsmith_prng::HarmonyRng;
use serde_json::{Map, Value};
use std::error::Error;
use tracing_subscriber::EnvFilter;

const DEFAULT_OCTAVE: u8 = 3;
const DEFAULT_BPM: f64 = 120.0;

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CHORDSMITH_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &[String]) -> Result<(), Box<dyn Error>> {
    let config = build_config(args)?;
    let key: Key = match parse_flag::<String>(args, "--key")? {
        Some(name) => name.parse()?,
        None => Key::C,
    };
    let octave: u8 = parse_flag(args, "--octave")?.unwrap_or(DEFAULT_OCTAVE);
    let seed: u64 = parse_flag(args, "--seed")?.unwrap_or_else(clock_seed);

    tracing::info!(seed, key = %key, slots = config.slots, "generating progression");

    println!("=== Chordsmith ===");
    println!("Key: {} (octave {})", key, octave);
    println!(
        "Slots: {}  Density: {:.2}  Curve: {}  Style: {}  Form: {}  Creativity: {:.2}",
        config.slots,
        config.density,
        config.tension_curve.name(),
        config.rhythmic_style.name(),
        config.phrase_structure.name(),
        config.creativity,
    );
    println!("Seed: {}", seed);
    println!();

    let model = ProgressionModel::default_model();
    let mut rng = HarmonyRng::new(seed);
    let slots = generate_progression(&config, &model, &mut rng)?;
    for slot in &slots {
        print_slot(slot, key, octave)?;
    }

    if let Some(list) = parse_flag::<String>(args, "--suggest")? {
        let bpm: f64 = parse_flag(args, "--bpm")?.unwrap_or(DEFAULT_BPM);
        println!();
        print_suggestions(&list, bpm, &model, &mut rng)?;
    }
    Ok(())
}

/// Preset (named or JSON file), then individual flags merged on top.
fn build_config(args: &[String]) -> Result<GenerationConfig, Box<dyn Error>> {
    let mut config = match parse_flag::<String>(args, "--preset")? {
        Some(name) => GenerationConfig::preset(&name)?,
        None => GenerationConfig::default(),
    };
    if let Some(path) = parse_flag::<String>(args, "--preset-json")? {
        let json = std::fs::read_to_string(&path).map_err(|e| format!("reading {}: {}", path, e))?;
        let fragment: Value = serde_json::from_str(&json)?;
        config = config.merged(&fragment)?;
        tracing::info!(path = %path, "loaded preset file");
    }

    let mut overrides = Map::new();
    if let Some(slots) = parse_flag::<usize>(args, "--slots")? {
        overrides.insert("slots".into(), slots.into());
    }
    if let Some(density) = parse_flag::<f64>(args, "--density")? {
        overrides.insert("density".into(), density.into());
    }
    if let Some(creativity) = parse_flag::<f64>(args, "--creativity")? {
        overrides.insert("creativity".into(), creativity.into());
    }
    for (flag, field) in [
        ("--curve", "tensionCurve"),
        ("--style", "rhythmicStyle"),
        ("--phrase", "phraseStructure"),
    ] {
        if let Some(name) = parse_flag::<String>(args, flag)? {
            overrides.insert(field.into(), name.into());
        }
    }

    Ok(config.merged(&Value::Object(overrides))?)
}

fn print_slot(slot: &GenerativeSlot, key: Key, octave: u8) -> Result<(), Box<dyn Error>> {
    match slot.degree {
        None => println!("{:>3} [{}]  -   rest          t={:.2}", slot.position, slot.section, slot.tension),
        Some(degree) => {
            let pitches = chord(key, degree, None, 0, octave)?;
            println!(
                "{:>3} [{}]  {:<4} {:<6} {:<14} vel {:.2}  dur {}  t={:.2}  swing {:.2}  stagger {:.2}",
                slot.position,
                slot.section,
                degree.roman(),
                chord_name(key, degree, None),
                format!("{:?}", pitches),
                slot.velocity,
                slot.duration,
                slot.tension,
                slot.swing,
                slot.stagger,
            );
        }
    }
    Ok(())
}

/// Treat a comma-separated degree list as chords played one beat apart.
fn print_suggestions(
    list: &str,
    bpm: f64,
    model: &ProgressionModel,
    rng: &mut HarmonyRng,
) -> Result<(), Box<dyn Error>> {
    let beat_ms = beat_ms(bpm)?;
    let mut history = Vec::new();
    for (i, part) in list.split(',').filter(|p| !p.trim().is_empty()).enumerate() {
        let raw: u8 = part.trim().parse().map_err(|_| format!("bad degree '{}' in --suggest", part))?;
        history.push(ChordHistoryEntry::new(ScaleDegree::new(raw)?, i as f64 * beat_ms));
    }
    let now = history.len() as f64 * beat_ms;

    let engine = SuggestionEngine::new(model.clone(), Default::default());
    println!("Suggestions after [{}] at {} BPM:", list, bpm);
    for (rank, s) in engine.suggest(&history, bpm, now, rng).iter().enumerate() {
        println!(
            "  {}. {:<4} {:>5.1}%  {:?}  ({})",
            rank + 1,
            s.degree.roman(),
            s.probability * 100.0,
            s.category,
            s.reason,
        );
    }

    let pattern = engine.analyze_pattern(&history);
    println!(
        "Pattern: interval {:.0} ms, consistency {:.2}, predictability {:.2}",
        pattern.average_interval, pattern.consistency, pattern.predictability,
    );
    Ok(())
}

fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Milliseconds per beat. The tempo must be a positive, finite BPM.
fn beat_ms(bpm: f64) -> Result<f64, String> {
    if !(bpm.is_finite() && bpm > 0.0) {
        return Err(format!("--bpm must be positive, got {}", bpm));
    }
    Ok(60_000.0 / bpm)
}

/// Value following `flag`, if the flag is present. A missing or unparseable
/// value is an error.
fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<Option<T>, String> {
    let Some(i) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    let raw = args.get(i + 1).ok_or_else(|| format!("{} needs a value", flag))?;
    raw.parse()
        .map(Some)
        .map_err(|_| format!("invalid value '{}' for {}", raw, flag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_flag_values() {
        let a = args(&["generate", "--slots", "24", "--style", "sparse"]);
        assert_eq!(parse_flag::<usize>(&a, "--slots"), Ok(Some(24)));
        assert_eq!(parse_flag::<String>(&a, "--style"), Ok(Some("sparse".to_string())));
        assert_eq!(parse_flag::<f64>(&a, "--density"), Ok(None));
    }

    #[test]
    fn test_parse_flag_rejects_bad_values() {
        let a = args(&["generate", "--slots", "1O"]);
        assert!(parse_flag::<usize>(&a, "--slots").is_err());
        let a = args(&["generate", "--seed"]);
        assert!(parse_flag::<u64>(&a, "--seed").is_err());
    }

    #[test]
    fn test_bad_slot_count_fails_config() {
        assert!(build_config(&args(&["generate", "--slots", "1O"])).is_err());
        let config = build_config(&args(&["generate", "--style", "Euclidean", "--phrase", "aaba"])).unwrap();
        assert_eq!(config.slots, 16);
    }

    #[test]
    fn test_beat_length_needs_positive_tempo() {
        assert_eq!(beat_ms(120.0), Ok(500.0));
        assert!(beat_ms(0.0).is_err());
        assert!(beat_ms(-60.0).is_err());
        assert!(beat_ms(f64::NAN).is_err());
    }
}
