//! YAML configuration for a practice session.
//!
//! ```yaml
//! tempo: 120
//! articulation: arpeggio
//! roots: [C, F, Bb]
//! qualities: [maj7, m7, 7alt]
//! voicing: drop2
//! seed: 42
//! ```
//!
//! Every key is optional. Keys are kebab-case (`bars-per-loop`,
//! `register-center`, `samples-dir`).

use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Deserialize;

use crate::error::TrainerError;
use crate::playback::{Articulation, PlaybackSettings, MAX_BARS_PER_LOOP};
use crate::theory::{ChordQuality, PitchClass};
use crate::vamp::Selection;
use crate::voicing::{ExtensionPolicy, VoicingOptions, VoicingStyle, MAX_CENTER, MIN_CENTER};

/// Raw config for YAML deserialization
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
    pub tempo: Option<f64>,
    pub sustain: Option<f64>,
    pub articulation: Option<String>,
    pub bass: Option<bool>,
    pub metronome: Option<bool>,
    pub swing: Option<bool>,
    pub bars_per_loop: Option<u32>,
    pub roots: Option<Vec<String>>,
    pub qualities: Option<Vec<String>>,
    pub voicing: Option<String>,
    pub register_center: Option<u8>,
    pub extensions: Option<String>,
    pub samples_dir: Option<PathBuf>,
    pub seed: Option<u64>,
}

/// Validated session configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    pub settings: PlaybackSettings,
    pub roots: Vec<PitchClass>,
    pub qualities: Vec<ChordQuality>,
    pub voicing: VoicingOptions,
    pub samples_dir: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            settings: PlaybackSettings::default(),
            roots: PitchClass::ALL.to_vec(),
            qualities: ChordQuality::ALL.to_vec(),
            voicing: VoicingOptions::default(),
            samples_dir: None,
            seed: None,
        }
    }
}

impl TrainerConfig {
    /// Parse and validate YAML. An empty document gives the defaults.
    pub fn from_yaml(content: &str) -> Result<TrainerConfig, TrainerError> {
        if content.trim().is_empty() {
            return Ok(TrainerConfig::default());
        }
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| TrainerError::ConfigError(e.to_string()))?;
        TrainerConfig::from_raw(raw)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<TrainerConfig, TrainerError> {
        let content = fs::read_to_string(path)?;
        let config = TrainerConfig::from_yaml(&content)?;
        log::info!(target: "vamp::config", "loaded config from {}", path.display());
        Ok(config)
    }

    fn from_raw(raw: RawConfig) -> Result<TrainerConfig, TrainerError> {
        let defaults = PlaybackSettings::default();

        let tempo_bpm = match raw.tempo {
            Some(t) if !(t.is_finite() && t > 0.0) => {
                return Err(TrainerError::ConfigError(format!("tempo must be positive, got {}", t)))
            }
            Some(t) => t,
            None => defaults.tempo_bpm,
        };

        let sustain_seconds = match raw.sustain {
            Some(s) if !(s.is_finite() && s > 0.0) => {
                return Err(TrainerError::ConfigError(format!("sustain must be positive, got {}", s)))
            }
            Some(s) => s,
            None => defaults.sustain_seconds,
        };

        let bars_per_loop = match raw.bars_per_loop {
            Some(0) => return Err(TrainerError::ConfigError("bars-per-loop must be at least 1".to_string())),
            Some(b) if b > MAX_BARS_PER_LOOP => {
                return Err(TrainerError::ConfigError(format!(
                    "bars-per-loop must be at most {}, got {}",
                    MAX_BARS_PER_LOOP, b
                )))
            }
            Some(b) => b,
            None => defaults.bars_per_loop,
        };

        let articulation = if let Some(a) = &raw.articulation {
            Articulation::from_name(a)
                .ok_or_else(|| TrainerError::ConfigError(format!("Invalid articulation: {}", a)))?
        } else {
            defaults.articulation
        };

        let roots = match raw.roots {
            Some(names) => names
                .iter()
                .map(|n| PitchClass::from_name(n).ok_or_else(|| TrainerError::UnknownRoot(n.clone())))
                .collect::<Result<Vec<_>, _>>()?,
            None => PitchClass::ALL.to_vec(),
        };

        let qualities = match raw.qualities {
            Some(names) => names
                .iter()
                .map(|n| ChordQuality::from_name(n).ok_or_else(|| TrainerError::UnknownQuality(n.clone())))
                .collect::<Result<Vec<_>, _>>()?,
            None => ChordQuality::ALL.to_vec(),
        };

        let style = match raw.voicing.as_deref() {
            None | Some("close") => VoicingStyle::Close,
            Some("drop2") | Some("drop-2") => VoicingStyle::Drop2,
            Some(other) => return Err(TrainerError::ConfigError(format!("Invalid voicing: {}", other))),
        };

        let extensions = match raw.extensions.as_deref() {
            None | Some("high") => ExtensionPolicy::High,
            Some("basic") => ExtensionPolicy::Basic,
            Some("none") => ExtensionPolicy::None,
            Some(other) => return Err(TrainerError::ConfigError(format!("Invalid extensions: {}", other))),
        };

        let register_center = raw.register_center.unwrap_or(VoicingOptions::default().register_center);
        if !(MIN_CENTER..=MAX_CENTER).contains(&register_center) {
            return Err(TrainerError::ConfigError(format!(
                "register-center must be between {} and {}, got {}",
                MIN_CENTER, MAX_CENTER, register_center
            )));
        }

        Ok(TrainerConfig {
            settings: PlaybackSettings {
                tempo_bpm,
                sustain_seconds,
                articulation,
                bass_enabled: raw.bass.unwrap_or(defaults.bass_enabled),
                metronome_enabled: raw.metronome.unwrap_or(defaults.metronome_enabled),
                swing_enabled: raw.swing.unwrap_or(defaults.swing_enabled),
                bars_per_loop,
            },
            roots,
            qualities,
            voicing: VoicingOptions { style, register_center, extensions },
            samples_dir: raw.samples_dir,
            seed: raw.seed,
        })
    }

    pub fn selection(&self) -> Selection {
        Selection {
            roots: self.roots.clone(),
            qualities: self.qualities.clone(),
        }
    }

    /// Generator for this session: seeded if the config names a seed.
    pub fn rng(&self) -> Pcg32 {
        match self.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_empty_config_is_default() {
        let config = TrainerConfig::from_yaml("").unwrap();
        assert_eq!(config, TrainerConfig::default());
        assert_eq!(config.settings.tempo_bpm, 96.0);
        assert_eq!(config.roots.len(), 12);
        assert_eq!(config.qualities.len(), 15);
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
tempo: 120
sustain: 2.5
articulation: arp
bass: true
metronome: true
swing: true
bars-per-loop: 2
roots: [C, F, Bb]
qualities: [maj7, m7, 7alt]
voicing: drop2
register-center: 64
extensions: basic
samples-dir: ./samples
seed: 42
"#;
        let config = TrainerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.settings.tempo_bpm, 120.0);
        assert_eq!(config.settings.sustain_seconds, 2.5);
        assert_eq!(config.settings.articulation, Articulation::Arpeggio);
        assert!(config.settings.bass_enabled);
        assert!(config.settings.metronome_enabled);
        assert!(config.settings.swing_enabled);
        assert_eq!(config.settings.bars_per_loop, 2);
        assert_eq!(config.roots, vec![PitchClass::C, PitchClass::F, PitchClass::Bb]);
        assert_eq!(
            config.qualities,
            vec![ChordQuality::Maj7, ChordQuality::Min7, ChordQuality::Dom7Alt]
        );
        assert_eq!(config.voicing.style, VoicingStyle::Drop2);
        assert_eq!(config.voicing.register_center, 64);
        assert_eq!(config.voicing.extensions, ExtensionPolicy::Basic);
        assert_eq!(config.samples_dir, Some(PathBuf::from("./samples")));
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_enharmonic_roots() {
        let config = TrainerConfig::from_yaml("roots: [\"A#\", Db]").unwrap();
        assert_eq!(config.roots, vec![PitchClass::Bb, PitchClass::Db]);
    }

    #[test]
    fn test_unknown_names_are_reported() {
        assert!(matches!(
            TrainerConfig::from_yaml("roots: [H]"),
            Err(TrainerError::UnknownRoot(name)) if name == "H"
        ));
        assert!(matches!(
            TrainerConfig::from_yaml("qualities: [sus4]"),
            Err(TrainerError::UnknownQuality(name)) if name == "sus4"
        ));
    }

    #[test]
    fn test_bad_values_are_rejected() {
        for yaml in [
            "tempo: 0",
            "tempo: -10",
            "sustain: 0",
            "bars-per-loop: 0",
            "bars-per-loop: 65",
            "bars-per-loop: 1073741824",
            "articulation: strum",
            "voicing: drop3",
            "extensions: all",
            "register-center: 10",
            "tempo: fast",
            "volume: 11",
        ] {
            assert!(
                matches!(TrainerConfig::from_yaml(yaml), Err(TrainerError::ConfigError(_))),
                "{} should be rejected",
                yaml
            );
        }
    }

    #[test]
    fn test_empty_lists_are_kept_for_fallback() {
        // The generator treats an empty selection as "everything".
        let config = TrainerConfig::from_yaml("roots: []\nqualities: []").unwrap();
        assert!(config.selection().roots.is_empty());
        assert!(config.selection().qualities.is_empty());
    }

    #[test]
    fn test_seed_makes_rng_reproducible() {
        let config = TrainerConfig::from_yaml("seed: 7").unwrap();
        let mut first = config.rng();
        let mut second = config.rng();
        let a: Vec<u32> = (0..4).map(|_| first.gen()).collect();
        let b: Vec<u32> = (0..4).map(|_| second.gen()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vamp.yaml");
        fs::write(&path, "tempo: 80\nmetronome: true\n").unwrap();

        let config = TrainerConfig::load(&path).unwrap();
        assert_eq!(config.settings.tempo_bpm, 80.0);
        assert!(config.settings.metronome_enabled);

        let missing = TrainerConfig::load(&dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(TrainerError::Io(_))));
    }
}
