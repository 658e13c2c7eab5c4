//! Chord generation.
//!
//! Picks a root and a quality from the active selections and resolves them to
//! a concrete [`Chord`]. Empty selections fall back to the full universe, so
//! generation cannot fail.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::Serialize;

use crate::theory::{ChordQuality, PitchClass, ALTERATION_COUNT, ALTERATION_POOL};

/// One concrete chord. Superseded by the next generation, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chord {
    root: PitchClass,
    quality: ChordQuality,
    offsets: Vec<u8>,
    notes: Vec<u8>,
}

impl Chord {
    /// Build a chord from already-resolved offsets.
    pub fn new(root: PitchClass, quality: ChordQuality, offsets: Vec<u8>) -> Self {
        let base = root.base_midi();
        let notes = offsets.iter().map(|o| base + o).collect();
        Self { root, quality, offsets, notes }
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    pub fn quality(&self) -> ChordQuality {
        self.quality
    }

    /// Semitone offsets from the root, in table order (alterations last).
    pub fn offsets(&self) -> &[u8] {
        &self.offsets
    }

    /// Absolute MIDI numbers anchored at the reference octave.
    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    /// Display label, e.g. "Bbm7".
    pub fn label(&self) -> String {
        format!("{}{}", self.root.name(), self.quality.name())
    }

    pub fn scale_hint(&self) -> &'static str {
        self.quality.scale_hint()
    }
}

/// Resolve a quality to concrete offsets, rolling alterations where needed.
pub fn resolve_offsets<R: Rng + ?Sized>(quality: ChordQuality, rng: &mut R) -> Vec<u8> {
    let mut offsets = quality.offsets().to_vec();
    if quality.is_alterable() {
        let mut picks: Vec<u8> = index::sample(rng, ALTERATION_POOL.len(), ALTERATION_COUNT)
            .into_iter()
            .map(|i| ALTERATION_POOL[i])
            .collect();
        picks.sort_unstable();
        offsets.extend(picks);
    }
    offsets
}

/// Generate one chord from the active selections.
///
/// # Examples
/// ```
/// use rand::SeedableRng;
/// use rand_pcg::Pcg32;
/// use vamp::chord::generate;
/// use vamp::theory::{ChordQuality, PitchClass};
///
/// let mut rng = Pcg32::seed_from_u64(7);
/// let chord = generate(&[PitchClass::C], &[ChordQuality::Maj7], &mut rng);
///
/// assert_eq!(chord.label(), "Cmaj7");
/// assert_eq!(chord.notes(), &[48, 52, 55, 59]);
/// ```
pub fn generate<R: Rng + ?Sized>(
    roots: &[PitchClass],
    qualities: &[ChordQuality],
    rng: &mut R,
) -> Chord {
    let roots = if roots.is_empty() { &PitchClass::ALL[..] } else { roots };
    let qualities = if qualities.is_empty() { &ChordQuality::ALL[..] } else { qualities };

    // Both slices are non-empty here.
    let root = *roots.choose(rng).unwrap_or(&PitchClass::C);
    let quality = *qualities.choose(rng).unwrap_or(&ChordQuality::Maj7);

    let chord = Chord::new(root, quality, resolve_offsets(quality, rng));
    log::debug!(target: "vamp::chord", "generated {} {:?}", chord.label(), chord.offsets());
    chord
}
