//! Voicing builder.
//!
//! Turns a [`Chord`]'s offsets into the concrete pitches that get played:
//! extension filtering, root/fifth guarantees, a six-voice cap, octave folding
//! into a register band, and optional drop-2.
//!
//! ## Register band
//! Every pitch is folded into `[center - 7, center + 9]`. The band is wider
//! than an octave, so every pitch class has at least one home in it. Drop-2
//! runs after folding and is the one step allowed to move a note (the dropped
//! one) below the band.

use std::collections::BTreeSet;

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chord::Chord;
use crate::theory::PitchClass;

/// Most pitches a voicing sounds at once.
pub const MAX_VOICES: usize = 6;

/// Semitones below the register center the band reaches.
pub const BAND_BELOW: i16 = 7;

/// Semitones above the register center the band reaches.
pub const BAND_ABOVE: i16 = 9;

/// Register centers are kept inside this range so folded pitches stay valid MIDI.
pub const MIN_CENTER: u8 = 24;
pub const MAX_CENTER: u8 = 108;

/// Chord tones kept under every extension policy. Also the core subset that
/// survives the voice cap: root, thirds, fifth, sevenths.
const CHORD_TONES: [u8; 6] = [0, 3, 4, 7, 10, 11];

/// b9 and 9, added by the `basic` policy.
const BASIC_EXTENSIONS: [u8; 2] = [13, 14];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoicingStyle {
    #[default]
    Close,
    Drop2,
}

/// Which upper structure survives filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionPolicy {
    /// Chord tones only.
    None,
    /// Chord tones plus b9/9.
    Basic,
    /// Everything the quality defines.
    #[default]
    High,
}

impl ExtensionPolicy {
    fn keeps(self, offset: u8) -> bool {
        match self {
            ExtensionPolicy::None => CHORD_TONES.contains(&offset),
            ExtensionPolicy::Basic => {
                CHORD_TONES.contains(&offset) || BASIC_EXTENSIONS.contains(&offset)
            }
            ExtensionPolicy::High => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicingOptions {
    pub style: VoicingStyle,
    pub register_center: u8,
    pub extensions: ExtensionPolicy,
}

impl Default for VoicingOptions {
    fn default() -> Self {
        Self {
            style: VoicingStyle::Close,
            register_center: 60,
            extensions: ExtensionPolicy::High,
        }
    }
}

impl VoicingOptions {
    /// Inclusive pitch band notes are folded into.
    pub fn band(&self) -> (u8, u8) {
        let center = self.register_center.clamp(MIN_CENTER, MAX_CENTER) as i16;
        ((center - BAND_BELOW) as u8, (center + BAND_ABOVE) as u8)
    }
}

/// Register-placed pitches for one chord, ascending and distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voicing {
    root: PitchClass,
    notes: Vec<u8>,
}

impl Voicing {
    pub fn new(root: PitchClass, mut notes: Vec<u8>) -> Self {
        notes.sort_unstable();
        notes.dedup();
        Self { root, notes }
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    pub fn notes(&self) -> &[u8] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Filter a chord's offsets by policy, restoring the root and (when the
/// chord has one) the perfect fifth.
fn filter_offsets(chord: &Chord, policy: ExtensionPolicy) -> BTreeSet<u8> {
    let mut kept: BTreeSet<u8> = chord.offsets().iter().copied().filter(|o| policy.keeps(*o)).collect();
    kept.insert(0);
    if chord.offsets().contains(&7) {
        kept.insert(7);
    }
    kept
}

/// Cap at [`MAX_VOICES`], keeping the core chord tones and sampling the rest.
fn cap_offsets<R: Rng + ?Sized>(offsets: BTreeSet<u8>, rng: &mut R) -> Vec<u8> {
    if offsets.len() <= MAX_VOICES {
        return offsets.into_iter().collect();
    }

    let (mut core, extras): (Vec<u8>, Vec<u8>) =
        offsets.into_iter().partition(|o| CHORD_TONES.contains(o));
    let room = MAX_VOICES.saturating_sub(core.len());
    core.extend(index::sample(rng, extras.len(), room).into_iter().map(|i| extras[i]));
    core.sort_unstable();
    core
}

/// Move `pitch` by octaves until it sits in `[low, high]`.
fn fold_into_band(pitch: i16, low: i16, high: i16) -> i16 {
    let mut p = pitch;
    while p < low {
        p += 12;
    }
    while p > high {
        p -= 12;
    }
    p
}

/// Build the voicing for `chord`.
///
/// The only randomness is the choice of which upper extensions survive the
/// six-voice cap; a fixed RNG state reproduces the same voicing.
///
/// # Examples
/// ```
/// use rand::SeedableRng;
/// use rand_pcg::Pcg32;
/// use vamp::chord::Chord;
/// use vamp::theory::{ChordQuality, PitchClass};
/// use vamp::voicing::{build, VoicingOptions};
///
/// let chord = Chord::new(PitchClass::C, ChordQuality::Dim7, vec![0, 3, 6, 9]);
/// let voicing = build(&chord, &VoicingOptions::default(), &mut Pcg32::seed_from_u64(0));
///
/// assert_eq!(voicing.notes(), &[54, 57, 60, 63]);
/// ```
pub fn build<R: Rng + ?Sized>(chord: &Chord, options: &VoicingOptions, rng: &mut R) -> Voicing {
    let offsets = cap_offsets(filter_offsets(chord, options.extensions), rng);

    let (low, high) = options.band();
    let root_midi = chord.root().base_midi() as i16;
    let folded: BTreeSet<u8> = offsets
        .iter()
        .map(|o| fold_into_band(root_midi + *o as i16, low as i16, high as i16) as u8)
        .collect();
    let mut notes: Vec<u8> = folded.into_iter().collect();

    if options.style == VoicingStyle::Drop2 && notes.len() >= 4 {
        let second_highest = notes.len() - 2;
        notes[second_highest] -= 12;
        notes.sort_unstable();
    }

    log::debug!(target: "vamp::voicing", "{} -> {:?}", chord.label(), notes);
    Voicing::new(chord.root(), notes)
}
