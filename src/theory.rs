//! Theory tables: pitch classes, chord qualities and scale suggestions.
//!
//! Pure data. Everything else in the crate reads from here.

use serde::Serialize;

/// MIDI number of the reference octave a chord root is anchored to (C3).
pub const BASE_MIDI: u8 = 48;

/// Lowest MIDI number of the bass register (C2).
pub const BASS_BASE_MIDI: u8 = 36;

/// Offsets always added to a `7alt` chord before its alterations.
pub const ALT_BASE: [u8; 4] = [0, 4, 7, 10];

/// b9, #9, #11, b13. Two of these are drawn for every `7alt`.
pub const ALTERATION_POOL: [u8; 4] = [13, 15, 18, 20];

/// How many alterations a `7alt` draws from the pool.
pub const ALTERATION_COUNT: usize = 2;

/// One of the twelve pitch classes, spelled with flats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PitchClass {
    C,
    Db,
    D,
    Eb,
    E,
    F,
    Gb,
    G,
    Ab,
    A,
    Bb,
    B,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Db,
        PitchClass::D,
        PitchClass::Eb,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Gb,
        PitchClass::G,
        PitchClass::Ab,
        PitchClass::A,
        PitchClass::Bb,
        PitchClass::B,
    ];

    /// Semitones above C.
    pub fn semitone(self) -> u8 {
        self as u8
    }

    pub fn from_semitone(semitone: u8) -> PitchClass {
        Self::ALL[(semitone % 12) as usize]
    }

    /// Parse a root name, normalizing enharmonic spellings to the flat set.
    ///
    /// # Examples
    /// ```
    /// use vamp::theory::PitchClass;
    ///
    /// assert_eq!(PitchClass::from_name("Bb"), Some(PitchClass::Bb));
    /// assert_eq!(PitchClass::from_name("A#"), Some(PitchClass::Bb));
    /// assert_eq!(PitchClass::from_name("Cb"), Some(PitchClass::B));
    /// assert_eq!(PitchClass::from_name("H"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<PitchClass> {
        let mut chars = name.trim().chars();
        let base: i8 = match chars.next()? {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let accidental: i8 = match chars.next() {
            None => 0,
            Some('b') | Some('♭') => -1,
            Some('#') | Some('♯') => 1,
            Some(_) => return None,
        };
        if chars.next().is_some() {
            return None;
        }
        Some(Self::from_semitone((base + accidental).rem_euclid(12) as u8))
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Db => "Db",
            PitchClass::D => "D",
            PitchClass::Eb => "Eb",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Gb => "Gb",
            PitchClass::G => "G",
            PitchClass::Ab => "Ab",
            PitchClass::A => "A",
            PitchClass::Bb => "Bb",
            PitchClass::B => "B",
        }
    }

    /// MIDI number of this pitch class in the chord reference octave.
    pub fn base_midi(self) -> u8 {
        BASE_MIDI + self.semitone()
    }

    /// MIDI number of this pitch class in the bass register.
    pub fn bass_midi(self) -> u8 {
        BASS_BASE_MIDI + self.semitone()
    }
}

/// Chord qualities offered by the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChordQuality {
    #[serde(rename = "maj7")]
    Maj7,
    #[serde(rename = "6/9")]
    SixNine,
    #[serde(rename = "m7")]
    Min7,
    #[serde(rename = "m9")]
    Min9,
    #[serde(rename = "m11")]
    Min11,
    #[serde(rename = "7")]
    Dom7,
    #[serde(rename = "13")]
    Dom13,
    #[serde(rename = "7b9")]
    Dom7Flat9,
    #[serde(rename = "7#9")]
    Dom7Sharp9,
    #[serde(rename = "7#11")]
    Dom7Sharp11,
    #[serde(rename = "7b13")]
    Dom7Flat13,
    #[serde(rename = "7alt")]
    Dom7Alt,
    #[serde(rename = "m7b5")]
    HalfDim7,
    #[serde(rename = "dim7")]
    Dim7,
    #[serde(rename = "mMaj7")]
    MinMaj7,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 15] = [
        ChordQuality::Maj7,
        ChordQuality::SixNine,
        ChordQuality::Min7,
        ChordQuality::Min9,
        ChordQuality::Min11,
        ChordQuality::Dom7,
        ChordQuality::Dom13,
        ChordQuality::Dom7Flat9,
        ChordQuality::Dom7Sharp9,
        ChordQuality::Dom7Sharp11,
        ChordQuality::Dom7Flat13,
        ChordQuality::Dom7Alt,
        ChordQuality::HalfDim7,
        ChordQuality::Dim7,
        ChordQuality::MinMaj7,
    ];

    /// Display name, as used in chord labels ("C" + "maj7").
    pub fn name(self) -> &'static str {
        match self {
            ChordQuality::Maj7 => "maj7",
            ChordQuality::SixNine => "6/9",
            ChordQuality::Min7 => "m7",
            ChordQuality::Min9 => "m9",
            ChordQuality::Min11 => "m11",
            ChordQuality::Dom7 => "7",
            ChordQuality::Dom13 => "13",
            ChordQuality::Dom7Flat9 => "7b9",
            ChordQuality::Dom7Sharp9 => "7#9",
            ChordQuality::Dom7Sharp11 => "7#11",
            ChordQuality::Dom7Flat13 => "7b13",
            ChordQuality::Dom7Alt => "7alt",
            ChordQuality::HalfDim7 => "m7b5",
            ChordQuality::Dim7 => "dim7",
            ChordQuality::MinMaj7 => "mMaj7",
        }
    }

    /// Look a quality up by its display name. A few common aliases are accepted.
    ///
    /// # Examples
    /// ```
    /// use vamp::theory::ChordQuality;
    ///
    /// assert_eq!(ChordQuality::from_name("m7b5"), Some(ChordQuality::HalfDim7));
    /// assert_eq!(ChordQuality::from_name("-7"), Some(ChordQuality::Min7));
    /// assert_eq!(ChordQuality::from_name("sus4"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<ChordQuality> {
        let name = name.trim();
        if let Some(q) = Self::ALL.iter().find(|q| q.name() == name) {
            return Some(*q);
        }
        match name {
            "M7" | "Δ7" => Some(ChordQuality::Maj7),
            "69" => Some(ChordQuality::SixNine),
            "-7" | "min7" => Some(ChordQuality::Min7),
            "-9" | "min9" => Some(ChordQuality::Min9),
            "-11" | "min11" => Some(ChordQuality::Min11),
            "ø7" | "ø" => Some(ChordQuality::HalfDim7),
            "°7" | "o7" => Some(ChordQuality::Dim7),
            "alt" => Some(ChordQuality::Dom7Alt),
            _ => None,
        }
    }

    /// Semitone offsets from the root. For `7alt` this is only the base
    /// template; alterations are drawn per generation.
    pub fn offsets(self) -> &'static [u8] {
        match self {
            ChordQuality::Maj7 => &[0, 4, 7, 11],
            ChordQuality::SixNine => &[0, 4, 7, 9, 14],
            ChordQuality::Min7 => &[0, 3, 7, 10],
            ChordQuality::Min9 => &[0, 3, 7, 10, 14],
            ChordQuality::Min11 => &[0, 3, 7, 10, 14, 17],
            ChordQuality::Dom7 => &[0, 4, 7, 10],
            ChordQuality::Dom13 => &[0, 4, 7, 10, 21],
            ChordQuality::Dom7Flat9 => &[0, 4, 7, 10, 13],
            ChordQuality::Dom7Sharp9 => &[0, 4, 7, 10, 15],
            ChordQuality::Dom7Sharp11 => &[0, 4, 7, 10, 18],
            ChordQuality::Dom7Flat13 => &[0, 4, 7, 10, 20],
            ChordQuality::Dom7Alt => &ALT_BASE,
            ChordQuality::HalfDim7 => &[0, 3, 6, 10],
            ChordQuality::Dim7 => &[0, 3, 6, 9],
            ChordQuality::MinMaj7 => &[0, 3, 7, 11],
        }
    }

    /// True when the offsets are a template re-rolled on every generation.
    pub fn is_alterable(self) -> bool {
        self == ChordQuality::Dom7Alt
    }

    /// Scale suggestion shown next to the chord label.
    pub fn scale_hint(self) -> &'static str {
        match self {
            ChordQuality::Maj7 => "Ionian / Lydian",
            ChordQuality::SixNine => "Major pentatonic / Ionian",
            ChordQuality::Min7 => "Dorian",
            ChordQuality::Min9 => "Dorian / Aeolian",
            ChordQuality::Min11 => "Dorian (minor pentatonic on top)",
            ChordQuality::Dom7 => "Mixolydian",
            ChordQuality::Dom13 => "Mixolydian (natural 13)",
            ChordQuality::Dom7Flat9 => "Half-whole diminished",
            ChordQuality::Dom7Sharp9 => "Altered / half-whole diminished",
            ChordQuality::Dom7Sharp11 => "Lydian dominant",
            ChordQuality::Dom7Flat13 => "Mixolydian b13",
            ChordQuality::Dom7Alt => "Altered (7th mode of melodic minor)",
            ChordQuality::HalfDim7 => "Locrian natural 2",
            ChordQuality::Dim7 => "Whole-half diminished",
            ChordQuality::MinMaj7 => "Melodic minor",
        }
    }
}

/// Look up the scale suggestion by quality name, as the UI layer keys it.
pub fn scale_hint(quality_name: &str) -> Option<&'static str> {
    ChordQuality::from_name(quality_name).map(ChordQuality::scale_hint)
}

/// Sampler-style note name for a MIDI number: sharps spelled with `s`
/// ("Ds4"), octave numbered so that MIDI 60 is C4.
///
/// # Examples
/// ```
/// use vamp::theory::sample_note_name;
///
/// assert_eq!(sample_note_name(60), "C4");
/// assert_eq!(sample_note_name(63), "Ds4");
/// assert_eq!(sample_note_name(21), "A0");
/// ```
pub fn sample_note_name(midi: u8) -> String {
    const NAMES: [&str; 12] = ["C", "Cs", "D", "Ds", "E", "F", "Fs", "G", "Gs", "A", "As", "B"];
    let octave = (midi / 12) as i16 - 1;
    format!("{}{}", NAMES[(midi % 12) as usize], octave)
}
