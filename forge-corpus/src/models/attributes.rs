//! Classification attributes and the canonical filename built from them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Separator between canonical filename fields
pub const NAME_SEPARATOR: char = '_';

/// Token count of a well-formed canonical filename split on `NAME_SEPARATOR`
pub const CANONICAL_TOKEN_COUNT: usize = 9;

/// Marker between the take number and the content digest
pub const HASH_MARKER: &str = "+MD5+";

/// Take number written into every canonical filename
pub const TAKE_NUMBER: &str = "01";

/// Keys of an [`AttributeSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    SourceLabel,
    Region,
    Accent,
    SpeechRate,
    CaptureDistance,
    Gender,
    AgeGroup,
    SpeakerId,
    CommandWord,
    ContentHash,
}

impl Attribute {
    /// All keys, in declaration order
    pub const ALL: [Attribute; 10] = [
        Attribute::SourceLabel,
        Attribute::Region,
        Attribute::Accent,
        Attribute::SpeechRate,
        Attribute::CaptureDistance,
        Attribute::Gender,
        Attribute::AgeGroup,
        Attribute::SpeakerId,
        Attribute::CommandWord,
        Attribute::ContentHash,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Attribute::SourceLabel => "source_label",
            Attribute::Region => "region",
            Attribute::Accent => "accent",
            Attribute::SpeechRate => "speech_rate",
            Attribute::CaptureDistance => "capture_distance",
            Attribute::Gender => "gender",
            Attribute::AgeGroup => "age_group",
            Attribute::SpeakerId => "speaker_id",
            Attribute::CommandWord => "command_word",
            Attribute::ContentHash => "content_hash",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Fixed-key attribute mapping
///
/// All ten keys are always present. Anything not inferred keeps the
/// "unknown" sentinel it was constructed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSet {
    source_label: String,
    region: String,
    accent: String,
    speech_rate: String,
    capture_distance: String,
    gender: String,
    age_group: String,
    speaker_id: String,
    command_word: String,
    content_hash: String,
}

impl AttributeSet {
    /// Create a set with every attribute at `unknown`
    pub fn new(unknown: &str) -> Self {
        let u = || unknown.to_string();
        Self {
            source_label: u(),
            region: u(),
            accent: u(),
            speech_rate: u(),
            capture_distance: u(),
            gender: u(),
            age_group: u(),
            speaker_id: u(),
            command_word: u(),
            content_hash: u(),
        }
    }

    pub fn get(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::SourceLabel => &self.source_label,
            Attribute::Region => &self.region,
            Attribute::Accent => &self.accent,
            Attribute::SpeechRate => &self.speech_rate,
            Attribute::CaptureDistance => &self.capture_distance,
            Attribute::Gender => &self.gender,
            Attribute::AgeGroup => &self.age_group,
            Attribute::SpeakerId => &self.speaker_id,
            Attribute::CommandWord => &self.command_word,
            Attribute::ContentHash => &self.content_hash,
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: impl Into<String>) {
        let value = value.into();
        let slot = match attribute {
            Attribute::SourceLabel => &mut self.source_label,
            Attribute::Region => &mut self.region,
            Attribute::Accent => &mut self.accent,
            Attribute::SpeechRate => &mut self.speech_rate,
            Attribute::CaptureDistance => &mut self.capture_distance,
            Attribute::Gender => &mut self.gender,
            Attribute::AgeGroup => &mut self.age_group,
            Attribute::SpeakerId => &mut self.speaker_id,
            Attribute::CommandWord => &mut self.command_word,
            Attribute::ContentHash => &mut self.content_hash,
        };
        *slot = value;
    }

    /// Iterate over all ten `(key, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &str)> {
        Attribute::ALL.into_iter().map(move |a| (a, self.get(a)))
    }

    /// Build the canonical file name
    ///
    /// `{region}_{accent}_{speech_rate}_{capture_distance}_{gender}_{age_group}_{speaker_id}_{command_word}_01+MD5+{content_hash}.wav`
    pub fn file_name(&self) -> String {
        let fields = [
            self.get(Attribute::Region),
            self.get(Attribute::Accent),
            self.get(Attribute::SpeechRate),
            self.get(Attribute::CaptureDistance),
            self.get(Attribute::Gender),
            self.get(Attribute::AgeGroup),
            self.get(Attribute::SpeakerId),
            self.get(Attribute::CommandWord),
        ];
        let sep = NAME_SEPARATOR.to_string();
        format!(
            "{}{}{}{}{}.wav",
            fields.join(&sep),
            sep,
            TAKE_NUMBER,
            HASH_MARKER,
            self.get(Attribute::ContentHash)
        )
    }
}

/// Synthesized destination for one audio file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalName {
    /// `output_root/<command>/<source_label>/<region bucket>`
    pub directory: PathBuf,
    pub file_name: String,
    pub attributes: AttributeSet,
}

impl CanonicalName {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    pub fn token_count(&self) -> usize {
        self.file_name.split(NAME_SEPARATOR).count()
    }

    pub fn is_well_formed(&self) -> bool {
        self.token_count() == CANONICAL_TOKEN_COUNT
    }
}

/// Speaker id encoded in a canonical file name (third token from the end)
pub fn speaker_id_from_file_name(file_name: &str) -> Option<&str> {
    let tokens: Vec<&str> = file_name.split(NAME_SEPARATOR).collect();
    if tokens.len() < 3 {
        return None;
    }
    Some(tokens[tokens.len() - 3])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> AttributeSet {
        let mut attrs = AttributeSet::new("unknown");
        attrs.set(Attribute::Region, "zhongguo");
        attrs.set(Attribute::Accent, "putonghua");
        attrs.set(Attribute::Gender, "woman");
        attrs.set(Attribute::SpeakerId, "spk01");
        attrs.set(Attribute::CommandWord, "dakai");
        attrs.set(Attribute::ContentHash, "0123456789abcdef0123456789abcdef");
        attrs
    }

    #[test]
    fn test_new_set_is_all_unknown() {
        let attrs = AttributeSet::new("unknown");
        assert_eq!(attrs.iter().count(), 10);
        assert!(attrs.iter().all(|(_, v)| v == "unknown"));
    }

    #[test]
    fn test_file_name_layout() {
        let name = sample_set().file_name();
        assert_eq!(
            name,
            "zhongguo_putonghua_unknown_unknown_woman_unknown_spk01_dakai_01+MD5+0123456789abcdef0123456789abcdef.wav"
        );
        assert_eq!(name.split(NAME_SEPARATOR).count(), CANONICAL_TOKEN_COUNT);
        assert_eq!(speaker_id_from_file_name(&name), Some("spk01"));
    }

    #[test]
    fn test_separator_in_value_breaks_token_count() {
        let mut attrs = sample_set();
        attrs.set(Attribute::SpeakerId, "spk_01");
        let name = CanonicalName {
            directory: PathBuf::from("out"),
            file_name: attrs.file_name(),
            attributes: attrs,
        };
        assert!(!name.is_well_formed());
        assert_eq!(name.token_count(), 10);
    }

    #[test]
    fn test_speaker_id_short_name() {
        assert_eq!(speaker_id_from_file_name("plain.wav"), None);
        assert_eq!(speaker_id_from_file_name("a_b_c.wav"), Some("a"));
    }
}
