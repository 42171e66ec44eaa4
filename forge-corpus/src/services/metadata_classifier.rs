//! Path and transcript based metadata classification
//!
//! Infers the ten corpus attributes of one recording and synthesizes its
//! canonical name and destination:
//!
//! ```text
//! <output_root>/<transcript>/<source_label>/<region bucket>/
//!     {region}_{accent}_{rate}_{distance}_{gender}_{age}_{speaker}_{command}_01+MD5+{hash}.wav
//! ```
//!
//! Keyword rules are matched against the whole path with `\` normalized to
//! `/`. Classification is a pure function of the path, the sidecar transcript
//! and the file content, so batches may classify in parallel.

use crate::config::CorpusConfig;
use crate::error::ClassifyError;
use crate::models::attributes::CANONICAL_TOKEN_COUNT;
use crate::models::{Attribute, AttributeSet, CanonicalName, TranscriptRecord};
use crate::rules::ClassificationRules;
use crate::services::content_hasher::ContentHasher;
use crate::services::encoding_sniffer::EncodingSniffer;
use crate::services::transliterator::{command_token, contains_cjk};
use std::path::{Component, Path};

/// Metadata classifier service
pub struct MetadataClassifier {
    rules: ClassificationRules,
    sniffer: EncodingSniffer,
    hasher: ContentHasher,
}

impl MetadataClassifier {
    pub fn new(rules: ClassificationRules, sniffer: EncodingSniffer, hasher: ContentHasher) -> Self {
        Self {
            rules,
            sniffer,
            hasher,
        }
    }

    /// Build the classifier and its collaborators from configuration
    pub fn from_config(config: &CorpusConfig) -> forge_common::Result<Self> {
        Ok(Self::new(
            ClassificationRules::compile(&config.classification)?,
            EncodingSniffer::new(&config.sniffer),
            ContentHasher::new(config.hasher.chunk_size),
        ))
    }

    pub fn rules(&self) -> &ClassificationRules {
        &self.rules
    }

    /// Classify one audio file
    ///
    /// A missing, undecodable or empty transcript is `NoTranscript`. A
    /// canonical name that does not split into nine tokens is logged and
    /// returned anyway unless strict naming is on.
    pub fn classify(&self, path: &Path, output_root: &Path) -> Result<CanonicalName, ClassifyError> {
        let transcript = self.read_transcript(path)?;
        let unknown = self.rules.unknown_value.as_str();
        let mut attributes = AttributeSet::new(unknown);

        attributes.set(Attribute::CommandWord, command_token(&transcript.content));
        attributes.set(Attribute::ContentHash, self.hasher.digest(path)?);

        let source_label = self.source_label(path);
        attributes.set(Attribute::SourceLabel, source_label.as_str());

        let region = if contains_cjk(&transcript.content) {
            &self.rules.domestic
        } else {
            &self.rules.overseas
        };
        attributes.set(Attribute::Region, region.region.as_str());
        attributes.set(Attribute::Accent, region.accent.as_str());

        let path_text = path.to_string_lossy().replace('\\', "/");
        for (attribute, rules) in &self.rules.attributes {
            if let Some(label) = rules.evaluate(&path_text) {
                attributes.set(*attribute, label);
            }
        }

        match speaker_id(path) {
            Some(speaker) => attributes.set(Attribute::SpeakerId, speaker),
            None => tracing::warn!(file = %path.display(), "No speaker directory in path"),
        }

        let directory = output_root
            .join(directory_name(&transcript.content))
            .join(directory_name(&source_label))
            .join(&region.bucket);

        let name = CanonicalName {
            directory,
            file_name: attributes.file_name(),
            attributes,
        };

        if !name.is_well_formed() {
            if self.rules.strict_naming {
                return Err(ClassifyError::MalformedName {
                    name: name.file_name.clone(),
                    tokens: name.token_count(),
                    expected: CANONICAL_TOKEN_COUNT,
                });
            }
            tracing::error!(
                file = %path.display(),
                name = %name.file_name,
                tokens = name.token_count(),
                "Malformed canonical name, relocating anyway"
            );
        }

        tracing::debug!(
            file = %path.display(),
            destination = %name.path().display(),
            "Classified"
        );

        Ok(name)
    }

    fn read_transcript(&self, path: &Path) -> Result<TranscriptRecord, ClassifyError> {
        let record = self
            .sniffer
            .read_transcript(path)
            .map_err(|e| ClassifyError::NoTranscript {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if record.content.is_empty() {
            return Err(ClassifyError::NoTranscript {
                path: path.to_path_buf(),
                reason: format!("{} is empty", record.source_path.display()),
            });
        }

        Ok(record)
    }

    /// Deepest directory matching the source marker, else the unknown source
    fn source_label(&self, path: &Path) -> String {
        path.parent()
            .into_iter()
            .flat_map(|dir| dir.components().rev())
            .filter_map(|component| match component {
                Component::Normal(name) => Some(name.to_string_lossy()),
                _ => None,
            })
            .find(|name| self.rules.source_marker.is_match(name))
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| self.rules.unknown_source.clone())
    }
}

/// Name of the file's parent directory
fn speaker_id(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
}

/// Single path component from free text
///
/// Separators and control characters become `_`; a name of only dots would
/// climb the tree, so its dots become `_` too.
fn directory_name(text: &str) -> String {
    let name: String = text
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    if name.chars().all(|c| c == '.') {
        "_".repeat(name.chars().count())
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassificationConfig;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Keywords are matched against the whole path, temp prefix included
    fn temp_dir() -> TempDir {
        loop {
            let dir = TempDir::new().unwrap();
            let name = dir.path().file_name().unwrap().to_string_lossy().to_lowercase();
            if !name.chars().any(|c| c.is_ascii_digit()) && !name.contains("man") {
                return dir;
            }
        }
    }

    fn classifier(config: &CorpusConfig) -> MetadataClassifier {
        MetadataClassifier::from_config(config).unwrap()
    }

    fn recording(root: &Path, rel: &str, transcript: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"RIFF-fake-audio").unwrap();
        fs::write(path.with_extension("lab"), transcript).unwrap();
        path
    }

    #[test]
    fn test_source_label_is_deepest_marker() {
        let temp_dir = temp_dir();
        let path = recording(
            temp_dir.path(),
            "来源A/sub/vendor source B/spk7/001.wav",
            "打开",
        );

        let name = classifier(&CorpusConfig::default())
            .classify(&path, Path::new("/out"))
            .unwrap();
        assert_eq!(name.attributes.get(Attribute::SourceLabel), "vendor source B");
        assert_eq!(name.attributes.get(Attribute::SpeakerId), "spk7");
        assert_eq!(
            name.directory,
            PathBuf::from("/out/打开/vendor source B/domestic")
        );
    }

    #[test]
    fn test_unknown_source_and_attributes() {
        let temp_dir = temp_dir();
        let path = recording(temp_dir.path(), "plain/spk1/001.wav", "hello");

        let name = classifier(&CorpusConfig::default())
            .classify(&path, Path::new("out"))
            .unwrap();
        let attrs = &name.attributes;
        assert_eq!(attrs.get(Attribute::SourceLabel), "unknown source");
        assert_eq!(attrs.get(Attribute::Region), "yingguo");
        assert_eq!(attrs.get(Attribute::Accent), "English");
        assert_eq!(attrs.get(Attribute::SpeechRate), "unknown");
        assert_eq!(attrs.get(Attribute::Gender), "unknown");
        assert_eq!(attrs.get(Attribute::CommandWord), "hello");
        assert!(name.directory.ends_with("hello/unknown source/overseas"));
        assert!(name.is_well_formed());
    }

    #[test]
    fn test_attributes_evaluated_independently() {
        let temp_dir = temp_dir();
        let path = recording(
            temp_dir.path(),
            "corpus/快语速/3米/男/老年人/spk2/a.wav",
            "关灯",
        );

        let name = classifier(&CorpusConfig::default())
            .classify(&path, Path::new("out"))
            .unwrap();
        let attrs = &name.attributes;
        assert_eq!(attrs.get(Attribute::SpeechRate), "fast");
        assert_eq!(attrs.get(Attribute::CaptureDistance), "3m");
        assert_eq!(attrs.get(Attribute::Gender), "man");
        assert_eq!(attrs.get(Attribute::AgeGroup), "oldAge");
        assert_eq!(attrs.get(Attribute::CommandWord), "guandeng");
    }

    #[test]
    fn test_missing_and_empty_transcript() {
        let temp_dir = temp_dir();
        let classifier = classifier(&CorpusConfig::default());

        let bare = temp_dir.path().join("spk/bare.wav");
        fs::create_dir_all(bare.parent().unwrap()).unwrap();
        fs::write(&bare, b"x").unwrap();
        assert!(matches!(
            classifier.classify(&bare, Path::new("out")),
            Err(ClassifyError::NoTranscript { .. })
        ));

        let blank = recording(temp_dir.path(), "spk/blank.wav", "  \n ");
        assert!(matches!(
            classifier.classify(&blank, Path::new("out")),
            Err(ClassifyError::NoTranscript { .. })
        ));
    }

    #[test]
    fn test_malformed_name_strict_and_lenient() {
        let temp_dir = temp_dir();
        let path = recording(temp_dir.path(), "data/spk_01/a.wav", "打开");

        let lenient = classifier(&CorpusConfig::default())
            .classify(&path, Path::new("out"))
            .unwrap();
        assert_eq!(lenient.token_count(), 10);

        let config = CorpusConfig {
            classification: ClassificationConfig {
                strict_naming: true,
                ..ClassificationConfig::default()
            },
            ..CorpusConfig::default()
        };
        match classifier(&config).classify(&path, Path::new("out")) {
            Err(ClassifyError::MalformedName {
                tokens, expected, ..
            }) => {
                assert_eq!(tokens, 10);
                assert_eq!(expected, 9);
            }
            other => panic!("Expected MalformedName, got {:?}", other),
        }
    }

    #[test]
    fn test_traversal_transcript_stays_in_bucket() {
        let temp_dir = temp_dir();
        let out = temp_dir.path().join("out");
        let classifier = classifier(&CorpusConfig::default());

        for transcript in ["../../../escaped", "..", "line one\nline/two"] {
            let path = recording(temp_dir.path(), "来源A/spk1/a.wav", transcript);
            let name = classifier.classify(&path, &out).unwrap();

            let command = name.attributes.get(Attribute::CommandWord);
            assert!(!command.contains('/') && !command.contains('\n'), "{}", command);
            assert!(!name.file_name.contains('/'));

            let dest = name.path();
            assert_eq!(dest.parent().unwrap(), name.directory);
            assert_eq!(name.directory.parent().unwrap().parent().unwrap().parent().unwrap(), out);
            assert!(name.directory.ends_with("来源A/overseas"));
            assert!(dest
                .components()
                .all(|c| !matches!(c, std::path::Component::ParentDir)));
        }
    }

    #[test]
    fn test_directory_name_replaces_separators() {
        assert_eq!(directory_name("on/off"), "on_off");
        assert_eq!(directory_name("a\\b\nc"), "a_b_c");
        assert_eq!(directory_name("打开"), "打开");
        assert_eq!(directory_name(".."), "__");
        assert_eq!(directory_name("."), "_");
        assert_eq!(directory_name("..a"), "..a");
    }
}
