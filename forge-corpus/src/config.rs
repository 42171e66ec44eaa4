//! Configuration model for forge-corpus
//!
//! Loaded once from TOML (see `forge_common::config` for file resolution) and
//! never mutated afterwards. Every key is optional; the defaults below are the
//! built-in rule tables.

use crate::models::attributes::Attribute;
use forge_common::config::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Root folder for organized and sampled output
    pub output_root: Option<PathBuf>,

    pub logging: LoggingConfig,
    pub classification: ClassificationConfig,
    pub sniffer: SnifferConfig,
    pub hasher: HasherConfig,
    pub sampler: SamplerConfig,
}

/// Rule tables for metadata classification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Regex a directory name must match to be taken as the source label
    pub source_marker: String,

    /// Value used for any attribute that could not be inferred
    pub unknown_value: String,

    /// Source label used when no directory matches `source_marker`
    pub unknown_source: String,

    /// Reject files whose canonical name is malformed instead of relocating them
    pub strict_naming: bool,

    /// Region/accent pair for transcripts containing CJK ideographs
    pub domestic: RegionConfig,

    /// Region/accent pair for all other transcripts
    pub overseas: RegionConfig,

    /// Keyword rules, evaluated per attribute in order; first match wins
    pub attributes: Vec<AttributeRuleConfig>,
}

/// Region/accent pair plus the destination bucket directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub region: String,
    pub accent: String,
    pub bucket: String,
}

/// Ordered categories for one path-derived attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRuleConfig {
    pub attribute: Attribute,
    pub categories: Vec<CategoryConfig>,
}

/// One category label and the keywords (case-insensitive regexes) selecting it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub label: String,
    pub keywords: Vec<String>,
}

impl CategoryConfig {
    fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            source_marker: "来源|(?i:source)".to_string(),
            unknown_value: "unknown".to_string(),
            unknown_source: "unknown source".to_string(),
            strict_naming: false,
            domestic: RegionConfig {
                region: "zhongguo".to_string(),
                accent: "putonghua".to_string(),
                bucket: "domestic".to_string(),
            },
            overseas: RegionConfig {
                region: "yingguo".to_string(),
                accent: "English".to_string(),
                bucket: "overseas".to_string(),
            },
            attributes: default_attribute_rules(),
        }
    }
}

/// Built-in keyword tables
///
/// Categories whose keywords contain another category's keyword must come
/// first ("woman" before "man").
fn default_attribute_rules() -> Vec<AttributeRuleConfig> {
    vec![
        AttributeRuleConfig {
            attribute: Attribute::SpeechRate,
            categories: vec![
                CategoryConfig::new("fast", &["快语速", "快速", "fast"]),
                CategoryConfig::new("normal", &["正常语速", "正常", "normal"]),
                CategoryConfig::new("slow", &["慢速", "慢语速", "slow"]),
            ],
        },
        AttributeRuleConfig {
            attribute: Attribute::CaptureDistance,
            categories: vec![
                CategoryConfig::new("1m", &["1m", "1米", "一米"]),
                CategoryConfig::new("2m", &["2m", "两米", "二米", "2米"]),
                CategoryConfig::new("3m", &["3m", "3米", "三米"]),
            ],
        },
        AttributeRuleConfig {
            attribute: Attribute::Gender,
            categories: vec![
                CategoryConfig::new("woman", &["女", "/woman", "woman"]),
                CategoryConfig::new("man", &["男", "/man", "man"]),
            ],
        },
        AttributeRuleConfig {
            attribute: Attribute::AgeGroup,
            categories: vec![
                CategoryConfig::new(
                    "children",
                    &["children", "儿童", "小孩", "小学", "初中", "幼儿园"],
                ),
                CategoryConfig::new("youth", &["青年", "年轻", "youth", "大学", "中学", "高中"]),
                CategoryConfig::new("middleAge", &["adults", "中年", "middleAge", "成年"]),
                CategoryConfig::new("oldAge", &["老年人", "oldAge", "大爷", "大妈"]),
            ],
        },
    ]
}

/// Transcript discovery and decoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnifferConfig {
    /// Only this many leading bytes of a transcript are decoded
    pub read_limit: usize,

    /// Suffixes appended to the audio path (minus `.wav`), tried in order
    pub sidecar_suffixes: Vec<String>,

    /// Encodings tried strictly, in order, when no BOM is present
    pub candidate_encodings: Vec<String>,

    /// Consult the statistical detector (needs the `statistical-detection` feature)
    pub statistical_detection: bool,

    /// Minimum detector confidence for its guess to be used
    pub detection_threshold: f32,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            read_limit: 4096,
            sidecar_suffixes: [
                ".lab",
                ".txt",
                ".list",
                ".wav.lab",
                ".wav.txt",
                ".wav.list",
                "_lab",
                "_label",
                "_annotation",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            candidate_encodings: [
                "utf-8",
                "ascii",
                "latin-1",
                "gb18030",
                "gbk",
                "gb2312",
                "big5",
                "shift_jis",
                "euc-jp",
                "euc-kr",
                "iso-8859-1",
                "iso-8859-2",
                "iso-8859-5",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            statistical_detection: false,
            detection_threshold: 0.9,
        }
    }
}

/// Content digest settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    /// Read buffer size in bytes
    pub chunk_size: usize,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self { chunk_size: 4096 }
    }
}

/// Balanced sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Maximum files selected per label
    pub max_per_label: usize,

    /// Peak amplitude selected files are normalized to, in (0, 1]
    pub target_peak: f32,

    /// Infix of the versioned directory name: `<label>_<tag>_<count>`
    pub version_tag: String,

    /// A candidate must match every include pattern
    pub include_patterns: Vec<String>,

    /// A candidate matching any exclude pattern is dropped
    pub exclude_patterns: Vec<String>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_per_label: 100,
            target_peak: 1.0,
            version_tag: "norm".to_string(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}
