//! Service modules for corpus curation
//!
//! Leaf decoders (header, transcript encoding, transliteration, digest), the
//! classifier and organizer built on them, the sampler, and the conversion
//! helpers behind the basic operations.

pub mod amplitude_normalizer;
pub mod balanced_sampler;
pub mod content_hasher;
pub mod corpus_organizer;
pub mod encoding_sniffer;
pub mod file_scanner;
pub mod format_converter;
pub mod metadata_classifier;
pub mod transliterator;
pub mod wav_header;

pub use amplitude_normalizer::{NormalizeError, Normalizer, PeakNormalizer};
pub use balanced_sampler::{BalancedSampler, FilterVerdict, SampleFilters};
pub use content_hasher::ContentHasher;
pub use corpus_organizer::{CorpusOrganizer, OrganizeOutcome};
pub use encoding_sniffer::{Detection, EncodingDetector, EncodingSniffer};
pub use file_scanner::{FileScanner, ScanError};
pub use format_converter::{ConvertError, PcmParams};
pub use metadata_classifier::MetadataClassifier;
pub use wav_header::{HeaderDecoder, WavHeader};
