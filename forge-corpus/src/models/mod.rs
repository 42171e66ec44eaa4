//! Data models for the curation pipeline

pub mod attributes;
pub mod report;
pub mod selection;
pub mod transcript;

pub use attributes::{Attribute, AttributeSet, CanonicalName};
pub use report::{
    write_report, BasicReport, FailureStage, FileFailure, LabelSummary, OrganizeReport, SampleReport,
};
pub use selection::{SampleBucket, SelectionResult};
pub use transcript::{DetectionMethod, EncodingUsed, TranscriptRecord};
