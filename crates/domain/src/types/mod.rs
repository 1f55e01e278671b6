//! Domain types and models

pub mod batch;
pub mod credential;
pub mod locale;
pub mod request;

pub use batch::{
    BatchConfig, BatchItem, BatchingOptions, ItemOutcome, OperationResult, OutputDirective,
    OutputEntry, OutputGroups, OutputKind,
};
pub use credential::{AuthMethod, Credential};
pub use locale::LanguageCode;
pub use request::{service_url, OperationRequest};
