//! Response interpretation
//!
//! The WebAPI reports success and failure in several unrelated JSON shapes.
//! Responses are classified once into a [`ResponseEnvelope`]; every question
//! asked afterwards (session lost? success? error text? payload?) is answered
//! from that variant by the [`ResponseClassifier`].
//!
//! [`normalize`] rewrites payloads into plain JSON: localized value lists
//! collapse to one string and `/Date(ms)/` strings become ISO-8601 instants.

pub mod classifier;
pub mod envelope;
pub mod normalize;
pub mod session;

pub use classifier::{ResponseClassifier, Verdict};
pub use envelope::ResponseEnvelope;
pub use normalize::normalize;
pub use session::SessionLossMatcher;
