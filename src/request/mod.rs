//! Request classification
//!
//! Pure, I/O-free conversion of an HTTP method + path into a structured
//! "verb on resource in namespace" description.

pub mod classifier;
pub mod info;

pub use classifier::RequestClassifier;
pub use info::ClassifiedRequest;
