//! Resilient Jira upstream client.
//!
//! Layering, leaf first: `adf` (text extraction), `http` (retrying GET),
//! `cache` (TTL-bounded raw documents), `normalize` (document flattening),
//! `stream` (chunked attachment bytes), `service` (orchestration).

pub mod adf;
pub mod cache;
pub mod error;
pub mod http;
pub mod normalize;
pub mod service;
pub mod stream;
pub mod types;

pub use error::JiraError;
pub use service::JiraService;
pub use types::{Attachment, AttachmentStream, Comment, Issue};
