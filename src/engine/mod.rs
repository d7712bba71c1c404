pub mod client;
pub mod error;
pub mod types;

pub use client::{EngineClient, TranslateApi};
pub use error::EngineError;
pub use types::{ErrorBody, FilePart, Job, JobStatus, SubmitAck, TranslationRequest};
