pub mod engine;
pub mod request;

pub use engine::CaptureEngine;
pub use request::{CapturedRequest, MockResponse};
