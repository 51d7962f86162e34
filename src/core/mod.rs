pub mod discovery;
pub mod domain;
pub mod extractor;
pub mod pipeline;
pub mod traits;
