// ABOUTME: Main library entry point for the headlines fetch-and-extract pipeline.
// ABOUTME: Re-exports the public API: Pipeline, PipelineBuilder, Strategy, DecodedDocument and the error types.

//! Headlines - fetch one web page and extract its headlines.
//!
//! The fetcher decodes whatever encoding the page uses into UTF-8; an
//! interchangeable [`Strategy`] (regex pattern, node-path query or CSS
//! selector) then pulls the headline strings out of the text.
//!
//! # Example
//!
//! ```no_run
//! use headlines::{Pipeline, PipelineError, StrategyKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PipelineError> {
//!     let pipeline = Pipeline::builder()
//!         .strategy_kind(StrategyKind::TreeQuery)
//!         .build()?;
//!     for headline in pipeline.run("https://www.thepaper.cn").await? {
//!         println!("{}", headline);
//!     }
//!     Ok(())
//! }
//! ```

pub mod document;
pub mod encoding;
pub mod error;
pub mod extractors;
pub mod options;
pub mod pipeline;
pub mod resource;

pub use crate::document::DecodedDocument;
pub use crate::encoding::{detect, Detection, DetectionSource, Hints};
pub use crate::error::{FetchError, FetchErrorCode, ParseError, PipelineError, Stage};
pub use crate::extractors::loader::{default_preset, load_builtin_presets};
pub use crate::extractors::{
    Extractor, PatternMatch, PresetRegistry, SelectorQuery, SitePreset, Strategy, StrategyKind,
    TreeQuery,
};
pub use crate::options::{Options, PipelineBuilder};
pub use crate::pipeline::{Headlines, Pipeline};
pub use crate::resource::{FetchOptions, Fetcher};
