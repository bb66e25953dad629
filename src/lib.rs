/*!
 * gdtrans - HTML game description translation through slow LLM endpoints.
 *
 * The pipeline parses an HTML document into a markup-preserving tree,
 * extracts the translatable text units, translates them in batches with
 * cascading degradation (10-line batch, 3/3/4 sub-batches, single units)
 * and writes the results back so everything untouched stays byte-identical.
 * Documents already in the target language are skipped by a cheap script
 * coverage check before any request is made.
 */

// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod html_processor;
pub mod language_coverage;
pub mod providers;
pub mod translation;

pub use app_config::{Config, EndpointDialect};
pub use errors::{AppError, ProviderError, TranslationError};
pub use html_processor::{HtmlDocument, TranslationUnit};
pub use translation::{SkipDecision, TranslationService};
