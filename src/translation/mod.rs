/*!
 * Translation services for HTML documents.
 *
 * The service in `core` owns the endpoint client, the HTTP gate and the
 * retry policy; `pipeline` implements the batched translation cascade on top
 * of it. `hallucination` and `prompts` are the supporting pieces both use.
 */

pub mod core;
pub mod hallucination;
pub mod pipeline;
pub mod prompts;

pub use self::core::{SkipDecision, TranslationService};
pub use self::hallucination::is_hallucination;
