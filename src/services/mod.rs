//! Conversation pipeline services.
//!
//! Input flows through [`preprocess`], [`respond`] and [`influence`]; the
//! [`Session`] ties the steps to persistent state and records each exchange
//! via [`ExchangeLog`].

mod corrector;
mod exchange_log;
mod influence;
mod preprocess;
mod responder;
mod session;

pub use corrector::{DictionaryCorrector, PassthroughCorrector, TextCorrector, build_corrector};
pub use exchange_log::{ExchangeLog, INPUT_DIGEST_LEN, input_digest};
pub use influence::{influence, influence_named};
pub use preprocess::preprocess;
pub use responder::{MAX_FALLBACK_KEYWORDS, NO_USABLE_WORDS, keyword_fallback, respond};
pub use session::{Session, SessionSummary, format_uptime};
