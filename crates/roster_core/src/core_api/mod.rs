mod engine;
mod error;
mod types;

pub use engine::{Decoder, decode};
pub use error::{CoreError, CoreErrorCode, TextPosition};
pub use types::{ImportUnit, ParseResult, SourceMetadata};
