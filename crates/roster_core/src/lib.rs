//! Decoder for army list exports from BattleScribe (`.rosz`, `.ros`) and
//! NewRecruit (`.json`).
//!
//! All three variants are unified into one [`roster::Roster`] model and then
//! flattened into a [`core_api::ParseResult`].

pub mod container;
pub mod core_api;
pub mod extract;
pub mod format;
pub mod roster;
pub mod schema;
pub mod xml;

pub use core_api::{CoreError, CoreErrorCode, Decoder, ImportUnit, ParseResult, decode};
pub use format::{RosterFormat, detect_format, supported_extensions};
