use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// The three export variants the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RosterFormat {
    /// `.rosz`: zip archive wrapping a single `.ros` document.
    Compressed,
    /// `.ros`: BattleScribe roster XML.
    Xml,
    /// `.json`: NewRecruit JSON export.
    Json,
}

const SUPPORTED_EXTENSIONS: [&str; 3] = [".rosz", ".ros", ".json"];

impl RosterFormat {
    pub const ALL: [RosterFormat; 3] = [Self::Compressed, Self::Xml, Self::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Compressed => SUPPORTED_EXTENSIONS[0],
            Self::Xml => SUPPORTED_EXTENSIONS[1],
            Self::Json => SUPPORTED_EXTENSIONS[2],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Compressed => "BattleScribe compressed roster",
            Self::Xml => "BattleScribe roster XML",
            Self::Json => "NewRecruit JSON export",
        }
    }

    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lowered = file_name.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| lowered.ends_with(format.extension()))
    }
}

impl fmt::Display for RosterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

pub fn detect_format(file_name: &str) -> Option<RosterFormat> {
    RosterFormat::from_file_name(file_name)
}

pub fn supported_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Extension as shown in error messages, e.g. `.txt`, or `(none)`.
pub(crate) fn display_extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| "(none)".to_string())
}
