use std::fs;
use std::path::Path;

use crate::container;
use crate::extract;
use crate::format::{RosterFormat, detect_format, display_extension};
use crate::roster::Roster;
use crate::schema::{self, SourceDocument};
use crate::xml;

use super::error::{CoreError, CoreErrorCode};
use super::types::ParseResult;

/// Stateless entry point for decoding army list exports.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decoder;

impl Decoder {
    pub fn new() -> Self {
        Self
    }

    /// Detects the format from `file_name` and decodes `bytes` with it.
    ///
    /// Unsupported names fail before the bytes are looked at.
    pub fn decode<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        file_name: &str,
    ) -> Result<ParseResult, CoreError> {
        let format = detect_or_reject(file_name)?;
        log::debug!("decoding {file_name:?} as {format:?}");
        self.decode_as(bytes, format)
    }

    /// Decodes `bytes` as `format`, skipping detection (e.g. pasted text).
    pub fn decode_as<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        format: RosterFormat,
    ) -> Result<ParseResult, CoreError> {
        let roster = self.read_roster(bytes, format)?;
        extract::extract(&roster, format)
    }

    /// Reads a file from disk. The name is checked before any I/O happens.
    pub fn decode_file(&self, path: &Path) -> Result<ParseResult, CoreError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let format = detect_or_reject(&file_name)?;

        let bytes = fs::read(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        log::debug!("read {} bytes from {}", bytes.len(), path.display());
        self.decode_as(bytes, format)
    }

    /// Runs the pipeline up to schema unification and returns the canonical roster.
    pub fn read_roster<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        format: RosterFormat,
    ) -> Result<Roster, CoreError> {
        load_document(bytes.as_ref(), format)?.into_roster()
    }
}

pub fn decode<B: AsRef<[u8]>>(bytes: B, file_name: &str) -> Result<ParseResult, CoreError> {
    Decoder::new().decode(bytes, file_name)
}

fn detect_or_reject(file_name: &str) -> Result<RosterFormat, CoreError> {
    detect_format(file_name).ok_or_else(|| {
        CoreError::new(
            CoreErrorCode::UnsupportedFormat,
            format!(
                "unsupported file extension {} for {file_name:?}; expected one of .rosz, .ros, .json",
                display_extension(file_name)
            ),
        )
    })
}

fn load_document(bytes: &[u8], format: RosterFormat) -> Result<SourceDocument, CoreError> {
    match format {
        RosterFormat::Compressed => {
            let inner = container::resolve_inner_roster(bytes)?;
            xml::parse_roster_xml(&inner.xml).map(SourceDocument::Xml)
        }
        RosterFormat::Xml => {
            let text = std::str::from_utf8(bytes).map_err(|e| {
                CoreError::new(
                    CoreErrorCode::XmlSyntax,
                    format!("roster XML is not valid UTF-8: {e}"),
                )
            })?;
            xml::parse_roster_xml(text).map(SourceDocument::Xml)
        }
        RosterFormat::Json => schema::parse_json_document(bytes).map(SourceDocument::Json),
    }
}
