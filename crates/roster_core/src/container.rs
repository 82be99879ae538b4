use std::io::{Cursor, Read};

use zip::ZipArchive;
use zip::result::ZipError;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::format::RosterFormat;

const MAX_PREALLOCATION: u64 = 8 * 1024 * 1024;

/// The XML member pulled out of a `.rosz` archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerRoster {
    pub entry_name: String,
    pub xml: String,
}

/// Opens a `.rosz` archive and returns the first member whose name ends in `.ros`.
pub fn resolve_inner_roster(bytes: &[u8]) -> Result<InnerRoster, CoreError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| container_error("failed to open compressed roster", e))?;

    let mut found = None;
    for index in 0..archive.len() {
        let entry = archive
            .by_index(index)
            .map_err(|e| container_error("failed to read archive entry", e))?;
        if entry.is_file() && is_roster_entry(entry.name()) {
            found = Some((index, entry.name().to_string()));
            break;
        }
    }

    let Some((index, entry_name)) = found else {
        return Err(CoreError::new(
            CoreErrorCode::MissingInnerFile,
            format!(
                "compressed roster contains no {} member ({} entries scanned)",
                RosterFormat::Xml.extension(),
                archive.len()
            ),
        ));
    };
    log::debug!("resolved inner roster entry {entry_name:?} at index {index}");

    let mut entry = archive
        .by_index(index)
        .map_err(|e| container_error("failed to read archive entry", e))?;
    // The declared size comes from the archive and is only a hint.
    let size_hint = usize::try_from(entry.size().min(MAX_PREALLOCATION)).unwrap_or(0);
    let mut raw = Vec::with_capacity(size_hint);
    entry.read_to_end(&mut raw).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Container,
            format!("failed to decompress {entry_name}: {e}"),
        )
    })?;

    let xml = String::from_utf8(raw).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Container,
            format!("{entry_name} is not valid UTF-8: {e}"),
        )
    })?;

    Ok(InnerRoster { entry_name, xml })
}

fn is_roster_entry(name: &str) -> bool {
    RosterFormat::from_file_name(name) == Some(RosterFormat::Xml)
}

fn container_error(context: &str, err: ZipError) -> CoreError {
    CoreError::new(CoreErrorCode::Container, format!("{context}: {err}"))
}
