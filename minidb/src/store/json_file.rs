use crate::errors::{MiniDbError, MiniDbResult};
use crate::store::{Collections, StorageProvider};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default number of spaces per indentation level in the database file.
pub const DEFAULT_JSON_INDENT: usize = 2;

/// Layout of the JSON text written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonFormat {
    /// Pretty printed with the given number of spaces per level.
    Pretty { indent: usize },
    /// Single line, no insignificant whitespace.
    Compact,
}

impl Default for JsonFormat {
    fn default() -> Self {
        JsonFormat::Pretty {
            indent: DEFAULT_JSON_INDENT,
        }
    }
}

/// Stores the database as a single JSON file.
///
/// Every save rewrites the whole file. The new content is written to a
/// uniquely named temporary file in the same directory and then renamed over
/// the target, so a failed save leaves the previous file intact.
///
/// The parent directory must exist; it is never created.
pub struct JsonFileStorage {
    path: PathBuf,
    format: JsonFormat,
}

impl JsonFileStorage {
    pub fn new<P: AsRef<Path>>(path: P, format: JsonFormat) -> Self {
        JsonFileStorage {
            path: path.as_ref().to_path_buf(),
            format,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> JsonFormat {
        self.format
    }

    fn write_atomically(&self, content: &str) -> MiniDbResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // the temp file is removed on drop if it is not persisted
        let result = NamedTempFile::new_in(dir)
            .and_then(|mut file| {
                file.write_all(content.as_bytes())?;
                file.as_file().sync_all()?;
                Ok(file)
            })
            .and_then(|file| file.persist(&self.path).map_err(|err| err.error));

        if let Err(err) = result {
            let cause = MiniDbError::from(err);
            log::error!(
                "Failed to save database to {}: {}",
                self.path.display(),
                cause
            );
            return Err(MiniDbError::new_with_cause(
                &format!("Failed to save database to {}", self.path.display()),
                cause.kind().clone(),
                cause,
            ));
        }
        Ok(())
    }
}

impl StorageProvider for JsonFileStorage {
    fn load(&self) -> MiniDbResult<Option<Collections>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No database file at {}", self.path.display());
                return Ok(None);
            }
            Err(err) => {
                let cause = MiniDbError::from(err);
                log::error!(
                    "Failed to read database file {}: {}",
                    self.path.display(),
                    cause
                );
                return Err(MiniDbError::new_with_cause(
                    &format!("Failed to read database file {}", self.path.display()),
                    cause.kind().clone(),
                    cause,
                ));
            }
        };

        let text = String::from_utf8(bytes)?;
        let collections = Collections::from_json(&text).map_err(|cause| {
            MiniDbError::new_with_cause(
                &format!("Database file {} is corrupted", self.path.display()),
                cause.kind().clone(),
                cause,
            )
        })?;

        log::debug!(
            "Loaded {} collections ({} records) from {}",
            collections.len(),
            collections.record_count(),
            self.path.display()
        );
        Ok(Some(collections))
    }

    fn save(&self, collections: &Collections) -> MiniDbResult<()> {
        let indent = match self.format {
            JsonFormat::Pretty { indent } => Some(indent),
            JsonFormat::Compact => None,
        };
        let content = collections.to_json(indent)?;
        self.write_atomically(&content)?;

        log::debug!(
            "Saved {} collections ({} bytes) to {}",
            collections.len(),
            content.len(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
