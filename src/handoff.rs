//! Selected-text hand-off between the viewer and the quiz page.
//!
//! Holds a single, most recent selection. The file-backed slot survives a
//! restart so `pdfmentor quiz` can pick up what the viewer stored.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::APP_NAME;

const HANDOFF_FILENAME: &str = "handoff.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionHandoff {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("hand-off I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("hand-off record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug)]
enum Backing {
    File(PathBuf),
    Memory(Option<SelectionHandoff>),
}

#[derive(Debug)]
pub struct HandoffSlot {
    backing: Backing,
}

impl HandoffSlot {
    /// In-memory slot that never touches disk
    pub fn ephemeral() -> Self {
        Self {
            backing: Backing::Memory(None),
        }
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            backing: Backing::File(path.into()),
        }
    }

    /// Slot under the user's data directory, or in memory if there is none
    pub fn default_location() -> Self {
        match dirs::data_local_dir() {
            Some(dir) => Self::with_file(dir.join(APP_NAME).join(HANDOFF_FILENAME)),
            None => {
                log::warn!("No data directory; quiz hand-off will not survive a restart");
                Self::ephemeral()
            }
        }
    }

    /// Overwrite the slot with a new selection
    pub fn store(&mut self, text: &str) -> Result<(), HandoffError> {
        let record = SelectionHandoff {
            text: text.to_string(),
            created_at: Utc::now(),
        };
        match &mut self.backing {
            Backing::Memory(slot) => {
                *slot = Some(record);
                Ok(())
            }
            Backing::File(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, serde_json::to_string_pretty(&record)?)?;
                Ok(())
            }
        }
    }

    /// Read without consuming
    pub fn peek(&self) -> Result<Option<SelectionHandoff>, HandoffError> {
        match &self.backing {
            Backing::Memory(slot) => Ok(slot.clone()),
            Backing::File(path) => read_record(path),
        }
    }

    /// Read and clear the slot
    pub fn take(&mut self) -> Result<Option<SelectionHandoff>, HandoffError> {
        match &mut self.backing {
            Backing::Memory(slot) => Ok(slot.take()),
            Backing::File(path) => {
                let record = read_record(path);
                if path.exists() {
                    fs::remove_file(&*path)?;
                }
                record
            }
        }
    }
}

fn read_record(path: &Path) -> Result<Option<SelectionHandoff>, HandoffError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_take_is_read_once() {
        let mut slot = HandoffSlot::ephemeral();
        slot.store("first").unwrap();
        slot.store("second").unwrap();

        assert_eq!(slot.peek().unwrap().unwrap().text, "second");
        assert_eq!(slot.take().unwrap().unwrap().text, "second");
        assert!(slot.take().unwrap().is_none());
    }

    #[test]
    fn file_slot_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app").join("handoff.json");

        HandoffSlot::with_file(&path).store("photosynthesis").unwrap();

        let mut reopened = HandoffSlot::with_file(&path);
        assert_eq!(reopened.take().unwrap().unwrap().text, "photosynthesis");
        assert!(!path.exists());
        assert!(reopened.take().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error_and_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handoff.json");
        fs::write(&path, "{ not json").unwrap();

        let mut slot = HandoffSlot::with_file(&path);
        assert!(matches!(slot.take(), Err(HandoffError::Corrupt(_))));
        assert!(slot.take().unwrap().is_none());
    }
}
