//! # Configuration
//!
//! Settings are loaded with [`confique`], in priority order:
//!
//! 1. **Environment variables**: `LUMANOTES_DATA_FILE`,
//!    `LUMANOTES_TOUCH_ON_TRANSITION`, `LUMANOTES_PRETTY_JSON`.
//! 2. **Config file**: an optional `lumanotes.toml` passed to [`NotesConfig::load`].
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_file` | platform data dir | JSON file backing the store |
//! | `touch_on_transition` | `false` | Re-stamp notes on pin, trash and restore |
//! | `pretty_json` | `true` | Indent the store file |

use crate::error::Result;
use crate::events::EventBus;
use crate::repository::{NoteRepository, RepositoryOptions};
use crate::store::file::FileStore;
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const DATA_FILE_NAME: &str = "notes.json";

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NotesConfig {
    /// Where notes are stored. When absent, `notes.json` in the platform's
    /// data directory for lumanotes.
    #[config(env = "LUMANOTES_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Re-stamp `last_modified` on pin, trash and restore, not just on save.
    #[config(env = "LUMANOTES_TOUCH_ON_TRANSITION", default = false)]
    pub touch_on_transition: bool,

    /// Write the store file indented.
    #[config(env = "LUMANOTES_PRETTY_JSON", default = true)]
    pub pretty_json: bool,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            touch_on_transition: false,
            pretty_json: true,
        }
    }
}

impl NotesConfig {
    /// Environment over `file` over defaults. A missing file is skipped.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(file) = file {
            builder = builder.file(file);
        }
        Ok(builder.load()?)
    }

    pub fn data_file(&self) -> PathBuf {
        if let Some(path) = &self.data_file {
            return path.clone();
        }
        match ProjectDirs::from("", "", "lumanotes") {
            Some(dirs) => dirs.data_dir().join(DATA_FILE_NAME),
            None => {
                log::warn!("no home directory; storing notes in the working directory");
                PathBuf::from(DATA_FILE_NAME)
            }
        }
    }

    pub fn repository_options(&self) -> RepositoryOptions {
        RepositoryOptions {
            touch_on_transition: self.touch_on_transition,
        }
    }

    pub async fn open_store(&self) -> Result<FileStore> {
        let store = FileStore::open(self.data_file()).await?;
        Ok(store.with_pretty_json(self.pretty_json))
    }

    /// A repository over the configured store, publishing on `bus`.
    pub async fn open_repository(&self, bus: Rc<EventBus>) -> Result<NoteRepository<FileStore>> {
        let store = self.open_store().await?;
        log::debug!("opening notes at {}", store.path().display());
        Ok(NoteRepository::new(store, bus).with_options(self.repository_options()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// File layer only, so tests are not affected by the caller's environment.
    fn from_file(path: &Path) -> NotesConfig {
        NotesConfig::builder().file(path).load().unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = NotesConfig::default();
        assert_eq!(config.data_file, None);
        assert!(!config.touch_on_transition);
        assert!(config.pretty_json);
        assert!(!config.repository_options().touch_on_transition);
    }

    #[test]
    fn test_default_data_file_is_named_notes_json() {
        let path = NotesConfig::default().data_file();
        assert_eq!(path.file_name().unwrap(), DATA_FILE_NAME);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = from_file(&dir.path().join("absent.toml"));
        assert_eq!(config, NotesConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lumanotes.toml");
        let expected = NotesConfig {
            data_file: Some(dir.path().join("mine.json")),
            touch_on_transition: true,
            pretty_json: false,
        };
        std::fs::write(&path, toml::to_string(&expected).unwrap()).unwrap();

        let config = from_file(&path);
        assert_eq!(config, expected);
        assert_eq!(config.data_file(), dir.path().join("mine.json"));
        assert!(config.repository_options().touch_on_transition);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lumanotes.toml");
        std::fs::write(&path, "pretty_json = \"sometimes\"").unwrap();

        let err = NotesConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, crate::error::NotesError::Config(_)));
    }

    #[tokio::test]
    async fn test_open_repository_uses_configured_file() {
        let dir = TempDir::new().unwrap();
        let config = NotesConfig {
            data_file: Some(dir.path().join("notes.json")),
            pretty_json: false,
            ..Default::default()
        };

        let repo = config
            .open_repository(Rc::new(EventBus::new()))
            .await
            .unwrap();
        let note = repo.create().await.unwrap();
        assert!(dir.path().join("notes.json").exists());

        let reopened = config.open_store().await.unwrap();
        let again = NoteRepository::new(reopened, Rc::new(EventBus::new()));
        assert_eq!(again.load(&note.id).await.unwrap().title, "Untitled");
    }
}
