use std::path::{Path, PathBuf};

use itemgrid_core::AccountId;
use itemgrid_engine::{EngineConfig, EngineError, TableEngine, TableView};
use itemgrid_storage::{SqliteStorage, StorageError};
use tempfile::TempDir;

use crate::FixtureSource;

/// A table engine over fixture data, with a scratch directory for exports
/// and file-backed preference stores.
pub struct TestWorkspace {
    pub account: AccountId,
    pub engine: TableEngine<FixtureSource>,
    dir: TempDir,
}

impl TestWorkspace {
    /// Preferences kept in memory.
    pub fn new(source: FixtureSource) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = SqliteStorage::open_in_memory()?;
        Ok(Self {
            account: AccountId::new(),
            engine: TableEngine::new(source, storage),
            dir: TempDir::new()?,
        })
    }

    /// Preferences kept in `preferences.db` inside the scratch directory.
    pub fn file_backed(source: FixtureSource) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let storage = open_store(dir.path())?;
        Ok(Self {
            account: AccountId::new(),
            engine: TableEngine::new(source, storage),
            dir,
        })
    }

    /// In-memory preferences with a custom engine configuration.
    pub fn with_config(
        source: FixtureSource,
        config: EngineConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = SqliteStorage::open_in_memory()?;
        Ok(Self {
            account: AccountId::new(),
            engine: TableEngine::with_config(source, storage, config),
            dir: TempDir::new()?,
        })
    }

    /// Drops the engine and opens a fresh one on the scratch directory's
    /// preference file. Only meaningful for [`TestWorkspace::file_backed`].
    pub fn reopen(self) -> Result<Self, Box<dyn std::error::Error>> {
        let Self { account, engine, dir } = self;
        let (source, _, config) = engine.into_parts();
        let storage = open_store(dir.path())?;
        Ok(Self {
            account,
            engine: TableEngine::with_config(source, storage, config),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn load(&self, slug: &str) -> Result<TableView, EngineError> {
        self.engine.load_view(self.account, slug)
    }
}

fn open_store(dir: &Path) -> Result<SqliteStorage, StorageError> {
    let path: PathBuf = dir.join("preferences.db");
    SqliteStorage::open(&path.to_string_lossy())
}
