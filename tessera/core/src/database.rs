use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tessera_catalog::{Catalog, FileVersionType};
use tessera_storage::StorageManager;
use tessera_storage::wal::{ReplayMode, Wal, WalReplayer};
use tessera_transaction::DummyTransaction;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::session::Session;
use crate::transaction_manager::TransactionManager;

/// State shared by every session of a database.
pub struct DatabaseContext {
    directory: PathBuf,
    catalog: Arc<Catalog>,
    storage: Arc<StorageManager>,
    wal: Arc<Wal>,
    transaction_manager: Arc<TransactionManager>,
}

impl DatabaseContext {
    #[inline]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[inline]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[inline]
    pub fn storage(&self) -> &Arc<StorageManager> {
        &self.storage
    }

    #[inline]
    pub fn wal(&self) -> &Wal {
        &self.wal
    }

    #[inline]
    pub fn transaction_manager(&self) -> &Arc<TransactionManager> {
        &self.transaction_manager
    }
}

pub struct Database {
    context: Arc<DatabaseContext>,
}

impl Database {
    /// Opens the database stored under `path`, creating it if the directory is empty.
    ///
    /// Recovery loads the storage snapshot, replays the committed transactions of the WAL
    /// (which also installs the catalog snapshot of the last committed schema change), then
    /// loads the catalog. If anything was replayed, a fresh storage snapshot is written and
    /// the WAL is cleared.
    pub fn open<P: AsRef<Path>>(path: P, config: &DatabaseConfig) -> Result<Self> {
        let directory = path.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;

        let wal = Arc::new(Wal::open_in(&directory)?);
        let storage = Arc::new(StorageManager::load_snapshot(
            &directory,
            config.enable_compression,
        )?);
        let entries = wal.read_all()?;
        let replayed = !entries.is_empty();
        if replayed {
            let replayer =
                WalReplayer::new(&storage, Some(directory.as_path()), ReplayMode::Recovery);
            let outcome = replayer.replay(entries)?;
            info!(
                committed = outcome.committed,
                discarded = outcome.discarded,
                "recovered from WAL"
            );
        } else {
            Catalog::discard_wal_version_file(&directory)?;
        }

        let bootstrap = !FileVersionType::Original.path_in(&directory).exists();
        let catalog = if bootstrap {
            Catalog::new()
        } else {
            Catalog::load_from_file(&directory, FileVersionType::Original)?
        };
        let catalog = Arc::new(catalog.with_wal(wal.clone()).with_directory(&directory));
        if bootstrap {
            catalog.save_to_file(
                &directory,
                FileVersionType::Original,
                &DummyTransaction::read(),
            )?;
            info!(path = %directory.display(), "database created");
        }

        storage.ensure_tables(&catalog, &DummyTransaction::read());
        if replayed {
            storage.save_snapshot(&directory)?;
            wal.clear()?;
        }

        let transaction_manager = Arc::new(TransactionManager::new(
            catalog.clone(),
            storage.clone(),
            wal.clone(),
            directory.clone(),
            config.clone(),
        ));
        info!(path = %directory.display(), "database opened");
        Ok(Self {
            context: Arc::new(DatabaseContext {
                directory,
                catalog,
                storage,
                wal,
                transaction_manager,
            }),
        })
    }

    pub fn session(&self) -> Session {
        Session::new(self.context.clone())
    }

    /// Folds every committed transaction into the snapshots.
    ///
    /// Waits for active transactions to leave, up to the checkpoint wait timeout.
    pub fn checkpoint(&self) -> Result<()> {
        self.context.transaction_manager.checkpoint()
    }

    #[inline]
    pub fn context(&self) -> &Arc<DatabaseContext> {
        &self.context
    }
}
