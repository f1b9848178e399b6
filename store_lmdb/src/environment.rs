//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use stakescan_store::{IndexStore, StoreError};
use stakescan_types::ContractFamily;

use crate::integrity::{check_data_dir, check_integrity};
use crate::migration::Migrator;
use crate::unit::LmdbUnit;
use crate::LmdbError;

/// Number of named databases the environment holds.
pub const MAX_DBS: u32 = 8;

/// Default memory map size: 16 GiB of address space.
pub const DEFAULT_MAP_SIZE: usize = 16 * 1024 * 1024 * 1024;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    pub(crate) env: Env,
    /// Raw staking-contract events keyed by [`stakescan_store::EventKey`].
    pub(crate) staking_events_db: Database<Bytes, Bytes>,
    /// Raw token-contract events keyed by [`stakescan_store::EventKey`].
    pub(crate) token_events_db: Database<Bytes, Bytes>,
    /// `address(20)` → `AccountRecord`.
    pub(crate) accounts_db: Database<Bytes, Bytes>,
    /// `address(20)` → `NodeRecord`.
    pub(crate) nodes_db: Database<Bytes, Bytes>,
    /// `account(20) ++ queue_index_be(8)` → `RedemptionRequest`.
    pub(crate) redemptions_db: Database<Bytes, Bytes>,
    /// `height_be(8)` → `Snapshot`.
    pub(crate) snapshots_db: Database<Bytes, Bytes>,
    /// Checkpoints, running totals and the schema version.
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path, migrate it to
    /// the current schema and run the startup integrity check.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        check_data_dir(path).map_err(LmdbError::Heed)?;
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process and path; no
        // other handle to the same files is created while this one lives.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let staking_events_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some("staking_events"))?;
        let token_events_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some("token_events"))?;
        let accounts_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some("accounts"))?;
        let nodes_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("nodes"))?;
        let redemptions_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some("redemptions"))?;
        let snapshots_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some("snapshots"))?;
        let meta_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let store = Self {
            env,
            staking_events_db,
            token_events_db,
            accounts_db,
            nodes_db,
            redemptions_db,
            snapshots_db,
            meta_db,
        };

        Migrator::run(&store)?;

        let report = check_integrity(&store.env)?;
        if report.is_healthy() {
            tracing::info!(
                path = %path.display(),
                databases = report.databases_checked,
                entries = report.total_entries,
                "opened LMDB environment"
            );
        } else {
            for err in &report.errors {
                tracing::error!(error = %err, "LMDB integrity check failed");
            }
        }

        Ok(store)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub(crate) fn events_db(&self, family: ContractFamily) -> Database<Bytes, Bytes> {
        match family {
            ContractFamily::Staking => self.staking_events_db,
            ContractFamily::Token => self.token_events_db,
        }
    }

    /// Stored schema version; 0 for a fresh database.
    pub fn schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization(
                        "schema_version has unexpected byte length".to_string(),
                    )
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_schema_version(&self, version: u32) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
        wtxn.commit()?;
        Ok(())
    }
}

impl IndexStore for LmdbEnvironment {
    type Unit<'a> = LmdbUnit<'a>;

    fn begin_unit(&self) -> Result<LmdbUnit<'_>, StoreError> {
        LmdbUnit::new(self)
    }

    fn clear_derived(&self) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.accounts_db.clear(&mut wtxn).map_err(LmdbError::from)?;
        self.nodes_db.clear(&mut wtxn).map_err(LmdbError::from)?;
        self.redemptions_db
            .clear(&mut wtxn)
            .map_err(LmdbError::from)?;
        self.meta_db
            .delete(&mut wtxn, crate::unit::TOTALS_KEY)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::info!("cleared derived state");
        Ok(())
    }
}
