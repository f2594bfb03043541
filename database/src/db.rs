use crate::errors::{DbError, DbResult};
use parking_lot::RwLock;
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, Snapshot, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const CF_BLOCKS: &str = "blocks";
pub const CF_BLOCK_INDEX: &str = "block_index";
pub const CF_TX_INDEX: &str = "tx_index";
pub const CF_UTXOS: &str = "utxos";
pub const CF_METADATA: &str = "metadata";

pub const COLUMN_FAMILIES: [&str; 5] = [CF_BLOCKS, CF_BLOCK_INDEX, CF_TX_INDEX, CF_UTXOS, CF_METADATA];

/// Raw key/value pairs yielded by [`DbReader::iter`]
pub type DbIterator<'a> = Box<dyn Iterator<Item = DbResult<(Box<[u8]>, Box<[u8]>)>> + 'a>;

/// Read access shared by the live database and its snapshots
pub trait DbReader {
    /// Fails with [`DbError::DatabaseClosed`] once the database was closed
    fn ensure_open(&self) -> DbResult<()>;

    fn get(&self, cf_name: &str, key: &[u8]) -> DbResult<Option<Vec<u8>>>;

    /// Iterates a column family in key order
    fn iter(&self, cf_name: &str) -> DbResult<DbIterator<'_>>;

    fn exists(&self, cf_name: &str, key: &[u8]) -> DbResult<bool> {
        Ok(self.get(cf_name, key)?.is_some())
    }
}

pub struct Database {
    db: Arc<DB>,
    is_closed: Arc<RwLock<bool>>,
    read_only: bool,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(10000);
        opts.set_keep_log_file_num(10);
        opts.set_max_background_jobs(4);
        opts.set_bytes_per_sync(1048576);
        opts.increase_parallelism(4);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);

        let cf_descriptors: Vec<_> =
            COLUMN_FAMILIES.iter().map(|name| ColumnFamilyDescriptor::new(*name, Options::default())).collect();

        let db = DB::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)?;
        info!("opened database at {}", path.as_ref().display());
        Ok(Self { db: Arc::new(db), is_closed: Arc::new(RwLock::new(false)), read_only: false })
    }

    /// Opens an existing database without write access
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let opts = Options::default();
        let db = DB::open_cf_for_read_only(&opts, path.as_ref(), COLUMN_FAMILIES, false)?;
        info!("opened database at {} (read-only)", path.as_ref().display());
        Ok(Self { db: Arc::new(db), is_closed: Arc::new(RwLock::new(false)), read_only: true })
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn check_closed(&self) -> DbResult<()> {
        if *self.is_closed.read() {
            return Err(DbError::DatabaseClosed);
        }
        Ok(())
    }

    fn get_cf_handle(&self, cf_name: &str) -> DbResult<&rocksdb::ColumnFamily> {
        self.db.cf_handle(cf_name).ok_or_else(|| DbError::ColumnFamilyNotFound(cf_name.to_string()))
    }

    pub fn batch(&self) -> WriteBatch {
        WriteBatch::default()
    }

    pub fn put_in_batch(&self, batch: &mut WriteBatch, cf_name: &str, key: &[u8], value: &[u8]) -> DbResult<()> {
        batch.put_cf(self.get_cf_handle(cf_name)?, key, value);
        Ok(())
    }

    pub fn delete_in_batch(&self, batch: &mut WriteBatch, cf_name: &str, key: &[u8]) -> DbResult<()> {
        batch.delete_cf(self.get_cf_handle(cf_name)?, key);
        Ok(())
    }

    /// Atomically applies every write collected in `batch`
    pub fn write_batch(&self, batch: WriteBatch) -> DbResult<()> {
        self.check_closed()?;
        debug!("writing batch of {} operations", batch.len());
        self.db.write(batch)?;
        Ok(())
    }

    /// A point-in-time view. Reads through it ignore later writes.
    pub fn snapshot(&self) -> DbSnapshot<'_> {
        DbSnapshot { db: self, inner: self.db.snapshot() }
    }

    /// Marks the handle closed. Every later read fails, including reads through
    /// snapshots taken before the call.
    pub fn close(&self) {
        *self.is_closed.write() = true;
        info!("database closed");
    }

    pub fn is_closed(&self) -> bool {
        *self.is_closed.read()
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), is_closed: self.is_closed.clone(), read_only: self.read_only }
    }
}

fn guarded<'a, I>(iter: I, is_closed: &'a RwLock<bool>) -> DbIterator<'a>
where
    I: Iterator<Item = Result<(Box<[u8]>, Box<[u8]>), rocksdb::Error>> + 'a,
{
    Box::new(iter.map(move |item| {
        if *is_closed.read() {
            return Err(DbError::DatabaseClosed);
        }
        item.map_err(DbError::from)
    }))
}

impl DbReader for Database {
    fn ensure_open(&self) -> DbResult<()> {
        self.check_closed()
    }

    fn get(&self, cf_name: &str, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        self.check_closed()?;
        let cf = self.get_cf_handle(cf_name)?;
        Ok(self.db.get_cf(cf, key)?)
    }

    fn iter(&self, cf_name: &str) -> DbResult<DbIterator<'_>> {
        self.check_closed()?;
        let cf = self.get_cf_handle(cf_name)?;
        Ok(guarded(self.db.iterator_cf(cf, IteratorMode::Start), &self.is_closed))
    }
}

/// Consistent read view over a [`Database`], released on drop
pub struct DbSnapshot<'a> {
    db: &'a Database,
    inner: Snapshot<'a>,
}

impl DbReader for DbSnapshot<'_> {
    fn ensure_open(&self) -> DbResult<()> {
        self.db.check_closed()
    }

    fn get(&self, cf_name: &str, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        self.db.check_closed()?;
        let cf = self.db.get_cf_handle(cf_name)?;
        Ok(self.inner.get_cf(cf, key)?)
    }

    fn iter(&self, cf_name: &str) -> DbResult<DbIterator<'_>> {
        self.db.check_closed()?;
        let cf = self.db.get_cf_handle(cf_name)?;
        Ok(guarded(self.inner.iterator_cf(cf, IteratorMode::Start), &self.db.is_closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn put(db: &Database, cf: &str, key: &[u8], value: &[u8]) {
        let mut batch = db.batch();
        db.put_in_batch(&mut batch, cf, key, value).unwrap();
        db.write_batch(batch).unwrap();
    }

    #[test]
    fn test_database_open_put_get() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        put(&db, CF_METADATA, b"k", b"v");
        assert_eq!(db.get(CF_METADATA, b"k").unwrap(), Some(b"v".to_vec()));
        assert!(db.exists(CF_METADATA, b"k").unwrap());
    }

    #[test]
    fn test_snapshot_ignores_later_writes() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        put(&db, CF_UTXOS, b"a", b"1");
        let snapshot = db.snapshot();
        put(&db, CF_UTXOS, b"b", b"2");

        assert_eq!(snapshot.get(CF_UTXOS, b"b").unwrap(), None);
        assert_eq!(snapshot.iter(CF_UTXOS).unwrap().count(), 1);
        assert_eq!(db.iter(CF_UTXOS).unwrap().count(), 2);
    }

    #[test]
    fn test_close_fails_outstanding_snapshot() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        put(&db, CF_UTXOS, b"a", b"1");
        put(&db, CF_UTXOS, b"b", b"2");
        let snapshot = db.snapshot();
        let mut iter = snapshot.iter(CF_UTXOS).unwrap();
        assert!(iter.next().unwrap().is_ok());

        db.close();
        assert!(matches!(iter.next(), Some(Err(DbError::DatabaseClosed))));
        assert!(matches!(snapshot.get(CF_UTXOS, b"a"), Err(DbError::DatabaseClosed)));
        assert!(matches!(db.write_batch(db.batch()), Err(DbError::DatabaseClosed)));
    }

    #[test]
    fn test_read_only_open_sees_data() {
        let tmp = TempDir::new().unwrap();
        {
            let db = Database::open(tmp.path()).unwrap();
            put(&db, CF_METADATA, b"network", b"simnet");
        }
        let db = Database::open_read_only(tmp.path()).unwrap();
        assert!(db.is_read_only());
        assert_eq!(db.get(CF_METADATA, b"network").unwrap(), Some(b"simnet".to_vec()));
    }
}
