use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    #[error("Database is closed")]
    DatabaseClosed,
}

pub type DbResult<T> = Result<T, DbError>;

impl From<bincode::Error> for DbError {
    fn from(err: bincode::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

impl DbError {
    /// True for errors caused by undecodable stored bytes rather than by the store itself
    pub fn is_decode_error(&self) -> bool {
        matches!(self, DbError::Serialization(_) | DbError::InvalidData(_))
    }
}
