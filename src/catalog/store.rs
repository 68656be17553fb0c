use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::record::{is_known_column, CatalogRecord, BASE_COLUMNS, USER_COLUMNS};
use crate::error::CatalogError;

/// Catalog shared between sessions. Queries take the read lock and copy a
/// snapshot; rating submission holds the write lock for the whole
/// read-modify-write.
pub type SharedCatalog = Arc<RwLock<Catalog>>;

/// CSV-backed beer table.
#[derive(Debug, Clone)]
pub struct Catalog {
    path: PathBuf,
    records: Vec<CatalogRecord>,
    /// Header row in file order, including columns the catalog only carries.
    columns: Vec<String>,
    /// Set once `User Rating`/`User Comment` exist in the table.
    user_columns: bool,
}

impl Catalog {
    pub fn new(path: PathBuf, records: Vec<CatalogRecord>) -> Self {
        let user_columns = records
            .iter()
            .any(|r| r.user_rating.is_some() || r.user_comment.is_some());
        let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        if user_columns {
            columns.extend(USER_COLUMNS.iter().map(|c| c.to_string()));
        }
        Self { path, records, columns, user_columns }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let mut reader = csv::Reader::from_path(&path)?;

        let headers = reader.headers()?.clone();
        for column in BASE_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(CatalogError::MissingColumn(column));
            }
        }
        let user_columns = headers.iter().any(|h| h == USER_COLUMNS[0]);
        let extra_positions: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !is_known_column(h))
            .map(|(i, _)| i)
            .collect();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let mut record: CatalogRecord = row.deserialize(Some(&headers))?;
            record.extras = extra_positions
                .iter()
                .map(|&i| row.get(i).unwrap_or("").to_string())
                .collect();
            records.push(record);
        }
        info!("Loaded {} catalog rows from {}", records.len(), path.display());

        Ok(Self {
            path,
            records,
            columns: headers.iter().map(str::to_string).collect(),
            user_columns,
        })
    }

    pub fn into_shared(self) -> SharedCatalog {
        Arc::new(RwLock::new(self))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Columns carried through rewrites without being interpreted.
    pub fn extra_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| !is_known_column(c))
            .collect()
    }

    /// Owned copy for one query; never aliases the live table.
    pub fn snapshot(&self) -> Vec<CatalogRecord> {
        self.records.clone()
    }

    pub fn has_user_columns(&self) -> bool {
        self.user_columns
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persists `records` as the whole table, then adopts them. On error the
    /// in-memory table and the file on disk are both left as they were.
    pub async fn commit(&mut self, records: Vec<CatalogRecord>) -> Result<(), CatalogError> {
        let user_columns = self.user_columns
            || records
                .iter()
                .any(|r| r.user_rating.is_some() || r.user_comment.is_some());
        let mut columns = self.columns.clone();
        if user_columns {
            for column in USER_COLUMNS {
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }

        let path = self.path.clone();
        let (records, columns) = tokio::task::spawn_blocking(move || {
            write_table(&path, &columns, &records).map(|_| (records, columns))
        })
        .await??;

        self.records = records;
        self.columns = columns;
        self.user_columns = user_columns;
        Ok(())
    }
}

/// Writes the full table to a temporary file next to `path` and renames it
/// into place, keeping the permissions of the file it replaces.
fn write_table(path: &Path, columns: &[String], records: &[CatalogRecord]) -> Result<(), CatalogError> {
    let persist_error = |source: std::io::Error| CatalogError::Persist {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = NamedTempFile::new_in(&dir).map_err(persist_error)?;

    let header: Vec<&str> = columns.iter().map(String::as_str).collect();
    let extras: Vec<&str> = header.iter().copied().filter(|c| !is_known_column(c)).collect();
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        writer.write_record(&header)?;
        for record in records {
            let row: Vec<&str> = header.iter().map(|c| record.cell(c, &extras)).collect();
            writer.write_record(&row)?;
        }
        writer.flush().map_err(persist_error)?;
    }

    match std::fs::metadata(path) {
        Ok(meta) => tmp.as_file().set_permissions(meta.permissions()).map_err(persist_error)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(persist_error(e)),
    }
    tmp.as_file().sync_all().map_err(persist_error)?;
    tmp.persist(path).map_err(|e| persist_error(e.error))?;
    debug!("Rewrote catalog table {} ({} rows)", path.display(), records.len());
    Ok(())
}
