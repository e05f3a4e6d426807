//! Blob Store (spec §4.G): content-addressed storage of original file
//! bytes, laid out `{root}/{tenant_id}/{YYYY}/{MM}/{file_id}.{ext}` the way
//! the corpus's attachment store shards by digest prefix.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Utc};
use doc_model::{FileId, TenantId};
use sha2::Digest;

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("blob not found: tenant={tenant}, file_id={file_id}")]
    NotFound { tenant: String, file_id: String },
    #[error("refused to read blob belonging to another tenant")]
    TenantMismatch,
}

#[derive(Debug, Clone)]
pub struct BlobStats {
    pub count: u64,
    pub total_bytes: u64,
}

/// Root-relative layout for one tenant's blobs. `file_id` is derived from
/// the content digest, never from the user-supplied filename, so it cannot
/// be used for path traversal (spec §4.G).
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn tenant_dir(&self, tenant: &TenantId) -> PathBuf {
        self.root.join(sanitize_tenant(tenant.as_str()))
    }

    /// Resolves the on-disk path for a stored blob, so callers that need to
    /// hand a real file path to something like a PDF reader don't have to
    /// round-trip the bytes through `get`.
    pub fn blob_path(&self, tenant: &TenantId, file_id: &FileId, ext: &str) -> PathBuf {
        // file_id encodes the YYYY/MM it was written under as its first two
        // path segments so a get() never needs a directory scan.
        let mut parts = file_id.as_str().splitn(3, '/');
        let year = parts.next().unwrap_or("0000");
        let month = parts.next().unwrap_or("00");
        let name = parts.next().unwrap_or(file_id.as_str());
        self.tenant_dir(tenant)
            .join(year)
            .join(month)
            .join(format!("{name}.{ext}"))
    }

    /// Writes `bytes` under this tenant, returning the generated `file_id`.
    /// The id is `{sha256-hex}` prefixed with the current `YYYY/MM` so the
    /// path can be reconstructed without scanning the tree.
    pub fn put(&self, tenant: &TenantId, bytes: &[u8], ext: &str) -> Result<FileId, BlobStoreError> {
        let digest = sha256_hex(bytes);
        let now = Utc::now();
        let file_id = FileId::from(format!("{:04}/{:02}/{}", now.year(), now.month(), digest));
        let path = self.blob_path(tenant, &file_id, ext);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if !path.exists() {
            fs::write(&path, bytes)?;
        }
        Ok(file_id)
    }

    pub fn get(&self, tenant: &TenantId, file_id: &FileId, ext: &str) -> Result<Vec<u8>, BlobStoreError> {
        let path = self.blob_path(tenant, file_id, ext);
        fs::read(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                BlobStoreError::NotFound {
                    tenant: tenant.as_str().to_string(),
                    file_id: file_id.as_str().to_string(),
                }
            } else {
                BlobStoreError::Io(e)
            }
        })
    }

    /// Deletes a blob. A missing file is logged and treated as success
    /// (spec §4.G "Deletes are best-effort").
    pub fn delete(&self, tenant: &TenantId, file_id: &FileId, ext: &str) {
        let path = self.blob_path(tenant, file_id, ext);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!(tenant_id = tenant.as_str(), file_id = file_id.as_str(), error = %err, "blob delete failed");
            }
        }
    }

    pub fn stats(&self, tenant: &TenantId) -> Result<BlobStats, BlobStoreError> {
        let mut count = 0u64;
        let mut total_bytes = 0u64;
        walk_sum(&self.tenant_dir(tenant), &mut count, &mut total_bytes)?;
        Ok(BlobStats { count, total_bytes })
    }
}

fn walk_sum(dir: &Path, count: &mut u64, total_bytes: &mut u64) -> Result<(), BlobStoreError> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            walk_sum(&path, count, total_bytes)?;
        } else {
            *count += 1;
            *total_bytes += entry.metadata()?.len();
        }
    }
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn sanitize_tenant(tenant: &str) -> String {
    tenant
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let tenant = TenantId::from("acme");
        let file_id = store.put(&tenant, b"hello world", "txt").unwrap();
        let bytes = store.get(&tenant, &file_id, "txt").unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[test]
    fn identical_bytes_reuse_the_same_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let tenant = TenantId::from("acme");
        let id1 = store.put(&tenant, b"same", "txt").unwrap();
        let id2 = store.put(&tenant, b"same", "txt").unwrap();
        assert_eq!(id1.as_str(), id2.as_str());
    }

    #[test]
    fn delete_of_missing_blob_does_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let tenant = TenantId::from("acme");
        store.delete(&tenant, &FileId::from("2026/01/doesnotexist"), "txt");
    }

    #[test]
    fn stats_counts_bytes_across_months() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let tenant = TenantId::from("acme");
        store.put(&tenant, b"aaa", "txt").unwrap();
        store.put(&tenant, b"bbbb", "txt").unwrap();
        let stats = store.stats(&tenant).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_bytes, 7);
    }
}
