//! SQLite persistence for document indexes.
//!
//! One file per dataset holding two tables:
//! - `entries`: one row per chunk with its embedding as little-endian f32
//! - `meta`: key/value manifest describing how the index was built
//!
//! Writes go to a uniquely named temporary file next to the target and are
//! renamed into place, so readers never observe a half-written index.

use super::{IndexEntry, IndexManifest};
use crate::chunk::ContentBucket;
use chrono::{DateTime, Utc};
use docchat_core::{AppError, AppResult};
use rusqlite::{params, Connection, OpenFlags};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const SCHEMA: &str = r#"
    CREATE TABLE entries (
        id TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        position INTEGER NOT NULL,
        class TEXT NOT NULL,
        text TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );
"#;

/// Write an index atomically to `path`.
pub fn write_index(path: &Path, manifest: &IndexManifest, entries: &[IndexEntry]) -> AppResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| AppError::Knowledge(format!("Invalid index path: {:?}", path)))?;
    fs::create_dir_all(parent)
        .map_err(|e| AppError::Knowledge(format!("Failed to create index directory: {}", e)))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "index.sqlite".to_string());
    let tmp_path = parent.join(format!("{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    if let Err(e) = write_database(&tmp_path, manifest, entries) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        AppError::Knowledge(format!("Failed to move index into place at {:?}: {}", path, e))
    })?;

    tracing::debug!("Wrote {} entries to {:?}", entries.len(), path);
    Ok(())
}

fn write_database(path: &Path, manifest: &IndexManifest, entries: &[IndexEntry]) -> AppResult<()> {
    let mut conn = Connection::open(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(SCHEMA)
        .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

    let tx = conn
        .transaction()
        .map_err(|e| AppError::Knowledge(format!("Failed to start transaction: {}", e)))?;
    {
        let mut insert_entry = tx
            .prepare(
                "INSERT INTO entries (id, source, position, class, text, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

        for entry in entries {
            insert_entry
                .execute(params![
                    entry.id,
                    entry.source,
                    entry.position as i64,
                    entry.bucket.as_str(),
                    entry.text,
                    embedding_to_bytes(&entry.embedding),
                ])
                .map_err(|e| AppError::Knowledge(format!("Failed to insert entry: {}", e)))?;
        }

        let mut insert_meta = tx
            .prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

        for (key, value) in manifest_pairs(manifest) {
            insert_meta
                .execute(params![key, value])
                .map_err(|e| AppError::Knowledge(format!("Failed to write meta '{}': {}", key, e)))?;
        }
    }
    tx.commit()
        .map_err(|e| AppError::Knowledge(format!("Failed to commit index: {}", e)))?;

    Ok(())
}

fn manifest_pairs(manifest: &IndexManifest) -> Vec<(&'static str, String)> {
    vec![
        ("format_version", manifest.format_version.to_string()),
        ("dataset", manifest.dataset.clone()),
        ("embedding_provider", manifest.embedding_provider.clone()),
        ("embedding_model", manifest.embedding_model.clone()),
        ("dimensions", manifest.dimensions.to_string()),
        ("entry_count", manifest.entry_count.to_string()),
        ("built_at", manifest.built_at.to_rfc3339()),
    ]
}

/// Read a persisted index. Any failure means the file is unusable.
pub fn read_index(path: &Path) -> AppResult<(IndexManifest, Vec<IndexEntry>)> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

    let manifest = read_manifest(&conn)?;

    let mut stmt = conn
        .prepare("SELECT id, source, position, class, text, embedding FROM entries ORDER BY rowid")
        .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Vec<u8>>(5)?,
            ))
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to query entries: {}", e)))?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, source, position, class, text, blob) =
            row.map_err(|e| AppError::Knowledge(format!("Failed to read entry: {}", e)))?;

        let bucket = ContentBucket::parse(&class)
            .ok_or_else(|| AppError::Knowledge(format!("Unknown content class '{}'", class)))?;

        entries.push(IndexEntry {
            id,
            source,
            position: position as u32,
            bucket,
            text,
            embedding: bytes_to_embedding(&blob)?,
        });
    }

    Ok((manifest, entries))
}

fn read_manifest(conn: &Connection) -> AppResult<IndexManifest> {
    let mut stmt = conn
        .prepare("SELECT key, value FROM meta")
        .map_err(|e| AppError::Knowledge(format!("Failed to read meta: {}", e)))?;
    let meta: HashMap<String, String> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .map_err(|e| AppError::Knowledge(format!("Failed to read meta: {}", e)))?
        .collect::<Result<_, _>>()
        .map_err(|e| AppError::Knowledge(format!("Failed to read meta: {}", e)))?;

    let get = |key: &str| {
        meta.get(key)
            .cloned()
            .ok_or_else(|| AppError::Knowledge(format!("Index meta is missing '{}'", key)))
    };
    let number = |key: &str| -> AppResult<usize> {
        get(key)?
            .parse()
            .map_err(|_| AppError::Knowledge(format!("Index meta '{}' is not a number", key)))
    };

    let built_at = DateTime::parse_from_rfc3339(&get("built_at")?)
        .map_err(|e| AppError::Knowledge(format!("Invalid built_at in index meta: {}", e)))?
        .with_timezone(&Utc);

    Ok(IndexManifest {
        format_version: number("format_version")? as u32,
        dataset: get("dataset")?,
        embedding_provider: get("embedding_provider")?,
        embedding_model: get("embedding_model")?,
        dimensions: number("dimensions")?,
        entry_count: number("entry_count")?,
        built_at,
    })
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FORMAT_VERSION;
    use tempfile::TempDir;

    fn manifest(entry_count: usize) -> IndexManifest {
        IndexManifest {
            format_version: FORMAT_VERSION,
            dataset: "commerce-webapi".to_string(),
            embedding_provider: "trigram".to_string(),
            embedding_model: "trigram-v1".to_string(),
            dimensions: 3,
            entry_count,
            built_at: Utc::now(),
        }
    }

    fn entry(id: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            source: "commerce-webapi/guides/install.md".to_string(),
            position: 0,
            bucket: ContentBucket::Markdown,
            text: "Run the installer".to_string(),
            embedding,
        }
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("embeddings/commerce-webapi/index.sqlite");

        let entries = vec![entry("a", vec![1.0, 0.0, -0.5]), entry("b", vec![0.25, 0.5, 0.75])];
        write_index(&path, &manifest(2), &entries).unwrap();

        let (read_manifest, read_entries) = read_index(&path).unwrap();
        assert_eq!(read_manifest.entry_count, 2);
        assert_eq!(read_manifest.embedding_model, "trigram-v1");
        assert_eq!(read_entries.len(), 2);
        assert_eq!(read_entries[0].id, "a");
        assert_eq!(read_entries[1].embedding, vec![0.25, 0.5, 0.75]);
        assert_eq!(read_entries[0].bucket, ContentBucket::Markdown);
    }

    #[test]
    fn test_no_temp_files_left() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        write_index(&path, &manifest(0), &[]).unwrap();

        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["index.sqlite".to_string()]);
    }

    #[test]
    fn test_overwrite_replaces() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        write_index(&path, &manifest(1), &[entry("a", vec![1.0, 0.0, 0.0])]).unwrap();
        write_index(&path, &manifest(0), &[]).unwrap();

        let (m, entries) = read_index(&path).unwrap();
        assert_eq!(m.entry_count, 0);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_garbage_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.sqlite");
        fs::write(&path, b"definitely not sqlite, just some bytes padded out a bit").unwrap();
        assert!(read_index(&path).is_err());
    }

    #[test]
    fn test_bytes_roundtrip_rejects_ragged() {
        assert!(bytes_to_embedding(&[0, 0, 128]).is_err());
        let bytes = embedding_to_bytes(&[1.5, -2.0]);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), vec![1.5, -2.0]);
    }
}
