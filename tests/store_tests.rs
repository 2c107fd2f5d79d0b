//! Persisted-document access tests.

use lensgraph::store::{MetadataStore, LOAD_CONCURRENCY};
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    fn write_doc(root: &Path, relative: &str, timestamp: Option<&str>) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut doc = json!({
            "filename": Path::new(relative).with_extension("png").file_name().unwrap().to_string_lossy(),
            "players": [{"id": "usr_a", "displayName": "A"}]
        });
        if let Some(ts) = timestamp {
            doc["timestamp"] = json!(ts);
        }
        fs::write(path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
    }

    #[test]
    fn test_lists_json_documents_recursively() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "2024/01/a.json", Some("2024-01-02T00:00:00.000Z"));
        write_doc(dir.path(), "b.json", Some("2024-02-02T00:00:00.000Z"));
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let store = MetadataStore::new(dir.path());
        assert_eq!(
            store.list_documents().unwrap(),
            vec!["2024/01/a.json".to_string(), "b.json".to_string()]
        );
    }

    #[test]
    fn test_read_document() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "nested/x.json", Some("2024-01-02T00:00:00.000Z"));

        let store = MetadataStore::new(dir.path());
        let record = store.read_document("nested/x.json").unwrap();
        assert_eq!(record.filename.as_deref(), Some("x.png"));
        assert_eq!(record.participants().unwrap()[0].id, "usr_a");
        assert!(store.read_document("../outside.json").is_err());
        assert_eq!(store.read_document("missing.json").unwrap_err().kind(), "IoError");
    }

    #[test]
    fn test_load_all_skips_broken_documents() {
        let dir = TempDir::new().unwrap();
        let mut files = Vec::new();
        for i in 0..(LOAD_CONCURRENCY * 3 + 2) {
            let rel = format!("d{}/doc{}.json", i % 3, i);
            write_doc(dir.path(), &rel, Some("2024-01-02T00:00:00.000Z"));
            files.push(rel);
        }
        fs::write(dir.path().join("broken.json"), "{ nope").unwrap();
        files.push("broken.json".to_string());
        files.push("vanished.json".to_string());

        let store = MetadataStore::new(dir.path());
        let records = store.load_all(&files);
        assert_eq!(records.len(), LOAD_CONCURRENCY * 3 + 2);
    }

    #[test]
    fn test_date_range_over_timestamps() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "a.json", Some("2023-11-30T23:00:00.000Z"));
        write_doc(dir.path(), "b.json", Some("2024-04-01T00:00:00.000Z"));
        write_doc(dir.path(), "c.json", Some("2024-01-15T12:00:00.000Z"));
        write_doc(dir.path(), "undated.json", None);

        let range = MetadataStore::new(dir.path()).date_range().unwrap();
        assert!(range.exists);
        assert_eq!(range.has_files, Some(true));
        assert_eq!(range.has_valid_dates, Some(true));
        assert_eq!(range.start.as_deref(), Some("2023-11"));
        assert_eq!(range.end.as_deref(), Some("2024-04"));
    }

    #[test]
    fn test_date_range_states() {
        let dir = TempDir::new().unwrap();
        let store = MetadataStore::new(dir.path());
        let empty = store.date_range().unwrap();
        assert_eq!(empty.has_files, Some(false));

        write_doc(dir.path(), "undated.json", None);
        let undated = store.date_range().unwrap();
        assert_eq!(undated.has_valid_dates, Some(false));
        assert_eq!(undated.start, None);

        let value = serde_json::to_value(&undated).unwrap();
        assert_eq!(value["hasValidDates"], false);
    }

    #[test]
    fn test_filter_by_months_is_inclusive() {
        let dir = TempDir::new().unwrap();
        write_doc(dir.path(), "dec.json", Some("2023-12-31T23:59:59.000Z"));
        write_doc(dir.path(), "jan.json", Some("2024-01-01T00:00:00.000Z"));
        write_doc(dir.path(), "feb.json", Some("2024-02-29T10:00:00.000Z"));
        write_doc(dir.path(), "mar.json", Some("2024-03-01T00:00:00.000Z"));

        let store = MetadataStore::new(dir.path());
        let matched = store.filter_by_months("2024-01", "2024-02").unwrap();
        assert_eq!(matched, vec!["feb.json".to_string(), "jan.json".to_string()]);
    }
}
