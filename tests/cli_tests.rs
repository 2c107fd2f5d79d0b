//! Integration tests for CLI wiring.
//!
//! These tests validate that the CLI is a thin adapter over existing APIs
//! with JSON output and proper exit codes.

mod common;

#[cfg(test)]
mod tests {
    use super::common::{player, world_metadata, write_screenshot, PngBuilder};
    use serde_json::Value;
    use std::path::Path;
    use std::process::{Command, Output};
    use tempfile::TempDir;

    fn lensgraph(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_lensgraph"))
            .args(args)
            .output()
            .expect("Failed to run lensgraph binary")
    }

    fn path_str(path: &Path) -> &str {
        path.to_str().expect("utf-8 temp path")
    }

    /// Captures are dated in the future so the decayed weight stays above
    /// the edge threshold whenever the test runs.
    fn populate(images: &Path) {
        let group = [player("usr_a", "Alice"), player("usr_b", "Bob")];
        for day in 1..=3 {
            let name = format!("VRChat_2099-01-{:02}_20-00-00.000_1920x1080.png", day);
            write_screenshot(&images.join("world").join(name), &world_metadata(&group));
        }
    }

    #[test]
    fn test_cli_generate_streams_events() {
        let workspace = TempDir::new().unwrap();
        let images = workspace.path().join("images");
        let metadata = workspace.path().join("metadata");
        populate(&images);

        let output = lensgraph(&[
            "generate",
            "--images",
            path_str(&images),
            "--metadata",
            path_str(&metadata),
        ]);
        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

        let stdout = String::from_utf8(output.stdout).unwrap();
        let events: Vec<Value> = stdout
            .lines()
            .map(|line| serde_json::from_str(line).expect("each line is JSON"))
            .collect();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0]["type"], "start");
        assert_eq!(events[0]["total"], 3);
        assert_eq!(events[3]["current"], 3);
        assert_eq!(events[4]["type"], "complete");
        assert_eq!(events[4]["successful"], 3);
        assert_eq!(events[4]["failed"], 0);
    }

    #[test]
    fn test_cli_graph_after_generate() {
        let workspace = TempDir::new().unwrap();
        let images = workspace.path().join("images");
        let metadata = workspace.path().join("metadata");
        populate(&images);

        let generate = lensgraph(&[
            "generate",
            "--images",
            path_str(&images),
            "--metadata",
            path_str(&metadata),
        ]);
        assert!(generate.status.success());

        let output = lensgraph(&["graph", "--metadata", path_str(&metadata)]);
        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        let payload: Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
        assert_eq!(payload["status"], "ok");
        let nodes = payload["data"]["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        let edges = payload["data"]["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0]["similarity"], 1.0);

        let range = lensgraph(&["range", "--metadata", path_str(&metadata)]);
        let payload: Value = serde_json::from_slice(&range.stdout).expect("stdout is JSON");
        assert_eq!(payload["data"]["start"], "2099-01");
        assert_eq!(payload["data"]["end"], "2099-01");

        let files = lensgraph(&["files", "--metadata", path_str(&metadata)]);
        let payload: Value = serde_json::from_slice(&files.stdout).expect("stdout is JSON");
        assert_eq!(payload["data"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_cli_inspect_decode_error_returns_structured_json() {
        let workspace = TempDir::new().unwrap();
        let path = workspace.path().join("bad.png");
        std::fs::write(&path, PngBuilder::new().itxt("{broken").finish()).unwrap();

        let output = lensgraph(&["inspect", "--file", path_str(&path)]);
        assert_eq!(output.status.code(), Some(1));
        let payload: Value =
            serde_json::from_slice(&output.stderr).expect("stderr should contain JSON payload");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error"]["kind"], "DecodeError");
        assert_eq!(payload["error"]["raw"], "{broken");
    }

    #[test]
    fn test_cli_graph_rejects_bad_date() {
        let workspace = TempDir::new().unwrap();
        let output = lensgraph(&[
            "graph",
            "--metadata",
            path_str(workspace.path()),
            "--from",
            "last-week",
        ]);
        assert_eq!(output.status.code(), Some(1));
        let payload: Value = serde_json::from_slice(&output.stderr).expect("stderr JSON");
        assert_eq!(payload["error"]["kind"], "InvalidDate");
    }
}
