// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Single-pass reconciliation (`poormansd --once`).

#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use serde_json::Value;

use super::common::*;

struct Env {
    temp: TempDir,
}

impl Env {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        make_home(&temp);
        Env { temp }
    }

    fn home(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    fn sync_root(&self) -> PathBuf {
        self.temp.path().join("sync")
    }

    fn selection_path(&self) -> PathBuf {
        self.sync_root().join("config.json")
    }

    fn daemon(&self) -> Command {
        let mut cmd = poormansd(&self.home());
        cmd.arg("--once")
            .arg("--sync-root")
            .arg(self.sync_root());
        cmd
    }

    fn source(&self, category: &str, name: &str, content: &str) {
        fs::write(self.home().join(category).join(name), content).unwrap();
    }

    fn mirror_names(&self, category: &str) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.sync_root().join(category))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    fn selection(&self) -> Value {
        serde_json::from_str(&fs::read_to_string(self.selection_path()).unwrap()).unwrap()
    }

    fn select(&self, key: &str, names: &[&str]) {
        let mut selection = self.selection();
        selection[key]["syncedFiles"] = serde_json::json!(names);
        fs::write(self.selection_path(), selection.to_string()).unwrap();
    }
}

fn synced(selection: &Value, key: &str) -> Vec<String> {
    serde_json::from_value(selection[key]["syncedFiles"].clone()).unwrap()
}

#[test]
fn first_run_writes_default_selection() {
    let env = Env::new();

    env.daemon().assert().success();

    let selection = env.selection();
    for (key, name) in [
        ("documentsDir", "Documents"),
        ("moviesDir", "Movies"),
        ("musicDir", "Music"),
        ("picturesDir", "Pictures"),
    ] {
        assert_eq!(selection[key]["name"], name);
        let expected = env.home().join(name);
        assert_eq!(selection[key]["path"], expected.to_str().unwrap());
        assert!(synced(&selection, key).is_empty());
        assert!(env.sync_root().join(name).is_dir());
    }
}

#[test]
fn first_run_copies_nothing() {
    let env = Env::new();
    env.source("Music", "song.mp3", "la");

    env.daemon().assert().success();

    assert!(env.mirror_names("Music").is_empty());
}

#[test]
fn selected_files_are_mirrored() {
    let env = Env::new();
    env.source("Music", "a.mp3", "aaa");
    env.source("Music", "b.mp3", "bbb");
    env.source("Pictures", "p.jpg", "ppp");
    env.daemon().assert().success();

    env.select("musicDir", &["a.mp3"]);
    env.daemon().assert().success();

    assert_eq!(env.mirror_names("Music"), vec!["a.mp3"]);
    assert!(env.mirror_names("Pictures").is_empty());
    let copied = fs::read_to_string(env.sync_root().join("Music/a.mp3")).unwrap();
    assert_eq!(copied, "aaa");
}

#[test]
fn deselected_and_orphaned_files_are_removed() {
    let env = Env::new();
    env.source("Movies", "keep.mkv", "k");
    env.source("Movies", "drop.mkv", "d");
    env.daemon().assert().success();
    env.select("moviesDir", &["keep.mkv", "drop.mkv"]);
    env.daemon().assert().success();
    fs::write(env.sync_root().join("Movies/stray.mkv"), "s").unwrap();

    env.select("moviesDir", &["keep.mkv"]);
    env.daemon().assert().success();

    assert_eq!(env.mirror_names("Movies"), vec!["keep.mkv"]);
}

#[test]
fn vanished_source_files_are_pruned_from_selection() {
    let env = Env::new();
    env.source("Documents", "cv.pdf", "cv");
    env.daemon().assert().success();
    env.select("documentsDir", &["cv.pdf", "lost.pdf"]);

    env.daemon().assert().success();

    assert_eq!(synced(&env.selection(), "documentsDir"), vec!["cv.pdf"]);
    assert_eq!(env.mirror_names("Documents"), vec!["cv.pdf"]);
}

#[test]
fn housekeeping_files_are_never_mirrored() {
    let env = Env::new();
    env.source("Pictures", ".DS_Store", "");
    env.daemon().assert().success();
    env.select("picturesDir", &[".DS_Store"]);

    env.daemon().assert().success();

    assert!(env.mirror_names("Pictures").is_empty());
    assert!(synced(&env.selection(), "picturesDir").is_empty());
}

#[test]
fn repeated_runs_are_stable() {
    let env = Env::new();
    env.source("Music", "a.mp3", "a");
    env.daemon().assert().success();
    env.select("musicDir", &["a.mp3"]);

    env.daemon().assert().success();
    let first = fs::read_to_string(env.selection_path()).unwrap();
    env.daemon().assert().success();
    let second = fs::read_to_string(env.selection_path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(env.mirror_names("Music"), vec!["a.mp3"]);
}

#[test]
fn missing_source_directory_fails() {
    let env = Env::new();
    env.daemon().assert().success();
    fs::remove_dir_all(env.home().join("Movies")).unwrap();

    env.daemon()
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: cannot list"));
}

#[test]
fn unparsable_selection_fails() {
    let env = Env::new();
    fs::create_dir_all(env.sync_root()).unwrap();
    fs::write(env.selection_path(), "{\"musicDir\": ").unwrap();

    env.daemon()
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid selection file"));
}

#[test]
fn selection_written_without_transient_fields() {
    let env = Env::new();
    env.source("Music", "a.mp3", "a");
    env.daemon().assert().success();

    let selection = env.selection();
    let music = selection["musicDir"].as_object().unwrap();
    let mut keys: Vec<&str> = music.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["name", "path", "syncedFiles"]);
    assert!(!env.sync_root().join("Music/a.mp3").exists());
}

#[test]
fn selection_order_is_kept() {
    let env = Env::new();
    env.source("Music", "a.mp3", "a");
    env.source("Music", "b.mp3", "b");
    env.daemon().assert().success();
    env.select("musicDir", &["b.mp3", "a.mp3"]);

    env.daemon().assert().success();

    assert_eq!(synced(&env.selection(), "musicDir"), vec!["b.mp3", "a.mp3"]);
}

#[test]
fn shared_mirror_name_fails() {
    let env = Env::new();
    env.source("Music", "a.mp3", "a");
    env.daemon().assert().success();
    let mut selection = env.selection();
    selection["picturesDir"]["name"] = "Music".into();
    selection["musicDir"]["syncedFiles"] = serde_json::json!(["a.mp3"]);
    fs::write(env.selection_path(), selection.to_string()).unwrap();

    env.daemon()
        .assert()
        .failure()
        .stderr(predicate::str::contains("share the mirror directory"));

    assert!(env.mirror_names("Music").is_empty());
}
