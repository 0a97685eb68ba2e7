// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! CLI integration tests.
//!
//! Runs the `vinum` binary against real files in a temp directory and
//! checks the literal output contract: echoed header, per-command counts,
//! final height line.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    _temp: TempDir,
    wine_data: PathBuf,
    commands: PathBuf,
    out: PathBuf,
    storage: PathBuf,
}

fn setup(csv_rows: &str, commands: &str) -> Workspace {
    let temp = TempDir::new().expect("Failed to create temp dir");

    let wine_data = temp.path().join("wines.csv");
    let content = if csv_rows.is_empty() {
        String::new()
    } else {
        format!("vinho_id,rotulo,ano_colheita,tipo\n{}", csv_rows)
    };
    fs::write(&wine_data, content).expect("Failed to write wine data");

    let commands_path = temp.path().join("in.txt");
    fs::write(&commands_path, commands).expect("Failed to write commands");

    Workspace {
        out: temp.path().join("out.txt"),
        storage: temp.path().join("storage"),
        _temp: temp,
        wine_data,
        commands: commands_path,
    }
}

fn vinum(ws: &Workspace) -> Command {
    let mut cmd = Command::cargo_bin("vinum").unwrap();
    cmd.args([
        "--wine-data",
        ws.wine_data.to_str().unwrap(),
        "--commands-file",
        ws.commands.to_str().unwrap(),
        "--out-file",
        ws.out.to_str().unwrap(),
        "--storage-dir",
        ws.storage.to_str().unwrap(),
    ]);
    cmd
}

fn out_content(ws: &Workspace) -> String {
    fs::read_to_string(&ws.out).expect("out file missing")
}

// ============================================================================
// Output contract
// ============================================================================

#[test]
fn test_cli_empty_search() {
    let ws = setup("", "FLH/3\nBUS=:2010\n");

    vinum(&ws).assert().success();
    assert_eq!(out_content(&ws), "FLH/3\nBUS=:2010/0\nH/0\n");
}

#[test]
fn test_cli_insert_and_find() {
    let ws = setup("1,X,2010,tinto\n", "FLH/3\nINC:2010\nBUS=:2010\n");

    vinum(&ws).assert().success();
    assert_eq!(out_content(&ws), "FLH/3\nINC:2010/1\nBUS=:2010/1\nH/0\n");
}

#[test]
fn test_cli_duplicates_and_height() {
    let rows = "1,A,2018,tinto\n2,B,2018,branco\n3,C,2018,rose\n4,D,2018,rosé\n5,E,2018,tinto\n";
    let ws = setup(rows, "FLH/3\nINC:2018\nBUS=:2018\n");

    vinum(&ws).assert().success();
    let out = out_content(&ws);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "FLH/3");
    assert_eq!(lines[1], "INC:2018/5");
    assert_eq!(lines[2], "BUS=:2018/5");
    let height: u32 = lines[3].strip_prefix("H/").unwrap().parse().unwrap();
    assert!(height >= 1);
}

#[test]
fn test_cli_small_pages_force_paging() {
    let mut rows = String::new();
    for i in 0..5 {
        rows.push_str(&format!(
            "{},Estate with a fairly long label number {:02},1990,tinto\n",
            i, i
        ));
    }
    for i in 5..10 {
        rows.push_str(&format!(
            "{},Estate with a fairly long label number {:02},1991,branco\n",
            i, i
        ));
    }
    let ws = setup(&rows, "FLH/4\nINC:1990\nINC:1991\nBUS=:1990\n");

    vinum(&ws)
        .args(["--page-size-in-bytes", "256"])
        .assert()
        .success();

    let out = out_content(&ws);
    assert!(out.contains("INC:1990/5"));
    assert!(out.contains("INC:1991/5"));
    assert!(out.contains("BUS=:1990/5"));
}

// ============================================================================
// Durability across restart
// ============================================================================

#[test]
fn test_cli_restart_finds_previous_run() {
    let ws = setup("1,X,2010,tinto\n", "FLH/3\nINC:2010\n");
    vinum(&ws).assert().success();

    // Second run, same storage directory, search only.
    fs::write(&ws.commands, "FLH/3\nBUS=:2010\n").unwrap();
    vinum(&ws).assert().success();

    assert_eq!(out_content(&ws), "FLH/3\nBUS=:2010/1\nH/0\n");
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_cli_missing_wine_data_fails() {
    let ws = setup("", "FLH/3\nBUS=:2010\n");
    fs::remove_file(&ws.wine_data).unwrap();

    vinum(&ws)
        .assert()
        .failure()
        .stderr(predicate::str::contains("wine"));
}

#[test]
fn test_cli_unknown_command_fails() {
    let ws = setup("1,X,2010,tinto\n", "FLH/3\nDEL:2010\n");

    vinum(&ws)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_cli_missing_header_fails() {
    let ws = setup("1,X,2010,tinto\n", "INC:2010\n");
    vinum(&ws).assert().failure();
}

#[test]
fn test_cli_malformed_csv_fails() {
    let ws = setup("1,X,not-a-year,tinto\n", "FLH/3\nINC:2010\n");
    vinum(&ws).assert().failure();
}

fn storage_file(ws: &Workspace, name: &str) -> PathBuf {
    Path::new(&ws.storage).join(name)
}

#[test]
fn test_cli_creates_expected_storage_layout() {
    let ws = setup("1,X,2010,tinto\n", "FLH/3\nINC:2010\n");
    vinum(&ws)
        .args(["--heap-size-in-bytes", "65536"])
        .assert()
        .success();

    assert!(storage_file(&ws, "heap.ygg").exists());
    assert!(storage_file(&ws, "heap_metadata.ygg").exists());
    assert!(storage_file(&ws, "index.ygg").exists());
    assert!(storage_file(&ws, "wines.sorted.ygg").exists());

    // The heap file is created at its full configured size.
    let heap_len = fs::metadata(storage_file(&ws, "heap.ygg")).unwrap().len();
    assert_eq!(heap_len, 65536);

    // The index file starts with the text metadata block.
    let index = fs::read_to_string(storage_file(&ws, "index.ygg")).unwrap();
    assert!(index.starts_with("ROOT_ID="));
    assert!(index.contains("NODE 0 | LEAF=true"));
}
