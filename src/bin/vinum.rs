// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! vinum CLI
//!
//! Runs a command file against the wine engine:
//! `vinum --wine-data wines.csv --commands-file in.txt --out-file out.txt`

use anyhow::Context;
use clap::Parser;
use std::fs;
use std::fs::File;
use std::path::PathBuf;

use vinum::{
    parse_script, run_script, BufferPool, Engine, HeapFileStore, IndexFileStore, WineSource,
};

#[derive(Parser)]
#[command(name = "vinum")]
#[command(version = "0.1.0")]
#[command(about = "Wine-catalog database engine with a persistent B+-Tree year index", long_about = None)]
struct Cli {
    /// Source wine catalog CSV (vinho_id,rotulo,ano_colheita,tipo)
    #[arg(long, value_name = "PATH")]
    wine_data: PathBuf,

    /// Fixed heap page capacity in bytes
    #[arg(long, value_name = "N", default_value_t = 4096)]
    page_size_in_bytes: usize,

    /// Maximum keys per index node before a split (the commands-file
    /// header overrides this for the run)
    #[arg(long, value_name = "M", default_value_t = 4)]
    max_keys_per_node: u16,

    /// Total heap file budget in bytes
    #[arg(long, value_name = "N", default_value_t = 40 * 1024 * 1024)]
    heap_size_in_bytes: u64,

    /// Resident data-page frames
    #[arg(long, value_name = "F", default_value_t = 1)]
    amount_of_page_frames: usize,

    /// Resident index-node frames
    #[arg(long, value_name = "F", default_value_t = 1)]
    amount_of_index_frames: usize,

    /// Command file (FLH/<m> header, then INC:/BUS=: lines)
    #[arg(long, value_name = "PATH", default_value = "in.txt")]
    commands_file: PathBuf,

    /// Output file
    #[arg(long, value_name = "PATH", default_value = "out.txt")]
    out_file: PathBuf,

    /// Directory holding the heap, index and sorted catalog files
    #[arg(long, value_name = "PATH", default_value = "storage")]
    storage_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let commands = fs::read_to_string(&cli.commands_file).with_context(|| {
        format!("cannot read commands file {}", cli.commands_file.display())
    })?;
    let script = parse_script(&commands)?;
    if script.degree != cli.max_keys_per_node {
        log::debug!(
            "commands-file header degree {} overrides --max-keys-per-node {}",
            script.degree,
            cli.max_keys_per_node
        );
    }

    let mut source = WineSource::prepare(&cli.wine_data, &cli.storage_dir)
        .context("wine source preparation failed")?;

    let heap = HeapFileStore::initialize(
        &cli.storage_dir,
        cli.page_size_in_bytes,
        cli.heap_size_in_bytes,
    )
    .context("heap store initialisation failed")?;
    let index = IndexFileStore::initialize(&cli.storage_dir, script.degree)
        .context("index store initialisation failed")?;

    let pool = BufferPool::new(
        heap,
        index,
        cli.amount_of_page_frames,
        cli.amount_of_index_frames,
    )?;
    let mut engine = Engine::new(pool)?;

    let mut out = File::create(&cli.out_file)
        .with_context(|| format!("cannot create out file {}", cli.out_file.display()))?;
    run_script(&mut engine, &mut source, &script, &mut out)?;

    engine.flush_all()?;
    Ok(())
}
