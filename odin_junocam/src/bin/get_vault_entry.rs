/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! operator tool to look at a single vault slot: prints the archive classification and contents and
//! optionally unpacks it

use std::path::Path;
use anyhow::Result;
use clap::Parser;
use lazy_static::lazy_static;

use odin_junocam::{
    load_config, select_variant, storage::{ensure_writable_dir, image_date}, unpack_to_dir, metadata_from_archive,
    ArchiveKind, ArchiveSource, JunoCamConfig, VaultClient
};

#[derive(Parser)]
#[command(about="get_vault_entry - retrieve and classify a JunoCam vault slot")]
struct CliOpts {
    /// pathname of the RON config file (uses the default vault if not set)
    #[arg(long,short)]
    config: Option<String>,

    /// directory to unpack the archive into
    #[arg(long,short)]
    output_dir: Option<String>,

    /// the vault slot
    slot: u64,
}

lazy_static! { static ref ARGS: CliOpts = CliOpts::parse(); }

#[tokio::main]
async fn main()->Result<()> {
    let config = match &ARGS.config {
        Some(path) => load_config( path)?,
        None => JunoCamConfig::default()
    };
    let client = VaultClient::new( &config)?;
    let entry = client.fetch( ARGS.slot).await?;

    let kind = entry.kind();
    println!("slot {}: {:?} ({kind:?}, {} bytes)", entry.slot, entry.filename, entry.payload.len());

    match kind {
        ArchiveKind::Image => {
            let files = entry.unpack()?;
            for f in &files {
                println!("  {} ({} bytes, date: {:?})", f.name, f.len(), image_date( &f.name));
            }
            match select_variant( &files) {
                Some(f) => println!("selected: {}", f.name),
                None => println!("no image variant")
            }
        }
        ArchiveKind::Data => {
            let (json_file, record) = metadata_from_archive( &entry.payload)?;
            println!("  {}: {}", json_file.name, record.caption());
        }
        _ => {}
    }

    if let Some(dir) = &ARGS.output_dir && !entry.payload.is_empty() {
        let dir = Path::new( dir);
        ensure_writable_dir( dir)?;
        unpack_to_dir( &entry.payload, dir)?;
        println!("unpacked to {dir:?}");
    }

    Ok(())
}
