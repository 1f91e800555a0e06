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

//! the long running JunoCam importer. Follows the vault starting at the persisted (or given) cursor,
//! stores new images and publishes them
//!
//! The publisher credentials are taken from the CONSUMER_KEY, CONSUMER_SECRET, ACCESS_TOKEN and
//! ACCESS_TOKEN_SECRET environment variables (not needed with --dry-run)

use anyhow::Result;
use clap::Parser;
use lazy_static::lazy_static;
use tracing_subscriber::EnvFilter;

use odin_junocam::{
    load_config, CursorLoop, JunoCamConfig, LogPublisher, Publisher, VaultClient,
    twitter::{Credentials, TwitterClient}
};

#[derive(Parser)]
#[command(about="junocam_bot - store and publish new JunoCam images")]
struct CliOpts {
    /// pathname of the RON config file
    #[arg(long,short,default_value="configs/junocam.ron")]
    config: String,

    /// vault slot to start with (overrides the persisted cursor)
    #[arg(long)]
    cursor: Option<u64>,

    /// log posts instead of publishing them
    #[arg(long)]
    dry_run: bool,
}

lazy_static! { static ref ARGS: CliOpts = CliOpts::parse(); }

#[tokio::main]
async fn main()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info"))) // RUST_LOG overrides
        .init();

    let config = load_config( &ARGS.config)?;
    let source = VaultClient::new( &config)?;

    if ARGS.dry_run {
        run( config, source, LogPublisher::new()).await
    } else {
        let publisher = TwitterClient::new( Credentials::from_env()?, config.request_timeout)?;
        run( config, source, publisher).await
    }
}

async fn run<P: Publisher> (config: JunoCamConfig, source: VaultClient, publisher: P)->Result<()> {
    let mut importer = CursorLoop::new( config, source, publisher, ARGS.cursor)?;
    importer.run().await?;
    Ok(())
}
