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

//! odin_junocam - a live importer that follows the public JunoCam vault, stores the most useful
//! image variant of each new image set and publishes it together with its metadata
//!
//! The vault is an append-only, sparsely populated numbered archive space. We keep a single cursor
//! into it and advance that cursor as new slots get published, see [`cursor_loop::CursorLoop`]

use std::{fs, path::{Path,PathBuf}, time::Duration};
use serde::{Serialize,Deserialize};

pub mod errors;
pub use errors::*;

pub mod archive;
pub use archive::*;

pub mod metadata;
pub use metadata::*;

pub mod storage;
pub use storage::*;

pub mod ledger;
pub use ledger::*;

pub mod publisher;
pub use publisher::*;

pub mod twitter;

pub mod cursor_loop;
pub use cursor_loop::*;

/// the importer configuration. All loop policies (strides, retry counts, sleep windows) live here
/// so that different dataset generations do not need different code paths
#[derive(Serialize,Deserialize,Debug,Clone)]
#[serde(default)]
pub struct JunoCamConfig {
    pub vault_url: String, // e.g. "https://www.missionjuno.swri.edu/Vault/VaultDownload"
    pub slot_param: String, // query parameter that carries the slot number
    pub request_timeout: Duration,

    pub storage_root: PathBuf,
    pub metadata_dir: String, // subdirectory of storage_root for metadata JSON files
    pub cursor_file: PathBuf,
    pub ledger_file: PathBuf,

    pub image_stride: u64, // slots to advance after an image archive
    pub metadata_offset: u64, // data archive slot relative to its image archive slot
    pub max_media_size: u64, // upload ceiling of the publishing platform in bytes

    pub max_fetch_attempts: u32, // per slot, before we force-advance
    pub fetch_retry_delay: Duration,
    pub max_metadata_attempts: u32,

    pub max_publish_attempts: u32,
    pub publish_backoff: Duration, // multiplied with the attempt number

    pub sleep_window: (Duration,Duration), // base bounds of the randomized poll interval
    pub short_multiplier: u32, // after processing something
    pub long_multiplier: u32, // once we reached the end of the published queue

    pub max_unclassified_failures: u32, // consecutive failures before we cool down
    pub cooldown: Duration,

    pub profile_template: Option<String>, // "{cursor}" gets replaced with the current slot
}

impl Default for JunoCamConfig {
    fn default()->Self {
        JunoCamConfig {
            vault_url: "https://www.missionjuno.swri.edu/Vault/VaultDownload".to_string(),
            slot_param: "VaultID".to_string(),
            request_timeout: Duration::from_secs(60),

            storage_root: PathBuf::from("data"),
            metadata_dir: "dataset_files".to_string(),
            cursor_file: PathBuf::from("cursor.txt"),
            ledger_file: PathBuf::from("published.txt"),

            image_stride: 4,
            metadata_offset: 1,
            max_media_size: 4_882_000,

            max_fetch_attempts: 3,
            fetch_retry_delay: Duration::from_secs(30),
            max_metadata_attempts: 3,

            max_publish_attempts: 3,
            publish_backoff: Duration::from_secs(15),

            sleep_window: (Duration::from_secs(60), Duration::from_secs(120)),
            short_multiplier: 1,
            long_multiplier: 15,

            max_unclassified_failures: 4,
            cooldown: Duration::from_secs(900),

            profile_template: None,
        }
    }
}

impl JunoCamConfig {
    /// the (lower,upper) bounds of the poll interval for a given multiplier
    pub fn sleep_bounds (&self, multiplier: u32)->(Duration,Duration) {
        (self.sleep_window.0 * multiplier, self.sleep_window.1 * multiplier)
    }
}

/// load a RON config file
pub fn load_config<P: AsRef<Path>> (path: P)->Result<JunoCamConfig> {
    let path = path.as_ref();
    let data = fs::read_to_string( path)
        .map_err(|e| OdinJunoCamError::ConfigParseError( format!("cannot read config {path:?}: {e}")))?;
    Ok( ron::from_str( &data)? )
}
