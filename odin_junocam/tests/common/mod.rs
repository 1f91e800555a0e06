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
#![allow(unused)]

//! scripted collaborators and archive builders shared by the integration tests

use std::{cell::{Cell,RefCell}, collections::HashMap, io::{Cursor,Write}, path::Path, time::Duration};
use bytes::Bytes;
use zip::{CompressionMethod, ZipWriter, write::SimpleFileOptions};

use odin_junocam::{ArchiveEntry, ArchiveSource, JunoCamConfig, MediaHandle, OdinJunoCamError, Publisher, Result};

pub const IMAGE_NAME: &str = "JNCE_2019202_21C00001_V01-raw.png";
pub const COMPOSITE_NAME: &str = "JNCE_2019202_21C00001_V01-mapprojected.png";

pub const METADATA_JSON: &str = r#"{
    "INSTRUMENT_NAME": "JUNO EPO CAMERA",
    "IMAGE_TIME": "2019-07-21T04:59:22.000",
    "PJ": 21,
    "TARGET_NAME": "JUPITER",
    "PRODUCER_ID": "NASA / JPL / SwRI / MSSS"
}"#;

/// build a zip payload from (archive path, contents) pairs
pub fn zip_payload (files: &[(&str,&str)])->Bytes {
    let mut writer = ZipWriter::new( Cursor::new( Vec::new()));
    let options = SimpleFileOptions::default().compression_method( CompressionMethod::Stored);

    for (name,contents) in files {
        if name.ends_with('/') {
            writer.add_directory( *name, options).unwrap();
        } else {
            writer.start_file( *name, options).unwrap();
            writer.write_all( contents.as_bytes()).unwrap();
        }
    }
    Bytes::from( writer.finish().unwrap().into_inner())
}

pub fn image_archive (slot: u64, files: &[(&str,&str)])->ArchiveEntry {
    ArchiveEntry::new( slot, format!("{slot}_ImageSet.zip"), zip_payload( files))
}

pub fn data_archive (slot: u64, json: &str)->ArchiveEntry {
    let path = format!("DataSet/{slot}-Metadata.json");
    ArchiveEntry::new( slot, format!("{slot}_DataSet.zip"), zip_payload( &[(path.as_str(), json)]))
}

/// a config that stores into `dir` and never sleeps
pub fn test_config (dir: &Path)->JunoCamConfig {
    JunoCamConfig {
        storage_root: dir.join("data"),
        cursor_file: dir.join("cursor.txt"),
        ledger_file: dir.join("published.txt"),
        fetch_retry_delay: Duration::ZERO,
        publish_backoff: Duration::ZERO,
        sleep_window: (Duration::ZERO, Duration::ZERO),
        cooldown: Duration::ZERO,
        ..JunoCamConfig::default()
    }
}

/// archive source with fixed entries per slot. Slots without entries are empty, and each slot can be
/// set up to fail a number of times before it returns its entry
#[derive(Default)]
pub struct ScriptedSource {
    entries: RefCell<HashMap<u64,ArchiveEntry>>,
    failures: RefCell<HashMap<u64,(u32,u16)>>, // slot -> (remaining failures, http status)
    flaky: RefCell<HashMap<u64,u16>>, // slot -> http status of every other fetch
    pub fetched: RefCell<Vec<u64>>,
}

impl ScriptedSource {
    pub fn new ()->Self { ScriptedSource::default() }

    pub fn with (self, entry: ArchiveEntry)->Self {
        self.entries.borrow_mut().insert( entry.slot, entry);
        self
    }

    pub fn failing (self, slot: u64, n: u32, status: u16)->Self {
        self.failures.borrow_mut().insert( slot, (n,status));
        self
    }

    /// fail the 1st, 3rd, 5th.. fetch of a slot
    pub fn flaky (self, slot: u64, status: u16)->Self {
        self.flaky.borrow_mut().insert( slot, status);
        self
    }

    pub fn n_fetches (&self, slot: u64)->usize {
        self.fetched.borrow().iter().filter( |s| **s == slot).count()
    }
}

impl ArchiveSource for ScriptedSource {
    async fn fetch (&self, slot: u64)->Result<ArchiveEntry> {
        let n_previous = self.n_fetches( slot);
        self.fetched.borrow_mut().push( slot);

        if let Some(status) = self.flaky.borrow().get( &slot) && n_previous % 2 == 0 {
            return Err( OdinJunoCamError::HttpStatusError( *status))
        }

        if let Some((n,status)) = self.failures.borrow_mut().get_mut( &slot) && *n > 0 {
            *n -= 1;
            return Err( OdinJunoCamError::HttpStatusError( *status))
        }

        Ok( self.entries.borrow().get( &slot).cloned().unwrap_or_else( || ArchiveEntry::empty( slot)) )
    }
}

/// publisher that records what it was asked to do and can be set up to fail posts
#[derive(Default)]
pub struct RecordingPublisher {
    pub uploads: RefCell<Vec<(String,usize)>>,
    pub alt_texts: RefCell<Vec<String>>,
    pub posts: RefCell<Vec<String>>,
    pub profiles: RefCell<Vec<String>>,
    pub post_attempts: Cell<u32>,
    pub failing_posts: Cell<u32>,
}

impl RecordingPublisher {
    pub fn new ()->Self { RecordingPublisher::default() }

    pub fn failing (n: u32)->Self {
        let publisher = RecordingPublisher::default();
        publisher.failing_posts.set(n);
        publisher
    }
}

impl Publisher for RecordingPublisher {
    async fn upload_media (&self, filename: &str, data: &[u8])->Result<MediaHandle> {
        let mut uploads = self.uploads.borrow_mut();
        uploads.push( (filename.to_string(), data.len()));
        Ok( MediaHandle( format!("media-{}", uploads.len())) )
    }

    async fn set_alt_text (&self, _media: &MediaHandle, alt_text: &str)->Result<()> {
        self.alt_texts.borrow_mut().push( alt_text.to_string());
        Ok(())
    }

    async fn publish_post (&self, caption: &str, _media: &MediaHandle)->Result<()> {
        self.post_attempts.set( self.post_attempts.get() + 1);

        let n = self.failing_posts.get();
        if n > 0 {
            self.failing_posts.set( n-1);
            return Err( OdinJunoCamError::PublishError("service unavailable".to_string()))
        }

        self.posts.borrow_mut().push( caption.to_string());
        Ok(())
    }

    async fn update_profile (&self, description: &str)->Result<()> {
        self.profiles.borrow_mut().push( description.to_string());
        Ok(())
    }
}
