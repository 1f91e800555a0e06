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

//! the cursor-advance loop that follows the vault
//!
//! Each iteration fetches the archive at the current cursor, classifies it and either processes an
//! image archive, skips the slot or - if nothing is published there yet - waits for it. Transient
//! failures are retried for the same slot a bounded number of times before the slot is given up on,
//! so the loop keeps moving forward without operator intervention. The only errors that terminate
//! [`CursorLoop::run`] are the ones that would make us lose track of the cursor or the ledger.

use std::{path::PathBuf, time::Duration};
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug,info,warn,error};

use crate::JunoCamConfig;
use crate::archive::{ArchiveEntry, ArchiveKind, ArchiveSource, select_variant};
use crate::errors::{OdinJunoCamError, Result, op_failed};
use crate::ledger::DedupLedger;
use crate::metadata::{MetadataRecord, alt_text_for, caption_for, metadata_from_archive};
use crate::publisher::{Post, Publisher, publish_with_retry};
use crate::storage::{CursorFile, ImageStore};

/// how long to wait before the next iteration
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Pace {
    Short,    // we just processed or skipped a slot, more is likely to follow
    Long,     // end of the published queue
    Retry,    // fixed delay before we try the same slot again
    Cooldown, // too many unclassified failures in a row
}

/// what became of an image archive
#[derive(Debug,Clone,PartialEq)]
pub enum ImageOutcome {
    Published(PathBuf),
    Stored(PathBuf), // publishing was abandoned but the image is saved
    NoImage,
    Oversized(u64),
    Duplicate(String),
}

pub struct CursorLoop<A,P> {
    config: JunoCamConfig,
    source: A,
    publisher: P,
    store: ImageStore,
    ledger: DedupLedger,
    cursor_file: CursorFile,

    cursor: u64,
    slot_failures: u32, // consecutive failures for the current slot, reset by any successful iteration
    unclassified_failures: u32, // consecutive unclassified failures, reset by any successful iteration
}

impl<A,P> CursorLoop<A,P> where A: ArchiveSource, P: Publisher {

    /// set up storage, ledger and the start cursor. An explicit `start_cursor` overrides the persisted one
    pub fn new (config: JunoCamConfig, source: A, publisher: P, start_cursor: Option<u64>)->Result<Self> {
        let store = ImageStore::new( &config.storage_root, &config.metadata_dir)?;
        let ledger = DedupLedger::open_or_seed( &config.ledger_file, &store)?;
        let cursor_file = CursorFile::new( &config.cursor_file);

        let cursor = match start_cursor {
            Some(cursor) => cursor,
            None => cursor_file.read()?.ok_or_else( || op_failed!("no persisted cursor in {:?} and no start cursor given", cursor_file.path()))?
        };
        info!("starting at slot {cursor} with {} ledger entries", ledger.len());

        Ok( CursorLoop { config, source, publisher, store, ledger, cursor_file, cursor, slot_failures: 0, unclassified_failures: 0 } )
    }

    pub fn cursor (&self)->u64 { self.cursor }

    pub fn ledger (&self)->&DedupLedger { &self.ledger }

    pub fn store (&self)->&ImageStore { &self.store }

    pub fn config (&self)->&JunoCamConfig { &self.config }

    pub fn source (&self)->&A { &self.source }

    pub fn publisher (&self)->&P { &self.publisher }

    /// run until we hit a fatal error
    pub async fn run (&mut self)->Result<()> {
        loop {
            let pace = self.iterate().await?;
            let delay = self.delay_for( pace);
            info!("slot {}: sleeping for {:?} ({pace:?})", self.cursor, delay);
            sleep( delay).await;
        }
    }

    /// one loop iteration including failure handling. Only fatal errors are returned
    pub async fn iterate (&mut self)->Result<Pace> {
        match self.step().await {
            Ok(pace) => {
                self.slot_failures = 0;
                self.unclassified_failures = 0;
                Ok(pace)
            }
            Err(e) if e.is_fatal() => {
                error!("fatal error at slot {}: {e}", self.cursor);
                Err(e)
            }
            Err(e) if e.is_transient() => {
                warn!("transient failure at slot {}: {e}", self.cursor);
                self.slot_failed().await
            }
            Err(e) => {
                error!("failure at slot {}: {e}", self.cursor);
                self.unclassified_failures += 1;
                let pace = self.slot_failed().await?;

                if self.unclassified_failures >= self.config.max_unclassified_failures {
                    warn!("{} consecutive failures, cooling down", self.unclassified_failures);
                    self.unclassified_failures = 0;
                    Ok(Pace::Cooldown)
                } else {
                    Ok(pace)
                }
            }
        }
    }

    /// fetch, classify and process the current slot
    pub async fn step (&mut self)->Result<Pace> {
        self.cursor_file.write( self.cursor)?;
        let entry = self.source.fetch( self.cursor).await?;

        match entry.kind() {
            ArchiveKind::Empty => {
                info!("slot {}: end of published queue", self.cursor);
                Ok(Pace::Long)
            }
            ArchiveKind::Image => {
                let outcome = self.process_image_archive( &entry).await?;
                info!("slot {}: {outcome:?}", self.cursor);
                self.advance( self.config.image_stride).await?;
                Ok(Pace::Short)
            }
            ArchiveKind::Data => { // these are only retrieved together with their image archive
                info!("slot {}: skipping data archive {:?}", self.cursor, entry.filename);
                self.advance( 1).await?;
                Ok(Pace::Short)
            }
            ArchiveKind::Unrecognized => {
                info!("slot {}: not an image set {:?}", self.cursor, entry.filename);
                self.advance( 1).await?;
                Ok(Pace::Short)
            }
        }
    }

    /// select, store, record and publish the image of an image archive
    pub async fn process_image_archive (&mut self, entry: &ArchiveEntry)->Result<ImageOutcome> {
        let files = entry.unpack()?;

        let Some(image) = select_variant( &files) else {
            warn!("no image found in {:?}", entry.filename);
            return Ok(ImageOutcome::NoImage)
        };

        if image.len() > self.config.max_media_size {
            warn!("{} is too big to publish ({} bytes)", image.name, image.len());
            return Ok(ImageOutcome::Oversized( image.len()))
        }

        if self.ledger.contains( &image.name) {
            info!("{} already published", image.name);
            return Ok(ImageOutcome::Duplicate( image.name.clone()))
        }

        let path = self.store.store_image( image)?;
        self.ledger.record( &image.name)?;
        info!("saved image {path:?}");

        let metadata = self.fetch_metadata().await;
        let post = Post {
            filename: &image.name,
            data: &image.contents,
            caption: caption_for( metadata.as_ref()),
            alt_text: alt_text_for( metadata.as_ref()),
        };

        if publish_with_retry( &self.publisher, &post, self.config.max_publish_attempts, self.config.publish_backoff).await {
            Ok(ImageOutcome::Published(path))
        } else {
            Ok(ImageOutcome::Stored(path))
        }
    }

    /// get the metadata record from the data archive that follows the current image archive.
    /// Any failure just means we publish without metadata
    pub async fn fetch_metadata (&self)->Option<MetadataRecord> {
        let slot = self.cursor + self.config.metadata_offset;

        for attempt in 1..=self.config.max_metadata_attempts {
            match self.source.fetch( slot).await {
                Ok(entry) => {
                    if entry.kind() == ArchiveKind::Data {
                        return match self.extract_metadata( &entry) {
                            Ok(md) => Some(md),
                            Err(e) => {
                                warn!("slot {slot}: invalid data archive {:?}: {e}", entry.filename);
                                None
                            }
                        }
                    } else {
                        info!("slot {slot}: not a data archive {:?}", entry.filename);
                        return None
                    }
                }
                Err(e) if e.is_transient() => {
                    warn!("slot {slot}: metadata fetch failed (attempt {attempt}): {e}");
                    if attempt < self.config.max_metadata_attempts {
                        sleep( self.config.fetch_retry_delay).await;
                    }
                }
                Err(e) => {
                    warn!("slot {slot}: metadata fetch failed: {e}");
                    return None
                }
            }
        }
        None
    }

    fn extract_metadata (&self, entry: &ArchiveEntry)->Result<MetadataRecord> {
        let (json_file, record) = metadata_from_archive( &entry.payload)?;
        let path = self.store.store_metadata( &json_file)?;
        debug!("saved metadata {path:?}");
        Ok(record)
    }

    /// move the cursor forward and persist it
    async fn advance (&mut self, n: u64)->Result<()> {
        self.cursor += n;
        self.slot_failures = 0;
        self.cursor_file.write( self.cursor)?;

        if let Some(template) = &self.config.profile_template {
            let description = template.replace( "{cursor}", &self.cursor.to_string());
            if let Err(e) = self.publisher.update_profile( &description).await {
                warn!("failed to update profile: {e}");
            }
        }
        Ok(())
    }

    /// count a failure for the current slot and give up on the slot once we exhausted our attempts
    async fn slot_failed (&mut self)->Result<Pace> {
        self.slot_failures += 1;
        if self.slot_failures >= self.config.max_fetch_attempts {
            warn!("giving up on slot {} after {} attempts", self.cursor, self.slot_failures);
            self.advance( 1).await?;
        }
        Ok(Pace::Retry)
    }

    /// the sleep duration for a given pace. Poll intervals are randomized within the configured window
    pub fn delay_for (&self, pace: Pace)->Duration {
        match pace {
            Pace::Short => random_delay( self.config.sleep_bounds( self.config.short_multiplier)),
            Pace::Long => random_delay( self.config.sleep_bounds( self.config.long_multiplier)),
            Pace::Retry => self.config.fetch_retry_delay,
            Pace::Cooldown => self.config.cooldown,
        }
    }
}

fn random_delay ((lower,upper): (Duration,Duration))->Duration {
    let lo = lower.as_millis() as u64;
    let hi = upper.as_millis() as u64;
    if hi > lo {
        Duration::from_millis( rand::rng().random_range( lo..hi))
    } else {
        lower
    }
}
