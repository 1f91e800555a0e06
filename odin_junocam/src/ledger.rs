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

use std::{collections::HashSet, fs::{self,OpenOptions}, io::{ErrorKind,Write}, path::{Path,PathBuf}};
use tracing::info;

use crate::errors::{Result, state_error};
use crate::storage::ImageStore;

/// the append-only record of image filenames we already stored (and tried to publish).
/// It is kept fully in memory and every addition is flushed to a newline delimited file before we
/// return, so that a subsequent publish can never run ahead of its ledger entry
#[derive(Debug)]
pub struct DedupLedger {
    path: PathBuf,
    names: HashSet<String>,
}

impl DedupLedger {

    /// load the ledger file (if any)
    pub fn open (path: impl AsRef<Path>)->Result<Self> {
        let path = path.as_ref().to_path_buf();
        let names = match fs::read_to_string( &path) {
            Ok(s) => s.lines().map( str::trim).filter( |l| !l.is_empty()).map( String::from).collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err( state_error( format!("cannot read ledger {path:?}: {e}")))
        };

        Ok( DedupLedger { path, names } )
    }

    /// load the ledger file, or if there is none yet create it from what is already in the image store
    pub fn open_or_seed (path: impl AsRef<Path>, store: &ImageStore)->Result<Self> {
        let path = path.as_ref();
        if path.is_file() {
            Self::open( path)

        } else {
            let mut ledger = DedupLedger { path: path.to_path_buf(), names: HashSet::new() };
            let stored = store.stored_image_names()?;
            if !stored.is_empty() {
                info!("seeding ledger {path:?} with {} stored images", stored.len());
            }
            for name in stored {
                ledger.record( &name)?;
            }
            Ok(ledger)
        }
    }

    pub fn contains (&self, name: &str)->bool {
        self.names.contains( name)
    }

    /// add a name and make it durable. Returns false if the name was already recorded
    pub fn record (&mut self, name: &str)->Result<bool> {
        if self.names.contains( name) { return Ok(false) }

        let res = OpenOptions::new().create(true).append(true).open( &self.path)
            .and_then( |mut file| {
                writeln!( file, "{name}")?;
                file.sync_data()
            });
        res.map_err( |e| state_error( format!("cannot append to ledger {:?}: {e}", self.path)))?;

        self.names.insert( name.to_string());
        Ok(true)
    }

    pub fn len (&self)->usize { self.names.len() }

    pub fn is_empty (&self)->bool { self.names.is_empty() }

    pub fn path (&self)->&Path { &self.path }
}
