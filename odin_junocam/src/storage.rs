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

//! the permanent image/metadata store and the persisted cursor

use std::{fs, io::{self,ErrorKind,Write}, path::{Path,PathBuf}};
use chrono::{Datelike, NaiveDate, Utc};
use tracing::warn;

use crate::archive::ArchiveFile;
use crate::errors::{Result, state_error};

/// the capture date encoded in an image filename: characters 5..12 are `YYYYDDD` (year and day-of-year),
/// e.g. "JNCE_2019202_21C00001_V01-raw.png"
pub fn image_date (filename: &str)->Option<NaiveDate> {
    let s = filename.get(5..12)?;
    if !s.bytes().all( |b| b.is_ascii_digit()) { return None }

    let year: i32 = s[0..4].parse().ok()?;
    let ordinal: u32 = s[4..7].parse().ok()?;
    NaiveDate::from_yo_opt( year, ordinal)
}

/// the `YEAR/DAY_OF_YEAR` directory for a given date
pub fn date_dir (date: NaiveDate)->PathBuf {
    PathBuf::from( format!("{:04}", date.year())).join( format!("{:03}", date.ordinal()))
}

pub fn ensure_writable_dir (path: impl AsRef<Path>)->io::Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        if fs::metadata( path)?.permissions().readonly() {
            Err( io::Error::new( ErrorKind::PermissionDenied, format!("dir {path:?} not writable")))
        } else {
            Ok(())
        }
    } else {
        fs::create_dir_all( path)
    }
}

/// permanent storage for selected images (under `root/YEAR/DAY_OF_YEAR/`) and metadata JSON files
/// (under `root/<metadata_dir>/`)
#[derive(Debug,Clone)]
pub struct ImageStore {
    root: PathBuf,
    metadata_dir: PathBuf,
}

impl ImageStore {
    pub fn new (root: impl AsRef<Path>, metadata_dir: &str)->Result<Self> {
        let root = root.as_ref().to_path_buf();
        let metadata_dir = root.join( metadata_dir);
        ensure_writable_dir( &root)?;

        Ok( ImageStore { root, metadata_dir } )
    }

    pub fn root (&self)->&Path { &self.root }

    /// where an image of the given name goes. Images without a parsable date are filed under today
    pub fn image_path (&self, filename: &str)->PathBuf {
        let date = match image_date( filename) {
            Some(date) => date,
            None => {
                warn!("no capture date in {filename}, filing under current date");
                Utc::now().date_naive()
            }
        };
        self.root.join( date_dir( date)).join( filename)
    }

    pub fn store_image (&self, file: &ArchiveFile)->Result<PathBuf> {
        let path = self.image_path( &file.name);
        if let Some(dir) = path.parent() { fs::create_dir_all( dir)? }
        fs::write( &path, &file.contents)?;
        Ok(path)
    }

    pub fn store_metadata (&self, file: &ArchiveFile)->Result<PathBuf> {
        fs::create_dir_all( &self.metadata_dir)?;
        let path = self.metadata_dir.join( &file.name);
        fs::write( &path, &file.contents)?;
        Ok(path)
    }

    /// names of all images we have stored so far. Only files within `YEAR/DAY_OF_YEAR` directories
    /// count, which excludes metadata and whatever else lives in the root dir (cursor, ledger)
    pub fn stored_image_names (&self)->Result<Vec<String>> {
        let mut names = Vec::new();
        for year_dir in sub_dirs( &self.root)? {
            if year_dir == self.metadata_dir || !is_numeric_name( &year_dir, 4) { continue }
            for day_dir in sub_dirs( &year_dir)? {
                if !is_numeric_name( &day_dir, 3) { continue }
                for e in fs::read_dir( &day_dir)? {
                    let path = e?.path();
                    if path.is_file() && let Some(name) = path.file_name().and_then( |n| n.to_str()) {
                        names.push( name.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// is the last path component a `len` digit number (a `YEAR` or `DAY_OF_YEAR` dir)
fn is_numeric_name (path: &Path, len: usize)->bool {
    path.file_name().and_then( |n| n.to_str())
        .is_some_and( |n| n.len() == len && n.bytes().all( |b| b.is_ascii_digit()))
}

fn sub_dirs (dir: &Path)->Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for e in fs::read_dir( dir)? {
        let path = e?.path();
        if path.is_dir() { dirs.push( path) }
    }
    Ok(dirs)
}

/// the persisted cursor: a single integer as plain text.
/// Failing to read or write it is fatal since we would otherwise lose track of where we are
#[derive(Debug,Clone)]
pub struct CursorFile {
    path: PathBuf,
}

impl CursorFile {
    pub fn new (path: impl AsRef<Path>)->Self {
        CursorFile { path: path.as_ref().to_path_buf() }
    }

    pub fn path (&self)->&Path { &self.path }

    /// returns None if there is no persisted cursor yet
    pub fn read (&self)->Result<Option<u64>> {
        match fs::read_to_string( &self.path) {
            Ok(s) => {
                let cursor = s.trim().parse::<u64>()
                    .map_err( |e| state_error( format!("invalid cursor file {:?}: {e}", self.path)))?;
                Ok( Some(cursor))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err( state_error( format!("cannot read cursor file {:?}: {e}", self.path)))
        }
    }

    /// overwrite the cursor value. We write to a sibling file and rename so that a failed write
    /// never leaves a truncated cursor behind
    pub fn write (&self, cursor: u64)->Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let res = fs::File::create( &tmp)
            .and_then( |mut file| {
                writeln!( file, "{cursor}")?;
                file.sync_data()
            })
            .and_then( |_| fs::rename( &tmp, &self.path));

        res.map_err( |e| state_error( format!("cannot write cursor file {:?}: {e}", self.path)))
    }
}
