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

//! vault archive entries: retrieval, classification and unpacking

use std::{io::{Cursor,Read}, path::Path};
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::{Client, StatusCode, header::CONTENT_DISPOSITION};
use zip::read::ZipArchive;
use tracing::debug;

use crate::JunoCamConfig;
use crate::errors::{OdinJunoCamError, Result};

/// marker token of archives that contain image files
pub const IMAGE_MARKER: &str = "ImageSet";

/// marker token of archives that contain the metadata JSON of the preceding image set
pub const DATA_MARKER: &str = "Data";

/// stacked RGB renderings, which is what we want to publish
pub const COMPOSITE_MARKER: &str = "mapprojected";

/// raw sensor output, only used if there is no composite rendering
pub const RAW_MARKER: &str = "raw";

lazy_static! {
    static ref CD_FILENAME_RE: Regex = Regex::new( r#"filename=([^;]+)"#).unwrap();
}

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum ArchiveKind {
    Image,
    Data,
    Unrecognized,
    Empty // nothing published at this slot (yet)
}

/// classify a vault filename. This only looks at the first four characters (which have to be digits)
/// and the marker tokens
pub fn classify (filename: &str)->ArchiveKind {
    if !has_numeric_prefix( filename) {
        ArchiveKind::Unrecognized
    } else if filename.contains( IMAGE_MARKER) {
        ArchiveKind::Image
    } else if filename.contains( DATA_MARKER) {
        ArchiveKind::Data
    } else {
        ArchiveKind::Unrecognized
    }
}

fn has_numeric_prefix (filename: &str)->bool {
    let bs = filename.as_bytes();
    bs.len() >= 4 && bs[..4].iter().all( |b| b.is_ascii_digit())
}

/// get the (unquoted) filename from a Content-Disposition header value
pub fn filename_from_content_disposition (cd: &str)->Option<String> {
    CD_FILENAME_RE.captures( cd)
        .and_then( |cap| cap.get(1))
        .map( |m| unquote( m.as_str().trim()))
        .filter( |s| !s.is_empty())
        .map( |s| s.to_string())
}

fn unquote (s: &str)->&str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len()-1]
    } else {
        s
    }
}

/// what we got back from the vault for a given slot. Only lives for one loop iteration
#[derive(Debug,Clone)]
pub struct ArchiveEntry {
    pub slot: u64,
    pub filename: Option<String>,
    pub payload: Bytes,
}

impl ArchiveEntry {
    pub fn new (slot: u64, filename: impl ToString, payload: Bytes)->Self {
        ArchiveEntry { slot, filename: Some(filename.to_string()), payload }
    }

    pub fn empty (slot: u64)->Self {
        ArchiveEntry { slot, filename: None, payload: Bytes::new() }
    }

    pub fn kind (&self)->ArchiveKind {
        match &self.filename {
            Some(filename) => classify( filename),
            None => ArchiveKind::Empty
        }
    }

    pub fn unpack (&self)->Result<Vec<ArchiveFile>> {
        unpack( &self.payload)
    }
}

/// a regular file from within an archive, stripped of its archive directory
#[derive(Debug,Clone,PartialEq)]
pub struct ArchiveFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl ArchiveFile {
    pub fn len (&self)->u64 { self.contents.len() as u64 }
}

/// unpack all regular files of a zip payload in archive order
pub fn unpack (payload: &[u8])->Result<Vec<ArchiveFile>> {
    let mut archive = ZipArchive::new( Cursor::new( payload))?;
    let mut files = Vec::with_capacity( archive.len());

    for i in 0..archive.len() {
        let mut zf = archive.by_index(i)?;
        if zf.is_dir() { continue }

        let name = match zf.name().rsplit('/').next() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue
        };

        let mut contents = Vec::with_capacity( zf.size() as usize);
        zf.read_to_end( &mut contents)?;
        files.push( ArchiveFile { name, contents });
    }

    Ok(files)
}

/// unpack a zip payload into a directory, keeping the archive structure
pub fn unpack_to_dir (payload: &[u8], dir: impl AsRef<Path>)->Result<()> {
    let mut archive = ZipArchive::new( Cursor::new( payload))?;
    archive.extract( dir.as_ref())?;
    Ok(())
}

/// pick the image we want to publish: the first composite rendering, or else the first raw image
pub fn select_variant (files: &[ArchiveFile])->Option<&ArchiveFile> {
    files.iter().find( |f| f.name.contains( COMPOSITE_MARKER))
        .or_else( || files.iter().find( |f| f.name.contains( RAW_MARKER)))
}

/// the source of archive entries. Abstracted so that the loop does not depend on a live vault
#[allow(async_fn_in_trait)]
pub trait ArchiveSource {
    async fn fetch (&self, slot: u64)->Result<ArchiveEntry>;
}

/// the http client for the remote vault
pub struct VaultClient {
    client: Client,
    url: String,
    slot_param: String,
}

impl VaultClient {
    pub fn new (config: &JunoCamConfig)->Result<Self> {
        let client = Client::builder()
            .timeout( config.request_timeout)
            .build()?;

        Ok( VaultClient { client, url: config.vault_url.clone(), slot_param: config.slot_param.clone() } )
    }
}

impl ArchiveSource for VaultClient {
    async fn fetch (&self, slot: u64)->Result<ArchiveEntry> {
        let response = self.client.get( &self.url)
            .query( &[(self.slot_param.as_str(), slot.to_string())])
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err( OdinJunoCamError::HttpStatusError( status.as_u16()))
        }

        let filename = response.headers().get( CONTENT_DISPOSITION)
            .and_then( |v| v.to_str().ok())
            .and_then( filename_from_content_disposition);

        match filename {
            Some(filename) => {
                let payload = response.bytes().await?;
                debug!("slot {slot}: {filename} ({} bytes)", payload.len());
                Ok( ArchiveEntry::new( slot, filename, payload) )
            }
            None => {
                debug!("slot {slot}: no content-disposition (status {status})");
                Ok( ArchiveEntry::empty( slot) )
            }
        }
    }
}
