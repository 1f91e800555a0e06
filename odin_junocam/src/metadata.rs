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

use serde_json::Value;

use crate::archive::{ArchiveFile, unpack};
use crate::errors::{OdinJunoCamError, Result, op_failed};

/// caption we publish if the data archive of an image could not be retrieved
pub const NO_METADATA_CAPTION: &str = "Could not retrieve metadata";

const NO_METADATA_ALT_TEXT: &str = "JunoCam image taken by the Juno spacecraft in orbit around Jupiter";

/// the attributes of an image set we use to compose captions.
/// Values are kept as strings since the source JSON is not consistent about numeric fields
#[derive(Debug,Clone,PartialEq)]
pub struct MetadataRecord {
    pub instrument: String,
    pub time: String,
    pub perijove: String,
    pub target: String,
    pub credit: String,
}

impl MetadataRecord {
    pub fn from_json (data: &[u8])->Result<Self> {
        let json: Value = serde_json::from_slice( data)?;

        Ok( MetadataRecord {
            instrument: json_string( &json, "INSTRUMENT_NAME")?,
            time: json_string( &json, "IMAGE_TIME")?,
            perijove: json_string( &json, "PJ")?,
            target: json_string( &json, "TARGET_NAME")?,
            credit: json_string( &json, "PRODUCER_ID")?,
        })
    }

    pub fn caption (&self)->String {
        format!("Perijove {}: {}, taken at {}, Target: {} (Image credit: {})",
            self.perijove, self.instrument, self.time, self.target, self.credit)
    }

    pub fn alt_text (&self)->String {
        format!("{} image of {} taken at {} during perijove {}", self.instrument, self.target, self.time, self.perijove)
    }
}

fn json_string (json: &Value, key: &str)->Result<String> {
    match json.get( key) {
        Some(Value::String(s)) => Ok( s.clone()),
        Some(Value::Null) | None => Err( op_failed!("missing metadata key {key}")),
        Some(v) => Ok( v.to_string())
    }
}

pub fn caption_for (metadata: Option<&MetadataRecord>)->String {
    metadata.map( |md| md.caption()).unwrap_or_else( || NO_METADATA_CAPTION.to_string())
}

pub fn alt_text_for (metadata: Option<&MetadataRecord>)->String {
    metadata.map( |md| md.alt_text()).unwrap_or_else( || NO_METADATA_ALT_TEXT.to_string())
}

/// unpack a data archive and parse its metadata JSON. If there are several we use the last one
pub fn metadata_from_archive (payload: &[u8])->Result<(ArchiveFile,MetadataRecord)> {
    let json_file = unpack( payload)?.into_iter()
        .filter( |f| f.name.to_ascii_lowercase().ends_with(".json"))
        .last()
        .ok_or_else( || op_failed!("no metadata JSON in data archive"))?;

    let record = MetadataRecord::from_json( &json_file.contents)?;
    Ok( (json_file, record) )
}
