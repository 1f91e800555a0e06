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

// run with "cargo test --test test_metadata -- --nocapture"

mod common;
use common::*;

use odin_junocam::{caption_for, metadata_from_archive, MetadataRecord, NO_METADATA_CAPTION};

#[test]
fn test_parse_metadata() {
    let md = MetadataRecord::from_json( METADATA_JSON.as_bytes()).unwrap();
    assert_eq!( md.instrument, "JUNO EPO CAMERA");
    assert_eq!( md.perijove, "21"); // numeric in the source
    assert_eq!( md.target, "JUPITER");

    assert_eq!( md.caption(),
        "Perijove 21: JUNO EPO CAMERA, taken at 2019-07-21T04:59:22.000, Target: JUPITER (Image credit: NASA / JPL / SwRI / MSSS)");
}

#[test]
fn test_missing_key() {
    let json = r#"{ "INSTRUMENT_NAME": "JUNO EPO CAMERA", "IMAGE_TIME": "2019-07-21T04:59:22.000" }"#;
    assert!( MetadataRecord::from_json( json.as_bytes()).is_err());
    assert!( MetadataRecord::from_json( b"not json").is_err());
}

#[test]
fn test_fallback_caption() {
    assert_eq!( caption_for( None), NO_METADATA_CAPTION);

    let md = MetadataRecord::from_json( METADATA_JSON.as_bytes()).unwrap();
    assert_eq!( caption_for( Some(&md)), md.caption());
}

#[test]
fn test_metadata_from_archive() {
    let entry = data_archive( 12346, METADATA_JSON);
    let (file, md) = metadata_from_archive( &entry.payload).unwrap();
    assert_eq!( file.name, "12346-Metadata.json");
    assert_eq!( md.credit, "NASA / JPL / SwRI / MSSS");

    let no_json = zip_payload( &[ ("DataSet/readme.txt", "nothing here") ]);
    assert!( metadata_from_archive( &no_json).is_err());
}
