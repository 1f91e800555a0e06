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

use std::io::ErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OdinJunoCamError>;

#[derive(Error,Debug)]
pub enum OdinJunoCamError {

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("http error {0}")]
    HttpError( #[from] reqwest::Error),

    #[error("http response status {0}")]
    HttpStatusError( u16 ),

    #[error("zip error {0}")]
    ZipError( #[from] zip::result::ZipError),

    #[error("serde error {0}")]
    SerdeError( #[from] serde_json::Error),

    #[error("config parse error {0}")]
    ConfigParseError( String ),

    /// the persisted cursor or ledger could not be read or written
    #[error("persisted state error {0}")]
    StateError( String ),

    #[error("publish error {0}")]
    PublishError( String ),

    #[error("operation failed {0}")]
    OpFailedError( String ),
}

impl OdinJunoCamError {

    /// errors that are worth retrying for the same slot (timeouts, connection resets, server hiccups)
    pub fn is_transient (&self)->bool {
        match self {
            OdinJunoCamError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            OdinJunoCamError::HttpStatusError(status) => *status == 429 || *status >= 500,
            _ => false
        }
    }

    /// errors the loop cannot recover from. Everything else is either transient or logged and skipped
    pub fn is_fatal (&self)->bool {
        match self {
            OdinJunoCamError::StateError(_) => true,
            OdinJunoCamError::IOError(e) => e.kind() == ErrorKind::StorageFull,
            _ => false
        }
    }
}

impl From<ron::error::SpannedError> for OdinJunoCamError {
    fn from (e: ron::error::SpannedError)->Self { OdinJunoCamError::ConfigParseError( e.to_string()) }
}

pub fn state_error (msg: impl ToString)->OdinJunoCamError {
    OdinJunoCamError::StateError(msg.to_string())
}

macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        OdinJunoCamError::OpFailedError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use op_failed;
