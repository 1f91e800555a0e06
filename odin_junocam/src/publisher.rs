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

//! the publishing collaborator. The loop only needs to upload media, attach alt text and post,
//! all of which are remote calls that can fail

use std::{cell::Cell, time::Duration};
use tokio::time::sleep;
use tracing::{info,warn,error};

use crate::errors::Result;

/// opaque id of uploaded media as returned by the publishing platform
#[derive(Debug,Clone,PartialEq,Eq)]
pub struct MediaHandle(pub String);

#[allow(async_fn_in_trait)]
pub trait Publisher {
    async fn upload_media (&self, filename: &str, data: &[u8])->Result<MediaHandle>;

    /// optional side channel for accessible descriptions of uploaded media
    async fn set_alt_text (&self, _media: &MediaHandle, _alt_text: &str)->Result<()> { Ok(()) }

    async fn publish_post (&self, caption: &str, media: &MediaHandle)->Result<()>;

    /// optional account profile update (we use it to show the current vault slot)
    async fn update_profile (&self, _description: &str)->Result<()> { Ok(()) }
}

/// everything we need to publish one image
#[derive(Debug)]
pub struct Post<'a> {
    pub filename: &'a str,
    pub data: &'a [u8],
    pub caption: String,
    pub alt_text: String,
}

/// upload and post with up to `max_attempts` tries, sleeping `backoff * attempt` between them.
/// Returns true if the post went out. Failures are logged, never propagated - the image is already
/// stored at this point
pub async fn publish_with_retry<P: Publisher> (publisher: &P, post: &Post<'_>, max_attempts: u32, backoff: Duration)->bool {
    for attempt in 1..=max_attempts {
        match publish( publisher, post).await {
            Ok(()) => {
                info!("published {} (attempt {attempt})", post.filename);
                return true
            }
            Err(e) => {
                warn!("publishing {} failed (attempt {attempt}/{max_attempts}): {e}", post.filename);
                if attempt < max_attempts {
                    sleep( backoff * attempt).await;
                }
            }
        }
    }

    error!("giving up on publishing {}", post.filename);
    false
}

async fn publish<P: Publisher> (publisher: &P, post: &Post<'_>)->Result<()> {
    let media = publisher.upload_media( post.filename, post.data).await?;

    if let Err(e) = publisher.set_alt_text( &media, &post.alt_text).await {
        warn!("failed to set alt text for {}: {e}", post.filename);
    }

    publisher.publish_post( &post.caption, &media).await
}

/// a publisher that only logs, used for dry runs
#[derive(Debug,Default)]
pub struct LogPublisher {
    n_uploads: Cell<u64>,
}

impl LogPublisher {
    pub fn new ()->Self { LogPublisher::default() }
}

impl Publisher for LogPublisher {
    async fn upload_media (&self, filename: &str, data: &[u8])->Result<MediaHandle> {
        let n = self.n_uploads.get() + 1;
        self.n_uploads.set(n);
        info!("(dry run) upload {filename} ({} bytes)", data.len());
        Ok( MediaHandle( format!("dry-run-{n}")) )
    }

    async fn set_alt_text (&self, media: &MediaHandle, alt_text: &str)->Result<()> {
        info!("(dry run) alt text for {}: {alt_text}", media.0);
        Ok(())
    }

    async fn publish_post (&self, caption: &str, media: &MediaHandle)->Result<()> {
        info!("(dry run) post with {}: {caption}", media.0);
        Ok(())
    }

    async fn update_profile (&self, description: &str)->Result<()> {
        info!("(dry run) profile: {description}");
        Ok(())
    }
}
