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

//! a minimal client for the X/Twitter API that implements [`Publisher`]. Requests are signed with
//! OAuth 1.0a (HMAC-SHA1) user credentials

use std::{env, time::Duration};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, distr::Alphanumeric};
use reqwest::{Client, Method, RequestBuilder, Response, header::AUTHORIZATION, multipart::{Form,Part}};
use serde::Deserialize;
use serde_json::json;
use sha1::Sha1;
use tracing::debug;

use crate::errors::{OdinJunoCamError, Result, op_failed};
use crate::publisher::{MediaHandle, Publisher};

const MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";
const MEDIA_METADATA_URL: &str = "https://upload.twitter.com/1.1/media/metadata/create.json";
const POST_URL: &str = "https://api.twitter.com/2/tweets";
const UPDATE_PROFILE_URL: &str = "https://api.twitter.com/1.1/account/update_profile.json";

pub const CONSUMER_KEY_VAR: &str = "CONSUMER_KEY";
pub const CONSUMER_SECRET_VAR: &str = "CONSUMER_SECRET";
pub const ACCESS_TOKEN_VAR: &str = "ACCESS_TOKEN";
pub const ACCESS_TOKEN_SECRET_VAR: &str = "ACCESS_TOKEN_SECRET";

/// RFC 3986 unreserved characters are the only ones that are not encoded
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// the four user-context secrets. Deliberately not Debug
#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl Credentials {
    pub fn from_env ()->Result<Self> {
        Ok( Credentials {
            consumer_key: env_var( CONSUMER_KEY_VAR)?,
            consumer_secret: env_var( CONSUMER_SECRET_VAR)?,
            access_token: env_var( ACCESS_TOKEN_VAR)?,
            access_token_secret: env_var( ACCESS_TOKEN_SECRET_VAR)?,
        })
    }
}

fn env_var (name: &str)->Result<String> {
    env::var( name).map_err( |_| OdinJunoCamError::ConfigParseError( format!("environment variable {name} not set")))
}

pub fn oauth_encode (s: &str)->String {
    utf8_percent_encode( s, OAUTH_ENCODE_SET).to_string()
}

/// `METHOD&url&params` with params encoded, sorted and joined
pub fn signature_base_string (method: &str, url: &str, params: &[(&str,&str)])->String {
    let mut encoded: Vec<(String,String)> = params.iter().map( |(k,v)| (oauth_encode(k), oauth_encode(v))).collect();
    encoded.sort();

    let param_string = encoded.iter()
        .map( |(k,v)| format!("{k}={v}"))
        .collect::<Vec<String>>()
        .join("&");

    format!("{}&{}&{}", method.to_ascii_uppercase(), oauth_encode(url), oauth_encode(&param_string))
}

pub fn oauth_signature (base_string: &str, consumer_secret: &str, token_secret: &str)->Result<String> {
    let key = format!("{}&{}", oauth_encode(consumer_secret), oauth_encode(token_secret));
    let mut mac = Hmac::<Sha1>::new_from_slice( key.as_bytes()).map_err( |e| op_failed!("invalid signing key: {e}"))?;
    mac.update( base_string.as_bytes());
    Ok( BASE64.encode( mac.finalize().into_bytes()) )
}

/// the `Authorization` header value for a request. `request_params` are the query/form parameters
/// that have to be included in the signature (JSON and multipart bodies are not)
pub fn authorization_header (credentials: &Credentials, method: &str, url: &str, request_params: &[(&str,&str)],
                             nonce: &str, timestamp: i64)->Result<String> {
    let timestamp = timestamp.to_string();
    let oauth_params: [(&str,&str);6] = [
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let mut params: Vec<(&str,&str)> = oauth_params.to_vec();
    params.extend_from_slice( request_params);

    let base_string = signature_base_string( method, url, &params);
    let signature = oauth_signature( &base_string, &credentials.consumer_secret, &credentials.access_token_secret)?;

    let mut fields: Vec<String> = oauth_params.iter().map( |(k,v)| format!("{}=\"{}\"", k, oauth_encode(v))).collect();
    fields.push( format!("oauth_signature=\"{}\"", oauth_encode(&signature)));
    fields.sort();

    Ok( format!("OAuth {}", fields.join(", ")) )
}

fn new_nonce ()->String {
    rand::rng().sample_iter( &Alphanumeric).take(32).map( char::from).collect()
}

#[derive(Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

pub struct TwitterClient {
    client: Client,
    credentials: Credentials,
}

impl TwitterClient {
    pub fn new (credentials: Credentials, timeout: Duration)->Result<Self> {
        let client = Client::builder().timeout( timeout).build()?;
        Ok( TwitterClient { client, credentials } )
    }

    fn signed_request (&self, method: Method, url: &str, request_params: &[(&str,&str)])->Result<RequestBuilder> {
        let auth = authorization_header( &self.credentials, method.as_str(), url, request_params, &new_nonce(), Utc::now().timestamp())?;
        Ok( self.client.request( method, url).header( AUTHORIZATION, auth) )
    }
}

async fn check_status (response: Response)->Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err( OdinJunoCamError::PublishError( format!("{status}: {body}")))
    }
}

impl Publisher for TwitterClient {
    async fn upload_media (&self, filename: &str, data: &[u8])->Result<MediaHandle> {
        let part = Part::bytes( data.to_vec()).file_name( filename.to_string());
        let form = Form::new().part( "media", part);

        let response = self.signed_request( Method::POST, MEDIA_UPLOAD_URL, &[])?
            .multipart( form)
            .send()
            .await?;
        let upload: MediaUploadResponse = check_status( response).await?.json().await?;
        debug!("uploaded {filename} as media {}", upload.media_id_string);

        Ok( MediaHandle( upload.media_id_string) )
    }

    async fn set_alt_text (&self, media: &MediaHandle, alt_text: &str)->Result<()> {
        let media_id = media.0.as_str();
        let body = json!({ "media_id": media_id, "alt_text": { "text": alt_text } });
        let response = self.signed_request( Method::POST, MEDIA_METADATA_URL, &[])?
            .json( &body)
            .send()
            .await?;
        check_status( response).await?;
        Ok(())
    }

    async fn publish_post (&self, caption: &str, media: &MediaHandle)->Result<()> {
        let media_id = media.0.as_str();
        let body = json!({ "text": caption, "media": { "media_ids": [ media_id ] } });
        let response = self.signed_request( Method::POST, POST_URL, &[])?
            .json( &body)
            .send()
            .await?;
        check_status( response).await?;
        Ok(())
    }

    async fn update_profile (&self, description: &str)->Result<()> {
        let params = [("description", description)];
        let response = self.signed_request( Method::POST, UPDATE_PROFILE_URL, &params)?
            .query( &params)
            .send()
            .await?;
        check_status( response).await?;
        Ok(())
    }
}
