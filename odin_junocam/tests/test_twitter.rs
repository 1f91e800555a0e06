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

// run with "cargo test --test test_twitter -- --nocapture"

use odin_junocam::twitter::*;

const URL: &str = "https://api.twitter.com/1.1/statuses/update.json";
const NONCE: &str = "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg";
const TIMESTAMP: i64 = 1318622958;
const STATUS: &str = "Hello Ladies + Gentlemen, a signed OAuth request!";

fn credentials ()->Credentials {
    Credentials {
        consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
        consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
        access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
        access_token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
    }
}

#[test]
fn test_oauth_encode() {
    assert_eq!( oauth_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
    assert_eq!( oauth_encode("a-b.c_d~e"), "a-b.c_d~e");
    assert_eq!( oauth_encode("An encoded string!"), "An%20encoded%20string%21");
}

#[test]
fn test_signature() {
    let params = [
        ("status", STATUS),
        ("include_entities", "true"),
        ("oauth_consumer_key", "xvz1evFS4wEEPTGEFPHBog"),
        ("oauth_nonce", NONCE),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", "1318622958"),
        ("oauth_token", "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb"),
        ("oauth_version", "1.0"),
    ];

    let base = signature_base_string( "POST", URL, &params);
    assert_eq!( base, "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958%26oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521");

    let creds = credentials();
    let signature = oauth_signature( &base, &creds.consumer_secret, &creds.access_token_secret).unwrap();
    assert_eq!( signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
}

#[test]
fn test_authorization_header() {
    let params = [ ("include_entities", "true"), ("status", STATUS) ];
    let header = authorization_header( &credentials(), "POST", URL, &params, NONCE, TIMESTAMP).unwrap();

    assert!( header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\", oauth_nonce="));
    assert!( header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
    assert!( header.contains("oauth_timestamp=\"1318622958\""));
    assert!( !header.contains("status")); // request params are signed but not part of the header
}
