// Not every utils is used in every test, so we allow dead code
#![allow(unused_imports, dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use gcs_signer::{AuthMode, GcsSigner, SignerConfig};
use ring::signature::{UnparsedPublicKey, RSA_PKCS1_2048_8192_SHA256};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;
use url::Url;

mod token_server;
pub use token_server::*;

/// Service account email of the checked-in test key
pub const TEST_CLIENT_EMAIL: &str = "url-signer@signer-test-project.iam.gserviceaccount.com";

/// PKCS#1 DER public half of the test service account key
const TEST_PUBLIC_KEY_DER: &[u8] = include_bytes!("../fixtures/public_key.der");

/// Path of the throwaway service-account key used by the tests
pub fn fixture_credentials() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/service_account.json")
}

/// Builds a signer that signs locally with the fixture key
pub async fn key_only_signer() -> GcsSigner {
    let config = SignerConfig::new(fixture_credentials()).with_auth_mode(AuthMode::KeyOnly);
    GcsSigner::connect(&config, &CancellationToken::new())
        .await
        .expect("fixture credentials should build a key-only signer")
}

/// Writes `contents` to a temporary credentials file
pub fn credentials_file_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Fixture credentials as JSON, for tests that tweak single fields
pub fn fixture_json() -> serde_json::Value {
    let raw = std::fs::read_to_string(fixture_credentials()).unwrap();
    serde_json::from_str(&raw).unwrap()
}

/// Query parameters of a signed URL
pub fn query_params(url: &Url) -> HashMap<String, String> {
    url.query_pairs().into_owned().collect()
}

/// Parses the `X-Goog-Date` timestamp (`YYYYMMDDTHHMMSSZ`)
pub fn goog_date(url: &Url) -> DateTime<Utc> {
    let raw = &query_params(url)["X-Goog-Date"];
    NaiveDateTime::parse_from_str(&raw[..15], "%Y%m%dT%H%M%S")
        .unwrap()
        .and_utc()
}

/// Reads `X-Goog-Expires` in seconds
pub fn goog_expires(url: &Url) -> i64 {
    query_params(url)["X-Goog-Expires"].parse().unwrap()
}

/// Rebuilds the V4 string-to-sign from the URL and checks the signature against the fixture key.
///
/// The canonical request covers method, path, query (without the signature), and host,
/// so any change to bucket, object, host, or expiry invalidates the signature.
pub fn signature_is_valid(url: &Url) -> bool {
    let params = query_params(url);
    let Some(signature) = params.get("X-Goog-Signature") else {
        return false;
    };
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };

    let query = url.query().unwrap_or_default();
    let Some((canonical_query, _)) = query.split_once("&X-Goog-Signature=") else {
        return false;
    };

    let host = match url.port() {
        Some(port) => format!("{}:{port}", url.host_str().unwrap_or_default()),
        None => url.host_str().unwrap_or_default().to_string(),
    };

    let canonical_request = format!(
        "GET\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
        url.path().replace('+', "%20"),
        canonical_query,
        host
    );

    let Some((_, scope)) = params["X-Goog-Credential"].split_once('/') else {
        return false;
    };
    let string_to_sign = format!(
        "GOOG4-RSA-SHA256\n{}\n{}\n{}",
        params["X-Goog-Date"],
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, TEST_PUBLIC_KEY_DER)
        .verify(string_to_sign.as_bytes(), &signature)
        .is_ok()
}
