use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;

/// Errors surfaced by the backend API client.
///
/// `Server` carries a message supplied (or defaulted) from the backend's JSON
/// error body; everything else is a client-side transport or decode failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Network(String),
    #[error("{message}")]
    Server { status: u16, message: String },
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    Io(String),
}

/// Auxiliary key material attached to encrypt/decrypt submissions.
///
/// At most one of the gesture value or a snapshot blob is ever sent; the
/// backend estimates the gesture itself when it receives a snapshot.
#[derive(Debug, Clone)]
pub enum GestureAux {
    Gesture(u32),
    Snapshot(Vec<u8>),
    None,
}

#[derive(Debug, Clone)]
pub struct EncryptRequest {
    pub cover_path: PathBuf,
    pub message: String,
    pub passcode: String,
    pub aux: GestureAux,
}

#[derive(Debug, Clone)]
pub struct DecryptRequest {
    pub stego_path: PathBuf,
    pub passcode: String,
    pub aux: GestureAux,
}

#[derive(Debug, Deserialize)]
struct EstimateResponse {
    count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DecryptResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    error: Option<String>,
}

/// HTTP client for the steganography backend.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit a snapshot to `/api/estimate` and return the gesture count.
    pub async fn estimate(&self, snapshot_png: Vec<u8>) -> Result<u32, ApiError> {
        log::debug!("Estimating gesture from {} byte snapshot", snapshot_png.len());

        let form = Form::new().part("snapshot", png_part(snapshot_png)?);

        let resp = self
            .client
            .post(self.endpoint("/api/estimate"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            let body: EstimateResponse = resp
                .json()
                .await
                .map_err(|e| ApiError::Decode(format!("Estimate response: {e}")))?;
            log::debug!("Gesture estimated: {}", body.count);
            Ok(body.count)
        } else {
            let message =
                error_body_message(resp, "Failed to estimate gesture", "Failed to estimate gesture")
                    .await;
            Err(ApiError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Submit a cover image, message and passcode to `/api/encrypt`.
    ///
    /// Returns the raw stego PNG bytes on success.
    pub async fn encrypt(&self, request: EncryptRequest) -> Result<Vec<u8>, ApiError> {
        log::debug!("Encrypting with cover {}", request.cover_path.display());

        let form = Form::new()
            .part("cover", file_part(&request.cover_path).await?)
            .text("message", request.message)
            .text("passcode", request.passcode);
        let form = attach_aux(form, request.aux)?;

        let resp = self
            .client
            .post(self.endpoint("/api/encrypt"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = error_body_message(resp, "Failed to encrypt", "Unknown error").await;
            return Err(ApiError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        log::debug!("Received {} byte stego image", bytes.len());
        Ok(bytes.to_vec())
    }

    /// Submit a stego image and passcode to `/api/decrypt`.
    ///
    /// The backend answers with JSON on every status code, so the body is
    /// parsed unconditionally and `success` decides the outcome.
    pub async fn decrypt(&self, request: DecryptRequest) -> Result<String, ApiError> {
        log::debug!("Decrypting {}", request.stego_path.display());

        let form = Form::new()
            .part("stego", file_part(&request.stego_path).await?)
            .text("passcode", request.passcode);
        let form = attach_aux(form, request.aux)?;

        let resp = self
            .client
            .post(self.endpoint("/api/decrypt"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status();
        let body: DecryptResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("Decrypt response: {e}")))?;

        if status.is_success() && body.success {
            Ok(body.message.unwrap_or_default())
        } else {
            let message = body
                .message
                .or(body.error)
                .unwrap_or_else(|| "Failed to decrypt".to_string());
            Err(ApiError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Extract the `error` field from a JSON error body.
///
/// `missing` is used when the body parses but carries no `error` field,
/// `unparsable` when the body is not JSON at all.
async fn error_body_message(resp: reqwest::Response, missing: &str, unparsable: &str) -> String {
    match resp.json::<ErrorBody>().await {
        Ok(body) => body.error.unwrap_or_else(|| missing.to_string()),
        Err(_) => unparsable.to_string(),
    }
}

fn png_part(bytes: Vec<u8>) -> Result<Part, ApiError> {
    Part::bytes(bytes)
        .file_name("snap.png")
        .mime_str("image/png")
        .map_err(|e| ApiError::Decode(format!("Invalid snapshot mime: {e}")))
}

async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::Io(format!("{}: {e}", path.display())))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime.essence_str())
        .map_err(|e| ApiError::Decode(format!("Invalid upload mime: {e}")))
}

fn attach_aux(form: Form, aux: GestureAux) -> Result<Form, ApiError> {
    match aux {
        GestureAux::Gesture(value) => Ok(form.text("gesture", value.to_string())),
        GestureAux::Snapshot(png) => Ok(form.part("snapshot", png_part(png)?)),
        GestureAux::None => Ok(form),
    }
}
