use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::api_client::{ApiError, DecryptRequest, EncryptRequest, GestureAux};
use crate::snapshot;
use crate::ui::{
    format_decrypt_success, format_error_status, CapturePane, JobOutcome, StegoCamApp,
};

/// Client-side preconditions for an encrypt submission. Violations are
/// reported before any request is constructed.
pub(crate) fn validate_encrypt_inputs(
    cover: Option<&Path>,
    message: &str,
    passcode: &str,
) -> Result<(), String> {
    if cover.is_none() {
        return Err("Choose a cover image".to_string());
    }
    if message.is_empty() || passcode.is_empty() {
        return Err("Enter message and passcode".to_string());
    }
    Ok(())
}

pub(crate) fn validate_decrypt_inputs(stego: Option<&Path>, passcode: &str) -> Result<(), String> {
    if stego.is_none() {
        return Err("Choose a stego image".to_string());
    }
    if passcode.is_empty() {
        return Err("Enter passcode".to_string());
    }
    Ok(())
}

/// Pick the auxiliary key field for a submission: the pane's cached gesture
/// when one exists, otherwise a freshly encoded snapshot of the last captured
/// frame, otherwise nothing.
fn gesture_aux(pane: &CapturePane) -> Result<GestureAux> {
    if let Some(gesture) = pane.last_gesture {
        return Ok(GestureAux::Gesture(gesture));
    }
    if let Some(frame) = &pane.last_snapshot {
        return Ok(GestureAux::Snapshot(snapshot::encode_png(frame)?));
    }
    Ok(GestureAux::None)
}

impl StegoCamApp {
    pub fn submit_encrypt(&mut self) {
        if let Err(message) = validate_encrypt_inputs(
            self.encrypt_form.cover_path.as_deref(),
            &self.encrypt_form.message,
            &self.encrypt_form.passcode,
        ) {
            self.show_alert(message);
            return;
        }
        let Some(cover_path) = self.encrypt_form.cover_path.clone() else {
            return;
        };

        let aux = match gesture_aux(&self.encode_pane) {
            Ok(aux) => aux,
            Err(e) => {
                self.show_alert(format!("Snapshot encoding failed: {e}"));
                return;
            }
        };

        let request = EncryptRequest {
            cover_path,
            message: self.encrypt_form.message.clone(),
            passcode: self.encrypt_form.passcode.clone(),
            aux,
        };

        let seq = self.next_seq();
        self.encrypt_form.pending_seq = Some(seq);
        self.encrypt_form.status = "Encrypting...".to_string();
        log::info!("Submitting encrypt request (seq {seq})");

        let api = Arc::clone(&self.api);
        let tx = self.jobs_tx.clone();
        self.runtime.spawn(async move {
            let result = api.encrypt(request).await;
            let _ = tx.send(JobOutcome::Encrypt { seq, result });
        });
    }

    pub fn submit_decrypt(&mut self) {
        if let Err(message) = validate_decrypt_inputs(
            self.decrypt_form.stego_path.as_deref(),
            &self.decrypt_form.passcode,
        ) {
            self.show_alert(message);
            return;
        }
        let Some(stego_path) = self.decrypt_form.stego_path.clone() else {
            return;
        };

        let aux = match gesture_aux(&self.decode_pane) {
            Ok(aux) => aux,
            Err(e) => {
                self.show_alert(format!("Snapshot encoding failed: {e}"));
                return;
            }
        };

        let request = DecryptRequest {
            stego_path,
            passcode: self.decrypt_form.passcode.clone(),
            aux,
        };

        let seq = self.next_seq();
        self.decrypt_form.pending_seq = Some(seq);
        self.decrypt_form.status = "Decrypting...".to_string();
        log::info!("Submitting decrypt request (seq {seq})");

        let api = Arc::clone(&self.api);
        let tx = self.jobs_tx.clone();
        self.runtime.spawn(async move {
            let result = api.decrypt(request).await;
            let _ = tx.send(JobOutcome::Decrypt { seq, result });
        });
    }

    pub fn apply_encrypt_outcome(&mut self, seq: u64, result: Result<Vec<u8>, ApiError>) {
        if self.encrypt_form.pending_seq != Some(seq) {
            log::debug!("Ignoring stale encrypt completion (seq {seq})");
            return;
        }
        self.encrypt_form.pending_seq = None;

        match result {
            Ok(bytes) => match self.save_stego_download(&bytes) {
                Ok(path) => {
                    log::info!("Stego image saved to {}", path.display());
                    self.encrypt_form.status = "Encrypted file downloaded.".to_string();
                }
                Err(e) => {
                    self.encrypt_form.status = format!("Error: {e}");
                }
            },
            Err(e) => {
                self.encrypt_form.status = format_error_status(&e);
            }
        }
    }

    pub fn apply_decrypt_outcome(&mut self, seq: u64, result: Result<String, ApiError>) {
        if self.decrypt_form.pending_seq != Some(seq) {
            log::debug!("Ignoring stale decrypt completion (seq {seq})");
            return;
        }
        self.decrypt_form.pending_seq = None;

        match result {
            Ok(message) => {
                self.decrypt_form.status = format_decrypt_success(&message);
            }
            Err(e) => {
                self.decrypt_form.status = format_error_status(&e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Side;
    use std::path::PathBuf;

    #[test]
    fn encrypt_validation_requires_all_inputs() {
        let cover = PathBuf::from("cover.png");

        assert_eq!(
            validate_encrypt_inputs(None, "msg", "pass"),
            Err("Choose a cover image".to_string())
        );
        assert_eq!(
            validate_encrypt_inputs(Some(&cover), "", "pass"),
            Err("Enter message and passcode".to_string())
        );
        assert_eq!(
            validate_encrypt_inputs(Some(&cover), "msg", ""),
            Err("Enter message and passcode".to_string())
        );
        assert!(validate_encrypt_inputs(Some(&cover), "msg", "pass").is_ok());
    }

    #[test]
    fn decrypt_validation_requires_all_inputs() {
        let stego = PathBuf::from("stego.png");

        assert_eq!(
            validate_decrypt_inputs(None, "pass"),
            Err("Choose a stego image".to_string())
        );
        assert_eq!(
            validate_decrypt_inputs(Some(&stego), ""),
            Err("Enter passcode".to_string())
        );
        assert!(validate_decrypt_inputs(Some(&stego), "pass").is_ok());
    }

    #[test]
    fn aux_prefers_cached_gesture() {
        let mut pane = CapturePane::new(Side::Encode);
        pane.last_gesture = Some(3);
        pane.last_snapshot = Some(image::RgbImage::new(2, 2));

        match gesture_aux(&pane).unwrap() {
            GestureAux::Gesture(3) => {}
            other => panic!("unexpected aux: {other:?}"),
        }
    }

    #[test]
    fn aux_falls_back_to_reencoded_snapshot() {
        let mut pane = CapturePane::new(Side::Encode);
        pane.last_snapshot = Some(image::RgbImage::new(2, 2));

        match gesture_aux(&pane).unwrap() {
            GestureAux::Snapshot(png) => {
                assert_eq!(&png[..4], &[0x89, b'P', b'N', b'G']);
            }
            other => panic!("unexpected aux: {other:?}"),
        }
    }

    #[test]
    fn aux_is_empty_without_any_capture() {
        let pane = CapturePane::new(Side::Decode);
        assert!(matches!(gesture_aux(&pane).unwrap(), GestureAux::None));
    }
}
