use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api_client::ApiError;
use crate::camera_controller::CameraController;
use crate::snapshot;
use crate::ui::{JobOutcome, Side, StegoCamApp};

impl StegoCamApp {
    /// Open the pane's webcam and start streaming. Failures surface a
    /// blocking alert; the pane's capture button stays disabled until a
    /// stream is live.
    pub fn start_camera(&mut self, side: Side) {
        let camera_config = self.config.camera.clone();

        // Release any previous stream for this pane before reopening
        self.pane_mut(side).camera = None;

        let result = CameraController::new(&camera_config).and_then(|mut controller| {
            controller.start_stream()?;
            Ok(controller)
        });

        match result {
            Ok(controller) => {
                let pane = self.pane_mut(side);
                pane.camera = Some(Arc::new(RwLock::new(controller)));
                pane.last_preview_update = None;
            }
            Err(e) => {
                self.show_alert(format!("Could not open webcam: {e}"));
            }
        }
    }

    pub fn stop_camera(&mut self, side: Side) {
        if let Some(camera) = self.pane_mut(side).camera.take() {
            if let Ok(mut camera_lock) = camera.try_write() {
                camera_lock.stop_stream();
            }
        }

        let pane = self.pane_mut(side);
        pane.preview_texture = None;
        pane.last_preview_update = None;
    }

    /// Grab the current frame, encode it as PNG and submit it for gesture
    /// estimation. The encode completes before the request is spawned.
    pub fn capture_gesture(&mut self, side: Side) {
        let Some(camera) = self.pane(side).camera.clone() else {
            self.show_alert("Camera is not running");
            return;
        };

        let frame = match camera.try_write() {
            Ok(mut camera_lock) => match camera_lock.capture_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    self.show_alert(format!("Capture failed: {e}"));
                    return;
                }
            },
            Err(_) => {
                self.show_alert("Camera busy");
                return;
            }
        };

        let png = match snapshot::encode_png(&frame) {
            Ok(png) => png,
            Err(e) => {
                self.show_alert(format!("Capture failed: {e}"));
                return;
            }
        };

        let seq = self.next_seq();
        {
            let pane = self.pane_mut(side);
            pane.last_snapshot = Some(frame);
            pane.estimate_seq = Some(seq);
        }
        log::info!("Submitting gesture estimate (seq {seq})");

        let api = Arc::clone(&self.api);
        let tx = self.jobs_tx.clone();
        self.runtime.spawn(async move {
            let result = api.estimate(png).await;
            let _ = tx.send(JobOutcome::Estimate { side, seq, result });
        });
    }

    /// Apply an estimate completion. Completions that are not the pane's
    /// newest request are stale and dropped.
    pub fn apply_estimate_outcome(&mut self, side: Side, seq: u64, result: Result<u32, ApiError>) {
        if self.pane(side).estimate_seq != Some(seq) {
            log::debug!("Ignoring stale estimate completion (seq {seq})");
            return;
        }
        self.pane_mut(side).estimate_seq = None;

        match result {
            Ok(count) => {
                self.pane_mut(side).last_gesture = Some(count);
                log::info!("Gesture cached: {count}");
            }
            Err(ApiError::Server { message, .. }) => self.show_alert(message),
            Err(e) => self.show_alert(format!("Error estimating gesture: {e}")),
        }
    }
}
