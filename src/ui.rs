use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{unbounded, Receiver, Sender};
use eframe::egui;
use tokio::sync::RwLock;

use crate::api_client::{ApiClient, ApiError};
use crate::camera_controller::CameraController;
use crate::config::Config;

// ============================================================================
// CONSTANTS FOR UI STYLING
// ============================================================================
const UI_PADDING: f32 = 12.0;
const PREVIEW_MAX_WIDTH: f32 = 420.0;
const PREVIEW_INTERVAL_MS: u64 = 33;

// ============================================================================
// ENUMS
// ============================================================================

/// Which capture pane a camera/gesture action belongs to. The two panes share
/// behavior but never state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Encode,
    Decode,
}

/// Completed background work, delivered back to the UI thread over the job
/// channel and applied on the next frame.
pub enum JobOutcome {
    Estimate {
        side: Side,
        seq: u64,
        result: Result<u32, ApiError>,
    },
    Encrypt {
        seq: u64,
        result: Result<Vec<u8>, ApiError>,
    },
    Decrypt {
        seq: u64,
        result: Result<String, ApiError>,
    },
}

// ============================================================================
// PANE AND FORM STATE
// ============================================================================

pub struct CapturePane {
    pub side: Side,
    pub camera: Option<Arc<RwLock<CameraController>>>,
    pub preview_texture: Option<egui::TextureHandle>,
    pub texture_name: &'static str,
    pub last_preview_update: Option<Instant>,
    pub last_snapshot: Option<image::RgbImage>,
    pub last_gesture: Option<u32>,
    // Sequence number of the newest estimate request; older completions are
    // stale and ignored.
    pub estimate_seq: Option<u64>,
}

impl CapturePane {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            camera: None,
            preview_texture: None,
            texture_name: match side {
                Side::Encode => "preview_encode",
                Side::Decode => "preview_decode",
            },
            last_preview_update: None,
            last_snapshot: None,
            last_gesture: None,
            estimate_seq: None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.camera.is_some()
    }
}

#[derive(Default)]
pub struct EncryptForm {
    pub cover_path: Option<PathBuf>,
    pub message: String,
    pub passcode: String,
    pub status: String,
    pub pending_seq: Option<u64>,
}

#[derive(Default)]
pub struct DecryptForm {
    pub stego_path: Option<PathBuf>,
    pub passcode: String,
    pub status: String,
    pub pending_seq: Option<u64>,
}

// ============================================================================
// MAIN APP STRUCT
// ============================================================================

pub struct StegoCamApp {
    pub config: Config,
    pub api: Arc<ApiClient>,
    pub runtime: tokio::runtime::Handle,

    pub jobs_tx: Sender<JobOutcome>,
    pub jobs_rx: Receiver<JobOutcome>,
    pub seq_counter: u64,

    pub encode_pane: CapturePane,
    pub decode_pane: CapturePane,
    pub encrypt_form: EncryptForm,
    pub decrypt_form: DecryptForm,

    pub alert: Option<String>,
    pub session_folder: Option<String>,
}

impl StegoCamApp {
    pub fn new(config: Config, api: Arc<ApiClient>, runtime: tokio::runtime::Handle) -> Self {
        let (jobs_tx, jobs_rx) = unbounded();

        Self {
            config,
            api,
            runtime,
            jobs_tx,
            jobs_rx,
            seq_counter: 0,
            encode_pane: CapturePane::new(Side::Encode),
            decode_pane: CapturePane::new(Side::Decode),
            encrypt_form: EncryptForm::default(),
            decrypt_form: DecryptForm::default(),
            alert: None,
            session_folder: None,
        }
    }

    pub fn pane(&self, side: Side) -> &CapturePane {
        match side {
            Side::Encode => &self.encode_pane,
            Side::Decode => &self.decode_pane,
        }
    }

    pub fn pane_mut(&mut self, side: Side) -> &mut CapturePane {
        match side {
            Side::Encode => &mut self.encode_pane,
            Side::Decode => &mut self.decode_pane,
        }
    }

    pub fn next_seq(&mut self) -> u64 {
        self.seq_counter += 1;
        self.seq_counter
    }

    pub fn show_alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("Alert: {message}");
        self.alert = Some(message);
    }
}

// ============================================================================
// MAIN UPDATE LOOP
// ============================================================================

impl eframe::App for StegoCamApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_jobs();

        // Refresh camera previews at ~30 FPS while a stream is live
        self.refresh_preview(ctx, Side::Encode);
        self.refresh_preview(ctx, Side::Decode);
        if self.encode_pane.is_streaming() || self.decode_pane.is_streaming() {
            ctx.request_repaint();
        }

        // Keep polling while background requests are in flight
        if self.encrypt_form.pending_seq.is_some()
            || self.decrypt_form.pending_seq.is_some()
            || self.encode_pane.estimate_seq.is_some()
            || self.decode_pane.estimate_seq.is_some()
        {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        self.render_ui(ctx);
        self.render_alert(ctx);
    }
}

impl StegoCamApp {
    /// Drain completed background jobs and apply them to UI state.
    fn poll_jobs(&mut self) {
        while let Ok(outcome) = self.jobs_rx.try_recv() {
            match outcome {
                JobOutcome::Estimate { side, seq, result } => {
                    self.apply_estimate_outcome(side, seq, result);
                }
                JobOutcome::Encrypt { seq, result } => {
                    self.apply_encrypt_outcome(seq, result);
                }
                JobOutcome::Decrypt { seq, result } => {
                    self.apply_decrypt_outcome(seq, result);
                }
            }
        }
    }

    fn refresh_preview(&mut self, ctx: &egui::Context, side: Side) {
        let now = Instant::now();
        let due = match self.pane(side).last_preview_update {
            None => true,
            Some(last) => now.duration_since(last) >= Duration::from_millis(PREVIEW_INTERVAL_MS),
        };
        if !due {
            return;
        }

        let Some(camera) = self.pane(side).camera.clone() else {
            return;
        };

        let frame = match camera.try_write() {
            Ok(mut camera_lock) => camera_lock.capture_frame().ok(),
            Err(_) => None,
        };

        if let Some(frame) = frame {
            let pane = self.pane_mut(side);
            pane.update_preview_texture(ctx, &frame);
            pane.last_preview_update = Some(now);
        }
    }

    fn render_ui(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("StegoCam");
            ui.label("Conceal a message in an image, keyed by passcode and hand gesture.");
            ui.add_space(UI_PADDING);

            ui.columns(2, |columns| {
                self.render_encode_column(&mut columns[0]);
                self.render_decode_column(&mut columns[1]);
            });
        });
    }

    fn render_encode_column(&mut self, ui: &mut egui::Ui) {
        ui.heading("Encrypt");
        self.render_camera_controls(ui, Side::Encode);
        ui.separator();

        ui.horizontal(|ui| {
            if ui.button("Choose cover image...").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image Files", &["png", "jpg", "jpeg"])
                    .pick_file()
                {
                    self.encrypt_form.cover_path = Some(path);
                }
            }
            if let Some(path) = &self.encrypt_form.cover_path {
                ui.label(file_label(path));
            }
        });

        ui.label("Message");
        ui.add(
            egui::TextEdit::multiline(&mut self.encrypt_form.message)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        ui.label("Passcode");
        ui.add(egui::TextEdit::singleline(&mut self.encrypt_form.passcode).password(true));

        ui.add_space(4.0);
        let pending = self.encrypt_form.pending_seq.is_some();
        if ui.add_enabled(!pending, egui::Button::new("Encrypt")).clicked() {
            self.submit_encrypt();
        }

        if !self.encrypt_form.status.is_empty() {
            ui.label(&self.encrypt_form.status);
        }
    }

    fn render_decode_column(&mut self, ui: &mut egui::Ui) {
        ui.heading("Decrypt");
        self.render_camera_controls(ui, Side::Decode);
        ui.separator();

        ui.horizontal(|ui| {
            if ui.button("Choose stego image...").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image Files", &["png", "jpg", "jpeg"])
                    .pick_file()
                {
                    self.decrypt_form.stego_path = Some(path);
                }
            }
            if let Some(path) = &self.decrypt_form.stego_path {
                ui.label(file_label(path));
            }
        });

        ui.label("Passcode");
        ui.add(egui::TextEdit::singleline(&mut self.decrypt_form.passcode).password(true));

        ui.add_space(4.0);
        let pending = self.decrypt_form.pending_seq.is_some();
        if ui.add_enabled(!pending, egui::Button::new("Decrypt")).clicked() {
            self.submit_decrypt();
        }

        if !self.decrypt_form.status.is_empty() {
            ui.label(&self.decrypt_form.status);
        }
    }

    fn render_camera_controls(&mut self, ui: &mut egui::Ui, side: Side) {
        let streaming = self.pane(side).is_streaming();

        ui.horizontal(|ui| {
            if ui.button("Start camera").clicked() {
                self.start_camera(side);
            }
            if ui.add_enabled(streaming, egui::Button::new("Stop camera")).clicked() {
                self.stop_camera(side);
            }
            if ui
                .add_enabled(streaming, egui::Button::new("Capture gesture"))
                .clicked()
            {
                self.capture_gesture(side);
            }
        });

        if let Some(texture) = self.pane(side).preview_texture.clone() {
            let size = texture.size_vec2();
            let width = ui.available_width().min(PREVIEW_MAX_WIDTH);
            let scale = (width / size.x).min(1.0);
            ui.add(egui::Image::new(&texture).fit_to_exact_size(size * scale));
        } else if streaming {
            ui.label("Waiting for camera...");
        }

        if let Some(gesture) = self.pane(side).last_gesture {
            ui.label(format_gesture_label(gesture));
        }
    }

    fn render_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.alert.clone() else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("Alert")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(4.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.alert = None;
        }
    }
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

pub(crate) fn format_gesture_label(count: u32) -> String {
    format!("gesture: {count}")
}

pub(crate) fn format_error_status(error: &ApiError) -> String {
    format!("Error: {error}")
}

pub(crate) fn format_decrypt_success(message: &str) -> String {
    format!("Decrypted message: {message}")
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gesture_label_format() {
        assert_eq!(format_gesture_label(3), "gesture: 3");
        assert_eq!(format_gesture_label(0), "gesture: 0");
    }

    #[test]
    fn error_status_shows_server_message() {
        let error = ApiError::Server {
            status: 400,
            message: "bad passcode".to_string(),
        };
        assert_eq!(format_error_status(&error), "Error: bad passcode");
    }

    #[test]
    fn error_status_shows_transport_text() {
        let error = ApiError::Network("connection refused".to_string());
        assert_eq!(format_error_status(&error), "Error: connection refused");
    }

    #[test]
    fn decrypt_success_format() {
        assert_eq!(format_decrypt_success("hello"), "Decrypted message: hello");
    }

    #[test]
    fn panes_start_isolated_and_idle() {
        let pane = CapturePane::new(Side::Encode);
        assert!(!pane.is_streaming());
        assert!(pane.last_gesture.is_none());
        assert!(pane.last_snapshot.is_none());
        assert_ne!(
            CapturePane::new(Side::Encode).texture_name,
            CapturePane::new(Side::Decode).texture_name
        );
    }
}
