use anyhow::{anyhow, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;

use crate::config::CameraConfig;

/// Webcam controller for a single capture pane.
///
/// Each pane owns its controller exclusively; the stream handle is tracked so
/// it can be released on stop, on re-start and on drop.
pub struct CameraController {
    device_index: u32,
    width: u32,
    height: u32,
    frame_rate: u32,
    camera: Option<Camera>,
}

impl CameraController {
    /// Create a controller for the configured device, probing that the device
    /// actually exists before any stream is opened.
    pub fn new(config: &CameraConfig) -> Result<Self> {
        log::info!("Initializing camera controller for device {}", config.device_index);

        let devices = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| anyhow!("Camera enumeration failed: {e}"))?;

        if devices.is_empty() {
            return Err(anyhow!("No camera devices found"));
        }

        if config.device_index as usize >= devices.len() {
            return Err(anyhow!(
                "Camera index {} out of range ({} device(s) available)",
                config.device_index,
                devices.len()
            ));
        }

        Ok(Self {
            device_index: config.device_index,
            width: config.width,
            height: config.height,
            frame_rate: config.frame_rate,
            camera: None,
        })
    }

    pub fn start_stream(&mut self) -> Result<()> {
        // Release any previous stream before reopening
        self.stop_stream();

        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(self.width, self.height),
                FrameFormat::MJPEG,
                self.frame_rate,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(self.device_index), format)
            .map_err(|e| anyhow!("Failed to open camera {}: {e}", self.device_index))?;

        camera
            .open_stream()
            .map_err(|e| anyhow!("Failed to start camera stream: {e}"))?;

        log::info!(
            "Camera stream started ({}x{} @ {} fps requested)",
            self.width,
            self.height,
            self.frame_rate
        );
        self.camera = Some(camera);
        Ok(())
    }

    pub fn stop_stream(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop camera stream cleanly: {e}");
            } else {
                log::info!("Camera stream stopped");
            }
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.camera.is_some()
    }

    /// Grab the current frame at its native resolution.
    pub fn capture_frame(&mut self) -> Result<RgbImage> {
        let camera = self
            .camera
            .as_mut()
            .ok_or_else(|| anyhow!("Camera stream not started"))?;

        let frame = camera
            .frame()
            .map_err(|e| anyhow!("Frame capture failed: {e}"))?;

        let image = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| anyhow!("Frame decode failed: {e}"))?;

        log::debug!("Captured frame: {}x{}", image.width(), image.height());
        Ok(image)
    }
}

impl Drop for CameraController {
    fn drop(&mut self) {
        self.stop_stream();
        log::debug!("Camera controller dropped");
    }
}
