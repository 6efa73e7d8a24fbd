use anyhow::Result;
use eframe::egui;
use log::info;
use std::sync::Arc;
use std::time::Duration;

mod api_client;
mod camera_controller;
mod capture;
mod config;
mod session;
mod snapshot;
mod submit;
mod texture;
mod ui;

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::ui::StegoCamApp;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Starting StegoCam (gesture-keyed steganography client)");

    // Load configuration
    let config = Config::load()?;
    config.validate()?;
    info!("Backend endpoint: {}", config.server.base_url);

    let api = Arc::new(ApiClient::new(
        &config.server.base_url,
        Duration::from_secs(config.server.timeout_secs),
    )?);
    let runtime = tokio::runtime::Handle::current();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.display.width as f32, config.display.height as f32])
            .with_min_inner_size([900.0, 620.0]),
        ..Default::default()
    };

    info!("Launching GUI application...");

    eframe::run_native(
        "StegoCam",
        options,
        Box::new(move |cc| {
            setup_style(&cc.egui_ctx);
            Box::new(StegoCamApp::new(config, api, runtime))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run application: {e}"))?;

    info!("Application shut down gracefully");
    Ok(())
}

fn setup_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.spacing.button_padding = egui::vec2(12.0, 8.0);
    style.spacing.item_spacing = egui::vec2(10.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(12.0);

    style.text_styles.insert(
        egui::TextStyle::Button,
        egui::FontId::new(16.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Body,
        egui::FontId::new(15.0, egui::FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Heading,
        egui::FontId::new(22.0, egui::FontFamily::Proportional),
    );

    ctx.set_style(style);
}
