use egui::{Context, TextureOptions};
use image::RgbImage;

use crate::ui::CapturePane;

impl CapturePane {
    pub fn update_preview_texture(&mut self, ctx: &Context, image: &RgbImage) {
        // Skip invalid frames to prevent a white flash in the preview
        if image.width() == 0 || image.height() == 0 {
            return;
        }

        let size = [image.width() as usize, image.height() as usize];
        let pixels = image.as_flat_samples();

        let color_image = egui::ColorImage::from_rgb(size, pixels.as_slice());

        // Reuse the existing texture when the frame size is stable
        match &mut self.preview_texture {
            Some(texture) => {
                if texture.size() == size {
                    texture.set(color_image, TextureOptions::NEAREST);
                } else {
                    *texture =
                        ctx.load_texture(self.texture_name, color_image, TextureOptions::NEAREST);
                }
            }
            None => {
                let texture =
                    ctx.load_texture(self.texture_name, color_image, TextureOptions::NEAREST);
                self.preview_texture = Some(texture);
            }
        }
    }
}
