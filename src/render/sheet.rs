use std::path::Path;

use image::RgbaImage;

use crate::error::StartupError;

/// Decoded sprite sheet, RGBA8, ready for upload.
#[derive(Debug)]
pub struct SpriteSheet {
    pub width: u32,
    pub height: u32,
    pixels: RgbaImage,
}

impl SpriteSheet {
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let decoded = image::open(path).map_err(|source| StartupError::AssetLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let sheet = Self::from_image(decoded.into_rgba8());
        log::info!(
            "Loaded sprite sheet {}: {}x{}",
            path.display(),
            sheet.width,
            sheet.height
        );
        Ok(sheet)
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self {
            width: pixels.width(),
            height: pixels.height(),
            pixels,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Reject sheets the device cannot hold as a single 2D texture.
    pub fn check_fits(&self, max_dimension: u32) -> Result<(), StartupError> {
        if self.width == 0 || self.height == 0 {
            return Err(StartupError::Texture(format!(
                "sprite sheet is empty ({}x{})",
                self.width, self.height
            )));
        }
        if self.width > max_dimension || self.height > max_dimension {
            return Err(StartupError::Texture(format!(
                "sprite sheet {}x{} exceeds device limit {max_dimension}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// GPU copy of the sheet plus the bind group that samples it.
pub struct SheetTexture {
    pub texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
}

impl SheetTexture {
    pub fn size(&self) -> glam::Vec2 {
        let extent = self.texture.size();
        glam::Vec2::new(extent.width as f32, extent.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("catwalk-{}-{name}", std::process::id()))
    }

    #[test]
    fn loads_png_dimensions() {
        let path = temp_path("sheet.png");
        RgbaImage::from_pixel(8, 26, image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();

        let sheet = SpriteSheet::load(&path).unwrap();
        assert_eq!((sheet.width, sheet.height), (8, 26));
        assert_eq!(sheet.pixels().len(), 8 * 26 * 4);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_an_asset_error() {
        let err = SpriteSheet::load(Path::new("definitely/not/here.png")).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn garbage_file_is_an_asset_error() {
        let path = temp_path("garbage.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = SpriteSheet::load(&path).unwrap_err();
        assert!(matches!(err, StartupError::AssetLoad { .. }));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn oversized_or_empty_sheet_is_a_texture_error() {
        let sheet = SpriteSheet::from_image(RgbaImage::new(64, 64));
        assert!(sheet.check_fits(64).is_ok());
        assert_eq!(sheet.check_fits(32).unwrap_err().exit_code(), 5);

        let empty = SpriteSheet::from_image(RgbaImage::new(0, 0));
        assert_eq!(empty.check_fits(8192).unwrap_err().exit_code(), 5);
    }
}
