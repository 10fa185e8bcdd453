use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use log::{debug, error, warn};

use crate::error::TextureError;

/// Channel layout of a decoded 8-bit image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Red,
    Rgb,
    Rgba,
}

impl PixelFormat {
    /// Maps a decoded channel count to a texture format. Counts other than
    /// 1, 3 and 4 are treated as RGB.
    pub fn from_channels(channels: u8) -> Self {
        Self::from_channels_strict(channels).unwrap_or_else(|err| {
            warn!("{err}; treating image as RGB");
            Self::Rgb
        })
    }

    pub fn from_channels_strict(channels: u8) -> Result<Self, TextureError> {
        match channels {
            1 => Ok(Self::Red),
            3 => Ok(Self::Rgb),
            4 => Ok(Self::Rgba),
            other => Err(TextureError::UnsupportedChannels(other)),
        }
    }
}

/// How an image file is turned into texture data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Store the bottom row first, matching GL texture coordinates.
    pub flip_vertically: bool,
    pub mipmaps: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            flip_vertically: false,
            mipmaps: true,
        }
    }
}

/// Tightly packed 8-bit pixels ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn decode(path: &Path, options: DecodeOptions) -> Result<Self, TextureError> {
        let image = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let image = if options.flip_vertically {
            image.flipv()
        } else {
            image
        };
        Ok(Self::from_dynamic(&image))
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let format = PixelFormat::from_channels(image.color().channel_count());
        let pixels = match format {
            PixelFormat::Red => image.to_luma8().into_raw(),
            PixelFormat::Rgb => image.to_rgb8().into_raw(),
            PixelFormat::Rgba => image.to_rgba8().into_raw(),
        };
        Self {
            width: image.width(),
            height: image.height(),
            format,
            pixels,
        }
    }

    fn to_dynamic(&self) -> Option<DynamicImage> {
        let (width, height, pixels) = (self.width, self.height, self.pixels.clone());
        Some(match self.format {
            PixelFormat::Red => DynamicImage::ImageLuma8(GrayImage::from_raw(width, height, pixels)?),
            PixelFormat::Rgb => DynamicImage::ImageRgb8(RgbImage::from_raw(width, height, pixels)?),
            PixelFormat::Rgba => {
                DynamicImage::ImageRgba8(RgbaImage::from_raw(width, height, pixels)?)
            }
        })
    }

    /// Number of mip levels in a full chain down to 1x1.
    pub fn mip_level_count(&self) -> u32 {
        u32::BITS - self.width.max(self.height).max(1).leading_zeros()
    }

    /// The image itself followed by successively halved, linearly filtered
    /// levels down to 1x1.
    pub fn mip_chain(&self) -> Vec<TextureImage> {
        let mut levels = vec![self.clone()];
        let Some(source) = self.to_dynamic() else {
            return levels;
        };
        let (mut width, mut height) = (self.width, self.height);
        for _ in 1..self.mip_level_count() {
            width = (width / 2).max(1);
            height = (height / 2).max(1);
            let level = source.resize_exact(width, height, FilterType::Triangle);
            let mut level = Self::from_dynamic(&level);
            level.format = self.format;
            levels.push(level);
        }
        levels
    }

    /// Pixels expanded to four channels. Single-channel images keep their
    /// red channel only, the remaining channels are zero with full alpha.
    pub fn rgba_pixels(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba => self.pixels.clone(),
            PixelFormat::Rgb => self
                .pixels
                .chunks_exact(3)
                .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], u8::MAX])
                .collect(),
            PixelFormat::Red => self
                .pixels
                .iter()
                .flat_map(|&red| [red, 0, 0, u8::MAX])
                .collect(),
        }
    }
}

/// A texture that either loaded or is known to be missing. Missing textures
/// are rendered with a default texture instead of aborting.
#[derive(Clone, Debug, PartialEq)]
pub enum TextureSlot<T> {
    Ready(T),
    Missing,
}

impl<T> TextureSlot<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TextureSlot<U> {
        match self {
            Self::Ready(value) => TextureSlot::Ready(f(value)),
            Self::Missing => TextureSlot::Missing,
        }
    }
}

/// Texture file bound to a texture unit during scene setup.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureRequest {
    pub path: PathBuf,
    pub unit: u32,
    pub options: DecodeOptions,
}

/// Decodes `path`, logging and returning [`TextureSlot::Missing`] on failure.
pub fn load_texture(path: &Path, options: DecodeOptions) -> TextureSlot<TextureImage> {
    match TextureImage::decode(path, options) {
        Ok(image) => {
            debug!(
                "loaded {} ({}x{}, {:?})",
                path.display(),
                image.width,
                image.height,
                image.format
            );
            TextureSlot::Ready(image)
        }
        Err(err) => {
            error!("{err}");
            TextureSlot::Missing
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayAlphaImage, Luma, LumaA, Rgba};
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn channel_counts_map_to_formats() {
        assert_eq!(PixelFormat::from_channels(1), PixelFormat::Red);
        assert_eq!(PixelFormat::from_channels(3), PixelFormat::Rgb);
        assert_eq!(PixelFormat::from_channels(4), PixelFormat::Rgba);
        assert_eq!(PixelFormat::from_channels(2), PixelFormat::Rgb);
        assert!(PixelFormat::from_channels_strict(2).is_err());
    }

    #[test]
    fn decodes_and_flips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gradient.png");
        let mut image = RgbaImage::new(1, 2);
        image.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        image.put_pixel(0, 1, Rgba([0, 0, 255, 128]));
        image.save(&path).unwrap();

        let upright = TextureImage::decode(&path, DecodeOptions::default()).unwrap();
        assert_eq!(upright.format, PixelFormat::Rgba);
        assert_eq!(&upright.pixels[..4], &[255, 0, 0, 255]);

        let options = DecodeOptions {
            flip_vertically: true,
            ..DecodeOptions::default()
        };
        let flipped = TextureImage::decode(&path, options).unwrap();
        assert_eq!(&flipped.pixels[..4], &[0, 0, 255, 128]);
    }

    #[test]
    fn grayscale_is_red_and_gray_alpha_falls_back_to_rgb() {
        let dir = TempDir::new().unwrap();
        let gray = dir.path().join("gray.png");
        GrayImage::from_pixel(2, 2, Luma([7])).save(&gray).unwrap();
        let image = TextureImage::decode(&gray, DecodeOptions::default()).unwrap();
        assert_eq!(image.format, PixelFormat::Red);
        assert_eq!(image.pixels, vec![7; 4]);
        assert_eq!(&image.rgba_pixels()[..4], &[7, 0, 0, 255]);

        let gray_alpha = dir.path().join("gray_alpha.png");
        GrayAlphaImage::from_pixel(1, 1, LumaA([9, 200]))
            .save(&gray_alpha)
            .unwrap();
        let image = TextureImage::decode(&gray_alpha, DecodeOptions::default()).unwrap();
        assert_eq!(image.format, PixelFormat::Rgb);
        assert_eq!(image.pixels, vec![9, 9, 9]);
    }

    #[test]
    fn decode_error_names_the_path_once() {
        let path = Path::new("/nonexistent/container.jpg");
        let err = TextureImage::decode(path, DecodeOptions::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Texture failed to load at path: /nonexistent/container.jpg: "));
        assert_eq!(message.matches("container.jpg").count(), 1);
    }

    #[test]
    fn missing_file_is_a_soft_failure() {
        let slot = load_texture(Path::new("/nonexistent/texture.png"), DecodeOptions::default());
        assert_eq!(slot, TextureSlot::Missing);
    }

    #[test]
    fn mip_chain_halves_to_one_pixel() {
        let image = TextureImage::from_dynamic(&DynamicImage::ImageRgb8(RgbImage::new(4, 2)));
        assert_eq!(image.mip_level_count(), 3);
        let sizes: Vec<_> = image
            .mip_chain()
            .iter()
            .map(|level| (level.width, level.height, level.pixels.len()))
            .collect();
        assert_eq!(sizes, vec![(4, 2, 24), (2, 1, 6), (1, 1, 3)]);
    }
}
