// Copyright @yucwang 2026

use crate::core::image::{ExtensionType, ImageDataType};
use crate::core::texture::TexelImage;
use crate::io::exr_utils::read_rgba_from_file;
use crate::math::constants::Float;
use crate::math::spectrum::RGBASpectrum;
use crate::textures::{wrap_index, TexelFilter};

use half::f16;
use image::io::Reader as ImageReader;
use std::path::Path;

enum TexelStorage {
    Float(Vec<Float>),
    Byte(Vec<u8>),
    Half(Vec<f16>),
    UShort(Vec<u16>),
}

// A software-resident texel store behind the fetch-primitive
// boundary. Texels keep their storage encoding; reads decode to
// float, normalize integer encodings to [0, 1], then filter with
// whatever mode the handle was configured with.
pub struct CpuImage {
    width: usize,
    height: usize,
    data_type: ImageDataType,
    filter: TexelFilter,
    extension: ExtensionType,
    texels: TexelStorage,
}

fn srgb_to_linear(v: Float) -> Float {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

impl CpuImage {
    pub fn from_float_texels(
        width: usize,
        height: usize,
        channels: usize,
        texels: Vec<Float>,
    ) -> Result<Self, String> {
        let data_type = match channels {
            4 => ImageDataType::Float4,
            1 => ImageDataType::Float1,
            _ => return Err(format!("unsupported channel count: {}", channels)),
        };
        Self::new(width, height, data_type, TexelStorage::Float(texels))
    }

    pub fn from_byte_texels(
        width: usize,
        height: usize,
        channels: usize,
        texels: Vec<u8>,
    ) -> Result<Self, String> {
        let data_type = match channels {
            4 => ImageDataType::Byte4,
            1 => ImageDataType::Byte1,
            _ => return Err(format!("unsupported channel count: {}", channels)),
        };
        Self::new(width, height, data_type, TexelStorage::Byte(texels))
    }

    pub fn from_half_texels(
        width: usize,
        height: usize,
        channels: usize,
        texels: Vec<f16>,
    ) -> Result<Self, String> {
        let data_type = match channels {
            4 => ImageDataType::Half4,
            1 => ImageDataType::Half1,
            _ => return Err(format!("unsupported channel count: {}", channels)),
        };
        Self::new(width, height, data_type, TexelStorage::Half(texels))
    }

    pub fn from_ushort_texels(
        width: usize,
        height: usize,
        channels: usize,
        texels: Vec<u16>,
    ) -> Result<Self, String> {
        let data_type = match channels {
            4 => ImageDataType::UShort4,
            1 => ImageDataType::UShort1,
            _ => return Err(format!("unsupported channel count: {}", channels)),
        };
        Self::new(width, height, data_type, TexelStorage::UShort(texels))
    }

    fn new(
        width: usize,
        height: usize,
        data_type: ImageDataType,
        texels: TexelStorage,
    ) -> Result<Self, String> {
        if width == 0 || height == 0 {
            return Err("image dimensions must be positive".to_string());
        }
        let expected = width * height * data_type.channels();
        let actual = match &texels {
            TexelStorage::Float(data) => data.len(),
            TexelStorage::Byte(data) => data.len(),
            TexelStorage::Half(data) => data.len(),
            TexelStorage::UShort(data) => data.len(),
        };
        if actual != expected {
            return Err(format!(
                "texel buffer holds {} values, expected {}",
                actual, expected
            ));
        }

        Ok(Self {
            width,
            height,
            data_type,
            filter: TexelFilter::Bilinear,
            extension: ExtensionType::Repeat,
            texels,
        })
    }

    pub fn from_exr(path: &str) -> Result<Self, String> {
        let buffer = read_rgba_from_file(path)?;
        let mut texels = Vec::with_capacity(buffer.data.len() * 4);
        for (r, g, b, a) in buffer.data {
            texels.push(r);
            texels.push(g);
            texels.push(b);
            texels.push(a);
        }
        Self::from_float_texels(buffer.width, buffer.height, 4, texels)
    }

    // Load an 8-bit image file. sRGB sources are linearized at load
    // time into float storage; already-linear sources keep their
    // byte encoding.
    pub fn from_image(path: &str, srgb: bool) -> Result<Self, String> {
        let img = ImageReader::open(path)
            .map_err(|e| format!("failed to open image {}: {}", path, e))?
            .decode()
            .map_err(|e| format!("failed to decode image {}: {}", path, e))?;

        if srgb {
            let rgba = img.to_rgba32f();
            let (width, height) = rgba.dimensions();
            let mut texels = Vec::with_capacity((width * height * 4) as usize);
            for p in rgba.pixels() {
                texels.push(srgb_to_linear(p[0]));
                texels.push(srgb_to_linear(p[1]));
                texels.push(srgb_to_linear(p[2]));
                texels.push(p[3]);
            }
            Self::from_float_texels(width as usize, height as usize, 4, texels)
        } else {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            Self::from_byte_texels(width as usize, height as usize, 4, rgba.into_raw())
        }
    }

    pub fn from_file(path: &str, srgb: bool) -> Result<Self, String> {
        let ext = Path::new(path)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "exr" => Self::from_exr(path),
            "jpg" | "jpeg" | "png" => Self::from_image(path, srgb),
            _ => Err(format!("unsupported texture format: {}", ext)),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data_type(&self) -> ImageDataType {
        self.data_type
    }

    pub fn set_filter(&mut self, filter: TexelFilter) {
        self.filter = filter;
    }

    pub fn set_extension(&mut self, extension: ExtensionType) {
        self.extension = extension;
    }

    fn texel_value(&self, index: usize) -> Float {
        match &self.texels {
            TexelStorage::Float(data) => data[index],
            TexelStorage::Byte(data) => data[index] as Float / 255.0,
            TexelStorage::Half(data) => data[index].to_f32(),
            TexelStorage::UShort(data) => data[index] as Float / 65535.0,
        }
    }

    fn texel_rgba(&self, x: isize, y: isize) -> RGBASpectrum {
        let xi = wrap_index(x, self.width, self.extension);
        let yi = wrap_index(y, self.height, self.extension);
        let (xi, yi) = match (xi, yi) {
            (Some(xi), Some(yi)) => (xi, yi),
            _ => return RGBASpectrum::zero(),
        };

        let channels = self.data_type.channels();
        let base = (yi * self.width + xi) * channels;
        if channels == 4 {
            RGBASpectrum::new(
                self.texel_value(base),
                self.texel_value(base + 1),
                self.texel_value(base + 2),
                self.texel_value(base + 3),
            )
        } else {
            RGBASpectrum::from_scalar(self.texel_value(base))
        }
    }

    fn texel_scalar(&self, x: isize, y: isize) -> Float {
        let xi = wrap_index(x, self.width, self.extension);
        let yi = wrap_index(y, self.height, self.extension);
        match (xi, yi) {
            (Some(xi), Some(yi)) => {
                self.texel_value((yi * self.width + xi) * self.data_type.channels())
            }
            _ => 0.0,
        }
    }
}

impl TexelImage for CpuImage {
    fn read_rgba(&self, x: Float, y: Float) -> RGBASpectrum {
        match self.filter {
            TexelFilter::Nearest => {
                let tx = (x * self.width as Float).floor() as isize;
                let ty = (y * self.height as Float).floor() as isize;
                self.texel_rgba(tx, ty)
            }
            TexelFilter::Bilinear => {
                let x = x * self.width as Float - 0.5;
                let y = y * self.height as Float - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let tx = x - x0;
                let ty = y - y0;
                let x0 = x0 as isize;
                let y0 = y0 as isize;

                let s00 = self.texel_rgba(x0, y0);
                let s10 = self.texel_rgba(x0 + 1, y0);
                let s01 = self.texel_rgba(x0, y0 + 1);
                let s11 = self.texel_rgba(x0 + 1, y0 + 1);

                (s00 * (1.0 - tx) + s10 * tx) * (1.0 - ty)
                    + (s01 * (1.0 - tx) + s11 * tx) * ty
            }
        }
    }

    fn read_scalar(&self, x: Float, y: Float) -> Float {
        match self.filter {
            TexelFilter::Nearest => {
                let tx = (x * self.width as Float).floor() as isize;
                let ty = (y * self.height as Float).floor() as isize;
                self.texel_scalar(tx, ty)
            }
            TexelFilter::Bilinear => {
                let x = x * self.width as Float - 0.5;
                let y = y * self.height as Float - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let tx = x - x0;
                let ty = y - y0;
                let x0 = x0 as isize;
                let y0 = y0 as isize;

                let s00 = self.texel_scalar(x0, y0);
                let s10 = self.texel_scalar(x0 + 1, y0);
                let s01 = self.texel_scalar(x0, y0 + 1);
                let s11 = self.texel_scalar(x0 + 1, y0 + 1);

                (s00 * (1.0 - tx) + s10 * tx) * (1.0 - ty)
                    + (s01 * (1.0 - tx) + s11 * tx) * ty
            }
        }
    }

    fn describe(&self) -> String {
        String::from("CpuImage")
    }
}
