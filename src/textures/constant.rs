// Copyright @yucwang 2026

use crate::core::texture::TexelImage;
use crate::math::constants::Float;
use crate::math::spectrum::RGBASpectrum;

// A fetch handle that resolves every read to one fixed color.
pub struct ConstantImage {
    value: RGBASpectrum,
}

impl ConstantImage {
    pub fn new(value: RGBASpectrum) -> Self {
        Self { value }
    }
}

impl TexelImage for ConstantImage {
    fn read_rgba(&self, _x: Float, _y: Float) -> RGBASpectrum {
        self.value
    }

    fn read_scalar(&self, _x: Float, _y: Float) -> Float {
        self.value.r()
    }

    fn describe(&self) -> String {
        String::from("ConstantImage")
    }
}
