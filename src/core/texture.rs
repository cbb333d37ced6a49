// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f};
use crate::math::spectrum::RGBASpectrum;

// Screen-space partial derivatives of a surface uv coordinate. The
// sampler forwards them to the tile mapper without interpreting them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Differential2 {
    pub dx: Vector2f,
    pub dy: Vector2f,
}

impl Default for Differential2 {
    fn default() -> Self {
        Self {
            dx: Vector2f::new(0.0, 0.0),
            dy: Vector2f::new(0.0, 0.0),
        }
    }
}

// The texel-fetch boundary: one filtered read of a backing image at
// coordinates normalized to [0, 1). Filtering (nearest or bilinear
// between texel centers) and boundary addressing are fixed on the
// concrete handle by the subsystem that owns it, never per read.
pub trait TexelImage: Send + Sync {
    fn read_rgba(&self, x: Float, y: Float) -> RGBASpectrum;

    fn read_scalar(&self, x: Float, y: Float) -> Float;

    fn describe(&self) -> String;
}
