// Copyright @yucwang 2026

use crate::core::image::{
    missing_texture_color, ImageInfo, TextureTables, IMAGE_NONE,
};
use crate::core::texture::{Differential2, TexelImage};
use crate::core::tile::{resolve_tile, TileMapper, TileResolution};
use crate::core::udim::UdimMapper;
use crate::math::constants::{Float, UInt, Vector2f};
use crate::math::cubic::{cubic_g0, cubic_g1, cubic_h0, cubic_h1};
use crate::math::spectrum::RGBASpectrum;

use std::sync::Arc;

// Positions and amplitudes of the four bilinear taps that together
// reproduce a 4x4 cubic B-spline footprint.
struct BicubicTaps {
    x0: Float,
    x1: Float,
    y0: Float,
    y1: Float,
    g0x: Float,
    g1x: Float,
    g0y: Float,
    g1y: Float,
}

fn bicubic_taps(width: usize, height: usize, uv: Vector2f) -> BicubicTaps {
    let width = width as Float;
    let height = height as Float;

    // Texel space, with the half-texel center convention.
    let x = uv.x * width - 0.5;
    let y = uv.y * height - 0.5;

    let px = x.floor();
    let py = y.floor();
    let fx = x - px;
    let fy = y - py;

    // The +0.5 compensates for the fetch primitive filtering between
    // texel centers.
    BicubicTaps {
        x0: (px + cubic_h0(fx) + 0.5) / width,
        x1: (px + cubic_h1(fx) + 0.5) / width,
        y0: (py + cubic_h0(fy) + 0.5) / height,
        y1: (py + cubic_h1(fy) + 0.5) / height,
        g0x: cubic_g0(fx),
        g1x: cubic_g1(fx),
        g0y: cubic_g0(fy),
        g1y: cubic_g1(fy),
    }
}

// Bicubic reconstruction from four bilinear fetches. Matches a true
// 4x4 cubic B-spline filter exactly when the underlying fetch
// interpolates linearly between texel centers. Boundary behavior is
// whatever the handle's addressing mode makes of the tap positions.
fn sample_bicubic_rgba(info: &ImageInfo, uv: Vector2f) -> RGBASpectrum {
    let t = bicubic_taps(info.width, info.height, uv);
    let tex = info.data.as_ref();
    (tex.read_rgba(t.x0, t.y0) * t.g0x + tex.read_rgba(t.x1, t.y0) * t.g1x) * t.g0y
        + (tex.read_rgba(t.x0, t.y1) * t.g0x + tex.read_rgba(t.x1, t.y1) * t.g1x) * t.g1y
}

fn sample_bicubic_scalar(info: &ImageInfo, uv: Vector2f) -> Float {
    let t = bicubic_taps(info.width, info.height, uv);
    let tex = info.data.as_ref();
    t.g0y * (t.g0x * tex.read_scalar(t.x0, t.y0) + t.g1x * tex.read_scalar(t.x1, t.y0))
        + t.g1y * (t.g0x * tex.read_scalar(t.x0, t.y1) + t.g1x * tex.read_scalar(t.x1, t.y1))
}

// Top-level sampling entry point of the shading stage: resolves a
// texture id against the global tables, handles tiled addressing,
// then dispatches on pixel encoding and interpolation quality.
pub struct ImageSampler {
    tables: Arc<TextureTables>,
    tile_mapper: Option<Arc<dyn TileMapper>>,
    udim_mapper: Option<Arc<dyn UdimMapper>>,
}

impl ImageSampler {
    pub fn new(tables: Arc<TextureTables>) -> Self {
        Self {
            tables,
            tile_mapper: None,
            udim_mapper: None,
        }
    }

    pub fn with_tile_mapper(mut self, mapper: Arc<dyn TileMapper>) -> Self {
        self.tile_mapper = Some(mapper);
        self
    }

    pub fn with_udim_mapper(mut self, mapper: Arc<dyn UdimMapper>) -> Self {
        self.udim_mapper = Some(mapper);
        self
    }

    pub fn tables(&self) -> &TextureTables {
        &self.tables
    }

    // Sample one texture at uv. Every failure mode degrades to a
    // bounded sentinel color; a bad id never panics.
    pub fn sample(&self, texture_id: UInt, uv: Vector2f, duv: Differential2) -> RGBASpectrum {
        if texture_id == IMAGE_NONE {
            return missing_texture_color();
        }

        let descriptor = match self.tables.texture(texture_id) {
            Some(descriptor) => descriptor,
            None => return missing_texture_color(),
        };

        let (slot, uv) = if descriptor.is_tiled() {
            let mapper = match &self.tile_mapper {
                Some(mapper) => mapper,
                None => return missing_texture_color(),
            };
            match resolve_tile(&self.tables, mapper.as_ref(), descriptor, uv, duv) {
                TileResolution::Rejected => return RGBASpectrum::zero(),
                TileResolution::Missing => return missing_texture_color(),
                TileResolution::Average(color) => return color,
                TileResolution::Resolved { slot, uv } => (slot, uv),
            }
        } else {
            if descriptor.slot == IMAGE_NONE {
                return missing_texture_color();
            }
            (descriptor.slot, uv)
        };

        let info = match self.tables.image(slot) {
            Some(info) => info,
            None => return missing_texture_color(),
        };

        if info.data_type.channels() == 4 {
            if info.interpolation.is_cubic() {
                sample_bicubic_rgba(info, uv)
            } else {
                info.data.read_rgba(uv.x, uv.y)
            }
        } else {
            let value = if info.interpolation.is_cubic() {
                sample_bicubic_scalar(info, uv)
            } else {
                info.data.read_scalar(uv.x, uv.y)
            };
            RGBASpectrum::from_scalar(value)
        }
    }

    // Resolve a UDIM image id to the tile texture under uv and
    // sample it. An unassigned tile is the missing texture; no fetch
    // is issued for it.
    pub fn sample_udim(&self, image_id: UInt, uv: Vector2f, duv: Differential2) -> RGBASpectrum {
        let mapper = match &self.udim_mapper {
            Some(mapper) => mapper,
            None => return missing_texture_color(),
        };
        let texture_id = mapper.map_udim(image_id, uv);
        if texture_id == IMAGE_NONE {
            return missing_texture_color();
        }
        self.sample(texture_id, uv, duv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::{
        ExtensionType, ImageDataType, InterpolationType, TextureDescriptor,
    };
    use crate::core::tile::{TileSample, TileState};
    use crate::core::udim::UdimRegistry;
    use crate::textures::constant::ConstantImage;
    use crate::textures::memory::CpuImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn assert_close(a: Float, b: Float) {
        assert!((a - b).abs() < 1e-5, "expected {} ≈ {}", a, b);
    }

    fn assert_spectrum_close(a: RGBASpectrum, b: RGBASpectrum) {
        for idx in 0..4 {
            assert!((a[idx] - b[idx]).abs() < 1e-5, "expected {:?} ≈ {:?}", a, b);
        }
    }

    // Fetch double that records how many reads were issued.
    struct CountingImage {
        value: RGBASpectrum,
        fetches: AtomicUsize,
    }

    impl CountingImage {
        fn new(value: RGBASpectrum) -> Self {
            Self {
                value,
                fetches: AtomicUsize::new(0),
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl TexelImage for CountingImage {
        fn read_rgba(&self, _x: Float, _y: Float) -> RGBASpectrum {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.value
        }

        fn read_scalar(&self, _x: Float, _y: Float) -> Float {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.value.r()
        }

        fn describe(&self) -> String {
            String::from("CountingImage")
        }
    }

    fn push_flat(
        tables: &mut TextureTables,
        data: Arc<dyn TexelImage>,
        data_type: ImageDataType,
        interpolation: InterpolationType,
    ) -> UInt {
        let slot = tables.push_image(ImageInfo {
            data,
            width: 8,
            height: 8,
            data_type,
            interpolation,
        });
        tables.push_texture(TextureDescriptor::flat(slot))
    }

    #[test]
    fn test_no_texture_sentinel_yields_missing_color() {
        let sampler = ImageSampler::new(Arc::new(TextureTables::new()));
        let color = sampler.sample(
            IMAGE_NONE,
            Vector2f::new(0.3, 0.8),
            Differential2::default(),
        );
        assert_eq!(color, missing_texture_color());
    }

    #[test]
    fn test_unknown_texture_id_yields_missing_color() {
        let sampler = ImageSampler::new(Arc::new(TextureTables::new()));
        let color = sampler.sample(42, Vector2f::new(0.5, 0.5), Differential2::default());
        assert_eq!(color, missing_texture_color());
    }

    #[test]
    fn test_flat_descriptor_without_slot_yields_missing_color() {
        let mut tables = TextureTables::new();
        let id = tables.push_texture(TextureDescriptor::flat(IMAGE_NONE));
        let sampler = ImageSampler::new(Arc::new(tables));
        let color = sampler.sample(id, Vector2f::new(0.5, 0.5), Differential2::default());
        assert_eq!(color, missing_texture_color());
    }

    #[test]
    fn test_linear_flat_sampling_passes_the_fetch_through() {
        let value = RGBASpectrum::new(0.1, 0.2, 0.3, 0.4);
        let image = Arc::new(CountingImage::new(value));
        let mut tables = TextureTables::new();
        let id = push_flat(
            &mut tables,
            image.clone(),
            ImageDataType::Float4,
            InterpolationType::Linear,
        );

        let sampler = ImageSampler::new(Arc::new(tables));
        let color = sampler.sample(id, Vector2f::new(0.37, 0.61), Differential2::default());
        assert_eq!(color, value);
        assert_eq!(image.fetch_count(), 1);
    }

    #[test]
    fn test_nearest_flat_sampling_passes_the_fetch_through() {
        let value = RGBASpectrum::new(0.9, 0.8, 0.7, 1.0);
        let image = Arc::new(CountingImage::new(value));
        let mut tables = TextureTables::new();
        let id = push_flat(
            &mut tables,
            image.clone(),
            ImageDataType::Byte4,
            InterpolationType::Nearest,
        );

        let sampler = ImageSampler::new(Arc::new(tables));
        let color = sampler.sample(id, Vector2f::new(0.99, 0.01), Differential2::default());
        assert_eq!(color, value);
        assert_eq!(image.fetch_count(), 1);
    }

    #[test]
    fn test_cubic_sampling_issues_four_fetches() {
        let value = RGBASpectrum::new(0.25, 0.5, 0.75, 1.0);
        let image = Arc::new(CountingImage::new(value));
        let mut tables = TextureTables::new();
        let id = push_flat(
            &mut tables,
            image.clone(),
            ImageDataType::Float4,
            InterpolationType::Cubic,
        );

        let sampler = ImageSampler::new(Arc::new(tables));
        sampler.sample(id, Vector2f::new(0.5, 0.5), Differential2::default());
        assert_eq!(image.fetch_count(), 4);
    }

    #[test]
    fn test_cubic_sampling_of_a_constant_field_is_the_identity() {
        let value = RGBASpectrum::new(0.25, 0.5, 0.75, 1.0);
        let mut tables = TextureTables::new();
        let id = push_flat(
            &mut tables,
            Arc::new(ConstantImage::new(value)),
            ImageDataType::Float4,
            InterpolationType::Cubic,
        );

        let sampler = ImageSampler::new(Arc::new(tables));
        for &(u, v) in &[(0.2, 0.2), (0.5, 0.5), (0.73, 0.31), (0.9, 0.1)] {
            let color = sampler.sample(id, Vector2f::new(u, v), Differential2::default());
            assert_spectrum_close(color, value);
        }
    }

    #[test]
    fn test_cubic_sampling_of_stored_constant_texels_is_the_identity() {
        // Same property as above, but through real storage and real
        // bilinear taps instead of a constant-returning double.
        let texels = vec![0.625; 8 * 8 * 4];
        let image = CpuImage::from_float_texels(8, 8, 4, texels).unwrap();
        let mut tables = TextureTables::new();
        let id = push_flat(
            &mut tables,
            Arc::new(image),
            ImageDataType::Float4,
            InterpolationType::Cubic,
        );

        let sampler = ImageSampler::new(Arc::new(tables));
        for &(u, v) in &[(0.3, 0.4), (0.51, 0.49), (0.82, 0.17)] {
            let color = sampler.sample(id, Vector2f::new(u, v), Differential2::default());
            assert_spectrum_close(color, RGBASpectrum::new(0.625, 0.625, 0.625, 0.625));
        }
    }

    #[test]
    fn test_smart_interpolation_takes_the_cubic_path() {
        let image = Arc::new(CountingImage::new(RGBASpectrum::from_scalar(0.5)));
        let mut tables = TextureTables::new();
        let id = push_flat(
            &mut tables,
            image.clone(),
            ImageDataType::Half4,
            InterpolationType::Smart,
        );

        let sampler = ImageSampler::new(Arc::new(tables));
        sampler.sample(id, Vector2f::new(0.5, 0.5), Differential2::default());
        assert_eq!(image.fetch_count(), 4);
    }

    #[test]
    fn test_single_channel_formats_expand_to_opaque_gray() {
        for &(data_type, interpolation) in &[
            (ImageDataType::Float1, InterpolationType::Linear),
            (ImageDataType::Byte1, InterpolationType::Nearest),
            (ImageDataType::Half1, InterpolationType::Cubic),
            (ImageDataType::UShort1, InterpolationType::Smart),
        ] {
            let image = Arc::new(CountingImage::new(RGBASpectrum::new(0.3, 0.0, 0.0, 0.0)));
            let mut tables = TextureTables::new();
            let id = push_flat(&mut tables, image, data_type, interpolation);

            let sampler = ImageSampler::new(Arc::new(tables));
            let color = sampler.sample(id, Vector2f::new(0.5, 0.5), Differential2::default());
            assert_close(color.r(), 0.3);
            assert_close(color.g(), 0.3);
            assert_close(color.b(), 0.3);
            assert_eq!(color.a(), 1.0);
        }
    }

    struct FixedTileMapper {
        state: TileState,
    }

    impl TileMapper for FixedTileMapper {
        fn map_tile(
            &self,
            _descriptor: &TextureDescriptor,
            uv: Vector2f,
            _duv: Differential2,
        ) -> TileSample {
            TileSample {
                state: self.state,
                local_xy: Vector2f::new(uv.x * 8.0, uv.y * 8.0),
            }
        }
    }

    #[test]
    fn test_tiled_not_loaded_yields_the_average_color() {
        let average = RGBASpectrum::new(0.6, 0.5, 0.4, 1.0);
        let mut tables = TextureTables::new();
        let id =
            tables.push_texture(TextureDescriptor::tiled(0, ExtensionType::Repeat, average));

        let sampler = ImageSampler::new(Arc::new(tables)).with_tile_mapper(Arc::new(
            FixedTileMapper {
                state: TileState::NotLoaded,
            },
        ));
        let color = sampler.sample(id, Vector2f::new(0.5, 0.5), Differential2::default());
        assert_eq!(color, average);
    }

    #[test]
    fn test_tiled_load_failure_yields_the_missing_color() {
        let mut tables = TextureTables::new();
        let id = tables.push_texture(TextureDescriptor::tiled(
            0,
            ExtensionType::Repeat,
            RGBASpectrum::zero(),
        ));

        let sampler = ImageSampler::new(Arc::new(tables)).with_tile_mapper(Arc::new(
            FixedTileMapper {
                state: TileState::LoadFailed,
            },
        ));
        let color = sampler.sample(id, Vector2f::new(0.5, 0.5), Differential2::default());
        assert_eq!(color, missing_texture_color());
    }

    #[test]
    fn test_tiled_clip_outside_is_transparent_not_missing() {
        let mut tables = TextureTables::new();
        let id = tables.push_texture(TextureDescriptor::tiled(
            0,
            ExtensionType::Clip,
            RGBASpectrum::zero(),
        ));

        let sampler = ImageSampler::new(Arc::new(tables)).with_tile_mapper(Arc::new(
            FixedTileMapper {
                state: TileState::LoadFailed,
            },
        ));
        let color = sampler.sample(id, Vector2f::new(1.5, 0.5), Differential2::default());
        assert_eq!(color, RGBASpectrum::zero());
        assert_ne!(color, missing_texture_color());
    }

    #[test]
    fn test_tiled_resident_tile_samples_its_image() {
        let value = RGBASpectrum::new(0.15, 0.35, 0.55, 1.0);
        let mut tables = TextureTables::new();
        let slot = tables.push_image(ImageInfo {
            data: Arc::new(ConstantImage::new(value)),
            width: 8,
            height: 8,
            data_type: ImageDataType::Float4,
            interpolation: InterpolationType::Linear,
        });
        let id = tables.push_texture(TextureDescriptor::tiled(
            0,
            ExtensionType::Repeat,
            RGBASpectrum::zero(),
        ));

        let sampler = ImageSampler::new(Arc::new(tables)).with_tile_mapper(Arc::new(
            FixedTileMapper {
                state: TileState::Loaded(slot),
            },
        ));
        let color = sampler.sample(id, Vector2f::new(0.25, 0.75), Differential2::default());
        assert_eq!(color, value);
    }

    #[test]
    fn test_udim_miss_returns_missing_color_without_fetching() {
        let image = Arc::new(CountingImage::new(RGBASpectrum::from_scalar(0.5)));
        let mut tables = TextureTables::new();
        let id = push_flat(
            &mut tables,
            image.clone(),
            ImageDataType::Float4,
            InterpolationType::Linear,
        );

        let mut registry = UdimRegistry::new();
        registry.insert(0, 1001, id);

        let sampler =
            ImageSampler::new(Arc::new(tables)).with_udim_mapper(Arc::new(registry));

        // Tile 1002 was never assigned.
        let color =
            sampler.sample_udim(0, Vector2f::new(1.5, 0.5), Differential2::default());
        assert_eq!(color, missing_texture_color());
        assert_eq!(image.fetch_count(), 0);
    }

    #[test]
    fn test_udim_hit_samples_the_tile_texture() {
        let value = RGBASpectrum::new(0.8, 0.1, 0.2, 1.0);
        let image = Arc::new(CountingImage::new(value));
        let mut tables = TextureTables::new();
        let id = push_flat(
            &mut tables,
            image.clone(),
            ImageDataType::Float4,
            InterpolationType::Linear,
        );

        let mut registry = UdimRegistry::new();
        registry.insert(7, 1001, id);

        let sampler =
            ImageSampler::new(Arc::new(tables)).with_udim_mapper(Arc::new(registry));
        let color =
            sampler.sample_udim(7, Vector2f::new(0.25, 0.5), Differential2::default());
        assert_eq!(color, value);
        assert_eq!(image.fetch_count(), 1);
    }
}
