// Copyright @yucwang 2026

use crate::core::texture::TexelImage;
use crate::math::constants::UInt;
use crate::math::spectrum::RGBASpectrum;

use std::sync::Arc;

// Reserved texture/image id meaning "nothing bound".
pub const IMAGE_NONE: UInt = UInt::MAX;

// Reserved tile-descriptor offset marking a flat (non-tiled) texture.
pub const TILE_DESCRIPTORS_UNSET: UInt = UInt::MAX;

// Substitution color for unresolvable textures and failed tiles.
pub fn missing_texture_color() -> RGBASpectrum {
    RGBASpectrum::new(1.0, 0.0, 1.0, 1.0)
}

// Raw pixel encoding of a backing image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageDataType {
    Float4,
    Byte4,
    Half4,
    UShort4,
    Float1,
    Byte1,
    Half1,
    UShort1,
}

impl ImageDataType {
    pub fn channels(&self) -> usize {
        match self {
            ImageDataType::Float4
            | ImageDataType::Byte4
            | ImageDataType::Half4
            | ImageDataType::UShort4 => 4,
            ImageDataType::Float1
            | ImageDataType::Byte1
            | ImageDataType::Half1
            | ImageDataType::UShort1 => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpolationType {
    Nearest,
    Linear,
    Cubic,
    // Cubic where it pays off, linear otherwise. Treated as cubic by
    // the sampler; the distinction belongs to the host renderer.
    Smart,
}

impl InterpolationType {
    // Whether the bicubic reconstruction path applies.
    pub fn is_cubic(&self) -> bool {
        match self {
            InterpolationType::Cubic | InterpolationType::Smart => true,
            InterpolationType::Nearest | InterpolationType::Linear => false,
        }
    }
}

// How coordinates outside [0, 1] are treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtensionType {
    Repeat,
    // Clamp to the edge texel.
    Extend,
    // Outside the image there is nothing: reads resolve to zero.
    Clip,
    Mirror,
}

// One concrete backing image resident in memory. The data handle is
// owned by the asset subsystem; sampling only reads through it.
pub struct ImageInfo {
    pub data: Arc<dyn TexelImage>,
    pub width: usize,
    pub height: usize,
    pub data_type: ImageDataType,
    pub interpolation: InterpolationType,
}

// Entry of the global texture table: either a flat image slot or a
// tiled texture addressed through the residency manager. Exactly one
// of `slot` / `tile_descriptor_offset` is meaningful.
#[derive(Clone)]
pub struct TextureDescriptor {
    pub slot: UInt,
    pub tile_descriptor_offset: UInt,
    pub extension: ExtensionType,
    // Placeholder shown while a tile streams in.
    pub average_color: RGBASpectrum,
}

impl TextureDescriptor {
    pub fn flat(slot: UInt) -> Self {
        Self {
            slot,
            tile_descriptor_offset: TILE_DESCRIPTORS_UNSET,
            extension: ExtensionType::Repeat,
            average_color: RGBASpectrum::zero(),
        }
    }

    pub fn tiled(
        tile_descriptor_offset: UInt,
        extension: ExtensionType,
        average_color: RGBASpectrum,
    ) -> Self {
        Self {
            slot: IMAGE_NONE,
            tile_descriptor_offset,
            extension,
            average_color,
        }
    }

    pub fn is_tiled(&self) -> bool {
        self.tile_descriptor_offset != TILE_DESCRIPTORS_UNSET
    }
}

// Append-only descriptor tables, populated before rendering begins
// and read-only while sampling runs.
pub struct TextureTables {
    textures: Vec<TextureDescriptor>,
    images: Vec<ImageInfo>,
}

impl TextureTables {
    pub fn new() -> Self {
        Self {
            textures: Vec::new(),
            images: Vec::new(),
        }
    }

    // Register a backing image; returns its slot.
    pub fn push_image(&mut self, info: ImageInfo) -> UInt {
        assert!(info.width > 0 && info.height > 0);
        self.images.push(info);
        (self.images.len() - 1) as UInt
    }

    // Register a texture descriptor; returns its texture id.
    pub fn push_texture(&mut self, descriptor: TextureDescriptor) -> UInt {
        self.textures.push(descriptor);
        (self.textures.len() - 1) as UInt
    }

    pub fn texture(&self, id: UInt) -> Option<&TextureDescriptor> {
        self.textures.get(id as usize)
    }

    pub fn image(&self, slot: UInt) -> Option<&ImageInfo> {
        self.images.get(slot as usize)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}
