// Copyright @yucwang 2026

use crate::core::image::{ExtensionType, TextureDescriptor, TextureTables};
use crate::core::texture::Differential2;
use crate::math::constants::{Float, UInt, Vector2f};
use crate::math::spectrum::RGBASpectrum;

// Residency of one virtual tile, reported by the residency manager
// at sample time. The state is only valid for the current call;
// tiles move between states independently of sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileState {
    // The tile's backing image is resident at this image slot.
    Loaded(UInt),
    // Still streaming in.
    NotLoaded,
    // Permanently failed to load.
    LoadFailed,
}

// A tile reference plus the coordinate inside that tile, in the
// tile's pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileSample {
    pub state: TileState,
    pub local_xy: Vector2f,
}

// Maps a wrapped coordinate (and its screen-space derivatives) onto
// a concrete tile. Implemented by the tile residency manager.
pub trait TileMapper: Send + Sync {
    fn map_tile(
        &self,
        descriptor: &TextureDescriptor,
        uv: Vector2f,
        duv: Differential2,
    ) -> TileSample;
}

// Outcome of resolving a tiled descriptor against residency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TileResolution {
    // The extension policy rejected the coordinate; nothing here.
    Rejected,
    // The tile failed to load.
    Missing,
    // The tile is streaming; show the placeholder color.
    Average(RGBASpectrum),
    // Resident: continue sampling `slot` at the renormalized uv.
    Resolved { slot: UInt, uv: Vector2f },
}

// Apply a tiled texture's extension policy to a coordinate. Returns
// None when the policy rejects it, in which case no fetch may be
// issued at all.
pub fn wrap_tiled_uv(extension: ExtensionType, uv: Vector2f) -> Option<Vector2f> {
    match extension {
        ExtensionType::Repeat => Some(Vector2f::new(wrap_repeat(uv.x), wrap_repeat(uv.y))),
        ExtensionType::Extend => {
            Some(Vector2f::new(uv.x.clamp(0.0, 1.0), uv.y.clamp(0.0, 1.0)))
        }
        ExtensionType::Clip => {
            if uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0 {
                None
            } else {
                Some(uv)
            }
        }
        ExtensionType::Mirror => Some(Vector2f::new(wrap_mirror(uv.x), wrap_mirror(uv.y))),
    }
}

fn wrap_repeat(value: Float) -> Float {
    let mut v = value - value.floor();
    if v < 0.0 {
        v += 1.0;
    }
    v
}

fn wrap_mirror(value: Float) -> Float {
    let mut v = value % 2.0;
    if v < 0.0 {
        v += 2.0;
    }
    if v > 1.0 {
        2.0 - v
    } else {
        v
    }
}

// Resolve a tiled descriptor to concrete backing data: wrap, map to
// a tile, then branch on residency. On a resident tile the
// tile-local pixel coordinate is converted back to the tile image's
// normalized space so sampling can continue as if flat.
pub fn resolve_tile(
    tables: &TextureTables,
    mapper: &dyn TileMapper,
    descriptor: &TextureDescriptor,
    uv: Vector2f,
    duv: Differential2,
) -> TileResolution {
    let wrapped = match wrap_tiled_uv(descriptor.extension, uv) {
        Some(wrapped) => wrapped,
        None => return TileResolution::Rejected,
    };

    let tile = mapper.map_tile(descriptor, wrapped, duv);
    match tile.state {
        TileState::LoadFailed => TileResolution::Missing,
        TileState::NotLoaded => TileResolution::Average(descriptor.average_color),
        TileState::Loaded(slot) => {
            let info = match tables.image(slot) {
                Some(info) => info,
                None => return TileResolution::Missing,
            };
            let uv = Vector2f::new(
                tile.local_xy.x / info.width as Float,
                tile.local_xy.y / info.height as Float,
            );
            TileResolution::Resolved { slot, uv }
        }
    }
}
