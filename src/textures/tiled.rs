// Copyright @yucwang 2026

use crate::core::image::TextureDescriptor;
use crate::core::texture::Differential2;
use crate::core::tile::{TileMapper, TileSample, TileState};
use crate::math::constants::{Float, UInt, Vector2f};

// Residency grid for one tiled texture: tiles_u x tiles_v virtual
// tiles covering the unit square, each either resident at an image
// slot, still streaming, or failed.
pub struct TileGrid {
    tiles_u: usize,
    tiles_v: usize,
    tile_width: usize,
    tile_height: usize,
    states: Vec<TileState>,
}

impl TileGrid {
    pub fn new(tiles_u: usize, tiles_v: usize, tile_width: usize, tile_height: usize) -> Self {
        assert!(tiles_u > 0 && tiles_v > 0);
        assert!(tile_width > 0 && tile_height > 0);
        Self {
            tiles_u,
            tiles_v,
            tile_width,
            tile_height,
            states: vec![TileState::NotLoaded; tiles_u * tiles_v],
        }
    }

    pub fn set_state(&mut self, tu: usize, tv: usize, state: TileState) {
        let index = tv * self.tiles_u + tu;
        self.states[index] = state;
    }

    pub fn state(&self, tu: usize, tv: usize) -> TileState {
        self.states[tv * self.tiles_u + tu]
    }
}

// Reference residency manager: resolves coordinates against
// per-descriptor tile grids built before rendering and frozen while
// sampling runs.
pub struct GridTileMapper {
    grids: Vec<TileGrid>,
}

impl GridTileMapper {
    pub fn new() -> Self {
        Self { grids: Vec::new() }
    }

    // Register a grid; returns the tile-descriptor offset to store
    // in the owning `TextureDescriptor`.
    pub fn push_grid(&mut self, grid: TileGrid) -> UInt {
        self.grids.push(grid);
        (self.grids.len() - 1) as UInt
    }

    pub fn grid_mut(&mut self, offset: UInt) -> Option<&mut TileGrid> {
        self.grids.get_mut(offset as usize)
    }
}

impl TileMapper for GridTileMapper {
    fn map_tile(
        &self,
        descriptor: &TextureDescriptor,
        uv: Vector2f,
        _duv: Differential2,
    ) -> TileSample {
        let grid = match self.grids.get(descriptor.tile_descriptor_offset as usize) {
            Some(grid) => grid,
            None => {
                return TileSample {
                    state: TileState::LoadFailed,
                    local_xy: Vector2f::new(0.0, 0.0),
                }
            }
        };

        // uv arrives wrapped into [0, 1]; 1.0 exactly lands in the
        // last tile.
        let fu = uv.x * grid.tiles_u as Float;
        let fv = uv.y * grid.tiles_v as Float;
        let tu = (fu.floor() as usize).min(grid.tiles_u - 1);
        let tv = (fv.floor() as usize).min(grid.tiles_v - 1);

        let local_xy = Vector2f::new(
            (fu - tu as Float) * grid.tile_width as Float,
            (fv - tv as Float) * grid.tile_height as Float,
        );

        TileSample {
            state: grid.state(tu, tv),
            local_xy,
        }
    }
}
