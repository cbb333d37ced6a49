// Copyright @yucwang 2026

use crate::core::image::IMAGE_NONE;
use crate::math::constants::{UInt, Vector2f};

use std::collections::HashMap;

// Maps a logical multi-tile image id plus a coordinate to the
// concrete texture id of the tile underneath it, or `IMAGE_NONE`
// when no tile is assigned there.
pub trait UdimMapper: Send + Sync {
    fn map_udim(&self, image_id: UInt, uv: Vector2f) -> UInt;
}

// Tile number under the UDIM convention: 1001 + column + 10 * row,
// ten columns per row, selected by the integer part of the
// coordinate. Coordinates left of the first column or below the
// first row have no tile.
pub fn udim_tile_number(uv: Vector2f) -> Option<UInt> {
    let column = uv.x.floor();
    let row = uv.y.floor();
    if column < 0.0 || column > 9.0 || row < 0.0 {
        return None;
    }
    Some(1001 + column as UInt + 10 * row as UInt)
}

// Host-side registry of assigned UDIM tiles, filled while the
// texture tables are built and read-only afterwards.
pub struct UdimRegistry {
    tiles: HashMap<(UInt, UInt), UInt>,
}

impl UdimRegistry {
    pub fn new() -> Self {
        Self {
            tiles: HashMap::new(),
        }
    }

    pub fn insert(&mut self, image_id: UInt, tile_number: UInt, texture_id: UInt) {
        self.tiles.insert((image_id, tile_number), texture_id);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl UdimMapper for UdimRegistry {
    fn map_udim(&self, image_id: UInt, uv: Vector2f) -> UInt {
        let tile_number = match udim_tile_number(uv) {
            Some(number) => number,
            None => return IMAGE_NONE,
        };
        match self.tiles.get(&(image_id, tile_number)) {
            Some(&texture_id) => texture_id,
            None => IMAGE_NONE,
        }
    }
}
