use crate::buffer::PixelBuffer;
use crate::errors::AssembleError;

/// How independently-fetched tiles compose into one logical canvas. All
/// tiles share the same dimensions and RGBA stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasLayout {
    pub rows: u32,
    pub cols: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

/// The production canvas: four 1000x1000 quadrants in a 2x2 grid.
pub const PLACE_LAYOUT: CanvasLayout = CanvasLayout {
    rows: 2,
    cols: 2,
    tile_width: 1000,
    tile_height: 1000,
};

impl CanvasLayout {
    pub fn width(&self) -> u32 {
        self.tile_width * self.cols
    }

    pub fn height(&self) -> u32 {
        self.tile_height * self.rows
    }

    pub fn tile_count(&self) -> u32 {
        self.rows * self.cols
    }

    /// Which tile contains the assembled-canvas coordinate (x, y). The
    /// placement request for a diffed pixel must use this same mapping,
    /// otherwise the pixel lands on the wrong quadrant.
    pub fn tile_index_for(&self, x: u32, y: u32) -> u32 {
        (y / self.tile_height) * self.cols + x / self.tile_width
    }

    /// Stitches tiles ordered [top-left, top-right, bottom-left,
    /// bottom-right, ..] into one buffer, copying row by row so each
    /// output row stays contiguous.
    pub fn assemble(&self, tiles: &[PixelBuffer]) -> Result<PixelBuffer, AssembleError> {
        let expected_tiles = self.tile_count() as usize;
        if tiles.len() != expected_tiles {
            return Err(AssembleError::WrongTileCount {
                expected: expected_tiles,
                actual: tiles.len(),
            });
        }

        let tile_bytes = self.tile_width as usize * self.tile_height as usize * 4;
        for (n, tile) in tiles.iter().enumerate() {
            if tile.as_bytes().len() != tile_bytes {
                return Err(AssembleError::LayoutMismatch {
                    tile: n,
                    expected: tile_bytes,
                    actual: tile.as_bytes().len(),
                });
            }
        }

        let width = self.width();
        let height = self.height();
        let row_bytes = self.tile_width as usize * 4;
        let out_stride = width as usize * 4;
        let mut out = vec![0u8; width as usize * height as usize * 4];

        for tile_row in 0..self.rows {
            for tile_col in 0..self.cols {
                let tile = &tiles[(tile_row * self.cols + tile_col) as usize];
                let src = tile.as_bytes();

                for row in 0..self.tile_height {
                    let dst_start = (tile_row * self.tile_height + row) as usize * out_stride
                        + tile_col as usize * row_bytes;
                    let src_start = row as usize * row_bytes;
                    out[dst_start..dst_start + row_bytes]
                        .copy_from_slice(&src[src_start..src_start + row_bytes]);
                }
            }
        }

        Ok(PixelBuffer {
            width,
            height,
            data: out,
        })
    }
}

/// Quadrant id 0-3 for a coordinate on the assembled production canvas.
/// Inverse of the assembly mapping above.
pub fn quadrant_for(x: u32, y: u32) -> u8 {
    PLACE_LAYOUT.tile_index_for(x, y) as u8
}
