//! Film

use crate::error::*;
use crate::image_io::*;
use crate::spectrum::*;
use std::sync::{PoisonError, RwLock};

/// A rectangular region of the image rendered by one worker.
#[derive(Clone, Debug)]
pub struct FilmTile {
    /// Left column.
    pub x0: usize,

    /// Top row.
    pub y0: usize,

    /// Width in pixels.
    pub width: usize,

    /// Height in pixels.
    pub height: usize,

    /// Pixel colors in row-major order.
    pub pixels: Vec<Spectrum>,
}

impl FilmTile {
    /// Create a new black `FilmTile`.
    ///
    /// * `x0`     - Left column.
    /// * `y0`     - Top row.
    /// * `width`  - Width in pixels.
    /// * `height` - Height in pixels.
    pub fn new(x0: usize, y0: usize, width: usize, height: usize) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
            pixels: vec![Spectrum::ZERO; width * height],
        }
    }
}

/// Image accumulation target.
pub struct Film {
    /// Image width.
    pub width: usize,

    /// Image height.
    pub height: usize,

    /// Pixel colors in row-major order.
    pixels: RwLock<Vec<Spectrum>>,
}

impl Film {
    /// Create a new black `Film`.
    ///
    /// * `width`  - Image width.
    /// * `height` - Image height.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: RwLock::new(vec![Spectrum::ZERO; width * height]),
        }
    }

    /// Returns the tiles covering the image.
    ///
    /// * `tile_size` - Tile edge length in pixels.
    pub fn tiles(&self, tile_size: usize) -> Vec<FilmTile> {
        let tile_size = tile_size.max(1);
        let mut tiles = vec![];
        for y0 in (0..self.height).step_by(tile_size) {
            for x0 in (0..self.width).step_by(tile_size) {
                let w = tile_size.min(self.width - x0);
                let h = tile_size.min(self.height - y0);
                tiles.push(FilmTile::new(x0, y0, w, h));
            }
        }
        tiles
    }

    /// Copy a finished tile into the image.
    ///
    /// * `tile` - The tile.
    pub fn merge_tile(&self, tile: &FilmTile) {
        let mut pixels = self.pixels.write().unwrap_or_else(PoisonError::into_inner);
        for ty in 0..tile.height {
            let row = (tile.y0 + ty) * self.width + tile.x0;
            pixels[row..row + tile.width].copy_from_slice(&tile.pixels[ty * tile.width..(ty + 1) * tile.width]);
        }
    }

    /// Returns a copy of the pixels.
    pub fn pixels(&self) -> Vec<Spectrum> {
        self.pixels.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Write the image to a file.
    ///
    /// * `path` - Output file path.
    pub fn write_image(&self, path: &str) -> Result<()> {
        write_image(path, &self.pixels(), self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_cover_image_once() {
        let film = Film::new(37, 20);
        let tiles = film.tiles(16);
        assert_eq!(tiles.len(), 3 * 2);
        let area: usize = tiles.iter().map(|t| t.width * t.height).sum();
        assert_eq!(area, 37 * 20);
    }

    #[test]
    fn merge_places_pixels() {
        let film = Film::new(4, 4);
        let mut tile = FilmTile::new(2, 2, 2, 2);
        tile.pixels[3] = Spectrum::ONE;
        film.merge_tile(&tile);
        let pixels = film.pixels();
        assert_eq!(pixels[3 * 4 + 3], Spectrum::ONE);
        assert_eq!(pixels.iter().filter(|p| !p.is_black()).count(), 1);
    }
}
