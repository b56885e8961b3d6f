//! Raster map loading.
//!
//! Maps are plain raster images: each pixel becomes one grid cell, transposed
//! so the image's X axis indexes grid columns. A pixel whose luminance
//! exceeds the midpoint becomes a trap tile; everything else is empty floor.

use crate::error::ServerError;
use crate::grid::{Cell, Grid};
use std::path::Path;
use tracing::info;
use wayfarer_event_system::Tile;

/// Glyph used for trap tiles produced by the loader.
pub const TRAP_GLYPHS: &str = "##";

/// Rec. 601 luma threshold on the 0-255 scale; brighter pixels are traps.
const LUMINANCE_THRESHOLD: f32 = 127.5;

/// Loads a grid from a raster image file.
///
/// # Arguments
///
/// * `path` - Path to any raster format the `image` crate can decode
///
/// # Returns
///
/// The decoded [`Grid`], or a `ServerError::Map` describing why the file
/// could not be read or decoded.
pub fn load_grid(path: &Path) -> Result<Grid, ServerError> {
    let trap_tile = Tile::new(TRAP_GLYPHS).map_err(|e| ServerError::Map(e.to_string()))?;

    let image = image::open(path)
        .map_err(|e| ServerError::Map(format!("Failed to open map {}: {e}", path.display())))?
        .to_rgb8();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ServerError::Map(format!(
            "Map {} has a zero dimension ({width}x{height})",
            path.display()
        )));
    }

    // Column-major: cell (x, y) is pixel (x, y) of the image.
    let mut cells = Vec::with_capacity((width as usize) * (height as usize));
    for x in 0..width {
        for y in 0..height {
            let pixel = image.get_pixel(x, y);
            let luminance = 0.299 * pixel[0] as f32
                + 0.587 * pixel[1] as f32
                + 0.114 * pixel[2] as f32;
            if luminance > LUMINANCE_THRESHOLD {
                cells.push(Cell::Trap(trap_tile));
            } else {
                cells.push(Cell::Empty);
            }
        }
    }

    let traps = cells.iter().filter(|c| matches!(c, Cell::Trap(_))).count();
    let grid = Grid::new(width, height, cells)?;
    info!(
        "🗺️ Loaded map {} ({}x{}, {} trap cells)",
        path.display(),
        grid.width(),
        grid.height(),
        traps
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use wayfarer_event_system::Vector;

    fn write_map(name: &str, pixels: &[(u32, u32, [u8; 3])], width: u32, height: u32) -> std::path::PathBuf {
        let mut image = RgbImage::new(width, height);
        for &(x, y, rgb) in pixels {
            image.put_pixel(x, y, Rgb(rgb));
        }
        let path = std::env::temp_dir().join(format!("wayfarer-map-{name}-{}.png", std::process::id()));
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn bright_pixels_become_traps() {
        let path = write_map(
            "bright",
            &[(1, 0, [255, 255, 255]), (2, 2, [200, 200, 200])],
            3,
            3,
        );
        let grid = load_grid(&path).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 3);
        assert!(grid.tile_at(Vector::new(1, 0)).is_some());
        assert!(grid.tile_at(Vector::new(2, 2)).is_some());
        assert!(grid.tile_at(Vector::new(0, 0)).is_none());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn luminance_uses_rec601_weights() {
        // Pure red (76.2) and pure blue (29.1) stay floor; pure green (149.7)
        // crosses the threshold.
        let path = write_map(
            "weights",
            &[
                (0, 0, [255, 0, 0]),
                (1, 0, [0, 255, 0]),
                (2, 0, [0, 0, 255]),
            ],
            3,
            1,
        );
        let grid = load_grid(&path).unwrap();
        assert!(grid.tile_at(Vector::new(0, 0)).is_none());
        assert!(grid.tile_at(Vector::new(1, 0)).is_some());
        assert!(grid.tile_at(Vector::new(2, 0)).is_none());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn non_square_maps_transpose_image_axes() {
        // 4 wide x 2 tall image => grid with width 4, height 2; the pixel at
        // image (3, 1) is grid cell (3, 1).
        let path = write_map("transpose", &[(3, 1, [255, 255, 255])], 4, 2);
        let grid = load_grid(&path).unwrap();
        assert_eq!((grid.width(), grid.height()), (4, 2));
        assert!(grid.tile_at(Vector::new(3, 1)).is_some());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_is_a_map_error() {
        let err = load_grid(Path::new("/nonexistent/map.png")).unwrap_err();
        assert!(matches!(err, ServerError::Map(_)));
    }
}
