//! Procedural sprite image.

/// Resource id of the checker image; textures are re-created from it after a
/// context loss.
pub const CHECKER_RESOURCE: u32 = 1;

pub const CHECKER_SIZE: u32 = 64;

/// RGBA8 checkerboard, `size × size` pixels, `cell` pixels per square, with a
/// transparent one-pixel border so blending is visible.
pub fn checker_rgba8(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Vec<u8> {
    let cell = cell.max(1);
    let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        for x in 0..size {
            let border = x == 0 || y == 0 || x + 1 == size || y + 1 == size;
            let color = if border {
                [0, 0, 0, 0]
            } else if (x / cell + y / cell) % 2 == 0 {
                a
            } else {
                b
            };
            pixels.extend_from_slice(&color);
        }
    }
    pixels
}

/// The demo's sprite image.
pub fn sprite_image() -> Vec<u8> {
    checker_rgba8(CHECKER_SIZE, 8, [230, 90, 40, 255], [250, 220, 120, 255])
}
