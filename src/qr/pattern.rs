use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{GrayImage, ImageFormat, ImageResult, Luma};

pub const IMAGE_SIZE: u32 = 200;
pub const GRID_SIZE: u32 = 8;
const CELL_SIZE: u32 = IMAGE_SIZE / GRID_SIZE;

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// Which grid cells are painted, row-major. Cell `i` is black when the i-th
/// UTF-16 code unit of `text` is even; cells past the end of `text` stay
/// white.
pub fn pattern_cells(text: &str) -> Vec<bool> {
    let mut cells = vec![false; (GRID_SIZE * GRID_SIZE) as usize];
    for (cell, unit) in cells.iter_mut().zip(text.encode_utf16()) {
        *cell = unit % 2 == 0;
    }
    cells
}

/// Renders the placeholder pattern for `text` as a PNG data URI.
///
/// Not a real QR code: standard readers cannot scan it.
pub fn render_pattern(text: &str) -> ImageResult<String> {
    let mut img = GrayImage::from_pixel(IMAGE_SIZE, IMAGE_SIZE, WHITE);

    for (i, black) in pattern_cells(text).into_iter().enumerate() {
        if !black {
            continue;
        }
        let row = i as u32 / GRID_SIZE;
        let col = i as u32 % GRID_SIZE;
        for y in row * CELL_SIZE..(row + 1) * CELL_SIZE {
            for x in col * CELL_SIZE..(col + 1) * CELL_SIZE {
                img.put_pixel(x, y, BLACK);
            }
        }
    }

    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_data_uri(uri: &str) -> GrayImage {
        let encoded = uri.strip_prefix("data:image/png;base64,").unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        image::load_from_memory(&bytes).unwrap().to_luma8()
    }

    #[test]
    fn even_character_codes_paint_cells() {
        // 'A' = 65, 'B' = 66, 'D' = 68
        let cells = pattern_cells("ABD");
        assert_eq!(cells.len(), 64);
        assert_eq!(&cells[..3], &[false, true, true]);
        assert!(cells[3..].iter().all(|c| !c));
    }

    #[test]
    fn only_the_first_sixty_four_characters_count() {
        let text = format!("{}{}", "A".repeat(64), "B".repeat(10));
        assert!(pattern_cells(&text).iter().all(|c| !c));
    }

    #[test]
    fn pattern_is_deterministic() {
        assert_eq!(
            render_pattern("eyJpZCI6IjEifQ==").unwrap(),
            render_pattern("eyJpZCI6IjEifQ==").unwrap()
        );
    }

    #[test]
    fn rendered_image_matches_cells() {
        // Second cell (row 0, col 1) and tenth cell (row 1, col 1) are black.
        let text = "ABAAAAAAAB";
        let img = decode_data_uri(&render_pattern(text).unwrap());

        assert_eq!(img.dimensions(), (IMAGE_SIZE, IMAGE_SIZE));
        assert_eq!(img.get_pixel(10, 10), &WHITE);
        assert_eq!(img.get_pixel(CELL_SIZE + 10, 10), &BLACK);
        assert_eq!(img.get_pixel(CELL_SIZE + 10, CELL_SIZE + 10), &BLACK);
        assert_eq!(img.get_pixel(10, CELL_SIZE + 10), &WHITE);
        assert_eq!(img.get_pixel(IMAGE_SIZE - 1, IMAGE_SIZE - 1), &WHITE);
    }
}
