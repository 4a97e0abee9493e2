//! Frame-number labels drawn with a built-in 5×7 bitmap font.
//!
//! Only the glyphs a `Frame: N` label needs are defined; anything else
//! renders as a hollow box.

use image::Rgb;

use reframe_frame_model::frame::Frame;

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// Horizontal advance per character, in font pixels.
const ADVANCE: u32 = GLYPH_WIDTH + 1;

/// The overlay label for a zero-based frame index.
pub fn frame_label(frame_index: usize) -> String {
    format!("Frame: {}", frame_index + 1)
}

/// Width and height of `text` in image pixels at `scale`.
pub fn text_size(text: &str, scale: u32) -> (u32, u32) {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return (0, 0);
    }
    (
        (chars * ADVANCE - 1) * scale.max(1),
        GLYPH_HEIGHT * scale.max(1),
    )
}

/// Draw `text` with its top-left corner at `(x, y)`, each font pixel
/// scaled to a `scale`×`scale` block. Pixels outside the frame are skipped.
pub fn draw_text(frame: &mut Frame, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1);
    let (width, height) = frame.dimensions();

    for (i, ch) in text.chars().enumerate() {
        let origin_x = x + i as u32 * ADVANCE * scale;
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                    continue;
                }
                let px = origin_x + col * scale;
                let py = y + row as u32 * scale;
                for dy in 0..scale {
                    for dx in 0..scale {
                        let (fx, fy) = (px + dx, py + dy);
                        if fx < width && fy < height {
                            frame.put_pixel(fx, fy, color);
                        }
                    }
                }
            }
        }
    }
}

fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        ' ' => [0; 7],
        _ => [0b11111, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111],
    }
}
