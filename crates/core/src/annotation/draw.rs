//! Pixel-level drawing primitives for frame overlays.
//!
//! Everything clips at the frame edges through `Frame::set_pixel`, so
//! callers can pass boxes and labels that hang partly off screen.

use crate::shared::frame::Frame;

pub const GREEN: [u8; 3] = [0, 255, 0];
pub const WHITE: [u8; 3] = [255, 255, 255];
pub const MAGENTA: [u8; 3] = [255, 0, 255];

const GLYPH_WIDTH: i32 = 3;
pub const TEXT_SCALE: i32 = 2;

/// Rectangle outline from `(x1, y1)` to `(x2, y2)` inclusive, `thickness`
/// pixels thick, growing inward.
pub fn draw_rect(
    frame: &mut Frame,
    bbox: (i32, i32, i32, i32),
    color: [u8; 3],
    thickness: i32,
) {
    let (x1, y1, x2, y2) = bbox;
    for inset in 0..thickness {
        let (left, top) = (x1 + inset, y1 + inset);
        let (right, bottom) = (x2 - inset, y2 - inset);
        if left > right || top > bottom {
            break;
        }
        for x in left..=right {
            frame.set_pixel(x, top, color);
            frame.set_pixel(x, bottom, color);
        }
        for y in top..=bottom {
            frame.set_pixel(left, y, color);
            frame.set_pixel(right, y, color);
        }
    }
}

/// Filled disc centered at `(cx, cy)`.
pub fn draw_disc(frame: &mut Frame, cx: i32, cy: i32, radius: i32, color: [u8; 3]) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                frame.set_pixel(cx + dx, cy + dy, color);
            }
        }
    }
}

/// Text at `(x, y)` (top-left of the first glyph). Lowercase letters render
/// through their uppercase glyphs; unknown characters advance the cursor
/// without drawing.
pub fn draw_text(frame: &mut Frame, x: i32, y: i32, text: &str, color: [u8; 3]) {
    let mut cursor_x = x;
    for ch in text.chars() {
        draw_char(frame, cursor_x, y, ch.to_ascii_uppercase(), color);
        cursor_x += (GLYPH_WIDTH + 1) * TEXT_SCALE;
    }
}

fn draw_char(frame: &mut Frame, x: i32, y: i32, ch: char, color: [u8; 3]) {
    let bitmap: [u8; 5] = match ch {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b010, 0b001],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        _ => [0b000, 0b000, 0b000, 0b000, 0b000],
    };

    for (row, bits) in bitmap.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 1 {
                for dy in 0..TEXT_SCALE {
                    for dx in 0..TEXT_SCALE {
                        frame.set_pixel(
                            x + col * TEXT_SCALE + dx,
                            y + row as i32 * TEXT_SCALE + dy,
                            color,
                        );
                    }
                }
            }
        }
    }
}
