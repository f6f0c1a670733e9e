//! Synthetic page builders
//!
//! Every builder returns an 8-bit gray page unless noted. Angles are in
//! degrees, positive for a counter-clockwise tilt as seen on screen.

use crate::TestResult;
use scanclean_core::{PixelLayout, Rect, RasterBuffer};

/// Paper tone used by the builders
pub const PAPER: u8 = 235;
/// Ink tone used by the builders
pub const INK: u8 = 25;

/// Word lengths cycled along each text line.
const WORDS: [f64; 7] = [34.0, 22.0, 48.0, 16.0, 40.0, 28.0, 12.0];

/// Plain page of one tone.
pub fn blank_page(width: u32, height: u32, value: u8) -> TestResult<RasterBuffer> {
    Ok(RasterBuffer::new_filled(width, height, PixelLayout::Gray, value)?)
}

/// Rotate `(x, y)` about `(cx, cy)` by a visual counter-clockwise angle.
fn turn(x: f64, y: f64, cx: f64, cy: f64, angle_deg: f64) -> (f64, f64) {
    let (s, c) = angle_deg.to_radians().sin_cos();
    let (dx, dy) = (x - cx, y - cy);
    (cx + c * dx + s * dy, cy - s * dx + c * dy)
}

/// Text-line layout for [`draw_text_lines`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextLayout {
    /// Stroke height of a line of "words"
    pub line_height: f64,
    /// Distance between line centers
    pub line_pitch: f64,
    /// Gap between words
    pub word_gap: f64,
    pub ink: u8,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            line_height: 7.0,
            line_pitch: 22.0,
            word_gap: 9.0,
            ink: INK,
        }
    }
}

/// Draw rows of word blocks filling `region`, tilted about the page center.
pub fn draw_text_lines(page: &mut RasterBuffer, region: Rect, angle_deg: f64, layout: &TextLayout) {
    let cx = (page.width() as f64 - 1.0) / 2.0;
    let cy = (page.height() as f64 - 1.0) / 2.0;
    let ink = [layout.ink];
    let mut word = 0usize;
    let mut y = region.y as f64 + layout.line_height;
    while y + layout.line_height <= region.bottom() as f64 {
        let mut x = region.x as f64;
        // stagger line starts so columns do not line up
        x += (word % 3) as f64 * 5.0;
        loop {
            let len = WORDS[word % WORDS.len()];
            word += 1;
            let end = (x + len).min(region.right() as f64 - 1.0);
            if end - x < 4.0 {
                break;
            }
            let (x0, y0) = turn(x, y, cx, cy, angle_deg);
            let (x1, y1) = turn(end, y, cx, cy, angle_deg);
            page.draw_line(x0, y0, x1, y1, layout.line_height, &ink);
            x = end + layout.word_gap;
        }
        y += layout.line_pitch;
    }
}

/// Page of text lines with margins, tilted by `angle_deg`.
pub fn text_page(width: u32, height: u32, angle_deg: f64) -> TestResult<RasterBuffer> {
    let mut page = blank_page(width, height, PAPER)?;
    let mx = (width / 8) as i32;
    let my = (height / 8) as i32;
    let region = Rect::new_unchecked(mx, my, width as i32 - 2 * mx, height as i32 - 2 * my);
    draw_text_lines(&mut page, region, angle_deg, &TextLayout::default());
    Ok(page)
}

/// Blank page crossed by one straight dark rule through its center.
///
/// The rule spans 80% of the width before tilting.
pub fn rule_line_page(width: u32, height: u32, angle_deg: f64, thickness: f64) -> TestResult<RasterBuffer> {
    let mut page = blank_page(width, height, PAPER)?;
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;
    let half = width as f64 * 0.4;
    let (x0, y0) = turn(cx - half, cy, cx, cy, angle_deg);
    let (x1, y1) = turn(cx + half, cy, cx, cy, angle_deg);
    page.draw_line(x0, y0, x1, y1, thickness, &[INK]);
    Ok(page)
}

/// White page inside a solid black frame `frame` pixels wide.
pub fn framed_page(width: u32, height: u32, frame: u32) -> TestResult<RasterBuffer> {
    let mut page = blank_page(width, height, 255)?;
    let (w, h, f) = (width as i32, height as i32, frame as i32);
    for r in [
        Rect::new_unchecked(0, 0, w, f),
        Rect::new_unchecked(0, h - f, w, f),
        Rect::new_unchecked(0, 0, f, h),
        Rect::new_unchecked(w - f, 0, f, h),
    ] {
        page.fill_rect(&r, &[0]);
    }
    Ok(page)
}

/// Number of frame pixels [`framed_page`] draws.
pub fn frame_pixel_count(width: u32, height: u32, frame: u32) -> u64 {
    let inner_w = width.saturating_sub(2 * frame) as u64;
    let inner_h = height.saturating_sub(2 * frame) as u64;
    width as u64 * height as u64 - inner_w * inner_h
}

/// White page with one black rectangle.
pub fn page_with_block(width: u32, height: u32, block: Rect) -> TestResult<RasterBuffer> {
    let mut page = blank_page(width, height, 255)?;
    page.fill_rect(&block, &[0]);
    Ok(page)
}

/// A letter-sized glyph plus isolated single-pixel dots
#[derive(Debug, Clone)]
pub struct SpeckledPage {
    pub page: RasterBuffer,
    /// Bounding box of the glyph
    pub glyph: Rect,
    /// Ink pixels belonging to the glyph
    pub glyph_pixels: usize,
    pub dots: Vec<(u32, u32)>,
}

/// White page with one "E"-shaped glyph `glyph_height` tall and ten dots.
///
/// Dots sit on a grid well away from the glyph.
pub fn speckled_page(width: u32, height: u32, glyph_height: u32) -> TestResult<SpeckledPage> {
    let mut page = blank_page(width, height, 255)?;
    let gh = glyph_height as i32;
    let gw = (gh * 2 / 3).max(3);
    let stroke = (gh / 6).max(2);
    let (gx, gy) = (width as i32 / 2 - gw / 2, height as i32 / 2 - gh / 2);
    let parts = [
        Rect::new_unchecked(gx, gy, stroke, gh),
        Rect::new_unchecked(gx, gy, gw, stroke),
        Rect::new_unchecked(gx, gy + gh / 2 - stroke / 2, gw * 3 / 4, stroke),
        Rect::new_unchecked(gx, gy + gh - stroke, gw, stroke),
    ];
    for r in &parts {
        page.fill_rect(r, &[0]);
    }
    let glyph = Rect::new_unchecked(gx, gy, gw, gh);
    let glyph_pixels = (gy..gy + gh)
        .flat_map(|y| (gx..gx + gw).map(move |x| (x, y)))
        .filter(|&(x, y)| page.get_unchecked(x as u32, y as u32) == 0)
        .count();

    let mut dots = Vec::with_capacity(10);
    let keep_out = glyph.inflate(gh);
    let (sx, sy) = (width / 6, height / 6);
    'outer: for j in 1..6 {
        for i in 1..6 {
            let (x, y) = (i * sx + j * 3, j * sy + i * 2);
            if keep_out.contains_point(x as i32, y as i32) {
                continue;
            }
            page.set_unchecked(x, y, 0);
            dots.push((x, y));
            if dots.len() == 10 {
                break 'outer;
            }
        }
    }
    Ok(SpeckledPage {
        page,
        glyph,
        glyph_pixels,
        dots,
    })
}

/// A circular hole drawn by [`punched_page`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hole {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

/// Paper with dark circular punch holes of tone `hole_value`.
pub fn punched_page(width: u32, height: u32, holes: &[Hole], hole_value: u8) -> TestResult<RasterBuffer> {
    let mut page = blank_page(width, height, PAPER)?;
    for h in holes {
        page.fill_circle(h.cx, h.cy, h.radius, &[hole_value]);
    }
    Ok(page)
}

/// Two text pages side by side, split by a bright blank band.
///
/// Returns a BGR spread. The gutter band is `gutter_width` wide and
/// centered on `gutter_x`; pages have darker, slightly uneven paper.
pub fn two_page_spread(width: u32, height: u32, gutter_x: u32, gutter_width: u32) -> TestResult<RasterBuffer> {
    let mut page = blank_page(width, height, 205)?;
    let (w, h) = (width as i32, height as i32);
    let gx0 = gutter_x as i32 - gutter_width as i32 / 2;
    page.fill_rect(&Rect::new_unchecked(gx0, 0, gutter_width as i32, h), &[250]);
    let my = h / 10;
    let inner = 6;
    let layout = TextLayout::default();
    draw_text_lines(
        &mut page,
        Rect::new_unchecked(w / 20, my, gx0 - inner - w / 20, h - 2 * my),
        0.0,
        &layout,
    );
    let rx = gx0 + gutter_width as i32 + inner;
    draw_text_lines(
        &mut page,
        Rect::new_unchecked(rx, my, w - w / 20 - rx, h - 2 * my),
        0.0,
        &layout,
    );
    Ok(page.to_bgr())
}

/// One page of text running edge to edge with no gutter, as BGR.
pub fn single_page_spread(width: u32, height: u32) -> TestResult<RasterBuffer> {
    let mut page = blank_page(width, height, 215)?;
    let (w, h) = (width as i32, height as i32);
    draw_text_lines(
        &mut page,
        Rect::new_unchecked(w / 30, h / 10, w - w / 15, h - h / 5),
        0.0,
        &TextLayout::default(),
    );
    Ok(page.to_bgr())
}

/// Dark pixel count of a gray page (`value <= threshold`).
pub fn dark_pixels(page: &RasterBuffer, threshold: u8) -> usize {
    let c = page.channels().max(1);
    page.data()
        .chunks_exact(c)
        .filter(|px| px[0] <= threshold)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count_matches_drawing() {
        let page = framed_page(50, 40, 4).unwrap();
        assert_eq!(dark_pixels(&page, 0) as u64, frame_pixel_count(50, 40, 4));
    }

    #[test]
    fn test_speckled_page_has_ten_dots() {
        let sp = speckled_page(300, 240, 24).unwrap();
        assert_eq!(sp.dots.len(), 10);
        for &(x, y) in &sp.dots {
            assert!(!sp.glyph.inflate(20).contains_point(x as i32, y as i32));
        }
        assert_eq!(dark_pixels(&sp.page, 0), sp.glyph_pixels + 10);
    }

    #[test]
    fn test_rule_line_tilt_direction() {
        let page = rule_line_page(200, 100, 10.0, 3.0).unwrap();
        // right end rises for a counter-clockwise tilt
        let left: usize = (0..100u32).filter(|&y| page.get_unchecked(30, y) < 128).map(|y| y as usize).sum();
        let right: usize = (0..100u32).filter(|&y| page.get_unchecked(170, y) < 128).map(|y| y as usize).sum();
        assert!(right < left);
    }
}
