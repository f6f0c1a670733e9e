//! In-place painting helpers
//!
//! These are the only mutating operations on a [`RasterBuffer`]; colors are
//! given per channel and truncated or repeated to fit the layout.

use super::RasterBuffer;
use crate::error::Result;
use crate::geometry::Rect;
use crate::mask::BinaryMask;

impl RasterBuffer {
    #[inline]
    fn put_color(&mut self, x: u32, y: u32, color: &[u8]) {
        let px = self.pixel_mut(x, y);
        for (i, v) in px.iter_mut().enumerate() {
            *v = color[i.min(color.len() - 1)];
        }
    }

    /// Fill the whole buffer with one color.
    pub fn fill(&mut self, color: &[u8]) {
        if self.is_empty() || color.is_empty() {
            return;
        }
        let c = self.channels();
        for px in self.data.chunks_exact_mut(c) {
            for (i, v) in px.iter_mut().enumerate() {
                *v = color[i.min(color.len() - 1)];
            }
        }
    }

    /// Fill a rectangle (clipped) with one color.
    pub fn fill_rect(&mut self, rect: &Rect, color: &[u8]) {
        let Some(r) = rect.clip_to(self.width, self.height) else {
            return;
        };
        if color.is_empty() {
            return;
        }
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                self.put_color(x as u32, y as u32, color);
            }
        }
    }

    /// Fill a disc (clipped) with one color.
    pub fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: &[u8]) {
        if self.is_empty() || color.is_empty() || radius <= 0.0 {
            return;
        }
        let r2 = radius * radius;
        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil() as i64).clamp(0, self.width as i64 - 1) as u32;
        let y1 = ((cy + radius).ceil() as i64).clamp(0, self.height as i64 - 1) as u32;
        for y in y0..=y1.min(self.height.saturating_sub(1)) {
            for x in x0..=x1.min(self.width.saturating_sub(1)) {
                let dx = x as f64 - cx;
                let dy = y as f64 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.put_color(x, y, color);
                }
            }
        }
    }

    /// Draw a straight line of the given thickness (clipped).
    pub fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, thickness: f64, color: &[u8]) {
        let len = (x1 - x0).hypot(y1 - y0);
        let steps = (len.ceil() as usize * 2).max(1);
        let half = (thickness / 2.0).max(0.5);
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.fill_circle(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t, half, color);
        }
    }

    /// Set every pixel under a set mask bit to `color`.
    ///
    /// # Errors
    ///
    /// Fails when the mask size differs from the buffer size.
    pub fn fill_masked(&mut self, mask: &BinaryMask, color: &[u8]) -> Result<()> {
        self.ensure_same_size(mask.width(), mask.height())?;
        if color.is_empty() {
            return Ok(());
        }
        for y in 0..self.height {
            for x in 0..self.width {
                if mask.get_unchecked(x, y) {
                    self.put_color(x, y, color);
                }
            }
        }
        Ok(())
    }

    /// Copy `src` into this buffer with its top-left corner at (`x`, `y`).
    ///
    /// Both buffers must share a layout; out-of-range parts are dropped.
    pub fn paste(&mut self, src: &RasterBuffer, x: i32, y: i32) -> Result<()> {
        if src.layout != self.layout {
            return Err(crate::error::Error::UnsupportedLayout {
                expected: self.layout.name(),
                actual: src.layout.name(),
            });
        }
        let dst_rect = Rect::new_unchecked(x, y, src.width as i32, src.height as i32);
        let Some(r) = dst_rect.clip_to(self.width, self.height) else {
            return Ok(());
        };
        let c = self.channels();
        for dy in r.y..r.bottom() {
            let sy = (dy - y) as u32;
            let sx0 = (r.x - x) as usize;
            let src_row = &src.row(sy)[sx0 * c..(sx0 + r.w as usize) * c];
            let dst_row = self.row_mut(dy as u32);
            dst_row[r.x as usize * c..r.right() as usize * c].copy_from_slice(src_row);
        }
        Ok(())
    }
}
