//! Button grid geometry. Everything is expressed as a fraction of the
//! surface so the grid keeps its proportions across resizes; pixel
//! rectangles are recomputed from the live surface size every frame.
//! Surface dimensions are assumed > 0.

#[derive(Clone, Copy, Debug)]
pub(crate) struct LayoutSpec {
    pub(crate) columns: usize,
    pub(crate) rows: usize,
    pub(crate) h_spacing: f32,
    pub(crate) v_spacing: f32,
    pub(crate) button_w: f32,
    pub(crate) button_h: f32,
    pub(crate) h_offset: f32,
    pub(crate) v_offset: f32,
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self {
            columns: 2,
            rows: 4,
            h_spacing: 1.0 / 10.0,
            v_spacing: 1.0 / 20.0,
            button_w: 1.0 / 6.0,
            button_h: 1.0 / 8.0,
            h_offset: 1.0 / 10.0,
            v_offset: 1.0 / 4.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ButtonRect {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) w: f32,
    pub(crate) h: f32,
}

impl LayoutSpec {
    pub(crate) fn button_count(&self) -> usize {
        self.columns * self.rows
    }

    /// Pixel rectangle for a 0-based, row-major button index. Indices past
    /// the logical grid still produce a rectangle; bounding is the
    /// caller's business.
    pub(crate) fn button_rect(&self, index: usize, surface_w: f32, surface_h: f32) -> ButtonRect {
        let col = (index % self.columns) as f32;
        let row = (index / self.columns) as f32;

        let w = self.button_w * surface_w;
        let h = self.button_h * surface_h;
        let x = (self.h_offset + self.h_spacing * col) * surface_w + w * col;
        let y = (self.v_offset + self.v_spacing * row) * surface_h + h * row;

        ButtonRect { x, y, w, h }
    }

    /// Map a click, normalized by the surface size, to a button index.
    /// Coordinates in a gutter band, left/above the grid, or past the last
    /// real column or row all miss.
    pub(crate) fn hit_test(&self, nx: f32, ny: f32) -> Option<usize> {
        let col = axis_band(nx - self.h_offset, self.button_w, self.h_spacing)?;
        let row = axis_band(ny - self.v_offset, self.button_h, self.v_spacing)?;

        if col >= self.columns {
            return None;
        }
        let index = row * self.columns + col;
        if index >= self.button_count() {
            return None;
        }
        Some(index)
    }
}

// One axis of the hit test: band index by stride division, then a
// remainder check to reject the gutter between buttons. The remainder may
// equal the button size exactly (trailing edge) and still hit.
fn axis_band(pos: f32, size: f32, spacing: f32) -> Option<usize> {
    if pos < 0.0 {
        return None;
    }
    let stride = size + spacing;
    let band = (pos / stride).floor();
    let within = pos - band * stride;
    if within > size {
        return None;
    }
    Some(band as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> LayoutSpec {
        LayoutSpec::default()
    }

    #[test]
    fn rects_scale_linearly_with_surface() {
        let s = spec();
        for index in 0..s.button_count() {
            let small = s.button_rect(index, 800.0, 450.0);
            let big = s.button_rect(index, 1600.0, 900.0);
            assert!((big.x - small.x * 2.0).abs() < 1e-3);
            assert!((big.y - small.y * 2.0).abs() < 1e-3);
            assert!((big.w - small.w * 2.0).abs() < 1e-3);
            assert!((big.h - small.h * 2.0).abs() < 1e-3);
        }
    }

    #[test]
    fn hit_test_inverts_button_rect_at_centers() {
        let s = spec();
        let (sw, sh) = (1600.0, 900.0);
        for index in 0..s.button_count() {
            let r = s.button_rect(index, sw, sh);
            let (cx, cy) = (r.x + r.w / 2.0, r.y + r.h / 2.0);
            assert_eq!(s.hit_test(cx / sw, cy / sh), Some(index));
        }
    }

    #[test]
    fn offset_origin_hits_button_zero() {
        let s = spec();
        assert_eq!(s.hit_test(s.h_offset, s.v_offset), Some(0));
    }

    #[test]
    fn horizontal_gutter_misses() {
        let s = spec();
        // midway between column 0 and column 1
        let nx = s.h_offset + s.button_w + s.h_spacing / 2.0;
        let ny = s.v_offset + s.button_h / 2.0;
        assert_eq!(s.hit_test(nx, ny), None);
    }

    #[test]
    fn vertical_gutter_misses() {
        let s = spec();
        let nx = s.h_offset + s.button_w / 2.0;
        let ny = s.v_offset + s.button_h + s.v_spacing / 2.0;
        assert_eq!(s.hit_test(nx, ny), None);
    }

    #[test]
    fn trailing_edge_still_hits() {
        let s = spec();
        let nx = s.h_offset + s.button_w;
        let ny = s.v_offset + s.button_h;
        assert_eq!(s.hit_test(nx, ny), Some(0));
    }

    #[test]
    fn left_or_above_the_grid_misses() {
        let s = spec();
        assert_eq!(s.hit_test(s.h_offset - 0.01, s.v_offset + 0.01), None);
        assert_eq!(s.hit_test(s.h_offset + 0.01, s.v_offset - 0.01), None);
        assert_eq!(s.hit_test(-0.2, -0.2), None);
    }

    #[test]
    fn past_last_column_misses() {
        let s = spec();
        // a third column band would start here if the grid had one
        let nx = s.h_offset + 2.0 * (s.button_w + s.h_spacing) + s.button_w / 2.0;
        let ny = s.v_offset + s.button_h / 2.0;
        assert_eq!(s.hit_test(nx, ny), None);
    }

    #[test]
    fn past_last_row_misses() {
        let s = spec();
        let nx = s.h_offset + s.button_w / 2.0;
        let ny = s.v_offset + 4.0 * (s.button_h + s.v_spacing) + s.button_h / 2.0;
        assert_eq!(s.hit_test(nx, ny), None);
    }
}
