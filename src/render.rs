use crate::brew::{BrewFrame, BrewPhase};
use crate::config::{Palette, Rgb};
use crate::layout::ButtonRect;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            c.ch = ' ';
            c.fg = Color::White;
            c.bg = bg;
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    pub(crate) fn opaque(c: Rgb) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: 255,
        }
    }
    pub(crate) fn faded(c: Rgb, a: u8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a,
        }
    }
}

pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn clear(&mut self, p: Pixel) {
        self.px.fill(p);
    }
    pub(crate) fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }

    /// Filled axis-aligned rectangle, clipped to the canvas.
    pub(crate) fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, p: Pixel) {
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_over(x, y, p);
            }
        }
    }

    /// Arc stroke around (cx, cy); angles in degrees, 0° at three o'clock.
    pub(crate) fn stroke_arc(
        &mut self,
        cx: f32,
        cy: f32,
        r: f32,
        start_deg: f32,
        end_deg: f32,
        p: Pixel,
    ) {
        let steps = ((end_deg - start_deg).abs().max(1.0) * 0.5) as i32 + 8;
        for i in 0..=steps {
            let a = (start_deg + (end_deg - start_deg) * i as f32 / steps as f32).to_radians();
            let x = (cx + a.cos() * r).round() as i32;
            let y = (cy + a.sin() * r).round() as i32;
            self.blend_over(x, y, p);
            self.blend_over(x + 1, y, p);
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        let prev = CellBuffer::new(cols, rows);
        let cur = CellBuffer::new(cols, rows);

        // Braille: 2×4 pixels per cell
        let canvas = PixelCanvas::new(cols as u32 * 2, rows as u32 * 4);

        Ok(Self {
            out,
            cols,
            rows,
            prev,
            cur,
            canvas,
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

pub(crate) fn canvas_to_cells(
    canvas: &PixelCanvas,
    out: &mut CellBuffer,
    enable_color: bool,
    bg: Color,
) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * 2;
            let py0 = cy * 4;

            let mut mask: u8 = 0;
            let mut sum_r: u32 = 0;
            let mut sum_g: u32 = 0;
            let mut sum_b: u32 = 0;
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let x = px0 + dx;
                    let y = py0 + dy;
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    let a = p.a as u32;

                    // threshold: treat alpha as ink
                    if a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink_count += 1;
                    }
                }
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');

            let fg = if enable_color && ink_count > 0 {
                let r = (sum_r / ink_count) as u8;
                let g = (sum_g / ink_count) as u8;
                let b = (sum_b / ink_count) as u8;
                Color::Rgb { r, g, b }
            } else {
                Color::White
            };

            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

/* -----------------------------
   Machine graphic (pixel space)
------------------------------ */

#[derive(Clone, Copy)]
pub(crate) struct Viewport {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) w: i32,
    pub(crate) h: i32,
}

pub(crate) struct MachineArt;

impl MachineArt {
    /// Draw the machine chrome and whatever liquid directives the frame
    /// carries. Geometry is fractions of the viewport, recomputed every
    /// frame so resizes just work.
    pub(crate) fn draw(
        canvas: &mut PixelCanvas,
        frame: &BrewFrame,
        palette: &Palette,
        vp: Viewport,
    ) {
        let fx = |f: f32| vp.x + (f * vp.w as f32) as i32;
        let fy = |f: f32| vp.y + (f * vp.h as f32) as i32;

        let body = Pixel::opaque(palette.body);
        let window = Pixel::opaque(palette.window);
        let mug = Pixel::opaque(palette.mug);

        // cabinet with the reservoir window punched out
        canvas.fill_rect(fx(0.18), fy(0.04), fx(0.82), fy(0.60), body);
        canvas.fill_rect(fx(0.28), fy(0.12), fx(0.72), fy(0.44), window);

        // spout housing under the cabinet
        canvas.fill_rect(fx(0.45), fy(0.60), fx(0.55), fy(0.66), body);

        // mug: walls, floor, and the handle arc on the right
        canvas.fill_rect(fx(0.40), fy(0.84), fx(0.42), fy(0.97), mug);
        canvas.fill_rect(fx(0.58), fy(0.84), fx(0.60), fy(0.97), mug);
        canvas.fill_rect(fx(0.40), fy(0.95), fx(0.60), fy(0.97), mug);
        let handle_r = (0.05 * vp.w as f32).max(3.0);
        canvas.stroke_arc(
            fx(0.60) as f32,
            fy(0.905) as f32,
            handle_r,
            -90.0,
            90.0,
            mug,
        );

        let Some(liquid) = frame.liquid else {
            return;
        };
        let ink = Pixel::opaque(liquid.color);

        // reservoir fills bottom-up
        if liquid.reservoir > 0.0 {
            let top = 0.44 - 0.32 * liquid.reservoir.clamp(0.0, 1.0);
            canvas.fill_rect(fx(0.28), fy(top), fx(0.72), fy(0.44), ink);
        }

        // pour stream reaches toward the mug as the spout fraction rises
        if liquid.spout > 0.0 {
            let reach = 0.66 + 0.20 * liquid.spout.clamp(0.0, 1.0);
            canvas.fill_rect(fx(0.485), fy(0.66), fx(0.515), fy(reach), ink);
        }

        // mug interior
        if liquid.mug > 0.0 {
            let top = 0.95 - 0.09 * liquid.mug.clamp(0.0, 1.0);
            canvas.fill_rect(fx(0.42), fy(top), fx(0.58), fy(0.95), ink);
        }
    }
}

/* -----------------------------
   Steam decoration
------------------------------ */

struct Puff {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    life: f32,
}

pub(crate) struct Steam {
    puffs: Vec<Puff>,
    rng: SmallRng,
}

impl Steam {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            puffs: Vec::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.puffs.clear();
    }

    /// Hot phases emit puffs above the cabinet; everything drifts up,
    /// wobbles, and fades.
    pub(crate) fn update(&mut self, active: bool, vp: Viewport) {
        if active && self.puffs.len() < 40 {
            let x = vp.x as f32 + vp.w as f32 * self.rng.gen_range(0.30..0.70);
            let y = vp.y as f32 + vp.h as f32 * 0.04;
            self.puffs.push(Puff {
                x,
                y,
                vx: self.rng.gen_range(-0.15..0.15),
                vy: self.rng.gen_range(-0.45..-0.2),
                life: 1.0,
            });
        }
        for p in &mut self.puffs {
            p.x += p.vx;
            p.y += p.vy;
            p.life -= 0.02;
        }
        let floor = vp.y as f32;
        self.puffs.retain(|p| p.life > 0.0 && p.y > floor - 2.0);
    }

    pub(crate) fn draw(&self, canvas: &mut PixelCanvas, color: Rgb) {
        for p in &self.puffs {
            let a = (p.life * 150.0) as u8;
            let x = p.x.round() as i32;
            let y = p.y.round() as i32;
            canvas.blend_over(x, y, Pixel::faded(color, a));
            canvas.blend_over(x + 1, y, Pixel::faded(color, a));
        }
    }
}

/* -----------------------------
   Cell-space text and buttons
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

/// Word-wrapped text inside a w×h box at (x, y): words go left to right
/// and wrap when the next one would cross the right edge, one row per
/// line. Starts one cell in from the corner.
pub(crate) fn draw_wrapped_text(
    buf: &mut CellBuffer,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    text: &str,
    fg: Color,
    bg: Color,
) {
    let inset = 1i32;
    let mut cx = inset;
    let mut cy = inset;
    for word in text.split_whitespace() {
        let len = word.chars().count() as i32;
        if cx + len >= w {
            cx = inset;
            cy += 1;
        }
        if cy >= h {
            break;
        }
        for (i, ch) in word.chars().enumerate() {
            let xx = x + cx + i as i32;
            if xx >= x + w {
                break;
            }
            if xx >= 0 && cy + y >= 0 {
                buf.set(xx as u16, (y + cy) as u16, Cell { ch, fg, bg });
            }
        }
        cx += len + 1;
    }
}

pub(crate) fn draw_button(buf: &mut CellBuffer, rect: &ButtonRect, label: &str, fg: Color, bg: Color) {
    let x0 = rect.x.round() as i32;
    let y0 = rect.y.round() as i32;
    let w = (rect.w.round() as i32).max(1);
    let h = (rect.h.round() as i32).max(1);

    for yy in y0..y0 + h {
        for xx in x0..x0 + w {
            if xx >= 0 && yy >= 0 {
                buf.set(xx as u16, yy as u16, Cell { ch: ' ', fg, bg });
            }
        }
    }
    if !label.is_empty() {
        draw_wrapped_text(buf, x0, y0, w, h, label, fg, bg);
    }
}

/* -----------------------------
   ASCII fallback machine
------------------------------ */

pub(crate) fn draw_machine_ascii(
    buf: &mut CellBuffer,
    frame: &BrewFrame,
    cx: i32,
    cy: i32,
    enable_color: bool,
    bg: Color,
) {
    let fg = Color::White;
    let liquid_fg = match (enable_color, frame.liquid) {
        (true, Some(l)) => Color::Rgb {
            r: l.color.r,
            g: l.color.g,
            b: l.color.b,
        },
        _ => Color::White,
    };

    let art = [
        "  _________________  ",
        " |  _____________  | ",
        " | |             | | ",
        " | |             | | ",
        " | |             | | ",
        " | |             | | ",
        " | |_____________| | ",
        " |_______   _______| ",
        "         | |         ",
        "                     ",
        "                     ",
        "       |     |       ",
        "       |_____|       ",
    ];
    let w = art[0].chars().count() as i32;
    let x0 = cx - w / 2;
    let y0 = cy - art.len() as i32 / 2;

    for (yy, line) in art.iter().enumerate() {
        let y = y0 + yy as i32;
        if y < 0 || y >= buf.h as i32 {
            continue;
        }
        let mut x = x0;
        for ch in line.chars() {
            if ch != ' ' && x >= 0 && x < buf.w as i32 {
                buf.set(x as u16, y as u16, Cell { ch, fg, bg });
            }
            x += 1;
        }
    }

    let Some(liquid) = frame.liquid else {
        return;
    };

    // window rows 2..=5 fill bottom-up with the liquid color
    let window_rows = 4i32;
    let filled = (liquid.reservoir.clamp(0.0, 1.0) * window_rows as f32).round() as i32;
    for row in 0..filled {
        let y = y0 + 5 - row;
        for x in x0 + 4..x0 + 17 {
            if x >= 0 && y >= 0 {
                buf.set(
                    x as u16,
                    y as u16,
                    Cell {
                        ch: '█',
                        fg: liquid_fg,
                        bg,
                    },
                );
            }
        }
    }

    // pour stream between the spout (row 8) and the mug rim (row 11)
    let stream_rows = (liquid.spout.clamp(0.0, 1.0) * 3.0).round() as i32;
    for row in 0..stream_rows {
        let y = y0 + 9 + row;
        let x = x0 + 10;
        if x >= 0 && y >= 0 {
            buf.set(
                x as u16,
                y as u16,
                Cell {
                    ch: '┆',
                    fg: liquid_fg,
                    bg,
                },
            );
        }
    }

    // mug interior
    if liquid.mug > 0.5 {
        let y = y0 + 11;
        for x in x0 + 8..x0 + 13 {
            if x >= 0 && y >= 0 {
                buf.set(
                    x as u16,
                    y as u16,
                    Cell {
                        ch: '▒',
                        fg: liquid_fg,
                        bg,
                    },
                );
            }
        }
    }
}

pub(crate) fn steaming(phase: BrewPhase) -> bool {
    matches!(
        phase,
        BrewPhase::Boiling | BrewPhase::Flavoring | BrewPhase::Seasoning | BrewPhase::Dispensing
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_at(buf: &CellBuffer, x: u16, y: u16) -> Cell {
        buf.cells[buf.idx(x, y)]
    }

    #[test]
    fn wrapped_text_breaks_before_the_right_edge() {
        let mut buf = CellBuffer::new(20, 6);
        draw_wrapped_text(&mut buf, 0, 0, 10, 6, "one two three", Color::White, Color::Black);

        // "one two" on the first row, "three" wrapped to the second
        assert_eq!(cell_at(&buf, 1, 1).ch, 'o');
        assert_eq!(cell_at(&buf, 5, 1).ch, 't');
        assert_eq!(cell_at(&buf, 1, 2).ch, 't');
        assert_eq!(cell_at(&buf, 5, 2).ch, 'e');
    }

    #[test]
    fn wrapped_text_stops_at_the_box_bottom() {
        let mut buf = CellBuffer::new(20, 6);
        draw_wrapped_text(&mut buf, 0, 0, 6, 3, "aaa bbb ccc ddd", Color::White, Color::Black);
        for y in 3..6 {
            for x in 0..20 {
                assert_eq!(cell_at(&buf, x, y).ch, ' ');
            }
        }
    }

    #[test]
    fn fill_rect_clips_to_the_canvas() {
        let mut canvas = PixelCanvas::new(8, 8);
        canvas.fill_rect(-4, -4, 20, 20, Pixel::opaque(Rgb::new(1, 2, 3)));
        for p in &canvas.px {
            assert_eq!((p.r, p.g, p.b, p.a), (1, 2, 3, 255));
        }
    }

    #[test]
    fn arc_stays_on_the_requested_side() {
        let mut canvas = PixelCanvas::new(40, 40);
        canvas.stroke_arc(20.0, 20.0, 8.0, -90.0, 90.0, Pixel::opaque(Rgb::new(9, 9, 9)));
        for y in 0..40u32 {
            for x in 0..20u32 {
                assert_eq!(canvas.px[canvas.idx(x, y)].a, 0, "ink left of center at {x},{y}");
            }
        }
    }
}
