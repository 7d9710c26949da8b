use crate::brew::{BrewFrame, BrewMachine, BrewSession};
use crate::config::{Palette, Rgb, Settings, CAPTION};
use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::layout::LayoutSpec;
use crate::render::{
    canvas_to_cells, draw_button, draw_machine_ascii, draw_text, steaming, MachineArt, Pixel,
    Steam, Terminal, Viewport,
};
use crossterm::style::Color;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scene {
    Menu,
    Brewing,
}

pub(crate) struct App {
    settings: Settings,
    palette: Palette,
    layout: LayoutSpec,
    machine: BrewMachine,
    session: BrewSession,
    steam: Steam,
    term: Terminal,
    scene: Scene,
    should_quit: bool,
}

impl App {
    fn init(settings: Settings) -> anyhow::Result<Self> {
        let palette = Palette::default();
        let layout = LayoutSpec::default();
        let machine = BrewMachine::new(&palette, settings.fill_ticks());
        let steam = Steam::new(settings.seed);
        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            palette,
            layout,
            machine,
            session: BrewSession::new(),
            steam,
            term,
            scene: Scene::Menu,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.settings.fps_cap as f32);

        while !self.should_quit {
            // A resize only swaps buffers; the brew counter and the
            // selection are untouched and geometry is re-derived below.
            let _resized = self.term.resize_if_needed()?;

            let events = collect_input_nonblocking(frame_dt)?;
            for ev in events {
                match map_event_to_action(self.scene, ev) {
                    Some(Action::Quit) => {
                        self.should_quit = true;
                        break;
                    }
                    Some(Action::ClickAt { column, row }) => {
                        let nx = (column as f32 + 0.5) / self.term.cols.max(1) as f32;
                        let ny = (row as f32 + 0.5) / self.term.rows.max(1) as f32;
                        if let Some(index) = self.layout.hit_test(nx, ny) {
                            self.press_button(index);
                        }
                    }
                    Some(Action::PressButton(index)) => self.press_button(index),
                    None => {}
                }
            }

            // one advance per display tick
            let frame = self.machine.advance(&mut self.session);
            self.render_frame(&frame)?;

            if frame.finished {
                self.session.reset();
                self.steam.clear();
                self.scene = Scene::Menu;
            }

            spin_sleep(frame_dt, Instant::now());
        }

        self.term.end()?;
        Ok(())
    }

    /// A hit on a labeled button picks that drink; blank grid buttons and
    /// repeated presses mid-brew are ignored.
    fn press_button(&mut self, index: usize) {
        if !self.session.is_idle() {
            return;
        }
        let Some(name) = self.machine.drink_names().get(index).copied() else {
            return;
        };
        if self.session.select(name) {
            self.scene = Scene::Brewing;
        }
    }

    fn render_frame(&mut self, frame: &BrewFrame) -> anyhow::Result<()> {
        let bg = self.bg();
        self.term.cur.clear(bg);

        match self.scene {
            Scene::Menu => self.render_menu(),
            Scene::Brewing => self.render_brewing(frame, bg),
        }

        // text overlay goes on top of whatever the scene painted
        let fg = self.tint(self.palette.text);
        draw_text(&mut self.term.cur, 1, 0, CAPTION, fg, bg);

        let rows = self.term.rows;
        draw_text(
            &mut self.term.cur,
            1,
            rows.saturating_sub(2),
            &frame.message,
            fg,
            bg,
        );
        let help = match self.scene {
            Scene::Menu => "click a drink or press 1-3 | q quit",
            Scene::Brewing => "q quit",
        };
        draw_text(&mut self.term.cur, 1, rows.saturating_sub(1), help, fg, bg);

        self.term.present(true)?;
        Ok(())
    }

    fn render_menu(&mut self) {
        let names = self.machine.drink_names();
        let sw = self.term.cols as f32;
        let sh = self.term.rows as f32;

        let label_fg = self.tint(self.palette.text);
        let button_bg = if self.settings.enable_color {
            rgb(self.palette.button)
        } else {
            Color::DarkGrey
        };

        // the whole grid, labeled or not, exactly as wide as the layout says
        for index in 0..self.layout.button_count() {
            let rect = self.layout.button_rect(index, sw, sh);
            let label = names.get(index).copied().unwrap_or("");
            draw_button(&mut self.term.cur, &rect, label, label_fg, button_bg);
        }
    }

    fn render_brewing(&mut self, frame: &BrewFrame, bg: Color) {
        if self.settings.enable_braille {
            self.term.canvas.clear(Pixel::default());

            // leave the caption row and the two text rows out of the viewport
            let top = 4i32;
            let bottom = (self.term.canvas.h as i32 - 8).max(top + 1);
            let vp_h = bottom - top;
            let vp_w = (vp_h * 11 / 10).min(self.term.canvas.w as i32).max(1);
            let vp = Viewport {
                x: (self.term.canvas.w as i32 - vp_w) / 2,
                y: top,
                w: vp_w,
                h: vp_h,
            };

            MachineArt::draw(&mut self.term.canvas, frame, &self.palette, vp);
            self.steam.update(steaming(frame.phase), vp);
            self.steam.draw(&mut self.term.canvas, self.palette.steam);

            canvas_to_cells(
                &self.term.canvas,
                &mut self.term.cur,
                self.settings.enable_color,
                bg,
            );
        } else {
            let cx = self.term.cols as i32 / 2;
            let cy = self.term.rows as i32 / 2;
            draw_machine_ascii(
                &mut self.term.cur,
                frame,
                cx,
                cy,
                self.settings.enable_color,
                bg,
            );
        }
    }

    fn tint(&self, c: Rgb) -> Color {
        if self.settings.enable_color {
            rgb(c)
        } else {
            Color::White
        }
    }

    fn bg(&self) -> Color {
        if self.settings.enable_color {
            rgb(self.palette.background)
        } else {
            Color::Black
        }
    }
}

fn rgb(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

pub(crate) fn run(mut settings: Settings) -> anyhow::Result<()> {
    // clamp before anything derives from the frame rate (fill time included)
    settings.fps_cap = settings.fps_cap.clamp(10, 240);
    let mut app = App::init(settings)?;
    app.run()?;
    Ok(())
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
