#[derive(Clone, Copy, Debug)]
pub(crate) struct Settings {
    pub(crate) fps_cap: u32,
    pub(crate) enable_color: bool,
    pub(crate) enable_braille: bool,
    pub(crate) seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 60,
            enable_color: true,
            enable_braille: true,
            seed: 0xC0FFEE_u64,
        }
    }
}

impl Settings {
    /// Ticks in one brewing phase: 2.5 seconds of wall clock at the target
    /// frame rate, so the animation speed survives fps changes.
    pub(crate) fn fill_ticks(&self) -> u64 {
        (2.5 * self.fps_cap as f32).round().max(1.0) as u64
    }
}

pub(crate) const CAPTION: &str = "Hot Drinks Machine";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Every color the machine uses, in one place. The liquid entries are the
/// endpoints of the brewing blends; the rest is chrome.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Palette {
    pub(crate) background: Rgb,
    pub(crate) button: Rgb,
    pub(crate) text: Rgb,
    pub(crate) body: Rgb,
    pub(crate) window: Rgb,
    pub(crate) mug: Rgb,
    pub(crate) steam: Rgb,
    pub(crate) water: Rgb,
    pub(crate) boiling: Rgb,
    pub(crate) tea: Rgb,
    pub(crate) tea_lemon: Rgb,
    pub(crate) chocolate: Rgb,
    pub(crate) coffee: Rgb,
    pub(crate) coffee_milk: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        // chrome colors from the original machine; liquids picked to read
        // on the plum background
        Self {
            background: Rgb::new(55, 0, 55),
            button: Rgb::new(100, 100, 100),
            text: Rgb::new(255, 255, 255),
            body: Rgb::new(128, 130, 140),
            window: Rgb::new(24, 22, 30),
            mug: Rgb::new(222, 222, 230),
            steam: Rgb::new(212, 212, 222),
            water: Rgb::new(90, 160, 230),
            boiling: Rgb::new(226, 228, 236),
            tea: Rgb::new(176, 118, 52),
            tea_lemon: Rgb::new(216, 172, 64),
            chocolate: Rgb::new(94, 56, 30),
            coffee: Rgb::new(54, 36, 24),
            coffee_milk: Rgb::new(168, 128, 92),
        }
    }
}
