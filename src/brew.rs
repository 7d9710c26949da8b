//! The brewing state machine. A drink's animation is a table of phases
//! interpreted against a monotonically increasing tick counter; each tick
//! yields a descriptive frame (message, liquid color, fill levels) and the
//! renderer does the rest.

use crate::config::{Palette, Rgb};

pub(crate) const IDLE_PROMPT: &str = "Select a drink";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum BrewPhase {
    Idle,
    Filling,
    Boiling,
    Flavoring,
    Seasoning,
    Dispensing,
    Ready,
}

/// One row of a recipe table: what the phase is called, which colors it
/// blends between, how many fill-time units it lasts, and the status line
/// shown while it runs.
#[derive(Clone, Debug)]
pub(crate) struct PhaseSpec {
    pub(crate) phase: BrewPhase,
    pub(crate) from: Rgb,
    pub(crate) to: Rgb,
    pub(crate) units: u32,
    pub(crate) message: String,
}

impl PhaseSpec {
    fn fill(water: Rgb) -> Self {
        Self {
            phase: BrewPhase::Filling,
            from: water,
            to: water,
            units: 1,
            message: "Filling with water".to_string(),
        }
    }

    fn blend(phase: BrewPhase, from: Rgb, to: Rgb, message: &str) -> Self {
        Self {
            phase,
            from,
            to,
            units: 1,
            message: message.to_string(),
        }
    }

    fn dispense(color: Rgb) -> Self {
        Self {
            phase: BrewPhase::Dispensing,
            from: color,
            to: color,
            units: 1,
            message: "Dispensing".to_string(),
        }
    }

    fn ready(name: &str, color: Rgb) -> Self {
        Self {
            phase: BrewPhase::Ready,
            from: color,
            to: color,
            units: 1,
            message: format!("{name} is ready!"),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Recipe {
    pub(crate) name: &'static str,
    pub(crate) phases: Vec<PhaseSpec>,
}

/// What one brewing cycle owns: the chosen drink and how far into the
/// animation it is. Created empty; a drink is accepted only while idle.
#[derive(Clone, Debug)]
pub(crate) struct BrewSession {
    drink: Option<String>,
    ticks: u64,
}

impl BrewSession {
    pub(crate) fn new() -> Self {
        Self {
            drink: None,
            ticks: 0,
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.drink.is_none()
    }

    /// A fresh selection always restarts the counter. Returns false (and
    /// changes nothing) while a brew is in progress.
    pub(crate) fn select(&mut self, name: &str) -> bool {
        if self.drink.is_some() {
            return false;
        }
        self.drink = Some(name.to_string());
        self.ticks = 0;
        true
    }

    pub(crate) fn reset(&mut self) {
        self.drink = None;
        self.ticks = 0;
    }
}

/// Liquid directives for one frame. Levels are fractions in [0, 1].
#[derive(Clone, Copy, Debug)]
pub(crate) struct Liquid {
    pub(crate) color: Rgb,
    pub(crate) reservoir: f32,
    pub(crate) spout: f32,
    pub(crate) mug: f32,
}

#[derive(Clone, Debug)]
pub(crate) struct BrewFrame {
    pub(crate) phase: BrewPhase,
    pub(crate) message: String,
    pub(crate) liquid: Option<Liquid>,
    /// Set once the recipe has fully elapsed (or the drink is unknown);
    /// the shell responds by resetting the session.
    pub(crate) finished: bool,
}

impl BrewFrame {
    fn idle(message: String, finished: bool) -> Self {
        Self {
            phase: BrewPhase::Idle,
            message,
            liquid: None,
            finished,
        }
    }
}

pub(crate) struct BrewMachine {
    recipes: Vec<Recipe>,
    fill_ticks: u64,
}

impl BrewMachine {
    pub(crate) fn new(palette: &Palette, fill_ticks: u64) -> Self {
        let p = palette;
        let recipes = vec![
            Recipe {
                name: "Lemon Tea",
                phases: vec![
                    PhaseSpec::fill(p.water),
                    PhaseSpec::blend(BrewPhase::Boiling, p.water, p.boiling, "Boiling the water"),
                    PhaseSpec::blend(BrewPhase::Flavoring, p.boiling, p.tea, "Brewing the tea"),
                    PhaseSpec::blend(BrewPhase::Seasoning, p.tea, p.tea_lemon, "Adding lemon"),
                    PhaseSpec::dispense(p.tea_lemon),
                    PhaseSpec::ready("Lemon Tea", p.tea_lemon),
                ],
            },
            Recipe {
                name: "Chocolate",
                phases: vec![
                    PhaseSpec::fill(p.water),
                    PhaseSpec::blend(BrewPhase::Boiling, p.water, p.boiling, "Boiling the water"),
                    PhaseSpec::blend(
                        BrewPhase::Flavoring,
                        p.boiling,
                        p.chocolate,
                        "Melting the chocolate",
                    ),
                    PhaseSpec::dispense(p.chocolate),
                    PhaseSpec::ready("Chocolate", p.chocolate),
                ],
            },
            Recipe {
                name: "Coffee",
                phases: vec![
                    PhaseSpec::fill(p.water),
                    PhaseSpec::blend(BrewPhase::Boiling, p.water, p.boiling, "Boiling the water"),
                    PhaseSpec::blend(
                        BrewPhase::Flavoring,
                        p.boiling,
                        p.coffee,
                        "Brewing the coffee",
                    ),
                    PhaseSpec::blend(
                        BrewPhase::Seasoning,
                        p.coffee,
                        p.coffee_milk,
                        "Adding sugar and milk",
                    ),
                    PhaseSpec::dispense(p.coffee_milk),
                    PhaseSpec::ready("Coffee", p.coffee_milk),
                ],
            },
        ];
        Self {
            recipes,
            fill_ticks,
        }
    }

    pub(crate) fn drink_names(&self) -> Vec<&'static str> {
        self.recipes.iter().map(|r| r.name).collect()
    }

    fn recipe(&self, name: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.name == name)
    }

    /// Advance the session by one tick and describe the frame to draw.
    /// Idle sessions render the selection prompt and do not advance.
    pub(crate) fn advance(&self, session: &mut BrewSession) -> BrewFrame {
        let Some(name) = session.drink.clone() else {
            return BrewFrame::idle(IDLE_PROMPT.to_string(), false);
        };
        let Some(recipe) = self.recipe(&name) else {
            return BrewFrame::idle(format!("Unknown drink: {name}"), true);
        };

        let tick = session.ticks;
        session.ticks += 1;

        let mut start = 0u64;
        for spec in &recipe.phases {
            let len = spec.units as u64 * self.fill_ticks;
            if tick < start + len {
                let t = (tick - start) as f32 / len as f32;
                return frame_for(spec, t);
            }
            start += len;
        }

        // the whole recipe has elapsed; tell the shell to reset
        BrewFrame::idle(String::new(), true)
    }
}

fn frame_for(spec: &PhaseSpec, t: f32) -> BrewFrame {
    let liquid = match spec.phase {
        BrewPhase::Idle => None,
        BrewPhase::Filling => Some(Liquid {
            color: spec.from,
            reservoir: t,
            spout: 0.0,
            mug: 0.0,
        }),
        BrewPhase::Boiling | BrewPhase::Flavoring | BrewPhase::Seasoning => Some(Liquid {
            color: blend(spec.from, spec.to, t),
            reservoir: 1.0,
            spout: 0.0,
            mug: 0.0,
        }),
        // The spout rises to full at the phase midpoint and drains back
        // while the reservoir empties twice as fast as the phase runs.
        BrewPhase::Dispensing => Some(Liquid {
            color: spec.to,
            reservoir: (1.0 - 2.0 * t).max(0.0),
            spout: 1.0 - (2.0 * t - 1.0).abs(),
            mug: t,
        }),
        BrewPhase::Ready => Some(Liquid {
            color: spec.to,
            reservoir: 0.0,
            spout: 0.0,
            mug: 1.0,
        }),
    };
    BrewFrame {
        phase: spec.phase,
        message: spec.message.clone(),
        liquid,
        finished: false,
    }
}

/// Per-channel linear blend. The factor is clamped; phase-local fractions
/// never leave [0, 1), so this only matters for hand-edited tables.
pub(crate) fn blend(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let ch = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Rgb::new(ch(a.r, b.r), ch(a.g, b.g), ch(a.b, b.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Palette;

    const F: u64 = 150; // 2.5s at 60 ticks/s

    fn machine() -> BrewMachine {
        BrewMachine::new(&Palette::default(), F)
    }

    fn frame_at(m: &BrewMachine, name: &str, tick: u64) -> BrewFrame {
        let mut session = BrewSession::new();
        assert!(session.select(name));
        for _ in 0..tick {
            m.advance(&mut session);
        }
        m.advance(&mut session)
    }

    #[test]
    fn blend_is_exact_at_endpoints() {
        let a = Rgb::new(10, 200, 33);
        let b = Rgb::new(255, 0, 128);
        assert_eq!(blend(a, b, 0.0), a);
        assert_eq!(blend(a, b, 1.0), b);
    }

    #[test]
    fn blend_clamps_out_of_range_factors() {
        let a = Rgb::new(10, 20, 30);
        let b = Rgb::new(200, 100, 50);
        assert_eq!(blend(a, b, -0.5), a);
        assert_eq!(blend(a, b, 1.5), b);
    }

    #[test]
    fn idle_session_shows_prompt_and_never_advances() {
        let m = machine();
        let mut session = BrewSession::new();
        for _ in 0..3 {
            let frame = m.advance(&mut session);
            assert_eq!(frame.phase, BrewPhase::Idle);
            assert_eq!(frame.message, IDLE_PROMPT);
            assert!(!frame.finished);
        }
        assert_eq!(session.ticks, 0);
    }

    #[test]
    fn filling_rises_from_zero_in_water_color() {
        let m = machine();
        let water = Palette::default().water;

        let frame = frame_at(&m, "Coffee", 0);
        assert_eq!(frame.phase, BrewPhase::Filling);
        let liquid = frame.liquid.unwrap();
        assert_eq!(liquid.reservoir, 0.0);
        assert_eq!(liquid.color, water);

        let frame = frame_at(&m, "Coffee", F / 2);
        let liquid = frame.liquid.unwrap();
        assert!((liquid.reservoir - 0.5).abs() < 1e-6);
        assert_eq!(liquid.color, water);
    }

    #[test]
    fn boiling_midpoint_is_the_half_blend() {
        let m = machine();
        let p = Palette::default();
        let frame = frame_at(&m, "Chocolate", F + F / 2);
        assert_eq!(frame.phase, BrewPhase::Boiling);
        let liquid = frame.liquid.unwrap();
        assert_eq!(liquid.color, blend(p.water, p.boiling, 0.5));
        assert_eq!(liquid.reservoir, 1.0);
    }

    #[test]
    fn chocolate_has_no_seasoning_phase() {
        let m = machine();
        // tick 3F is seasoning for the six-phase drinks, dispensing for chocolate
        assert_eq!(frame_at(&m, "Lemon Tea", 3 * F).phase, BrewPhase::Seasoning);
        assert_eq!(frame_at(&m, "Coffee", 3 * F).phase, BrewPhase::Seasoning);
        assert_eq!(frame_at(&m, "Chocolate", 3 * F).phase, BrewPhase::Dispensing);
    }

    #[test]
    fn spout_follows_the_triangular_profile() {
        let m = machine();
        let dispense_start = 4 * F; // Coffee: fill, boil, flavor, season, dispense

        let liquid = frame_at(&m, "Coffee", dispense_start).liquid.unwrap();
        assert_eq!(liquid.spout, 0.0);
        assert_eq!(liquid.reservoir, 1.0);

        let liquid = frame_at(&m, "Coffee", dispense_start + F / 2).liquid.unwrap();
        assert_eq!(liquid.spout, 1.0);
        assert_eq!(liquid.reservoir, 0.0);

        let liquid = frame_at(&m, "Coffee", dispense_start + F - 1).liquid.unwrap();
        assert!(liquid.spout < 0.05);
    }

    #[test]
    fn phases_never_regress_and_finish_exactly_once() {
        let m = machine();
        let mut session = BrewSession::new();
        assert!(session.select("Lemon Tea"));

        let total = 6 * F;
        let mut last = BrewPhase::Idle;
        for _ in 0..total {
            let frame = m.advance(&mut session);
            assert!(!frame.finished);
            assert!(frame.phase >= last, "{:?} after {:?}", frame.phase, last);
            last = frame.phase;
        }
        assert_eq!(last, BrewPhase::Ready);
        assert!(m.advance(&mut session).finished);
    }

    #[test]
    fn chocolate_cycle_resets_and_accepts_a_new_drink() {
        let m = machine();
        let mut session = BrewSession::new();
        assert!(session.select("Chocolate"));

        for _ in 0..6 * F {
            let frame = m.advance(&mut session);
            if frame.finished {
                session.reset();
            }
        }
        assert!(session.is_idle());
        assert!(session.select("Coffee"));
    }

    #[test]
    fn selection_is_rejected_while_brewing() {
        let m = machine();
        let mut session = BrewSession::new();
        assert!(session.select("Chocolate"));
        for _ in 0..10 {
            m.advance(&mut session);
        }
        assert!(!session.select("Coffee"));
        let frame = m.advance(&mut session);
        assert_ne!(frame.phase, BrewPhase::Idle);
    }

    #[test]
    fn unknown_drink_reports_and_requests_reset() {
        let m = machine();
        let mut session = BrewSession::new();
        assert!(session.select("Espresso"));
        let frame = m.advance(&mut session);
        assert_eq!(frame.phase, BrewPhase::Idle);
        assert!(frame.finished);
        assert!(frame.liquid.is_none());
        assert!(frame.message.contains("Espresso"));
        session.reset();
        assert!(session.select("Coffee"));
    }
}
