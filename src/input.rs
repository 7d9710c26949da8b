use crate::app::Scene;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub(crate) enum InputEvent {
    Key(KeyCode, KeyModifiers),
    Click { column: u16, row: u16 },
}

pub(crate) fn collect_input_nonblocking(
    max_frame_time: Duration,
) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) => {
                if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                    out.push(InputEvent::Key(k.code, k.modifiers));
                }
            }
            Event::Mouse(m) => {
                if let MouseEventKind::Down(MouseButton::Left) = m.kind {
                    out.push(InputEvent::Click {
                        column: m.column,
                        row: m.row,
                    });
                }
            }
            _ => {}
        }
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Quit,
    /// A raw left click in cell coordinates; the shell normalizes it
    /// against the live surface size before hit testing.
    ClickAt { column: u16, row: u16 },
    /// Keyboard shortcut for a grid button, 0-based.
    PressButton(usize),
}

/// Selection input only counts on the menu; a brew in progress cannot be
/// restarted from the grid.
pub(crate) fn map_event_to_action(scene: Scene, ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Key(code, _) => match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char(ch) if scene == Scene::Menu => {
                let digit = ch.to_digit(10)?;
                if digit >= 1 {
                    Some(Action::PressButton(digit as usize - 1))
                } else {
                    None
                }
            }
            _ => None,
        },
        InputEvent::Click { column, row } if scene == Scene::Menu => {
            Some(Action::ClickAt { column, row })
        }
        InputEvent::Click { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ch: char) -> InputEvent {
        InputEvent::Key(KeyCode::Char(ch), KeyModifiers::NONE)
    }

    #[test]
    fn quit_works_in_both_scenes() {
        for scene in [Scene::Menu, Scene::Brewing] {
            assert_eq!(map_event_to_action(scene, key('q')), Some(Action::Quit));
            assert_eq!(
                map_event_to_action(scene, InputEvent::Key(KeyCode::Esc, KeyModifiers::NONE)),
                Some(Action::Quit)
            );
        }
    }

    #[test]
    fn digits_press_buttons_on_the_menu_only() {
        assert_eq!(
            map_event_to_action(Scene::Menu, key('1')),
            Some(Action::PressButton(0))
        );
        assert_eq!(
            map_event_to_action(Scene::Menu, key('8')),
            Some(Action::PressButton(7))
        );
        assert_eq!(map_event_to_action(Scene::Menu, key('0')), None);
        assert_eq!(map_event_to_action(Scene::Brewing, key('1')), None);
    }

    #[test]
    fn clicks_are_ignored_while_brewing() {
        let click = InputEvent::Click { column: 5, row: 7 };
        assert_eq!(
            map_event_to_action(Scene::Menu, click),
            Some(Action::ClickAt { column: 5, row: 7 })
        );
        assert_eq!(map_event_to_action(Scene::Brewing, click), None);
    }
}
