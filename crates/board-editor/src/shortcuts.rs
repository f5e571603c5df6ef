//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `BoardAction`s. Hosts feed
//! `KeyboardEvent.key`-style names; `cmd` means ⌘ on macOS and Ctrl
//! elsewhere.

use crate::input::Modifiers;
use crate::selection::CanvasMode;
use board_core::Alignment;

/// Commands a session can perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoardAction {
    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Duplicate,
    SelectAll,
    Deselect,
    Align(Alignment),
    Nudge { dx: f64, dy: f64 },

    // ── Z-order ──
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,

    // ── View ──
    ZoomIn,
    ZoomOut,
    ZoomReset,
    ToggleGrid,
    ToggleSnap,

    // ── Mode ──
    SetMode(CanvasMode),
}

/// Nudge distance in document pixels; shift multiplies by ten.
const NUDGE: f64 = 1.0;

pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action, or `None` if unbound.
    pub fn resolve(key: &str, mods: Modifiers) -> Option<BoardAction> {
        let cmd = mods.cmd();

        if let Some((dx, dy)) = arrow(key) {
            if cmd || mods.alt {
                return None;
            }
            let step = if mods.shift { NUDGE * 10.0 } else { NUDGE };
            return Some(BoardAction::Nudge {
                dx: dx * step,
                dy: dy * step,
            });
        }

        if cmd && mods.shift {
            return match key {
                "z" | "Z" => Some(BoardAction::Redo),
                "[" | "{" => Some(BoardAction::SendToBack),
                "]" | "}" => Some(BoardAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(BoardAction::Undo),
                "y" | "Y" => Some(BoardAction::Redo),
                "a" | "A" => Some(BoardAction::SelectAll),
                "d" | "D" => Some(BoardAction::Duplicate),
                "=" | "+" => Some(BoardAction::ZoomIn),
                "-" => Some(BoardAction::ZoomOut),
                "0" => Some(BoardAction::ZoomReset),
                "[" => Some(BoardAction::SendBackward),
                "]" => Some(BoardAction::BringForward),
                "'" => Some(BoardAction::ToggleGrid),
                ";" => Some(BoardAction::ToggleSnap),
                _ => None,
            };
        }

        if mods.alt {
            return match key {
                "r" | "R" => Some(BoardAction::Align(Alignment::Row)),
                "c" | "C" => Some(BoardAction::Align(Alignment::Column)),
                "g" | "G" => Some(BoardAction::Align(Alignment::Grid)),
                _ => None,
            };
        }

        if mods.shift {
            return None;
        }

        match key {
            "v" | "V" => Some(BoardAction::SetMode(CanvasMode::Select)),
            "c" | "C" => Some(BoardAction::SetMode(CanvasMode::Chat)),
            "m" | "M" => Some(BoardAction::SetMode(CanvasMode::DragDrop)),
            "Delete" | "Backspace" => Some(BoardAction::Delete),
            "Escape" => Some(BoardAction::Deselect),
            _ => None,
        }
    }
}

fn arrow(key: &str) -> Option<(f64, f64)> {
    match key {
        "ArrowLeft" => Some((-1.0, 0.0)),
        "ArrowRight" => Some((1.0, 0.0)),
        "ArrowUp" => Some((0.0, -1.0)),
        "ArrowDown" => Some((0.0, 1.0)),
        _ => None,
    }
}
