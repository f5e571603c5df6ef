//! Input abstraction layer.
//!
//! Hosts translate their native pointer, wheel and keyboard events into
//! `InputEvent`s. Pointer positions are in screen pixels; the session maps
//! them into document space through the current viewport.

/// Modifier key state at the time of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn command() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// ⌘ on macOS, Ctrl elsewhere.
    pub fn cmd(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, modifiers: Modifiers },
    PointerMove { x: f64, y: f64, modifiers: Modifiers },
    PointerUp { x: f64, y: f64, modifiers: Modifiers },

    /// Scroll or pinch. `zoom` is a multiplicative factor (1.0 = none).
    Wheel { dx: f64, dy: f64, zoom: f64, x: f64, y: f64 },

    /// `key` is the host's logical key name (`"z"`, `"Delete"`, `"ArrowLeft"`).
    Key { key: String, modifiers: Modifiers },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.into(),
            modifiers,
        }
    }

    /// Same event with different modifiers. Non-pointer events are unchanged.
    pub fn with_modifiers(self, mods: Modifiers) -> Self {
        match self {
            Self::PointerDown { x, y, .. } => Self::PointerDown {
                x,
                y,
                modifiers: mods,
            },
            Self::PointerMove { x, y, .. } => Self::PointerMove {
                x,
                y,
                modifiers: mods,
            },
            Self::PointerUp { x, y, .. } => Self::PointerUp {
                x,
                y,
                modifiers: mods,
            },
            other => other,
        }
    }

    /// Screen position, for pointer events.
    pub fn position(&self) -> Option<(f64, f64)> {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Wheel { x, y, .. } => Some((*x, *y)),
            Self::Key { .. } => None,
        }
    }
}
