//! The input side of the Renderer/Input boundary.
//!
//! The platform layer feeds key, button and pointer events into an
//! [`InputFrame`]; components read it during their update hook. Click state
//! is edge-triggered and must be cleared once per tick with
//! [`InputFrame::clear_edges`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Keys the game understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    W,
    A,
    S,
    D,
    Space,
    Escape,
}

/// Pointer buttons, wheel clicks included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Either shift key is held.
    pub shift: bool,
    /// Either control key is held.
    pub ctrl: bool,
    /// Either alt key is held.
    pub alt: bool,
}

/// One tick's worth of input state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputFrame {
    keys_down: HashSet<Key>,
    keys_clicked: HashSet<Key>,
    buttons_down: HashSet<MouseButton>,
    buttons_clicked: HashSet<MouseButton>,
    pointer: Vec2,
    previous_pointer: Vec2,
    pointer_velocity: Vec2,
    modifiers: Modifiers,
    exit_requested: bool,
}

impl InputFrame {
    /// An empty frame: nothing held, pointer at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    // -- events -------------------------------------------------------------

    /// Record a key press. A press of a key that was not already held also
    /// registers a click.
    pub fn press_key(&mut self, key: Key) {
        if self.keys_down.insert(key) {
            self.keys_clicked.insert(key);
        }
    }

    /// Record a key release. Clicks already registered this tick remain.
    pub fn release_key(&mut self, key: Key) {
        self.keys_down.remove(&key);
    }

    /// Record a button press; same edge rule as [`press_key`](Self::press_key).
    pub fn press_button(&mut self, button: MouseButton) {
        if self.buttons_down.insert(button) {
            self.buttons_clicked.insert(button);
        }
    }

    /// Record a button release.
    pub fn release_button(&mut self, button: MouseButton) {
        self.buttons_down.remove(&button);
    }

    /// Move the pointer. Velocity becomes the delta from the last position.
    pub fn move_pointer(&mut self, position: Vec2) {
        self.previous_pointer = self.pointer;
        self.pointer = position;
        self.pointer_velocity = self.pointer - self.previous_pointer;
    }

    /// Replace the modifier state wholesale.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// Raise the user-exit flag. It stays raised.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Clear clicked keys/buttons and pointer velocity. Held state survives.
    pub fn clear_edges(&mut self) {
        self.keys_clicked.clear();
        self.buttons_clicked.clear();
        self.pointer_velocity = Vec2::ZERO;
    }

    // -- queries ------------------------------------------------------------

    /// Whether `key` is currently held.
    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Whether `key` went down this tick.
    pub fn is_key_clicked(&self, key: Key) -> bool {
        self.keys_clicked.contains(&key)
    }

    /// Whether `button` is currently held.
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Whether `button` went down this tick. Wheel notches only ever click.
    pub fn is_button_clicked(&self, button: MouseButton) -> bool {
        self.buttons_clicked.contains(&button)
    }

    /// Last pointer position, in canvas pixels.
    pub fn pointer_position(&self) -> Vec2 {
        self.pointer
    }

    /// Pointer movement since the previous position; zero after
    /// [`clear_edges`](Self::clear_edges) until the pointer moves again.
    pub fn pointer_velocity(&self) -> Vec2 {
        self.pointer_velocity
    }

    /// Current modifier state.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// +1 for a wheel-up click this tick, -1 for wheel-down, 0 otherwise.
    pub fn scroll(&self) -> i32 {
        if self.is_button_clicked(MouseButton::WheelDown) {
            return -1;
        }
        if self.is_button_clicked(MouseButton::WheelUp) {
            return 1;
        }
        0
    }

    /// Whether the user asked to quit.
    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_registers_down_and_click() {
        let mut input = InputFrame::new();
        input.press_key(Key::Space);
        assert!(input.is_key_down(Key::Space));
        assert!(input.is_key_clicked(Key::Space));
    }

    #[test]
    fn clicks_are_edge_triggered() {
        let mut input = InputFrame::new();
        input.press_key(Key::W);
        input.clear_edges();
        assert!(input.is_key_down(Key::W));
        assert!(!input.is_key_clicked(Key::W));

        // Key repeat while held does not click again.
        input.press_key(Key::W);
        assert!(!input.is_key_clicked(Key::W));

        input.release_key(Key::W);
        input.press_key(Key::W);
        assert!(input.is_key_clicked(Key::W));
    }

    #[test]
    fn pointer_velocity_is_frame_relative() {
        let mut input = InputFrame::new();
        input.move_pointer(Vec2::new(10.0, 5.0));
        input.move_pointer(Vec2::new(13.0, 1.0));
        assert_eq!(input.pointer_velocity(), Vec2::new(3.0, -4.0));
        input.clear_edges();
        assert_eq!(input.pointer_velocity(), Vec2::ZERO);
        assert_eq!(input.pointer_position(), Vec2::new(13.0, 1.0));
    }

    #[test]
    fn wheel_clicks_scroll() {
        let mut input = InputFrame::new();
        assert_eq!(input.scroll(), 0);
        input.press_button(MouseButton::WheelUp);
        assert_eq!(input.scroll(), 1);
        input.clear_edges();
        input.release_button(MouseButton::WheelUp);
        input.press_button(MouseButton::WheelDown);
        assert_eq!(input.scroll(), -1);
    }

    #[test]
    fn exit_flag_survives_clear() {
        let mut input = InputFrame::new();
        input.request_exit();
        input.clear_edges();
        assert!(input.exit_requested());
    }
}
