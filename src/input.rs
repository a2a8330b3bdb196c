use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key, NamedKey};

/// What the host should show for the mouse cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorIntent {
    #[default]
    Default,
    Pointer,
    Move,
}

/// Pointer gestures recognized from raw window events. Drag recognition
/// filters taps: presses that move less than the threshold resolve to
/// `Click` (or `DoubleClick`) on release and never emit drag events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Move { position: Vec2 },
    Click { position: Vec2 },
    DoubleClick { position: Vec2 },
    DragStart { position: Vec2 },
    Drag { delta: Vec2, ctrl: bool },
    DragEnd,
    Wheel { delta: f32 },
}

pub struct Input {
    tap_threshold: f32,
    double_click_window: f32,
    cursor: Option<Vec2>,
    press_origin: Option<Vec2>,
    dragging: bool,
    last_cursor: Vec2,
    last_click_at: Option<f32>,
    ctrl_held: bool,
    gestures: Vec<Gesture>,
}

impl Input {
    pub fn new(tap_threshold: f32, double_click_window: f32) -> Self {
        Self {
            tap_threshold: tap_threshold.max(0.0),
            double_click_window: double_click_window.max(0.0),
            cursor: None,
            press_origin: None,
            dragging: false,
            last_cursor: Vec2::ZERO,
            last_click_at: None,
            ctrl_held: false,
            gestures: Vec::new(),
        }
    }

    pub fn cursor_position(&self) -> Option<Vec2> {
        self.cursor
    }

    pub fn ctrl_held(&self) -> bool {
        self.ctrl_held
    }

    pub fn push_window_event(&mut self, event: &WindowEvent, now: f32) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                let pos = Vec2::new(position.x as f32, position.y as f32);
                self.cursor = Some(pos);
                if let Some(origin) = self.press_origin {
                    let moved = pos - origin;
                    if !self.dragging && moved.length() >= self.tap_threshold {
                        self.dragging = true;
                        self.gestures.push(Gesture::DragStart { position: origin });
                    }
                    if self.dragging {
                        let delta = pos - self.last_cursor;
                        self.gestures.push(Gesture::Drag { delta, ctrl: self.ctrl_held });
                    }
                } else {
                    self.gestures.push(Gesture::Move { position: pos });
                }
                self.last_cursor = pos;
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => match state {
                ElementState::Pressed => {
                    let pos = self.cursor.unwrap_or(Vec2::ZERO);
                    self.press_origin = Some(pos);
                    self.last_cursor = pos;
                    self.dragging = false;
                }
                ElementState::Released => {
                    if self.dragging {
                        self.gestures.push(Gesture::DragEnd);
                    } else if let Some(origin) = self.press_origin {
                        let double = self
                            .last_click_at
                            .map(|at| now - at <= self.double_click_window)
                            .unwrap_or(false);
                        if double {
                            self.gestures.push(Gesture::DoubleClick { position: origin });
                            self.last_click_at = None;
                        } else {
                            self.gestures.push(Gesture::Click { position: origin });
                            self.last_click_at = Some(now);
                        }
                    }
                    self.press_origin = None;
                    self.dragging = false;
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 60.0,
                };
                self.gestures.push(Gesture::Wheel { delta: d });
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let Key::Named(NamedKey::Control) = event.logical_key {
                    self.ctrl_held = event.state == ElementState::Pressed;
                }
            }
            _ => {}
        }
    }

    pub fn drain(&mut self) -> Vec<Gesture> {
        std::mem::take(&mut self.gestures)
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new(2.0, 0.35)
    }
}
