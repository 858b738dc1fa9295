use winit::keyboard::KeyCode;

/// Logical controls the session understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Up,
    Down,
    Left,
    Right,
    Jump,
    Quit,
}

/// Latest held/released level of each movement control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl InputState {
    /// Record a key edge. Quit carries no level and is ignored here.
    pub fn set(&mut self, control: Control, pressed: bool) {
        match control {
            Control::Up => self.up = pressed,
            Control::Down => self.down = pressed,
            Control::Left => self.left = pressed,
            Control::Right => self.right = pressed,
            Control::Jump => self.jump = pressed,
            Control::Quit => {}
        }
    }
}

pub fn map_key(key_code: KeyCode) -> Option<Control> {
    match key_code {
        KeyCode::ArrowUp => Some(Control::Up),
        KeyCode::ArrowDown => Some(Control::Down),
        KeyCode::ArrowLeft => Some(Control::Left),
        KeyCode::ArrowRight => Some(Control::Right),
        KeyCode::Space => Some(Control::Jump),
        KeyCode::Escape => Some(Control::Quit),
        _ => None,
    }
}
