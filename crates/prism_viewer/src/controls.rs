//! Keyboard bindings.

use prism_math::Vec3;
use winit::keyboard::KeyCode;

/// What a key press asks the viewer to do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Switch to GPU rasterisation
    Rasterise,
    /// Switch to the CPU ray tracer
    RayTrace,
    /// Move the selected group along a direction
    Drive(Vec3),
    /// Spin the selected group about an axis
    Rotate(Vec3),
    /// Scale the selected group towards a factor and back
    Scale(f32),
    /// Write the scene dump to disk
    Dump,
    /// Rebuild the tic-tac-toe board
    ResetBoard,
}

pub fn action_for(key: KeyCode) -> Option<Action> {
    let action = match key {
        KeyCode::KeyO => Action::Rasterise,
        KeyCode::KeyP => Action::RayTrace,
        KeyCode::ArrowUp => Action::Drive(Vec3::Y),
        KeyCode::ArrowDown => Action::Drive(Vec3::NEG_Y),
        KeyCode::ArrowLeft => Action::Drive(Vec3::NEG_X),
        KeyCode::ArrowRight => Action::Drive(Vec3::X),
        KeyCode::KeyE => Action::Drive(Vec3::Z),
        KeyCode::KeyQ => Action::Drive(Vec3::NEG_Z),
        KeyCode::KeyX => Action::Rotate(Vec3::X),
        KeyCode::KeyY => Action::Rotate(Vec3::Y),
        KeyCode::KeyZ => Action::Rotate(Vec3::Z),
        KeyCode::KeyR => Action::Scale(2.0),
        KeyCode::KeyT => Action::Scale(0.5),
        KeyCode::KeyJ => Action::Dump,
        KeyCode::KeyN => Action::ResetBoard,
        _ => return None,
    };
    Some(action)
}
