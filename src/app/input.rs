use crate::controller::Direction;
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBinding {
    Move(Direction),
    ReleasePointerLock,
}

/// Physical (layout-independent) key bindings.
pub fn map_key(key: PhysicalKey) -> Option<KeyBinding> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    match code {
        KeyCode::KeyW => Some(KeyBinding::Move(Direction::Forward)),
        KeyCode::KeyS => Some(KeyBinding::Move(Direction::Backward)),
        KeyCode::KeyA => Some(KeyBinding::Move(Direction::Left)),
        KeyCode::KeyD => Some(KeyBinding::Move(Direction::Right)),
        KeyCode::Escape => Some(KeyBinding::ReleasePointerLock),
        _ => None,
    }
}
