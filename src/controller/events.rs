use std::collections::VecDeque;
use std::path::PathBuf;

/// Movement keys, camera-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    /// Unit step as (right, forward).
    pub fn axes(self) -> (f32, f32) {
        match self {
            Direction::Forward => (0.0, 1.0),
            Direction::Backward => (0.0, -1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// Platform-neutral input, queued by the window layer and drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Sent for the initial press and for every key repeat.
    KeyDown(Direction),
    KeyUp(Direction),
    PointerDown,
    PointerUp,
    /// Cursor position in physical pixels, top-left origin.
    PointerMoved { x: f32, y: f32 },
    PointerLeft,
    /// Raw mouse motion, also delivered while the pointer is locked.
    PointerMotion { dx: f32, dy: f32 },
    /// Primary click in the scene; asks for pointer lock.
    Click,
    ReleasePointerLock,
    FileDropped(PathBuf),
    ToggleRotation,
}

#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Take every queued event in arrival order.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, InputEvent, InputQueue};

    #[test]
    fn drain_preserves_order_and_empties() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::PointerDown);
        queue.push(InputEvent::PointerMoved { x: 1.0, y: 2.0 });
        queue.push(InputEvent::PointerUp);
        assert_eq!(
            queue.drain(),
            vec![
                InputEvent::PointerDown,
                InputEvent::PointerMoved { x: 1.0, y: 2.0 },
                InputEvent::PointerUp,
            ]
        );
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn opposite_directions_cancel() {
        let (r1, f1) = Direction::Forward.axes();
        let (r2, f2) = Direction::Backward.axes();
        assert_eq!((r1 + r2, f1 + f2), (0.0, 0.0));
        let (r1, f1) = Direction::Left.axes();
        let (r2, f2) = Direction::Right.axes();
        assert_eq!((r1 + r2, f1 + f2), (0.0, 0.0));
    }
}
