use glam::Vec2;

/// Pointer position and press modes.
///
/// `rotating_camera` and `dragging_appearance` are separate flags that are
/// always set and cleared together, so during a press camera look and
/// highlight dragging are both active.
// NOTE: the overlap looks accidental; kept because it is the observed behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    pub position: Option<Vec2>,
    pub rotating_camera: bool,
    pub dragging_appearance: bool,
}

impl PointerState {
    pub fn press(&mut self) {
        self.rotating_camera = true;
        self.dragging_appearance = true;
    }

    pub fn release(&mut self) {
        self.rotating_camera = false;
        self.dragging_appearance = false;
    }

    pub fn move_to(&mut self, position: Vec2) {
        self.position = Some(position);
    }

    pub fn leave(&mut self) {
        self.position = None;
    }
}
