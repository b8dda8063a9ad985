use std::time::{Duration, Instant};
use winit::window::Window;

/// FPS counter shown in the window title, refreshed twice a second.
pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_title_time: Instant,
    frame_count: u32,
    frame_dt: f32,
    triangles: usize,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_frame_time: None,
            last_title_time: Instant::now(),
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            triangles: 0,
            base_title,
        }
    }

    pub fn set_triangles(&mut self, triangles: usize) {
        self.triangles = triangles;
    }

    /// Returns the new title when it is due for a refresh.
    pub fn tick(&mut self, now: Instant) -> Option<String> {
        let dt = match self.last_frame_time {
            Some(last) => now.saturating_duration_since(last),
            None => Duration::from_millis(16),
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt.as_secs_f32();

        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_title_time);
        if elapsed.as_secs_f32() < 0.5 {
            return None;
        }
        let fps = self.frame_count as f32 / elapsed.as_secs_f32();
        self.frame_count = 0;
        self.last_title_time = now;
        Some(format!(
            "{} - {:.1} fps ({:.2} ms, {} triangles)",
            self.base_title,
            fps,
            self.frame_dt * 1000.0,
            self.triangles
        ))
    }

    pub fn update(&mut self, window: &Window, now: Instant) {
        if let Some(title) = self.tick(now) {
            window.set_title(&title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FrameTiming;
    use std::time::{Duration, Instant};

    #[test]
    fn title_refreshes_every_half_second() {
        let mut timing = FrameTiming::new("holoscene".to_string());
        let start = Instant::now();
        assert!(timing.tick(start).is_none());
        timing.set_triangles(12);
        let title = timing.tick(start + Duration::from_millis(600)).unwrap();
        assert!(title.starts_with("holoscene - "));
        assert!(title.ends_with("12 triangles)"));
        assert!(timing.tick(start + Duration::from_millis(700)).is_none());
    }
}
