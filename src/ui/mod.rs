use crate::config::HighlightColor;
use crate::controller::{InputEvent, InteractionController};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    SaveSettings,
    LoadSettings,
}

/// The floating control panel.
#[derive(Default)]
pub struct ControlPanel {
    status: String,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        controller: &mut InteractionController,
    ) -> Option<PanelAction> {
        let mut action = None;
        egui::Window::new("Controls")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                let settings = controller.settings_mut();
                ui.add(
                    egui::Slider::new(&mut settings.lights.hemisphere, 0.0..=1.0)
                        .text("Hemisphere Light"),
                );
                ui.add(
                    egui::Slider::new(&mut settings.lights.directional, 0.0..=1.0)
                        .text("Directional Light"),
                );
                ui.add(egui::Slider::new(&mut settings.lights.back, 0.0..=1.0).text("Back Light"));

                let highlight = &mut settings.highlight;
                egui::ComboBox::from_label("Hologram")
                    .selected_text(highlight.label())
                    .show_ui(ui, |ui| {
                        for color in HighlightColor::ALL {
                            ui.selectable_value(highlight, color, color.label());
                        }
                    });

                ui.separator();
                let mut rotation = controller.model_rotation();
                let mut changed = false;
                changed |= ui
                    .add(egui::Slider::new(&mut rotation.x, -PI..=PI).text("Rotate X"))
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(&mut rotation.y, -PI..=PI).text("Rotate Y"))
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(&mut rotation.z, -PI..=PI).text("Rotate Z"))
                    .changed();
                if changed {
                    controller.set_model_rotation(rotation);
                }
                if ui.button("Toggle Animation").clicked() {
                    controller.push_event(InputEvent::ToggleRotation);
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Save Settings").clicked() {
                        action = Some(PanelAction::SaveSettings);
                    }
                    if ui.button("Load Settings").clicked() {
                        action = Some(PanelAction::LoadSettings);
                    }
                });
                if controller.is_loading() {
                    ui.label("Loading...");
                }
                if !self.status.is_empty() {
                    ui.label(&self.status);
                }
            });
        action
    }
}
