//! Live parameter panel.
//!
//! Widgets only produce [`ParamEdit`]s; every edit goes through the
//! validated setters, so a rejected value never reaches the kernel.

use bevy::prelude::*;
use bevy_inspector_egui::bevy_egui::EguiContexts;
use shared::{
    water::{ParamError, SimulationParams, UpdateRule},
    WaterSettings,
};

use crate::config::ConfigDir;

/// One requested parameter change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEdit {
    Viscosity(f32),
    DisturbanceRadius(f32),
    DisturbanceStrength(f32),
    Relaxation(f32),
    HeightCompensation(f32),
    Rule(UpdateRule),
}

impl ParamEdit {
    pub fn apply(self, params: &mut SimulationParams) -> Result<(), ParamError> {
        match self {
            ParamEdit::Viscosity(value) => params.set_viscosity(value),
            ParamEdit::DisturbanceRadius(value) => params.set_disturbance_radius(value),
            ParamEdit::DisturbanceStrength(value) => params.set_disturbance_strength(value),
            ParamEdit::Relaxation(value) => params.set_relaxation(value),
            ParamEdit::HeightCompensation(value) => params.set_height_compensation(value),
            ParamEdit::Rule(rule) => {
                params.set_rule(rule);
                Ok(())
            }
        }
    }
}

/// Messages shown at the bottom of the panel.
#[derive(Resource, Debug, Default)]
pub struct TuningPanel {
    pub last_error: Option<String>,
    pub last_save: Option<String>,
}

impl TuningPanel {
    /// Applies `edit`, remembering the rejection if there is one.
    pub fn submit(&mut self, edit: ParamEdit, params: &mut SimulationParams) {
        match edit.apply(params) {
            Ok(()) => self.last_error = None,
            Err(e) => {
                warn!("Rejected {:?}: {}", edit, e);
                self.last_error = Some(e.to_string());
            }
        }
    }
}

/// Draws the widgets and collects the edits made this frame.
fn draw_panel(
    ctx: &egui::Context,
    params: &SimulationParams,
    panel: &TuningPanel,
    edits: &mut Vec<ParamEdit>,
) -> bool {
    let mut save_requested = false;

    egui::Window::new("Water")
        .default_pos([10.0, 10.0])
        .default_width(260.0)
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading("Simulation");
            ui.separator();

            let mut rule = params.rule();
            ui.horizontal(|ui| {
                ui.label("Rule:");
                egui::ComboBox::from_id_salt("update_rule")
                    .selected_text(rule.label())
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut rule, UpdateRule::Relaxation, "relaxation");
                        ui.selectable_value(&mut rule, UpdateRule::Wave, "wave");
                    });
            });
            if rule != params.rule() {
                edits.push(ParamEdit::Rule(rule));
            }

            // Sliders reach the invalid bounds on purpose; the setters decide.
            let mut viscosity = params.viscosity();
            if ui
                .add(
                    egui::Slider::new(&mut viscosity, 0.8..=1.0)
                        .text("Viscosity")
                        .fixed_decimals(3),
                )
                .changed()
            {
                edits.push(ParamEdit::Viscosity(viscosity));
            }

            let mut relaxation = params.relaxation();
            if ui
                .add(
                    egui::Slider::new(&mut relaxation, 0.0..=1.0)
                        .text("Relaxation")
                        .fixed_decimals(2),
                )
                .changed()
            {
                edits.push(ParamEdit::Relaxation(relaxation));
            }

            let mut compensation = params.height_compensation();
            if ui
                .add(
                    egui::Slider::new(&mut compensation, -0.05..=0.05)
                        .text("Height compensation")
                        .fixed_decimals(4),
                )
                .changed()
            {
                edits.push(ParamEdit::HeightCompensation(compensation));
            }

            ui.separator();
            ui.heading("Pointer");
            ui.separator();

            let mut radius = params.disturbance_radius();
            if ui
                .add(
                    egui::Slider::new(&mut radius, 0.0..=64.0)
                        .text("Mouse size")
                        .suffix(" cells"),
                )
                .changed()
            {
                edits.push(ParamEdit::DisturbanceRadius(radius));
            }

            let mut strength = params.disturbance_strength();
            if ui
                .add(
                    egui::Slider::new(&mut strength, 0.0..=2.0)
                        .text("Strength")
                        .fixed_decimals(2),
                )
                .changed()
            {
                edits.push(ParamEdit::DisturbanceStrength(strength));
            }

            ui.separator();
            ui.label(format!("Time: {:.1} s", params.elapsed_time()));
            if ui.button("Save settings").clicked() {
                save_requested = true;
            }
            if let Some(message) = &panel.last_save {
                ui.label(message);
            }
            if let Some(error) = &panel.last_error {
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }
        });

    save_requested
}

pub fn tuning_panel(
    mut contexts: EguiContexts,
    mut params: ResMut<SimulationParams>,
    mut panel: ResMut<TuningPanel>,
    mut settings: ResMut<WaterSettings>,
    config_dir: Res<ConfigDir>,
) {
    let Some(ctx) = contexts.try_ctx_mut() else {
        return;
    };

    let mut edits = Vec::new();
    let save_requested = draw_panel(ctx, &params, &panel, &mut edits);

    for edit in edits {
        panel.submit(edit, &mut params);
    }

    if save_requested {
        settings.capture(&params);
        let path = config_dir.settings_path();
        panel.last_save = Some(match settings.save(&path) {
            Ok(()) => {
                info!("Saved water settings to {}", path.display());
                format!("Saved to {}", path.display())
            }
            Err(e) => {
                error!("Could not save {}: {}", path.display(), e);
                format!("Save failed: {}", e)
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_edit_is_applied() {
        let mut params = SimulationParams::default();
        let mut panel = TuningPanel::default();
        panel.submit(ParamEdit::DisturbanceRadius(8.0), &mut params);
        panel.submit(ParamEdit::Rule(UpdateRule::Wave), &mut params);

        assert_eq!(params.disturbance_radius(), 8.0);
        assert_eq!(params.rule(), UpdateRule::Wave);
        assert!(panel.last_error.is_none());
    }

    #[test]
    fn test_rejected_edit_keeps_previous_value() {
        let mut params = SimulationParams::default();
        let mut panel = TuningPanel::default();
        let before = params.viscosity();

        panel.submit(ParamEdit::Viscosity(1.0), &mut params);
        assert_eq!(params.viscosity(), before);
        assert!(panel
            .last_error
            .as_deref()
            .is_some_and(|message| message.contains("viscosity")));

        panel.submit(ParamEdit::Viscosity(0.9), &mut params);
        assert_eq!(params.viscosity(), 0.9);
        assert!(panel.last_error.is_none());
    }

    #[test]
    fn test_zero_mouse_size_is_rejected() {
        let mut params = SimulationParams::default();
        assert_eq!(
            ParamEdit::DisturbanceRadius(0.0).apply(&mut params),
            Err(ParamError::InvalidRadius(0.0))
        );
    }
}
