use crate::config::Config;

/// Returns true when the config was changed (and saved) this frame.
pub fn show_settings_window(ctx: &egui::Context, show: &mut bool, config: &mut Config) -> bool {
    let mut changed = false;

    egui::Window::new("Settings")
        .open(show)
        .resizable(false)
        .default_width(300.0)
        .show(ctx, |ui| {
            ui.heading("Annotations");
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Pen width:");
                changed |= ui
                    .add(
                        egui::DragValue::new(&mut config.stroke_width)
                            .range(1.0..=20.0)
                            .speed(0.25)
                            .suffix(" px"),
                    )
                    .changed();
            });

            ui.horizontal(|ui| {
                ui.label("Pen colour:");
                changed |= ui.color_edit_button_srgb(&mut config.stroke_colour).changed();
            });

            ui.horizontal(|ui| {
                ui.label("Score colour:");
                changed |= ui.color_edit_button_srgb(&mut config.number_colour).changed();
            });

            ui.horizontal(|ui| {
                ui.label("Glyph size:");
                changed |= ui
                    .add(
                        egui::DragValue::new(&mut config.glyph_size)
                            .range(8.0..=120.0)
                            .speed(1.0)
                            .suffix(" px"),
                    )
                    .changed();
            });

            ui.horizontal(|ui| {
                ui.label("Text size:");
                changed |= ui
                    .add(
                        egui::DragValue::new(&mut config.text_size)
                            .range(8.0..=96.0)
                            .speed(1.0)
                            .suffix(" px"),
                    )
                    .changed();
            });

            ui.add_space(8.0);
            ui.heading("Interface");
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Font scale:");
                changed |= ui
                    .add(
                        egui::DragValue::new(&mut config.ui_font_scale)
                            .range(0.75..=2.0)
                            .speed(0.05)
                            .suffix("x"),
                    )
                    .changed();
            });

            ui.add_space(8.0);
            if ui.button("Reset to Defaults").clicked() {
                let data_dir = config.data_dir.clone();
                *config = Config {
                    data_dir,
                    ..Config::default()
                };
                changed = true;
            }

            ui.separator();
            ui.label(format!("Data directory: {}", config.data_dir.display()));
            ui.label(format!("Page raster size: {} px", config.raster_target_size));
        });

    if changed {
        config.save();
    }
    changed
}
