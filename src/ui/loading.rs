pub fn show_loading_overlay(ctx: &egui::Context) {
    egui::Area::new(egui::Id::from("loading_overlay"))
        .fixed_pos(egui::pos2(0.0, 0.0))
        .interactable(false)
        .show(ctx, |ui| {
            let screen = ui.ctx().screen_rect();
            ui.painter().rect_filled(
                screen,
                0.0,
                egui::Color32::from_rgba_unmultiplied(0, 0, 0, 120),
            );

            ui.allocate_new_ui(egui::UiBuilder::new().max_rect(screen), |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(screen.height() / 2.0 - 20.0);
                    ui.spinner();
                    ui.label("Fetching answer sheet and question paper...");
                });
            });
        });
}
