pub fn show_shortcuts_window(ctx: &egui::Context, show: &mut bool) {
    egui::Window::new("Keyboard Shortcuts")
        .open(show)
        .resizable(false)
        .collapsible(false)
        .default_width(320.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            let sections: &[(&str, &[(&str, &str)])] = &[
                (
                    "Tools",
                    &[
                        ("C", "Check"),
                        ("X", "Cross"),
                        ("T", "Text"),
                        ("P", "Pen"),
                        ("N", "Score"),
                        ("Ctrl+Z", "Undo last mark"),
                    ][..],
                ),
                (
                    "Pages",
                    &[
                        ("PgDn / Right", "Next page"),
                        ("PgUp / Left", "Previous page"),
                        ("Home", "First page"),
                        ("End", "Last page"),
                    ][..],
                ),
                (
                    "General",
                    &[
                        ("Escape", "Cancel prompt"),
                        ("F1", "Toggle this dialog"),
                        ("Ctrl+,", "Settings"),
                        ("Ctrl+Q", "Quit"),
                    ][..],
                ),
            ];

            for (i, (heading, shortcuts)) in sections.iter().enumerate() {
                if i > 0 {
                    ui.add_space(4.0);
                }
                ui.heading(*heading);
                ui.add_space(2.0);
                egui::Grid::new(format!("shortcuts_{i}"))
                    .num_columns(2)
                    .spacing([20.0, 4.0])
                    .show(ui, |ui| {
                        for (key, desc) in *shortcuts {
                            ui.label(egui::RichText::new(*key).monospace().strong());
                            ui.label(*desc);
                            ui.end_row();
                        }
                    });
            }
        });
}
