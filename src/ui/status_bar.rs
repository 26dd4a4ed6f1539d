use crate::session::MarkingSession;
use crate::ui::UiAction;

pub fn show_status_bar(
    ctx: &egui::Context,
    page_input: &mut String,
    session: &MarkingSession,
) -> Vec<UiAction> {
    let mut actions = Vec::new();
    let nav = session.navigator();

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(nav.current() > 1, egui::Button::new("\u{25C0}"))
                .clicked()
            {
                actions.push(UiAction::PrevPage);
            }
            ui.label(format!("Page {}/{}", nav.current(), nav.total()));
            if ui
                .add_enabled(!nav.is_last(), egui::Button::new("\u{25B6}"))
                .clicked()
            {
                actions.push(UiAction::NextPage);
            }

            let response = ui.add(
                egui::TextEdit::singleline(page_input)
                    .desired_width(36.0)
                    .hint_text("go"),
            );
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                if let Ok(page) = page_input.trim().parse::<i64>() {
                    actions.push(UiAction::GoToPage(page));
                }
                page_input.clear();
            }

            ui.separator();
            ui.label(format!("Visited: {}", nav.visited()));
            ui.separator();
            ui.label(format!("Tool: {}", session.tools().active().display_name()));
            if let Some(q) = session.selected_question() {
                ui.separator();
                ui.label(format!("Question {} (max {})", q.question_no, q.marks));
            }
            if !session.is_ready() {
                ui.separator();
                ui.spinner();
            }
        });
    });

    actions
}
