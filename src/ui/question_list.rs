use crate::ledger::Award;
use crate::session::MarkingSession;
use crate::ui::UiAction;

pub fn show_question_list(ctx: &egui::Context, session: &MarkingSession) -> Vec<UiAction> {
    let mut actions = Vec::new();
    let ledger = session.ledger();
    let selected = session.selected_question().map(|l| l.question_no.as_str());

    egui::SidePanel::left("questions")
        .resizable(true)
        .default_width(220.0)
        .min_width(160.0)
        .show(ctx, |ui| {
            ui.heading("Questions");
            ui.separator();

            egui::ScrollArea::vertical()
                .auto_shrink(false)
                .max_height(ui.available_height() - 60.0)
                .show(ui, |ui| {
                    for leaf in session.leaves() {
                        let awarded = match ledger.award(&leaf.question_no) {
                            Some(Award::NotApplicable) => "NA".to_string(),
                            Some(award) => award.to_string(),
                            None => "-".to_string(),
                        };
                        let label = format!("Q{}  {} / {}", leaf.question_no, awarded, leaf.marks);
                        let is_selected = selected == Some(leaf.question_no.as_str());
                        let mut response = ui.selectable_label(is_selected, label);
                        if !leaf.text.is_empty() {
                            response = response.on_hover_text(&leaf.text);
                        }
                        if response.clicked() && !is_selected {
                            actions.push(UiAction::SelectQuestion(leaf.question_no.clone()));
                        }
                    }
                });

            ui.separator();
            let total = ledger.total();
            match ledger.declared_total() {
                Some(declared) => ui.strong(format!("Total: {} / {}", total, declared)),
                None => ui.strong(format!("Total: {}", total)),
            };
            if let Some(over) = ledger.over_total() {
                ui.colored_label(
                    egui::Color32::from_rgb(200, 60, 40),
                    format!("Exceeds paper total by {}", over),
                );
            }
        });

    actions
}
