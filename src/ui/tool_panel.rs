use crate::ledger::MARK_PANEL;
use crate::session::MarkingSession;
use crate::tools::Tool;
use crate::ui::UiAction;

pub fn show_tool_panel(ctx: &egui::Context, session: &MarkingSession) -> Vec<UiAction> {
    let mut actions = Vec::new();
    let active = session.tools().active();
    let armed = session.tools().armed_mark();
    let has_selection = session.selected_question().is_some();

    egui::TopBottomPanel::top("tool_panel").show(ctx, |ui| {
        ui.horizontal(|ui| {
            for &tool in Tool::panel() {
                let label = egui::RichText::new(tool.glyph()).size(18.0);
                let response = if tool.is_command() {
                    ui.button(label)
                } else {
                    ui.selectable_label(active == tool && armed.is_none(), label)
                };
                if response.on_hover_text(tool.display_name()).clicked() {
                    actions.push(UiAction::SelectTool(tool));
                }
            }

            ui.separator();

            for award in MARK_PANEL {
                let selected = armed == Some(award);
                let response = ui.add_enabled(
                    has_selection,
                    egui::SelectableLabel::new(selected, award.to_string()),
                );
                if response
                    .on_disabled_hover_text("Select a question first")
                    .clicked()
                {
                    actions.push(UiAction::ChooseMark(award));
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Finish").clicked() {
                    actions.push(UiAction::Finish);
                }
            });
        });
    });

    actions
}
