use crate::session::MarkingSession;
use crate::tools::PromptKind;
use crate::ui::UiAction;

/// Input box for text and score annotations. Shown while the tool controller
/// is waiting on a prompt.
pub fn show_prompt(
    ctx: &egui::Context,
    input: &mut String,
    session: &MarkingSession,
) -> Vec<UiAction> {
    let mut actions = Vec::new();

    let Some(prompt) = session.tools().pending_prompt() else {
        input.clear();
        return actions;
    };

    let (title, hint) = match &prompt.kind {
        PromptKind::Text => ("Add text".to_string(), "Comment".to_string()),
        PromptKind::Mark {
            question_no,
            max_marks,
        } => (
            format!("Marks for question {}", question_no),
            format!("0 to {} or NA", max_marks),
        ),
    };

    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            let response = ui.add(egui::TextEdit::singleline(input).hint_text(hint));
            response.request_focus();
            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            ui.horizontal(|ui| {
                if ui.button("OK").clicked() || enter {
                    actions.push(UiAction::SubmitPrompt(input.clone()));
                }
                if ui.button("Cancel").clicked()
                    || ui.input(|i| i.key_pressed(egui::Key::Escape))
                {
                    actions.push(UiAction::CancelPrompt);
                }
            });
        });

    actions
}
