pub mod loading;
pub mod notices;
pub mod prompt;
pub mod question_list;
pub mod settings;
pub mod shortcuts;
pub mod status_bar;
pub mod tool_panel;

use crate::config::Config;
use crate::ledger::Award;
use crate::session::MarkingSession;
use crate::tools::Tool;

pub use notices::Notices;

#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    SelectTool(Tool),
    ChooseMark(Award),
    SelectQuestion(String),
    SubmitPrompt(String),
    CancelPrompt,
    NextPage,
    PrevPage,
    GoToPage(i64),
    ConfigChanged,
    Finish,
    Quit,
}

pub struct UiState {
    pub show_settings: bool,
    pub show_shortcuts: bool,
    pub prompt_input: String,
    pub page_input: String,
    pub notices: Notices,
    /// Area left for the sheet after all panels, in egui points.
    pub content_rect: egui::Rect,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            show_settings: false,
            show_shortcuts: false,
            prompt_input: String::new(),
            page_input: String::new(),
            notices: Notices::default(),
            content_rect: egui::Rect::EVERYTHING,
        }
    }
}

/// Build the entire egui UI. Returns the actions to apply to the session.
/// `session` is `None` while the sheet and paper are still loading.
pub fn build_ui(
    ctx: &egui::Context,
    ui_state: &mut UiState,
    session: Option<&MarkingSession>,
    config: &mut Config,
) -> Vec<UiAction> {
    let mut actions = Vec::new();

    if let Some(session) = session {
        actions.extend(tool_panel::show_tool_panel(ctx, session));
        actions.extend(question_list::show_question_list(ctx, session));
        actions.extend(status_bar::show_status_bar(ctx, &mut ui_state.page_input, session));
        actions.extend(prompt::show_prompt(ctx, &mut ui_state.prompt_input, session));
    } else if ui_state.notices.fatal().is_none() {
        loading::show_loading_overlay(ctx);
    }

    if settings::show_settings_window(ctx, &mut ui_state.show_settings, config) {
        actions.push(UiAction::ConfigChanged);
    }
    shortcuts::show_shortcuts_window(ctx, &mut ui_state.show_shortcuts);
    actions.extend(notices::show_notices(ctx, &mut ui_state.notices));

    ui_state.content_rect = ctx.available_rect();

    actions
}
