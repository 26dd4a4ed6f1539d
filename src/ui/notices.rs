use std::time::{Duration, Instant};

use crate::error::MarkingError;
use crate::ui::UiAction;

const NOTICE_LIFETIME: Duration = Duration::from_secs(4);

struct Notice {
    message: String,
    shown_at: Instant,
}

/// Transient notices for recoverable errors, plus at most one blocking notice
/// for a failed load.
#[derive(Default)]
pub struct Notices {
    transient: Vec<Notice>,
    fatal: Option<String>,
}

impl Notices {
    pub fn push(&mut self, error: &MarkingError) {
        if error.is_fatal() {
            log::error!("{}", error);
            self.fatal = Some(error.to_string());
        } else {
            log::warn!("{}", error);
            self.transient.push(Notice {
                message: error.to_string(),
                shown_at: Instant::now(),
            });
        }
    }

    pub fn fatal(&self) -> Option<&str> {
        self.fatal.as_deref()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.transient.is_empty() && self.fatal.is_none()
    }

    fn expire(&mut self, now: Instant) {
        self.transient
            .retain(|n| now.duration_since(n.shown_at) < NOTICE_LIFETIME);
    }
}

pub fn show_notices(ctx: &egui::Context, notices: &mut Notices) -> Vec<UiAction> {
    let mut actions = Vec::new();

    if let Some(message) = notices.fatal() {
        egui::Window::new("Cannot mark this sheet")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(4.0);
                ui.label("Fix the source and restart to try again.");
                ui.add_space(8.0);
                if ui.button("Quit").clicked() {
                    actions.push(UiAction::Quit);
                }
            });
        return actions;
    }

    notices.expire(Instant::now());
    if notices.transient.is_empty() {
        return actions;
    }

    egui::Area::new(egui::Id::from("notices"))
        .anchor(egui::Align2::CENTER_TOP, [0.0, 12.0])
        .interactable(false)
        .show(ctx, |ui| {
            for notice in &notices.transient {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.colored_label(
                        egui::Color32::from_rgb(200, 60, 40),
                        &notice.message,
                    );
                });
            }
        });
    // Keep repainting so notices disappear on time without input.
    ctx.request_repaint_after(Duration::from_millis(250));

    actions
}
