use crate::annotation::Mark;
use crate::coords::Point;
use crate::error::MarkingError;
use crate::ledger::{Award, ScoreLedger};
use crate::questions::LeafQuestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    #[default]
    None,
    Check,
    Cross,
    Text,
    Stroke,
    Number,
    Undo,
    Clear,
}

impl Tool {
    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::None => "None",
            Tool::Check => "Check (C)",
            Tool::Cross => "Cross (X)",
            Tool::Text => "Text (T)",
            Tool::Stroke => "Pen (P)",
            Tool::Number => "Score (N)",
            Tool::Undo => "Undo (Ctrl+Z)",
            Tool::Clear => "Clear page",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Tool::None => "",
            Tool::Check => "\u{2713}",
            Tool::Cross => "\u{2717}",
            Tool::Text => "T",
            Tool::Stroke => "\u{270E}",
            Tool::Number => "#",
            Tool::Undo => "\u{21B6}",
            Tool::Clear => "\u{2672}",
        }
    }

    /// Tools shown on the tool panel, in panel order.
    pub fn panel() -> &'static [Tool] {
        &[
            Tool::Check,
            Tool::Cross,
            Tool::Text,
            Tool::Stroke,
            Tool::Number,
            Tool::Undo,
            Tool::Clear,
        ]
    }

    /// Commands act once when chosen rather than becoming the active tool.
    pub fn is_command(&self) -> bool {
        matches!(self, Tool::Undo | Tool::Clear)
    }
}

/// Pointer input already mapped into raster space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    Click(Point),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromptKind {
    Text,
    Mark { question_no: String, max_marks: f64 },
}

/// A click that needs examiner input before it can become an annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPrompt {
    pub kind: PromptKind,
    pub at: Point,
}

/// What the session should do in response to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    Nothing,
    /// Input is needed; see `ToolController::pending_prompt`.
    AwaitingInput,
    Append(Mark),
    /// Record the award in the ledger and place its annotation.
    Award {
        question_no: String,
        award: Award,
        mark: Mark,
    },
    Undo,
    Clear,
}

/// Active tool plus the transient state of an unfinished gesture.
#[derive(Debug, Default)]
pub struct ToolController {
    tool: Tool,
    stroke: Option<Vec<Point>>,
    pending: Option<PendingPrompt>,
    /// Panel value waiting to be placed, bound to the question it was chosen for.
    preset: Option<(String, Award)>,
}

impl ToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Tool {
        self.tool
    }

    /// Choosing a tool drops any unfinished stroke, prompt, or armed mark.
    /// Commands fire immediately and leave the active tool as it was.
    pub fn select(&mut self, tool: Tool) -> ToolAction {
        match tool {
            Tool::Undo => ToolAction::Undo,
            Tool::Clear => ToolAction::Clear,
            _ => {
                if tool != self.tool {
                    log::debug!("Tool {:?} -> {:?}", self.tool, tool);
                }
                self.tool = tool;
                self.abandon_gesture();
                self.preset = None;
                ToolAction::Nothing
            }
        }
    }

    /// Arm the score tool with a panel value so the next click places it
    /// without asking. The value is placed once, and only for `question_no`.
    pub fn arm_mark(&mut self, question_no: &str, award: Award) {
        self.tool = Tool::Number;
        self.abandon_gesture();
        self.preset = Some((question_no.to_string(), award));
    }

    pub fn armed_mark(&self) -> Option<Award> {
        self.preset.as_ref().map(|(_, award)| *award)
    }

    pub fn disarm(&mut self) {
        if let Some((question_no, award)) = self.preset.take() {
            log::debug!("Disarmed {} for question {}", award, question_no);
        }
    }

    pub fn in_progress_stroke(&self) -> Option<&[Point]> {
        self.stroke.as_deref()
    }

    pub fn pending_prompt(&self) -> Option<&PendingPrompt> {
        self.pending.as_ref()
    }

    pub fn cancel_prompt(&mut self) {
        self.pending = None;
    }

    /// Feed one pointer event. `selected` is the question currently chosen for scoring.
    pub fn handle(
        &mut self,
        event: PointerEvent,
        selected: Option<&LeafQuestion>,
    ) -> Result<ToolAction, MarkingError> {
        match (self.tool, event) {
            (Tool::Stroke, PointerEvent::Down(p)) => {
                self.stroke = Some(vec![p]);
                Ok(ToolAction::Nothing)
            }
            (Tool::Stroke, PointerEvent::Move(p)) => {
                if let Some(points) = self.stroke.as_mut() {
                    points.push(p);
                }
                Ok(ToolAction::Nothing)
            }
            (Tool::Stroke, PointerEvent::Up(p)) => match self.stroke.take() {
                Some(mut points) => {
                    points.push(p);
                    Ok(ToolAction::Append(Mark::Stroke { points }))
                }
                None => Ok(ToolAction::Nothing),
            },
            (Tool::Check, PointerEvent::Click(at)) => Ok(ToolAction::Append(Mark::Check { at })),
            (Tool::Cross, PointerEvent::Click(at)) => Ok(ToolAction::Append(Mark::Cross { at })),
            (Tool::Text, PointerEvent::Click(at)) => {
                self.pending = Some(PendingPrompt {
                    kind: PromptKind::Text,
                    at,
                });
                Ok(ToolAction::AwaitingInput)
            }
            (Tool::Number, PointerEvent::Click(at)) => {
                let leaf = selected.ok_or(MarkingError::NoQuestionSelected)?;
                match self.preset.take() {
                    Some((question_no, award)) if question_no == leaf.question_no => {
                        return Ok(score_action(leaf, award, at));
                    }
                    Some((question_no, _)) => {
                        log::debug!(
                            "Armed value for question {} ignored on question {}",
                            question_no,
                            leaf.question_no
                        );
                    }
                    None => {}
                }
                self.pending = Some(PendingPrompt {
                    kind: PromptKind::Mark {
                        question_no: leaf.question_no.clone(),
                        max_marks: leaf.marks,
                    },
                    at,
                });
                Ok(ToolAction::AwaitingInput)
            }
            _ => Ok(ToolAction::Nothing),
        }
    }

    /// Resolve the pending prompt with what the examiner typed. A rejected mark
    /// keeps the prompt open so it can be corrected.
    pub fn submit_prompt(
        &mut self,
        input: &str,
        ledger: &ScoreLedger,
    ) -> Result<ToolAction, MarkingError> {
        let Some(prompt) = self.pending.as_ref() else {
            return Ok(ToolAction::Nothing);
        };
        match &prompt.kind {
            PromptKind::Text => {
                let at = prompt.at;
                self.pending = None;
                let text = input.trim();
                if text.is_empty() {
                    return Ok(ToolAction::Nothing);
                }
                Ok(ToolAction::Append(Mark::Text {
                    at,
                    text: text.to_string(),
                }))
            }
            PromptKind::Mark { question_no, .. } => {
                let award = Award::parse(input)
                    .ok_or_else(|| MarkingError::invalid_mark(question_no, "not a number"))?;
                ledger.validate(question_no, award)?;
                let action = ToolAction::Award {
                    question_no: question_no.clone(),
                    award,
                    mark: Mark::Number {
                        at: prompt.at,
                        text: award.to_string(),
                    },
                };
                self.pending = None;
                Ok(action)
            }
        }
    }

    /// Drop an unfinished stroke or open prompt.
    pub fn abandon_gesture(&mut self) {
        self.stroke = None;
        self.pending = None;
    }
}

fn score_action(leaf: &LeafQuestion, award: Award, at: Point) -> ToolAction {
    ToolAction::Award {
        question_no: leaf.question_no.clone(),
        award,
        mark: Mark::Number {
            at,
            text: award.to_string(),
        },
    }
}
