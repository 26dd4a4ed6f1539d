use crate::annotation::{Annotation, AnnotationBook};
use crate::document::PageRaster;
use crate::error::MarkingError;
use crate::ledger::{Award, ScoreLedger, ScoreSummary};
use crate::navigator::PageNavigator;
use crate::questions::{LeafQuestion, QuestionPaper};
use crate::tools::{PointerEvent, Tool, ToolAction, ToolController};

/// Everything an examiner changes while marking one answer sheet.
///
/// Single owner: annotation stores, the ledger and the navigator are only
/// mutated through these methods, each of which finishes its state update
/// before flagging a redraw.
#[derive(Debug)]
pub struct MarkingSession {
    book: AnnotationBook,
    ledger: ScoreLedger,
    navigator: PageNavigator,
    tools: ToolController,
    selected: Option<usize>,
    raster: Option<PageRaster>,
    redraw: bool,
}

impl MarkingSession {
    pub fn new(paper: &QuestionPaper, page_count: u32) -> Self {
        let leaves = paper.leaves();
        log::info!(
            "Marking {} page(s) against {} gradable question(s)",
            page_count,
            leaves.len()
        );
        Self {
            book: AnnotationBook::new(),
            ledger: ScoreLedger::new(leaves, paper.total_marks),
            navigator: PageNavigator::new(page_count),
            tools: ToolController::new(),
            selected: None,
            raster: None,
            redraw: true,
        }
    }

    pub fn leaves(&self) -> &[LeafQuestion] {
        self.ledger.leaves()
    }

    pub fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    pub fn navigator(&self) -> &PageNavigator {
        &self.navigator
    }

    pub fn tools(&self) -> &ToolController {
        &self.tools
    }

    pub fn current_page(&self) -> u32 {
        self.navigator.current()
    }

    /// Annotations on the current page, in replay order.
    pub fn annotations(&self) -> &[Annotation] {
        self.book.annotations(self.navigator.current())
    }

    pub fn annotations_on(&self, page: u32) -> &[Annotation] {
        self.book.annotations(page)
    }

    pub fn select_question(&mut self, question_no: &str) -> Result<(), MarkingError> {
        let index = self
            .leaves()
            .iter()
            .position(|l| l.question_no == question_no)
            .ok_or_else(|| MarkingError::UnknownQuestion(question_no.to_string()))?;
        if self.selected != Some(index) {
            self.tools.disarm();
        }
        self.selected = Some(index);
        self.redraw = true;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.tools.disarm();
        self.selected = None;
        self.redraw = true;
    }

    pub fn selected_question(&self) -> Option<&LeafQuestion> {
        self.selected.and_then(|i| self.ledger.leaves().get(i))
    }

    /// True once the current page's raster has been drawn and input can land on it.
    pub fn is_ready(&self) -> bool {
        self.raster.is_some()
    }

    pub fn raster(&self) -> Option<&PageRaster> {
        self.raster.as_ref()
    }

    /// Install the rendered raster for a page. Rasters for a page that is no
    /// longer current are dropped.
    pub fn set_raster(&mut self, raster: PageRaster) {
        if raster.page != self.navigator.current() {
            log::debug!(
                "Dropping stale raster for page {} (now on {})",
                raster.page,
                self.navigator.current()
            );
            return;
        }
        self.raster = Some(raster);
        self.redraw = true;
    }

    pub fn select_tool(&mut self, tool: Tool) -> Result<(), MarkingError> {
        let action = self.tools.select(tool);
        self.redraw = true;
        self.apply(action)
    }

    /// Apply a mark-panel value to the selected question, then arm the score
    /// tool so the next click places the value on the page.
    pub fn choose_mark(&mut self, award: Award) -> Result<(), MarkingError> {
        let question_no = self
            .selected_question()
            .map(|l| l.question_no.clone())
            .ok_or(MarkingError::NoQuestionSelected)?;
        self.ledger.set_award(&question_no, award)?;
        self.tools.arm_mark(&question_no, award);
        self.redraw = true;
        Ok(())
    }

    pub fn pointer(&mut self, event: PointerEvent) -> Result<(), MarkingError> {
        if !self.is_ready() {
            return Err(MarkingError::NotReady);
        }
        let selected = self.selected.and_then(|i| self.ledger.leaves().get(i));
        let action = self.tools.handle(event, selected)?;
        if matches!(event, PointerEvent::Down(_) | PointerEvent::Move(_))
            && self.tools.in_progress_stroke().is_some()
        {
            self.redraw = true;
        }
        self.apply(action)
    }

    pub fn submit_prompt(&mut self, input: &str) -> Result<(), MarkingError> {
        let action = self.tools.submit_prompt(input, &self.ledger)?;
        self.redraw = true;
        self.apply(action)
    }

    pub fn cancel_prompt(&mut self) {
        self.tools.cancel_prompt();
        self.redraw = true;
    }

    pub fn next_page(&mut self) -> Result<u32, MarkingError> {
        let page = self.navigator.next()?;
        self.on_page_changed();
        Ok(page)
    }

    pub fn prev_page(&mut self) -> Result<u32, MarkingError> {
        let page = self.navigator.prev()?;
        self.on_page_changed();
        Ok(page)
    }

    pub fn jump_to(&mut self, page: i64) -> Result<u32, MarkingError> {
        let before = self.navigator.current();
        let page = self.navigator.jump_to(page)?;
        if page != before {
            self.on_page_changed();
        }
        Ok(page)
    }

    /// Consume the redraw flag.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    pub fn summary(&self) -> ScoreSummary {
        self.ledger.summary()
    }

    fn on_page_changed(&mut self) {
        self.tools.abandon_gesture();
        self.raster = None;
        self.redraw = true;
        log::info!(
            "Page {}/{} ({} forward moves)",
            self.navigator.current(),
            self.navigator.total(),
            self.navigator.visited()
        );
    }

    fn apply(&mut self, action: ToolAction) -> Result<(), MarkingError> {
        let page = self.navigator.current();
        match action {
            ToolAction::Nothing => {}
            ToolAction::AwaitingInput => self.redraw = true,
            ToolAction::Append(mark) => {
                let kind = mark.kind_name();
                if self.book.page_mut(page).push(mark).is_some() {
                    log::debug!("Added {} on page {}", kind, page);
                    self.redraw = true;
                }
            }
            ToolAction::Award {
                question_no,
                award,
                mark,
            } => {
                self.ledger.set_award(&question_no, award)?;
                self.book.page_mut(page).push(mark);
                self.redraw = true;
            }
            ToolAction::Undo => {
                if let Some(removed) = self.book.page_mut(page).undo() {
                    log::debug!("Undid {} on page {}", removed.mark.kind_name(), page);
                    self.redraw = true;
                }
            }
            ToolAction::Clear => {
                let removed = self.book.page_mut(page).clear();
                if removed > 0 {
                    log::debug!("Cleared {} annotation(s) on page {}", removed, page);
                    self.redraw = true;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Mark;
    use crate::coords::Point;
    use assert_matches::assert_matches;

    const PAPER: &str = r#"{
        "totalMarks": 11,
        "questions": {
            "1": { "questionNo": "1", "text": "Define", "marks": 5 },
            "2": { "questionNo": "2", "text": "Compare",
                   "actualQuestions": [
                       { "questionNo": "2a", "marks": 3 },
                       { "questionNo": "2b", "marks": 3 }
                   ] }
        }
    }"#;

    fn session() -> MarkingSession {
        let paper = QuestionPaper::from_json(PAPER).unwrap();
        let mut session = MarkingSession::new(&paper, 3);
        session.set_raster(PageRaster::blank(1, 10, 10));
        session
    }

    fn click(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Click(Point::new(x, y))
    }

    #[test]
    fn test_input_rejected_until_raster_ready() {
        let paper = QuestionPaper::from_json(PAPER).unwrap();
        let mut session = MarkingSession::new(&paper, 3);
        session.select_tool(Tool::Check).unwrap();
        assert_eq!(session.pointer(click(1.0, 1.0)), Err(MarkingError::NotReady));
        assert!(session.annotations().is_empty());
        session.set_raster(PageRaster::blank(1, 10, 10));
        session.pointer(click(1.0, 1.0)).unwrap();
        assert_eq!(session.annotations().len(), 1);
    }

    #[test]
    fn test_score_scenario_through_tools() {
        let mut session = session();
        session.select_tool(Tool::Number).unwrap();

        session.select_question("1").unwrap();
        session.pointer(click(5.0, 5.0)).unwrap();
        session.submit_prompt("5").unwrap();

        session.select_question("2a").unwrap();
        session.pointer(click(6.0, 6.0)).unwrap();
        session.submit_prompt("2").unwrap();

        session.select_question("2b").unwrap();
        session.choose_mark(Award::NotApplicable).unwrap();

        assert_eq!(session.ledger().total(), 7.0);
        assert_eq!(session.ledger().award("2b"), Some(Award::NotApplicable));
        let texts: Vec<_> = session
            .annotations()
            .iter()
            .filter_map(|a| match &a.mark {
                Mark::Number { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["5", "2"]);
    }

    #[test]
    fn test_invalid_mark_changes_nothing() {
        let mut session = session();
        session.select_question("1").unwrap();
        session.select_tool(Tool::Number).unwrap();
        session.pointer(click(5.0, 5.0)).unwrap();
        assert_matches!(
            session.submit_prompt("7"),
            Err(MarkingError::InvalidMark { .. })
        );
        assert!(session.annotations().is_empty());
        assert_eq!(session.ledger().award("1"), None);

        assert_matches!(
            session.choose_mark(Award::Marks(8.0)),
            Err(MarkingError::InvalidMark { .. })
        );
        assert_eq!(session.ledger().total(), 0.0);
    }

    #[test]
    fn test_number_without_selection() {
        let mut session = session();
        session.select_tool(Tool::Number).unwrap();
        assert_eq!(
            session.pointer(click(1.0, 1.0)),
            Err(MarkingError::NoQuestionSelected)
        );
        assert_eq!(
            session.choose_mark(Award::Marks(1.0)),
            Err(MarkingError::NoQuestionSelected)
        );
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_armed_mark_places_annotation_on_click() {
        let mut session = session();
        session.select_question("2a").unwrap();
        session.choose_mark(Award::Marks(0.5)).unwrap();
        session.pointer(click(3.0, 4.0)).unwrap();
        assert_eq!(
            session.annotations()[0].mark,
            Mark::Number {
                at: Point::new(3.0, 4.0),
                text: "1/2".into()
            }
        );
        assert_eq!(session.ledger().total(), 0.5);
    }

    #[test]
    fn test_armed_mark_does_not_follow_question_change() {
        let mut session = session();
        session.select_question("2a").unwrap();
        session.choose_mark(Award::Marks(2.0)).unwrap();
        session.select_question("1").unwrap();
        assert_eq!(session.tools().armed_mark(), None);

        session.pointer(click(1.0, 1.0)).unwrap();
        assert!(session.tools().pending_prompt().is_some());
        session.cancel_prompt();
        session.pointer(click(2.0, 2.0)).unwrap();
        session.cancel_prompt();

        assert_eq!(session.ledger().award("1"), None);
        assert_eq!(session.ledger().award("2a"), Some(Award::Marks(2.0)));
        assert_eq!(session.ledger().total(), 2.0);
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_armed_mark_is_placed_once() {
        let mut session = session();
        session.select_question("2a").unwrap();
        session.choose_mark(Award::Marks(1.0)).unwrap();
        session.pointer(click(1.0, 1.0)).unwrap();
        session.pointer(click(2.0, 2.0)).unwrap();
        assert_eq!(session.annotations().len(), 1);
        assert!(session.tools().pending_prompt().is_some());
        assert_eq!(session.ledger().total(), 1.0);

        session.cancel_prompt();
        session.choose_mark(Award::Marks(2.0)).unwrap();
        session.clear_selection();
        assert_eq!(session.tools().armed_mark(), None);
    }

    #[test]
    fn test_pages_have_their_own_annotations() {
        let mut session = session();
        session.select_tool(Tool::Check).unwrap();
        session.pointer(click(1.0, 1.0)).unwrap();

        session.next_page().unwrap();
        assert!(!session.is_ready());
        assert!(session.annotations().is_empty());
        session.set_raster(PageRaster::blank(2, 10, 10));
        session.pointer(click(2.0, 2.0)).unwrap();
        session.pointer(click(3.0, 3.0)).unwrap();
        session.select_tool(Tool::Undo).unwrap();
        assert_eq!(session.annotations().len(), 1);

        session.prev_page().unwrap();
        assert_eq!(session.annotations().len(), 1);
        assert_eq!(session.annotations_on(2).len(), 1);
    }

    #[test]
    fn test_stale_raster_is_ignored() {
        let mut session = session();
        session.next_page().unwrap();
        session.set_raster(PageRaster::blank(1, 10, 10));
        assert!(!session.is_ready());
    }

    #[test]
    fn test_stroke_then_undo_and_clear() {
        let mut session = session();
        session.select_tool(Tool::Stroke).unwrap();
        session
            .pointer(PointerEvent::Down(Point::new(0.0, 0.0)))
            .unwrap();
        session
            .pointer(PointerEvent::Move(Point::new(1.0, 2.0)))
            .unwrap();
        session.pointer(PointerEvent::Up(Point::new(2.0, 2.0))).unwrap();
        assert_eq!(session.annotations().len(), 1);
        session.select_tool(Tool::Undo).unwrap();
        assert!(session.annotations().is_empty());
        session.select_tool(Tool::Undo).unwrap();
        assert!(session.annotations().is_empty());
        assert_eq!(session.tools().active(), Tool::Stroke);

        session.select_tool(Tool::Cross).unwrap();
        session.pointer(click(1.0, 1.0)).unwrap();
        session.pointer(click(2.0, 1.0)).unwrap();
        session.select_tool(Tool::Clear).unwrap();
        assert!(session.annotations().is_empty());
    }

    #[test]
    fn test_navigation_errors_leave_page() {
        let mut session = session();
        assert_matches!(session.prev_page(), Err(MarkingError::PageOutOfRange { .. }));
        assert_matches!(session.jump_to(9), Err(MarkingError::PageOutOfRange { .. }));
        assert_eq!(session.current_page(), 1);
        assert!(session.is_ready());
        assert_eq!(session.jump_to(3), Ok(3));
        assert_eq!(session.navigator().visited(), 0);
    }

    #[test]
    fn test_redraw_flag_is_consumed() {
        let mut session = session();
        assert!(session.take_redraw());
        assert!(!session.take_redraw());
        session.select_tool(Tool::Check).unwrap();
        session.take_redraw();
        session.pointer(click(1.0, 1.0)).unwrap();
        assert!(session.take_redraw());

        // Only changes that show up on screen ask for a frame.
        session.select_tool(Tool::Stroke).unwrap();
        session.take_redraw();
        session.pointer(PointerEvent::Move(Point::new(1.0, 1.0))).unwrap();
        assert!(!session.take_redraw());
        session.select_tool(Tool::Text).unwrap();
        session.take_redraw();
        session.pointer(click(2.0, 2.0)).unwrap();
        assert!(session.take_redraw());
    }
}
