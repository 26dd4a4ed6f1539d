use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::error::MarkingError;
use crate::questions::LeafQuestion;

/// Marks awarded to one question. "Not applicable" counts as zero but stays
/// distinguishable so the UI can label it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Award {
    Marks(f64),
    NotApplicable,
}

/// Values offered by the mark panel, in display order.
pub const MARK_PANEL: [Award; 14] = [
    Award::Marks(0.0),
    Award::Marks(0.25),
    Award::Marks(0.5),
    Award::Marks(1.0),
    Award::Marks(2.0),
    Award::Marks(3.0),
    Award::Marks(4.0),
    Award::Marks(5.0),
    Award::Marks(6.0),
    Award::Marks(7.0),
    Award::Marks(8.0),
    Award::Marks(9.0),
    Award::Marks(10.0),
    Award::NotApplicable,
];

impl Award {
    pub fn value(&self) -> f64 {
        match self {
            Award::Marks(m) => *m,
            Award::NotApplicable => 0.0,
        }
    }

    /// Parse examiner input: decimals, simple fractions like `1/4`, or `NA`.
    pub fn parse(input: &str) -> Option<Award> {
        let input = input.trim();
        if input.eq_ignore_ascii_case("na") || input.eq_ignore_ascii_case("n/a") {
            return Some(Award::NotApplicable);
        }
        let value = match input.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num.trim().parse().ok()?;
                let den: f64 = den.trim().parse().ok()?;
                if den == 0.0 {
                    return None;
                }
                num / den
            }
            None => input.parse().ok()?,
        };
        value.is_finite().then_some(Award::Marks(value))
    }
}

impl fmt::Display for Award {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Award::NotApplicable => write!(f, "NA"),
            Award::Marks(m) if *m == 0.25 => write!(f, "1/4"),
            Award::Marks(m) if *m == 0.5 => write!(f, "1/2"),
            Award::Marks(m) if m.fract() == 0.0 => write!(f, "{}", *m as i64),
            Award::Marks(m) => write!(f, "{}", m),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreEntry {
    pub question_no: String,
    pub awarded: f64,
    pub max_marks: f64,
    pub not_applicable: bool,
}

/// What the finish/reject action receives.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub entries: Vec<ScoreEntry>,
    pub total: f64,
    pub declared_total: Option<f64>,
    pub ungraded: Vec<String>,
}

/// Per-question awards for one answer sheet.
#[derive(Debug, Clone)]
pub struct ScoreLedger {
    leaves: Vec<LeafQuestion>,
    awards: HashMap<String, Award>,
    declared_total: Option<f64>,
}

impl ScoreLedger {
    pub fn new(leaves: Vec<LeafQuestion>, declared_total: Option<f64>) -> Self {
        Self {
            leaves,
            awards: HashMap::new(),
            declared_total,
        }
    }

    pub fn leaves(&self) -> &[LeafQuestion] {
        &self.leaves
    }

    pub fn max_marks(&self, question_no: &str) -> Option<f64> {
        self.leaves
            .iter()
            .find(|l| l.question_no == question_no)
            .map(|l| l.marks)
    }

    /// Check an award without recording it.
    pub fn validate(&self, question_no: &str, award: Award) -> Result<(), MarkingError> {
        let max = self
            .max_marks(question_no)
            .ok_or_else(|| MarkingError::UnknownQuestion(question_no.to_string()))?;
        let Award::Marks(marks) = award else {
            return Ok(());
        };
        if !marks.is_finite() {
            return Err(MarkingError::invalid_mark(question_no, "not a number"));
        }
        if marks < 0.0 {
            return Err(MarkingError::invalid_mark(question_no, "marks cannot be negative"));
        }
        if marks > max {
            return Err(MarkingError::invalid_mark(
                question_no,
                format!("{} exceeds the maximum of {}", marks, max),
            ));
        }
        Ok(())
    }

    /// Record an award, replacing any earlier one for the question.
    pub fn set_award(&mut self, question_no: &str, award: Award) -> Result<(), MarkingError> {
        self.validate(question_no, award)?;
        let previous = self.awards.insert(question_no.to_string(), award);
        log::debug!(
            "Question {}: {} -> {} (total {})",
            question_no,
            previous.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
            award,
            self.total()
        );
        if let Some(over) = self.over_total() {
            log::warn!(
                "Awarded total exceeds the declared paper total by {}; question tree and ledger disagree",
                over
            );
        }
        Ok(())
    }

    pub fn set_score(&mut self, question_no: &str, marks: f64) -> Result<(), MarkingError> {
        self.set_award(question_no, Award::Marks(marks))
    }

    pub fn set_not_applicable(&mut self, question_no: &str) -> Result<(), MarkingError> {
        self.set_award(question_no, Award::NotApplicable)
    }

    pub fn award(&self, question_no: &str) -> Option<Award> {
        self.awards.get(question_no).copied()
    }

    pub fn total(&self) -> f64 {
        self.awards.values().map(Award::value).sum()
    }

    pub fn declared_total(&self) -> Option<f64> {
        self.declared_total
    }

    /// How far the awarded total runs past the declared paper total, if at all.
    pub fn over_total(&self) -> Option<f64> {
        let declared = self.declared_total?;
        let over = self.total() - declared;
        (over > 1e-9).then_some(over)
    }

    pub fn graded_count(&self) -> usize {
        self.awards.len()
    }

    /// Awarded questions in paper order.
    pub fn entries(&self) -> impl Iterator<Item = (&LeafQuestion, Award)> + '_ {
        self.leaves
            .iter()
            .filter_map(|leaf| self.award(&leaf.question_no).map(|award| (leaf, award)))
    }

    pub fn summary(&self) -> ScoreSummary {
        let entries = self
            .entries()
            .map(|(leaf, award)| ScoreEntry {
                question_no: leaf.question_no.clone(),
                awarded: award.value(),
                max_marks: leaf.marks,
                not_applicable: award == Award::NotApplicable,
            })
            .collect();
        let ungraded = self
            .leaves
            .iter()
            .filter(|leaf| !self.awards.contains_key(&leaf.question_no))
            .map(|leaf| leaf.question_no.clone())
            .collect();
        ScoreSummary {
            entries,
            total: self.total(),
            declared_total: self.declared_total,
            ungraded,
        }
    }
}
