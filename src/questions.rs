use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::MarkingError;

/// A gradable question: no further sub-divisions and a maximum mark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafQuestion {
    pub question_no: String,
    pub text: String,
    pub marks: f64,
}

/// One entry of a question paper, classified once when the paper is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionNode {
    Leaf(LeafQuestion),
    Container {
        question_no: String,
        text: String,
        /// Optional groupings ("answer any two of ...").
        sub_questions: Vec<QuestionNode>,
        /// Concrete items.
        actual_questions: Vec<QuestionNode>,
    },
}

impl QuestionNode {
    pub fn question_no(&self) -> &str {
        match self {
            QuestionNode::Leaf(leaf) => &leaf.question_no,
            QuestionNode::Container { question_no, .. } => question_no,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionPaper {
    /// Declared paper total, if the paper states one.
    pub total_marks: Option<f64>,
    pub questions: Vec<QuestionNode>,
}

impl QuestionPaper {
    pub fn from_json(json: &str) -> Result<Self, MarkingError> {
        let root: RawRoot = serde_json::from_str(json)
            .map_err(|e| MarkingError::QuestionPaperLoadFailure(e.to_string()))?;
        Self::from_raw(root)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, MarkingError> {
        let root: RawRoot = serde_json::from_slice(bytes)
            .map_err(|e| MarkingError::QuestionPaperLoadFailure(e.to_string()))?;
        Self::from_raw(root)
    }

    fn from_raw(root: RawRoot) -> Result<Self, MarkingError> {
        let raw = match root {
            RawRoot::Single(paper) => paper,
            RawRoot::List(mut papers) => {
                if papers.len() > 1 {
                    log::warn!(
                        "Question paper root holds {} entries, using the first",
                        papers.len()
                    );
                }
                if papers.is_empty() {
                    return Err(MarkingError::QuestionPaperLoadFailure(
                        "empty question paper list".into(),
                    ));
                }
                papers.swap_remove(0)
            }
        };

        let total_marks = raw.total_marks.as_ref().and_then(Scalar::as_number);
        let questions = raw.questions.map(build_children).unwrap_or_default();
        if questions.is_empty() {
            return Err(MarkingError::QuestionPaperLoadFailure(
                "question paper has no questions".into(),
            ));
        }

        Ok(Self {
            total_marks,
            questions,
        })
    }

    pub fn leaves(&self) -> Vec<LeafQuestion> {
        flatten(&self.questions)
    }
}

/// Depth-first, input-ordered list of gradable questions. Containers yield their
/// actual questions before their sub-questions. A question number seen twice
/// keeps its first occurrence.
pub fn flatten(nodes: &[QuestionNode]) -> Vec<LeafQuestion> {
    let mut seen = HashSet::new();
    let mut leaves = Vec::new();
    for node in nodes {
        collect_leaves(node, &mut seen, &mut leaves);
    }
    leaves
}

fn collect_leaves(node: &QuestionNode, seen: &mut HashSet<String>, out: &mut Vec<LeafQuestion>) {
    match node {
        QuestionNode::Leaf(leaf) => {
            if seen.insert(leaf.question_no.clone()) {
                out.push(leaf.clone());
            } else {
                log::debug!("Skipping duplicate question {}", leaf.question_no);
            }
        }
        QuestionNode::Container {
            sub_questions,
            actual_questions,
            ..
        } => {
            for child in actual_questions {
                collect_leaves(child, seen, out);
            }
            for child in sub_questions {
                collect_leaves(child, seen, out);
            }
        }
    }
}

// Wire shapes. Papers come from a loosely typed backend, so numbers may arrive
// as strings and child relations as either arrays or keyed objects.

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRoot {
    List(Vec<RawPaper>),
    Single(RawPaper),
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawPaper {
    total_marks: Option<Scalar>,
    questions: Option<RawChildren>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawNode {
    question_no: Option<Scalar>,
    #[serde(alias = "question")]
    text: Option<String>,
    marks: Option<Scalar>,
    sub_questions: Option<RawChildren>,
    actual_questions: Option<RawChildren>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawChildren {
    List(Vec<serde_json::Value>),
    Keyed(serde_json::Map<String, serde_json::Value>),
}

impl RawChildren {
    fn is_empty(&self) -> bool {
        match self {
            RawChildren::List(nodes) => nodes.is_empty(),
            RawChildren::Keyed(map) => map.is_empty(),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(untagged)]
enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    fn as_number(&self) -> Option<f64> {
        let n = match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
        };
        n.filter(|n| n.is_finite())
    }

    fn as_label(&self) -> String {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.trim().to_string(),
        }
    }
}

fn build_children(children: RawChildren) -> Vec<QuestionNode> {
    match children {
        RawChildren::List(nodes) => nodes
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| parse_node(value, None, &format!("#{}", index + 1)))
            .collect(),
        RawChildren::Keyed(map) => map
            .into_iter()
            .filter_map(|(key, value)| parse_node(value, Some(&key), &key))
            .collect(),
    }
}

fn parse_node(value: serde_json::Value, key: Option<&str>, label: &str) -> Option<QuestionNode> {
    match serde_json::from_value::<RawNode>(value) {
        Ok(node) => build_node(node, key),
        Err(e) => {
            log::warn!("Ignoring malformed question {}: {}", label, e);
            None
        }
    }
}

fn build_node(raw: RawNode, key: Option<&str>) -> Option<QuestionNode> {
    let question_no = raw
        .question_no
        .as_ref()
        .map(Scalar::as_label)
        .filter(|s| !s.is_empty())
        .or_else(|| key.map(str::to_string));
    let text = raw.text.unwrap_or_default();
    let has_children = [&raw.sub_questions, &raw.actual_questions]
        .into_iter()
        .any(|children| children.as_ref().is_some_and(|c| !c.is_empty()));

    if has_children {
        let sub_questions = raw.sub_questions.map(build_children).unwrap_or_default();
        let actual_questions = raw.actual_questions.map(build_children).unwrap_or_default();
        let question_no = question_no.unwrap_or_default();
        if sub_questions.is_empty() && actual_questions.is_empty() {
            log::warn!("Question {} has no usable parts and cannot be graded", question_no);
        }
        return Some(QuestionNode::Container {
            question_no,
            text,
            sub_questions,
            actual_questions,
        });
    }

    let Some(question_no) = question_no else {
        log::warn!("Ignoring question without a number: {:?}", text);
        return None;
    };
    match raw.marks.as_ref().and_then(Scalar::as_number) {
        Some(marks) if marks >= 0.0 => Some(QuestionNode::Leaf(LeafQuestion {
            question_no,
            text,
            marks,
        })),
        _ => {
            log::warn!("Ignoring question {} without usable marks", question_no);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn leaf(no: &str, marks: f64) -> QuestionNode {
        QuestionNode::Leaf(LeafQuestion {
            question_no: no.into(),
            text: String::new(),
            marks,
        })
    }

    fn numbers(leaves: &[LeafQuestion]) -> Vec<&str> {
        leaves.iter().map(|l| l.question_no.as_str()).collect()
    }

    #[test]
    fn test_flatten_actual_before_sub() {
        let tree = vec![
            leaf("1", 5.0),
            QuestionNode::Container {
                question_no: "2".into(),
                text: String::new(),
                sub_questions: vec![leaf("2c", 2.0)],
                actual_questions: vec![leaf("2a", 3.0), leaf("2b", 3.0)],
            },
        ];
        assert_eq!(numbers(&flatten(&tree)), vec!["1", "2a", "2b", "2c"]);
    }

    #[test]
    fn test_flatten_skips_duplicates_keeping_first() {
        let tree = vec![
            leaf("1", 5.0),
            QuestionNode::Container {
                question_no: "2".into(),
                text: String::new(),
                sub_questions: vec![QuestionNode::Container {
                    question_no: "2-or".into(),
                    text: String::new(),
                    sub_questions: vec![],
                    actual_questions: vec![leaf("2a", 4.0), leaf("1", 9.0)],
                }],
                actual_questions: vec![leaf("2a", 3.0)],
            },
        ];
        let leaves = flatten(&tree);
        assert_eq!(numbers(&leaves), vec!["1", "2a"]);
        assert_eq!(leaves[0].marks, 5.0);
        assert_eq!(leaves[1].marks, 3.0);
    }

    #[test]
    fn test_parse_keyed_paper_preserves_order() {
        let json = r#"{
            "totalMarks": 11,
            "questions": {
                "2": { "questionNo": "2", "text": "Two",
                       "actualQuestions": [
                           { "questionNo": "2a", "text": "a", "marks": 3 },
                           { "questionNo": "2b", "text": "b", "marks": "3" }
                       ] },
                "1": { "questionNo": 1, "text": "One", "marks": 5 }
            }
        }"#;
        let paper = QuestionPaper::from_json(json).unwrap();
        assert_eq!(paper.total_marks, Some(11.0));
        assert_eq!(numbers(&paper.leaves()), vec!["2a", "2b", "1"]);
    }

    #[test]
    fn test_parse_one_element_list_root() {
        let json = r#"[{ "totalMarks": "5",
            "questions": [ { "questionNo": "1", "question": "Explain", "marks": 5 } ] }]"#;
        let paper = QuestionPaper::from_json(json).unwrap();
        assert_eq!(paper.total_marks, Some(5.0));
        let leaves = paper.leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].text, "Explain");
    }

    #[test]
    fn test_container_with_marks_is_not_gradable() {
        let json = r#"{ "questions": [
            { "questionNo": "3", "marks": 10,
              "subQuestions": { "3a": { "marks": 4 }, "3b": { "marks": 6 } } }
        ] }"#;
        let paper = QuestionPaper::from_json(json).unwrap();
        assert_matches!(paper.questions[0], QuestionNode::Container { .. });
        assert_eq!(numbers(&paper.leaves()), vec!["3a", "3b"]);
    }

    #[test]
    fn test_container_with_only_dropped_parts_is_not_gradable() {
        let json = r#"{ "questions": [
            { "questionNo": "1", "marks": 2 },
            { "questionNo": "3", "marks": 10, "subQuestions": [ { "questionNo": "3a" } ] }
        ] }"#;
        let paper = QuestionPaper::from_json(json).unwrap();
        assert_matches!(
            &paper.questions[1],
            QuestionNode::Container { sub_questions, .. } if sub_questions.is_empty()
        );
        assert_eq!(numbers(&paper.leaves()), vec!["1"]);
    }

    #[test]
    fn test_malformed_list_entry_is_skipped() {
        let json = r#"{ "questions": [
            { "questionNo": "1", "marks": 2 },
            { "questionNo": "2", "marks": [1, 2] },
            { "questionNo": "3", "text": 7, "marks": 1 },
            "not a question",
            { "questionNo": "4", "marks": 3 }
        ] }"#;
        let paper = QuestionPaper::from_json(json).unwrap();
        assert_eq!(numbers(&paper.leaves()), vec!["1", "4"]);
    }

    #[test]
    fn test_nodes_without_marks_are_dropped() {
        let json = r#"{ "questions": [
            { "questionNo": "1", "marks": 2 },
            { "questionNo": "2" },
            { "questionNo": "3", "marks": "lots" }
        ] }"#;
        let paper = QuestionPaper::from_json(json).unwrap();
        assert_eq!(numbers(&paper.leaves()), vec!["1"]);
        assert_eq!(paper.total_marks, None);
    }

    #[test]
    fn test_bad_papers_fail_to_load() {
        assert_matches!(
            QuestionPaper::from_json("[]"),
            Err(MarkingError::QuestionPaperLoadFailure(_))
        );
        assert_matches!(
            QuestionPaper::from_json("{ \"questions\": [] }"),
            Err(MarkingError::QuestionPaperLoadFailure(_))
        );
        assert_matches!(
            QuestionPaper::from_json("not json"),
            Err(MarkingError::QuestionPaperLoadFailure(_))
        );
    }
}
