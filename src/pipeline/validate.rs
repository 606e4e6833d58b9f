//! Response validation: raw model output → typed [`ArtifactResult`].
//!
//! Parsing into the typed structs alone would accept too much (two correct
//! answers, a 900-character description, an edge pointing at a missing node)
//! and report too little (serde stops at the first problem). The checker
//! walks the parsed `serde_json::Value` first and collects every violation
//! with a JSON path, then the value is deserialised into the typed shape.
//!
//! No repair is attempted: code fences, trailing prose or a truncated array
//! all fail. Whether to ask the model again is the caller's decision.

use crate::artifact::{ArtifactKind, ArtifactResult};
use crate::error::StudyGenError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Longest accepted quiz, question or answer description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 400;
/// Allowed number of questions in a quiz.
pub const QUESTIONS_PER_QUIZ: std::ops::RangeInclusive<usize> = 3..=10;
/// Allowed number of answers per quiz question.
pub const ANSWERS_PER_QUESTION: std::ops::RangeInclusive<usize> = 3..=5;

/// Parse `raw` as JSON and check it against the schema for `kind`.
pub fn validate(raw: &str, kind: ArtifactKind) -> Result<ArtifactResult, StudyGenError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| StudyGenError::MalformedOutput {
        kind,
        violations: vec![format!("output is not valid JSON: {e}")],
    })?;

    let mut checker = Checker::default();
    match kind {
        ArtifactKind::Flashcards => checker.flashcards(&value),
        ArtifactKind::Mindmap => checker.mindmap(&value),
        ArtifactKind::Quiz => checker.quiz(&value),
    }
    if !checker.violations.is_empty() {
        debug!(
            "Rejected {} output with {} violations",
            kind,
            checker.violations.len()
        );
        return Err(StudyGenError::MalformedOutput {
            kind,
            violations: checker.violations,
        });
    }

    Ok(match kind {
        ArtifactKind::Flashcards => ArtifactResult::Flashcards(typed(value, kind)?),
        ArtifactKind::Mindmap => ArtifactResult::Mindmap(typed(value, kind)?),
        ArtifactKind::Quiz => ArtifactResult::Quiz(typed(value, kind)?),
    })
}

fn typed<T: DeserializeOwned>(value: Value, kind: ArtifactKind) -> Result<T, StudyGenError> {
    serde_json::from_value(value).map_err(|e| StudyGenError::MalformedOutput {
        kind,
        violations: vec![e.to_string()],
    })
}

#[derive(Default)]
struct Checker {
    violations: Vec<String>,
}

impl Checker {
    fn fail(&mut self, path: &str, msg: impl AsRef<str>) {
        self.violations.push(format!("{path}: {}", msg.as_ref()));
    }

    // ── Shapes ───────────────────────────────────────────────────────────

    fn flashcards(&mut self, root: &Value) {
        let Some(cards) = self.as_array(root, "$") else {
            return;
        };
        for (i, card) in cards.iter().enumerate() {
            let path = format!("$[{i}]");
            let Some(obj) = self.as_object(card, &path) else {
                continue;
            };
            for key in ["title", "front", "back"] {
                self.required_str(obj, key, &path, None);
            }
            self.difficulty(obj, &path);
        }
    }

    fn mindmap(&mut self, root: &Value) {
        let Some(obj) = self.as_object(root, "$") else {
            return;
        };
        self.required_str(obj, "title", "$", None);
        self.required_str(obj, "description", "$", None);
        self.difficulty(obj, "$");

        let mut node_ids = HashSet::new();
        if let Some(nodes) = self.field_array(obj, "nodes", "$") {
            if nodes.is_empty() {
                self.fail("$.nodes", "must contain at least one node");
            }
            for (i, node) in nodes.iter().enumerate() {
                let path = format!("$.nodes[{i}]");
                let Some(node) = self.as_object(node, &path) else {
                    continue;
                };
                if let Some(id) = self.required_str(node, "id", &path, None) {
                    if !node_ids.insert(id.to_string()) {
                        self.fail(&format!("{path}.id"), format!("duplicate node id '{id}'"));
                    }
                }
                self.node_label(node, &path);
                self.position(node, &path);
            }
        }

        if let Some(edges) = self.field_array(obj, "edges", "$") {
            let mut edge_ids = HashSet::new();
            for (i, edge) in edges.iter().enumerate() {
                let path = format!("$.edges[{i}]");
                let Some(edge) = self.as_object(edge, &path) else {
                    continue;
                };
                if let Some(id) = self.required_str(edge, "id", &path, None) {
                    if !edge_ids.insert(id.to_string()) {
                        self.fail(&format!("{path}.id"), format!("duplicate edge id '{id}'"));
                    }
                }
                for end in ["source", "target"] {
                    if let Some(node_id) = self.required_str(edge, end, &path, None) {
                        if !node_ids.contains(node_id) {
                            self.fail(
                                &format!("{path}.{end}"),
                                format!("references unknown node '{node_id}'"),
                            );
                        }
                    }
                }
                self.required_str(edge, "label", &path, None);
            }
        }
    }

    fn quiz(&mut self, root: &Value) {
        let Some(obj) = self.as_object(root, "$") else {
            return;
        };
        self.required_str(obj, "title", "$", None);
        self.required_str(obj, "description", "$", Some(MAX_DESCRIPTION_CHARS));
        self.difficulty(obj, "$");

        let Some(questions) = self.field_array(obj, "questions", "$") else {
            return;
        };
        self.count("$.questions", questions.len(), &QUESTIONS_PER_QUIZ, "questions");

        for (qi, question) in questions.iter().enumerate() {
            let qpath = format!("$.questions[{qi}]");
            let Some(question) = self.as_object(question, &qpath) else {
                continue;
            };
            self.required_str(question, "description", &qpath, Some(MAX_DESCRIPTION_CHARS));

            let Some(answers) = self.field_array(question, "answers", &qpath) else {
                continue;
            };
            let apath = format!("{qpath}.answers");
            self.count(&apath, answers.len(), &ANSWERS_PER_QUESTION, "answers");

            let mut correct = 0;
            for (ai, answer) in answers.iter().enumerate() {
                let path = format!("{apath}[{ai}]");
                let Some(answer) = self.as_object(answer, &path) else {
                    continue;
                };
                self.required_str(answer, "description", &path, Some(MAX_DESCRIPTION_CHARS));
                match answer.get("isCorrect") {
                    Some(Value::Bool(true)) => correct += 1,
                    Some(Value::Bool(false)) => {}
                    Some(_) => self.fail(&format!("{path}.isCorrect"), "must be a boolean"),
                    None => self.fail(&path, "missing field 'isCorrect'"),
                }
            }
            if correct != 1 {
                self.fail(
                    &apath,
                    format!("exactly one answer must have isCorrect=true, found {correct}"),
                );
            }
        }
    }

    // ── Field helpers ────────────────────────────────────────────────────

    fn as_object<'v>(&mut self, v: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match v {
            Value::Object(map) => Some(map),
            other => {
                self.fail(path, format!("expected an object, got {}", type_name(other)));
                None
            }
        }
    }

    fn as_array<'v>(&mut self, v: &'v Value, path: &str) -> Option<&'v Vec<Value>> {
        match v {
            Value::Array(items) => Some(items),
            other => {
                self.fail(path, format!("expected an array, got {}", type_name(other)));
                None
            }
        }
    }

    fn field_array<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<&'v Vec<Value>> {
        match obj.get(key) {
            Some(v) => self.as_array(v, &format!("{path}.{key}")),
            None => {
                self.fail(path, format!("missing field '{key}'"));
                None
            }
        }
    }

    /// A present, non-blank string, optionally bounded in characters.
    fn required_str<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        key: &str,
        path: &str,
        max_chars: Option<usize>,
    ) -> Option<&'v str> {
        let field = format!("{path}.{key}");
        match obj.get(key) {
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.fail(&field, "must not be empty");
                None
            }
            Some(Value::String(s)) => {
                if let Some(max) = max_chars {
                    let len = s.chars().count();
                    if len > max {
                        self.fail(&field, format!("is {len} characters, limit is {max}"));
                    }
                }
                Some(s)
            }
            Some(other) => {
                self.fail(&field, format!("expected a string, got {}", type_name(other)));
                None
            }
            None => {
                self.fail(path, format!("missing field '{key}'"));
                None
            }
        }
    }

    fn difficulty(&mut self, obj: &Map<String, Value>, path: &str) {
        let field = format!("{path}.difficulty");
        match obj.get("difficulty") {
            Some(Value::Number(n)) => match n.as_u64() {
                Some(0..=2) => {}
                _ => self.fail(&field, format!("must be 0, 1 or 2, got {n}")),
            },
            Some(other) => self.fail(
                &field,
                format!("must be the integer 0, 1 or 2, got {}", type_name(other)),
            ),
            None => self.fail(path, "missing field 'difficulty'"),
        }
    }

    fn node_label(&mut self, node: &Map<String, Value>, path: &str) {
        match node.get("data") {
            Some(data) => {
                let data_path = format!("{path}.data");
                if let Some(data) = self.as_object(data, &data_path) {
                    self.required_str(data, "label", &data_path, None);
                }
            }
            None => {
                self.required_str(node, "label", path, None);
            }
        }
    }

    fn position(&mut self, node: &Map<String, Value>, path: &str) {
        let Some(position) = node.get("position") else {
            self.fail(path, "missing field 'position'");
            return;
        };
        let pos_path = format!("{path}.position");
        let Some(position) = self.as_object(position, &pos_path) else {
            return;
        };
        for axis in ["x", "y"] {
            match position.get(axis) {
                Some(Value::Number(_)) => {}
                Some(other) => self.fail(
                    &format!("{pos_path}.{axis}"),
                    format!("expected a number, got {}", type_name(other)),
                ),
                None => self.fail(&pos_path, format!("missing field '{axis}'")),
            }
        }
    }

    fn count(
        &mut self,
        path: &str,
        len: usize,
        allowed: &std::ops::RangeInclusive<usize>,
        what: &str,
    ) {
        if !allowed.contains(&len) {
            self.fail(
                path,
                format!(
                    "must have between {} and {} {what}, found {len}",
                    allowed.start(),
                    allowed.end()
                ),
            );
        }
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Difficulty;
    use serde_json::json;

    fn violations(raw: &str, kind: ArtifactKind) -> Vec<String> {
        match validate(raw, kind) {
            Err(StudyGenError::MalformedOutput { violations, .. }) => violations,
            other => panic!("expected MalformedOutput, got {other:?}"),
        }
    }

    fn answers(correct: &[bool]) -> Value {
        Value::Array(
            correct
                .iter()
                .enumerate()
                .map(|(i, c)| json!({"description": format!("Option {i}"), "isCorrect": c}))
                .collect(),
        )
    }

    fn quiz_with(questions: Vec<Value>) -> String {
        json!({
            "title": "Cats",
            "description": "A short quiz about cats.",
            "difficulty": 1,
            "questions": questions
        })
        .to_string()
    }

    fn question(correct: &[bool]) -> Value {
        json!({"description": "Which is true?", "answers": answers(correct)})
    }

    fn mindmap_json() -> Value {
        json!({
            "nodes": [
                {"id": "1", "data": {"label": "Cats"}, "position": {"x": 0, "y": 0}},
                {"id": "2", "data": {"label": "Mammals"}, "position": {"x": 200, "y": 100}}
            ],
            "edges": [{"id": "e1-2", "source": "1", "target": "2", "label": "are"}],
            "difficulty": 0,
            "description": "Cats are mammals.",
            "title": "Cats"
        })
    }

    #[test]
    fn flashcards_pass_through_unchanged() {
        let raw = r#"[{"title":"Cats","front":"What are cats?","back":"Mammals","difficulty":0}]"#;
        let result = validate(raw, ArtifactKind::Flashcards).unwrap();
        assert_eq!(serde_json::to_string(&result).unwrap(), raw);
        let cards = result.into_flashcards().unwrap();
        assert_eq!(cards[0].difficulty, Difficulty::Easy);
    }

    #[test]
    fn empty_flashcard_set_is_accepted() {
        let result = validate("[]", ArtifactKind::Flashcards).unwrap();
        assert_eq!(result.into_flashcards().unwrap().len(), 0);
    }

    #[test]
    fn not_json_is_malformed() {
        let v = violations("not json", ArtifactKind::Flashcards);
        assert!(v[0].contains("not valid JSON"), "{v:?}");
    }

    #[test]
    fn fenced_json_is_not_repaired() {
        let raw = "```json\n[]\n```";
        assert!(matches!(
            validate(raw, ArtifactKind::Flashcards),
            Err(StudyGenError::MalformedOutput { .. })
        ));
    }

    #[test]
    fn difficulty_words_and_out_of_range_are_rejected() {
        let raw = json!([
            {"title": "a", "front": "b", "back": "c", "difficulty": "Easy"},
            {"title": "a", "front": "b", "back": "c", "difficulty": 3},
            {"title": "a", "front": "b", "back": "c", "difficulty": -1},
            {"title": "a", "front": "b", "back": "c", "difficulty": 1.5}
        ])
        .to_string();
        let v = violations(&raw, ArtifactKind::Flashcards);
        assert_eq!(v.len(), 4, "{v:?}");
        assert!(v[0].starts_with("$[0].difficulty"));
        assert!(v[1].starts_with("$[1].difficulty"));
    }

    #[test]
    fn flashcard_missing_and_blank_fields_are_reported() {
        let raw = json!([{"title": " ", "front": "b", "difficulty": 0}]).to_string();
        let v = violations(&raw, ArtifactKind::Flashcards);
        assert!(v.iter().any(|m| m == "$[0].title: must not be empty"), "{v:?}");
        assert!(v.iter().any(|m| m == "$[0]: missing field 'back'"), "{v:?}");
    }

    #[test]
    fn quiz_with_two_correct_answers_is_rejected() {
        let raw = quiz_with(vec![
            question(&[true, true, false]),
            question(&[true, false, false]),
            question(&[false, false, true]),
        ]);
        let v = violations(&raw, ArtifactKind::Quiz);
        assert_eq!(
            v,
            vec!["$.questions[0].answers: exactly one answer must have isCorrect=true, found 2"]
        );
    }

    #[test]
    fn quiz_with_no_correct_answer_is_rejected() {
        let raw = quiz_with(vec![question(&[false, false, false]); 3]);
        assert_eq!(violations(&raw, ArtifactKind::Quiz).len(), 3);
    }

    #[test]
    fn valid_quiz_is_accepted() {
        let raw = quiz_with(vec![question(&[false, true, false, false]); 3]);
        let quiz = validate(&raw, ArtifactKind::Quiz).unwrap().into_quiz().unwrap();
        assert_eq!(quiz.questions.len(), 3);
        assert_eq!(quiz.difficulty, Difficulty::Medium);
        assert!(quiz.questions[0].answers[1].is_correct);
    }

    #[test]
    fn quiz_upper_bounds_are_inclusive() {
        let raw = quiz_with(vec![question(&[false, false, false, false, true]); 10]);
        let quiz = validate(&raw, ArtifactKind::Quiz).unwrap().into_quiz().unwrap();
        assert_eq!(quiz.questions.len(), 10);
        assert!(quiz.questions.iter().all(|q| q.answers.len() == 5));
    }

    #[test]
    fn quiz_question_and_answer_counts_are_bounded() {
        let too_few = quiz_with(vec![question(&[true, false, false]); 2]);
        let v = violations(&too_few, ArtifactKind::Quiz);
        assert!(v[0].contains("between 3 and 10 questions, found 2"), "{v:?}");

        let too_many = quiz_with(vec![question(&[true, false, false]); 11]);
        assert!(violations(&too_many, ArtifactKind::Quiz)[0].contains("found 11"));

        let few_answers = quiz_with(vec![question(&[true, false]); 3]);
        assert_eq!(violations(&few_answers, ArtifactKind::Quiz).len(), 3);

        let many_answers = quiz_with(vec![question(&[true, false, false, false, false, false]); 3]);
        assert!(violations(&many_answers, ArtifactKind::Quiz)[0].contains("between 3 and 5 answers"));
    }

    #[test]
    fn quiz_description_limit_counts_characters() {
        let mut quiz: Value = serde_json::from_str(&quiz_with(vec![question(&[true, false, false]); 3])).unwrap();
        // 400 multi-byte characters are within the limit.
        quiz["description"] = json!("é".repeat(400));
        assert!(validate(&quiz.to_string(), ArtifactKind::Quiz).is_ok());

        quiz["description"] = json!("x".repeat(401));
        let v = violations(&quiz.to_string(), ArtifactKind::Quiz);
        assert_eq!(v, vec!["$.description: is 401 characters, limit is 400"]);
    }

    #[test]
    fn quiz_answer_without_is_correct_is_rejected() {
        let mut q = question(&[true, false, false]);
        q["answers"][2] = json!({"description": "Maybe"});
        let raw = quiz_with(vec![q, question(&[true, false, false]), question(&[true, false, false])]);
        let v = violations(&raw, ArtifactKind::Quiz);
        assert!(v.contains(&"$.questions[0].answers[2]: missing field 'isCorrect'".to_string()), "{v:?}");
    }

    #[test]
    fn valid_mindmap_is_accepted() {
        let map = validate(&mindmap_json().to_string(), ArtifactKind::Mindmap)
            .unwrap()
            .into_mindmap()
            .unwrap();
        assert_eq!(map.nodes.len(), 2);
        assert_eq!(map.nodes[1].label(), "Mammals");
        assert_eq!(map.edges[0].target, "2");
    }

    #[test]
    fn mindmap_with_flat_labels_is_accepted() {
        let mut m = mindmap_json();
        m["nodes"][0] = json!({"id": "1", "label": "Cats", "position": {"x": 0, "y": 0}});
        let map = validate(&m.to_string(), ArtifactKind::Mindmap)
            .unwrap()
            .into_mindmap()
            .unwrap();
        assert_eq!(map.nodes[0].label(), "Cats");
    }

    #[test]
    fn mindmap_edge_to_unknown_node_is_rejected() {
        let mut m = mindmap_json();
        m["edges"][0]["target"] = json!("99");
        let v = violations(&m.to_string(), ArtifactKind::Mindmap);
        assert_eq!(v, vec!["$.edges[0].target: references unknown node '99'"]);
    }

    #[test]
    fn mindmap_duplicate_ids_and_bad_position_are_rejected() {
        let mut m = mindmap_json();
        m["nodes"][1]["id"] = json!("1");
        m["nodes"][0]["position"]["x"] = json!("left");
        let v = violations(&m.to_string(), ArtifactKind::Mindmap);
        assert!(v.iter().any(|s| s.contains("duplicate node id '1'")), "{v:?}");
        assert!(v.iter().any(|s| s.starts_with("$.nodes[0].position.x")), "{v:?}");
    }

    #[test]
    fn wrong_root_type_is_rejected() {
        let v = violations("{}", ArtifactKind::Flashcards);
        assert_eq!(v, vec!["$: expected an array, got an object"]);
        let v = violations("[]", ArtifactKind::Quiz);
        assert_eq!(v, vec!["$: expected an object, got an array"]);
    }
}
