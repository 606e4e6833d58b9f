//! Study artifacts: the three shapes a model is asked to produce.
//!
//! Field names follow the JSON contract consumed by the study platform
//! front-end (`isCorrect`, ReactFlow-style `data.label` on mindmap nodes), so
//! a validated artifact serialises back to exactly the shape the model was
//! asked for.

use crate::error::StudyGenError;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;
use std::str::FromStr;

// ── Kind ─────────────────────────────────────────────────────────────────

/// Which artifact a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Flashcards,
    Mindmap,
    Quiz,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Flashcards,
        ArtifactKind::Mindmap,
        ArtifactKind::Quiz,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Flashcards => "flashcards",
            ArtifactKind::Mindmap => "mindmap",
            ArtifactKind::Quiz => "quiz",
        }
    }

    /// Whether callers may attach a custom prompt to this kind.
    ///
    /// Quizzes are generated from the fixed rules only.
    pub fn supports_custom_prompt(&self) -> bool {
        !matches!(self, ArtifactKind::Quiz)
    }

    /// Model used when the configuration does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            ArtifactKind::Flashcards => "gpt-5",
            ArtifactKind::Mindmap | ArtifactKind::Quiz => "gpt-5-nano-2025-08-07",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = StudyGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flashcards" | "flashcard" => Ok(ArtifactKind::Flashcards),
            "mindmap" | "mindmaps" => Ok(ArtifactKind::Mindmap),
            "quiz" | "quizzes" => Ok(ArtifactKind::Quiz),
            other => Err(StudyGenError::InvalidRequest(format!(
                "unknown artifact kind '{other}' (expected flashcards, mindmap or quiz)"
            ))),
        }
    }
}

// ── Difficulty ───────────────────────────────────────────────────────────

/// Difficulty of an artifact, always serialised as the integer 0, 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    Easy = 0,
    Medium = 1,
    Hard = 2,
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Difficulty::Easy),
            1 => Ok(Difficulty::Medium),
            2 => Ok(Difficulty::Hard),
            other => Err(format!("difficulty must be 0, 1 or 2, got {other}")),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 {
        d as u8
    }
}

// ── Flashcards ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub title: String,
    pub front: String,
    pub back: String,
    pub difficulty: Difficulty,
}

// ── Mindmap ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mindmap {
    pub nodes: Vec<MindmapNode>,
    pub edges: Vec<MindmapEdge>,
    pub difficulty: Difficulty,
    pub description: String,
    pub title: String,
}

/// A concept in the mindmap.
///
/// Serialised ReactFlow-style with the label under `data`. A flat `label`
/// field is accepted on input and comes back out nested under `data`, so the
/// mindmap endpoint normalises that one shape rather than echoing it.
/// Position numbers keep the form the model wrote (`0` stays `0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMindmapNode")]
pub struct MindmapNode {
    pub id: String,
    pub data: NodeData,
    pub position: NodePosition,
}

impl MindmapNode {
    pub fn label(&self) -> &str {
        &self.data.label
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: Number,
    pub y: Number,
}

#[derive(Deserialize)]
struct RawMindmapNode {
    id: String,
    data: Option<NodeData>,
    label: Option<String>,
    position: NodePosition,
}

impl TryFrom<RawMindmapNode> for MindmapNode {
    type Error = String;

    fn try_from(raw: RawMindmapNode) -> Result<Self, Self::Error> {
        let label = match (raw.data, raw.label) {
            (Some(data), _) => data.label,
            (None, Some(label)) => label,
            (None, None) => return Err(format!("node '{}' has no label", raw.id)),
        };
        Ok(MindmapNode {
            id: raw.id,
            data: NodeData { label },
            position: raw.position,
        })
    }
}

/// A labelled relationship between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindmapEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
}

// ── Quiz ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub description: String,
    pub answers: Vec<QuizAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub description: String,
    #[serde(rename = "isCorrect")]
    pub is_correct: bool,
}

// ── Result ───────────────────────────────────────────────────────────────

/// A validated artifact, returned directly to the caller.
///
/// Serialises untagged: a flashcard set is a bare JSON array, mindmaps and
/// quizzes are bare objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArtifactResult {
    Flashcards(Vec<Flashcard>),
    Mindmap(Mindmap),
    Quiz(Quiz),
}

impl ArtifactResult {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactResult::Flashcards(_) => ArtifactKind::Flashcards,
            ArtifactResult::Mindmap(_) => ArtifactKind::Mindmap,
            ArtifactResult::Quiz(_) => ArtifactKind::Quiz,
        }
    }

    pub fn into_flashcards(self) -> Option<Vec<Flashcard>> {
        match self {
            ArtifactResult::Flashcards(cards) => Some(cards),
            _ => None,
        }
    }

    pub fn into_mindmap(self) -> Option<Mindmap> {
        match self {
            ArtifactResult::Mindmap(m) => Some(m),
            _ => None,
        }
    }

    pub fn into_quiz(self) -> Option<Quiz> {
        match self {
            ArtifactResult::Quiz(q) => Some(q),
            _ => None,
        }
    }
}
