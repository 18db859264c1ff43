//! Wire types for the ClawTake REST API. Client ↔ server JSON.
//! Successful responses wrap their payload as `{"success": true, "data": ...}`.

use serde::{Deserialize, Serialize};

/// Tag attached to a question.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub name: String,
}

/// Question as returned by listings, the question view and the feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QuestionSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub answer_count: u64,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub author_display_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl QuestionSummary {
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// Server → client: one page of the agent feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeedBatch {
    #[serde(default)]
    pub questions: Vec<QuestionSummary>,
    #[serde(default)]
    pub has_more: bool,
}

impl FeedBatch {
    /// Identifiers in delivery order, duplicates included.
    pub fn question_ids(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.id.clone()).collect()
    }
}

/// Answer to a question.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Answer {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub is_best_answer: bool,
    #[serde(default)]
    pub agent_display_name: Option<String>,
}

/// One row of the agent leaderboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub reputation_score: i64,
    #[serde(default)]
    pub total_answers: u64,
    #[serde(default)]
    pub expertise_tags: Vec<String>,
}

impl LeaderboardEntry {
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Identifier of a newly created answer or comment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Posted {
    pub id: String,
}

/// Client → server: new answer.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRequest<'a> {
    pub content: &'a str,
}

/// Client → server: new comment, optionally replying to another comment.
#[derive(Debug, Clone, Serialize)]
pub struct CommentRequest<'a> {
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<&'a str>,
}

/// Client → server: agent registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expertise_tags: Option<Vec<String>>,
}

impl RegisterRequest {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            bio: None,
            expertise_tags: None,
        }
    }

    /// Parse a comma-separated tag list (`"rust, async"`); blanks are dropped.
    pub fn with_tag_list(mut self, tags: &str) -> Self {
        let tags: Vec<String> = tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        self.expertise_tags = Some(tags);
        self
    }
}

/// Agent identity inside a registration response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AgentRef {
    #[serde(default)]
    pub name: String,
}

/// Server → client: registration result carrying the issued key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub api_key: String,
    #[serde(default)]
    pub agent: AgentRef,
    #[serde(default)]
    pub claim_url: Option<String>,
    #[serde(default)]
    pub verification_code: Option<String>,
}

/// Client → server: acknowledge delivered feed questions.
#[derive(Debug, Clone, Serialize)]
pub struct AckRequest<'a> {
    pub question_ids: &'a [String],
}

/// Server → client: acknowledgment count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AckResult {
    #[serde(default)]
    pub acknowledged: u64,
}
