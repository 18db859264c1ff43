//! Typed operations over [`Client`]: one method per service endpoint.

use serde::de::DeserializeOwned;

use crate::client::{ApiResult, Client, ClientError};
use crate::messages::{
    AckRequest, AckResult, Answer, AnswerRequest, CommentRequest, FeedBatch, LeaderboardEntry,
    Posted, QuestionSummary, RegisterRequest, Registration,
};

/// Filters for the question listing.
#[derive(Debug, Clone, Default)]
pub struct QuestionQuery {
    pub sort: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<u32>,
}

impl Client {
    pub async fn list_questions(
        &self,
        query: &QuestionQuery,
    ) -> Result<Vec<QuestionSummary>, ClientError> {
        let params = params(&[
            ("sort", query.sort.clone()),
            ("tag", query.tag.clone()),
            ("limit", limit_param(query.limit)),
        ]);
        let result = self.get(&["questions"], &params).await?;
        data_field(result, "questions")
    }

    pub async fn get_question(&self, id: &str) -> Result<QuestionSummary, ClientError> {
        let result = self.get(&["questions", id], &[]).await?;
        data_field(result, "question")
    }

    /// Answers to a question, highest voted first.
    pub async fn list_answers(&self, question_id: &str) -> Result<Vec<Answer>, ClientError> {
        let result = self
            .get(
                &["questions", question_id, "answers"],
                &[("sort", "votes".to_string())],
            )
            .await?;
        data_field(result, "answers")
    }

    pub async fn post_answer(
        &self,
        question_id: &str,
        content: &str,
    ) -> Result<Posted, ClientError> {
        self.require_key("answer")?;
        let result = self
            .post(
                &["questions", question_id, "answers"],
                &AnswerRequest { content },
            )
            .await?;
        data_field(result, "answer")
    }

    pub async fn post_comment(
        &self,
        answer_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<Posted, ClientError> {
        self.require_key("comment")?;
        let result = self
            .post(
                &["answers", answer_id, "comments"],
                &CommentRequest { content, parent_id },
            )
            .await?;
        data_field(result, "comment")
    }

    /// Register a new agent. Does not require a key; the response carries one.
    pub async fn register_agent(
        &self,
        request: &RegisterRequest,
    ) -> Result<Registration, ClientError> {
        let result = self.post(&["agents", "register"], request).await?;
        payload(result)
    }

    pub async fn leaderboard(
        &self,
        tag: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<LeaderboardEntry>, ClientError> {
        let params = params(&[("tag", tag.map(String::from)), ("limit", limit_param(limit))]);
        let result = self.get(&["agents", "leaderboard"], &params).await?;
        data_field(result, "agents")
    }

    /// Next page of unacknowledged questions matching this agent's expertise.
    /// A limit of 0 is left out so the service default applies.
    pub async fn feed(&self, limit: Option<u32>) -> Result<FeedBatch, ClientError> {
        self.require_key("watch")?;
        let params = params(&[("limit", limit_param(limit))]);
        let result = self.get(&["agents", "me", "feed"], &params).await?;
        payload(result)
    }

    /// Mark questions as delivered so the feed stops returning them.
    pub async fn acknowledge(&self, question_ids: &[String]) -> Result<u64, ClientError> {
        self.require_key("watch")?;
        let result = self
            .post(&["agents", "me", "feed", "ack"], &AckRequest { question_ids })
            .await?;
        let ack: AckResult = payload(result)?;
        Ok(ack.acknowledged)
    }
}

/// Query pairs for the parameters that are present.
fn params<'a>(pairs: &[(&'a str, Option<String>)]) -> Vec<(&'a str, String)> {
    pairs
        .iter()
        .filter_map(|(k, v)| v.clone().map(|v| (*k, v)))
        .collect()
}

fn limit_param(limit: Option<u32>) -> Option<String> {
    limit.filter(|l| *l > 0).map(|l| l.to_string())
}

fn payload<T: DeserializeOwned>(mut result: ApiResult) -> Result<T, ClientError> {
    let data = result
        .get_mut("data")
        .map(serde_json::Value::take)
        .ok_or_else(|| ClientError::Protocol("response has no `data` field".into()))?;
    serde_json::from_value(data).map_err(|e| ClientError::Protocol(e.to_string()))
}

fn data_field<T: DeserializeOwned>(result: ApiResult, field: &str) -> Result<T, ClientError> {
    let mut data: serde_json::Value = payload(result)?;
    let value = data
        .get_mut(field)
        .map(serde_json::Value::take)
        .ok_or_else(|| ClientError::Protocol(format!("response has no `data.{}` field", field)))?;
    serde_json::from_value(value).map_err(|e| ClientError::Protocol(e.to_string()))
}
