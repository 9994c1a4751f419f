// src/services/questions.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        identity::Identity,
        question::{Question, QuestionStatus},
    },
    storage::{KvStore, keys, load_json, save_json},
};

/// Substrings that get a question rejected. Matched against lower-cased text.
pub const BANNED_WORDS: &[&str] = &[
    "กู", "มึง", "สัส", "เหี้ย", "ควย", "เย็ด", "fuck", "shit", "เลว", "ชั่ว",
];

/// Default size of the ranked board.
pub const TOP_QUESTIONS: usize = 5;

/// Moderation filter.
pub fn is_flagged(text: &str) -> bool {
    let lowered = text.to_lowercase();
    BANNED_WORDS.iter().any(|word| lowered.contains(word))
}

/// The community question feed.
pub struct QuestionStore {
    kv: Arc<dyn KvStore>,
    questions: RwLock<Vec<Question>>,
}

impl QuestionStore {
    /// Loads persisted questions, falling back to the seed feed.
    pub async fn load(kv: Arc<dyn KvStore>) -> Result<Self, AppError> {
        let questions = load_json::<Vec<Question>>(kv.as_ref(), keys::QUESTIONS)
            .await?
            .unwrap_or_else(seed_questions);

        Ok(Self {
            kv,
            questions: RwLock::new(questions),
        })
    }

    async fn commit(&self, current: &mut Vec<Question>, next: Vec<Question>) -> Result<(), AppError> {
        save_json(self.kv.as_ref(), keys::QUESTIONS, &next).await?;
        *current = next;
        Ok(())
    }

    /// Every stored question, rejected ones included.
    pub async fn list_all(&self) -> Vec<Question> {
        self.questions.read().await.clone()
    }

    /// Stores the question with the status decided by the moderation filter.
    /// Rejected questions are kept but never ranked.
    pub async fn submit(&self, text: &str, author: &Identity) -> Result<Question, AppError> {
        let status = if is_flagged(text) {
            QuestionStatus::Rejected
        } else {
            QuestionStatus::Approved
        };

        let question = Question {
            id: Uuid::new_v4().to_string(),
            author_id: author.id.clone(),
            author_name: author.display_name.clone(),
            text: text.to_string(),
            vote_count: 0,
            created_at: Utc::now(),
            voted_by: Vec::new(),
            status,
        };

        let mut questions = self.questions.write().await;
        let mut next = questions.clone();
        next.push(question.clone());
        self.commit(&mut questions, next).await?;

        match status {
            QuestionStatus::Rejected => {
                tracing::warn!("Question {} from {} rejected by moderation", question.id, author.id)
            }
            _ => tracing::info!("Question {} from {} approved", question.id, author.id),
        }

        Ok(question)
    }

    /// One vote per voter. A repeated vote returns the question unchanged.
    pub async fn vote(&self, question_id: &str, voter_id: &str) -> Result<Question, AppError> {
        let mut questions = self.questions.write().await;

        let current = questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", question_id)))?;

        if current.voted_by.iter().any(|v| v == voter_id) {
            return Ok(current.clone());
        }

        let mut next = questions.clone();
        let mut voted = None;
        if let Some(q) = next.iter_mut().find(|q| q.id == question_id) {
            q.vote_count += 1;
            q.voted_by.push(voter_id.to_string());
            voted = Some(q.clone());
        }
        self.commit(&mut questions, next).await?;

        voted.ok_or_else(|| AppError::NotFound(format!("Question '{}' not found", question_id)))
    }

    /// Approved questions by descending votes; ties keep insertion order.
    pub async fn ranked(&self, limit: Option<usize>) -> Vec<Question> {
        let mut approved: Vec<Question> = self
            .questions
            .read()
            .await
            .iter()
            .filter(|q| q.status == QuestionStatus::Approved)
            .cloned()
            .collect();

        // sort_by is stable
        approved.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
        if let Some(limit) = limit {
            approved.truncate(limit);
        }
        approved
    }
}

fn seed_questions() -> Vec<Question> {
    let now = Utc::now();
    vec![
        Question {
            id: "1".to_string(),
            author_id: "mock1".to_string(),
            author_name: "somchai".to_string(),
            text: "อยากให้ Zeelink เพิ่มฟีเจอร์อะไรมากที่สุดครับ?".to_string(),
            vote_count: 1254,
            created_at: now,
            voted_by: Vec::new(),
            status: QuestionStatus::Approved,
        },
        Question {
            id: "2".to_string(),
            author_id: "mock2".to_string(),
            author_name: "admin".to_string(),
            text: "ร้านกาแฟในเชียงใหม่ร้านไหนดี?".to_string(),
            vote_count: 856,
            created_at: now - Duration::days(1),
            voted_by: Vec::new(),
            status: QuestionStatus::Approved,
        },
    ]
}
