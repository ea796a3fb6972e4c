//! Wire structs for the quiz service (serde ready).
//! Field names follow the service's JSON exactly.

use serde::{Deserialize, Serialize};

use crate::domain::{Attempt, Question};

/// `GET /questions` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionsOut {
    pub questions: Vec<QuestionItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionItem {
    pub question: String,
    /// Sent by the service but not trusted: list position is the id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl QuestionsOut {
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
            .into_iter()
            .enumerate()
            .map(|(id, item)| Question { id, text: item.question })
            .collect()
    }
}

/// `POST /check-answer` body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerIn {
    pub team_no: String,
    pub qid: usize,
    pub answer: String,
    pub time_taken: u64,
    pub score: u64,
}

impl From<&Attempt> for AnswerIn {
    fn from(a: &Attempt) -> Self {
        Self {
            team_no: a.team_identifier.clone(),
            qid: a.question_id,
            answer: a.answer.clone(),
            time_taken: a.elapsed_seconds,
            score: a.score,
        }
    }
}

/// `POST /check-answer` response.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerdictOut {
    pub correct: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_ids_come_from_list_position() {
        let body = r#"{"questions":[{"id":7,"question":"2+2?"},{"question":"Capital of France?"}]}"#;
        let out: QuestionsOut = serde_json::from_str(body).unwrap();
        let qs = out.into_questions();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0], Question { id: 0, text: "2+2?".into() });
        assert_eq!(qs[1].id, 1);
    }

    #[test]
    fn answer_body_uses_service_field_names() {
        let attempt = Attempt {
            team_identifier: "7".into(),
            question_id: 2,
            answer: "paris".into(),
            elapsed_seconds: 12,
            score: 88,
        };
        let v = serde_json::to_value(AnswerIn::from(&attempt)).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "team_no": "7", "qid": 2, "answer": "paris", "time_taken": 12, "score": 88 })
        );
    }
}
