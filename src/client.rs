//! Quiz service access: the `QuestionService` port and its HTTP implementation.
//!
//! Requests carry no timeout and are never retried: a hung request simply keeps
//! the runner waiting. Calls are instrumented and log status and sizes, not answers.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use tracing::{error, info, instrument, warn};

use crate::config::ServiceCfg;
use crate::domain::{Attempt, Question};
use crate::error::ServiceError;
use crate::protocol::{AnswerIn, QuestionsOut, VerdictOut};
use crate::util::trunc_for_log;

const CLIENT_UA: &str = concat!("quizgate/", env!("CARGO_PKG_VERSION"));

/// Injected capability used by the runner. Fakes implement this in tests.
#[async_trait]
pub trait QuestionService: Send + Sync {
  /// The full question list, ids assigned by position.
  async fn load_questions(&self) -> Result<Vec<Question>, ServiceError>;
  /// `Ok(true)` when the service accepts the answer.
  async fn verify_answer(&self, attempt: &Attempt) -> Result<bool, ServiceError>;
}

#[derive(Clone, Debug)]
pub struct HttpQuestionService {
  client: reqwest::Client,
  pub base_url: String,
  questions_path: String,
  verify_path: String,
}

impl HttpQuestionService {
  pub fn new(cfg: &ServiceCfg) -> Result<Self, ServiceError> {
    let client = reqwest::Client::builder().user_agent(CLIENT_UA).build()?;
    Ok(Self {
      client,
      base_url: cfg.base_url.trim_end_matches('/').to_string(),
      questions_path: cfg.questions_path.clone(),
      verify_path: cfg.verify_path.clone(),
    })
  }

  fn url(&self, path: &str) -> String {
    if path.starts_with('/') {
      format!("{}{}", self.base_url, path)
    } else {
      format!("{}/{}", self.base_url, path)
    }
  }

  /// `GET /`. Only logged; the quiz starts regardless.
  #[instrument(level = "info", skip(self), fields(base_url = %self.base_url))]
  pub async fn health_check(&self) -> Result<(), ServiceError> {
    let res = match self.client.get(self.url("/")).send().await {
      Ok(res) => res,
      Err(e) => {
        warn!(target: "quizgate", error = %e, "Quiz service unreachable");
        return Err(e.into());
      }
    };
    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      warn!(target: "quizgate", %status, body = %trunc_for_log(&body, 120), "Quiz service health check failed");
      return Err(ServiceError::Status(status, body));
    }
    info!(target: "quizgate", %status, "Quiz service reachable");
    Ok(())
  }

  async fn read_json<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, ServiceError> {
    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_else(|_| "No body".into());
      error!(target: "quizgate", %status, body_len = body.len(), "Quiz service request failed");
      return Err(ServiceError::Status(status, body));
    }
    Ok(res.json::<T>().await?)
  }
}

#[async_trait]
impl QuestionService for HttpQuestionService {
  #[instrument(level = "info", skip(self), fields(path = %self.questions_path))]
  async fn load_questions(&self) -> Result<Vec<Question>, ServiceError> {
    let res = self
      .client
      .get(self.url(&self.questions_path))
      .send()
      .await?;
    let body: QuestionsOut = Self::read_json(res).await?;
    let questions = body.into_questions();
    info!(target: "quizgate", count = questions.len(), "Questions fetched");
    Ok(questions)
  }

  #[instrument(level = "info", skip(self, attempt), fields(qid = attempt.question_id, answer_len = attempt.answer.len(), time_taken = attempt.elapsed_seconds))]
  async fn verify_answer(&self, attempt: &Attempt) -> Result<bool, ServiceError> {
    let res = self
      .client
      .post(self.url(&self.verify_path))
      .header(CONTENT_TYPE, "application/json")
      .json(&AnswerIn::from(attempt))
      .send()
      .await?;
    let verdict: VerdictOut = Self::read_json(res).await?;
    info!(target: "quizgate", qid = attempt.question_id, correct = verdict.correct, "Answer verified");
    Ok(verdict.correct)
  }
}
