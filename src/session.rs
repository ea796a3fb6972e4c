//! Quiz session: the gate-to-completion state machine for one page instance.
//!
//! This module owns:
//!   - the runner phase, the loaded questions and the current position
//!   - the single per-question timer
//!   - the transcript and the gate error slot
//!   - the injected session store and question service
//!
//! All mutation goes through `&mut self` on one event loop. Network calls and the
//! pacing delay run as spawned tasks that report back as `Event`s; anything that
//! arrives for a phase the session has already left is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::client::QuestionService;
use crate::config::ClientConfig;
use crate::domain::{Attempt, Phase, Question, Transcript};
use crate::error::{AccessError, LoadError, VerificationTransportError};
use crate::gate::{self, Unlocked};
use crate::store::{SessionStore, INDEX_KEY};
use crate::timer::QuestionTimer;
use crate::util::{calculate_score, normalize_answer};

/// Results and wake-ups delivered to the session's event loop.
#[derive(Debug)]
pub enum Event {
    /// Once a second from the running timer.
    Tick { generation: u64 },
    QuestionsLoaded(Result<Vec<Question>, LoadError>),
    Verdict {
        attempt: Attempt,
        outcome: Result<bool, VerificationTransportError>,
    },
    /// Pacing delay after a correct answer has elapsed.
    ShowQuestion(usize),
}

#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub access_phrase: String,
    pub advance_delay: Duration,
}

impl From<&ClientConfig> for SessionSettings {
    fn from(cfg: &ClientConfig) -> Self {
        Self {
            access_phrase: cfg.access.phrase.clone(),
            advance_delay: cfg.pacing.advance_delay(),
        }
    }
}

pub struct QuizSession {
    settings: SessionSettings,
    store: Box<dyn SessionStore>,
    service: Arc<dyn QuestionService>,
    events: UnboundedSender<Event>,

    phase: Phase,
    team: String,
    questions: Vec<Question>,
    index: usize,
    /// Position to resume at once questions arrive; `index` stays in range until then.
    resume_at: usize,
    timer: Option<QuestionTimer>,
    timer_generation: u64,

    transcript: Transcript,
    gate_error: Option<AccessError>,
}

impl QuizSession {
    /// A locked session. Nothing is read from the store.
    pub fn new(
        settings: SessionSettings,
        store: Box<dyn SessionStore>,
        service: Arc<dyn QuestionService>,
        events: UnboundedSender<Event>,
    ) -> Self {
        Self {
            settings,
            store,
            service,
            events,
            phase: Phase::Locked,
            team: String::new(),
            questions: Vec::new(),
            index: 0,
            resume_at: 0,
            timer: None,
            timer_generation: 0,
            transcript: Transcript::default(),
            gate_error: None,
        }
    }

    /// Page start: bypass the gate when the store holds an unlock, and resume at
    /// the persisted index once questions arrive.
    #[instrument(level = "info", skip_all)]
    pub fn restore(
        settings: SessionSettings,
        store: Box<dyn SessionStore>,
        service: Arc<dyn QuestionService>,
        events: UnboundedSender<Event>,
    ) -> Self {
        let mut session = Self::new(settings, store, service, events);
        if let Some(restored) = gate::restore(&*session.store) {
            session.team = restored.team;
            session.resume_at = restored.index;
            session.start_loading();
        }
        session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn gate_error(&self) -> Option<AccessError> {
        self.gate_error
    }

    #[cfg(test)]
    pub fn timer(&self) -> Option<&QuestionTimer> {
        self.timer.as_ref()
    }

    /// "Time: Ns" while a question has a timer, `None` before the first question and after completion.
    pub fn timer_display(&self) -> Option<String> {
        self.timer.as_ref().map(|t| format!("Time: {}s", t.elapsed()))
    }

    /// Gate check. Already unlocked sessions succeed without touching anything.
    #[instrument(level = "info", skip(self, team, phrase), fields(team = %team.trim()))]
    pub fn check_access(&mut self, team: &str, phrase: &str) -> Result<Unlocked, AccessError> {
        let team = match gate::validate(team, phrase, &self.settings.access_phrase) {
            Ok(team) => team,
            Err(e) => {
                warn!(target: "quizgate", error = ?e, "Access denied");
                self.gate_error = Some(e);
                return Err(e);
            }
        };
        self.gate_error = None;

        if self.phase.is_unlocked() {
            debug!(target: "quizgate", phase = ?self.phase, "Already unlocked; not reloading");
            return Ok(Unlocked { team: self.team.clone(), fresh: false });
        }

        gate::persist_unlock(&mut *self.store, &team);
        info!(target: "quizgate", %team, "Access granted");
        self.team = team.clone();
        self.index = 0;
        self.resume_at = 0;
        self.start_loading();
        Ok(Unlocked { team, fresh: true })
    }

    fn start_loading(&mut self) {
        self.phase = Phase::Loading;
        let service = self.service.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = match service.load_questions().await {
                Ok(questions) if questions.is_empty() => Err(LoadError::NoQuestionsAvailable),
                Ok(questions) => Ok(questions),
                Err(e) => Err(LoadError::LoadFailed(e)),
            };
            let _ = events.send(Event::QuestionsLoaded(result));
        });
    }

    /// Show question `i` and restart its timer from zero.
    #[instrument(level = "debug", skip(self))]
    pub fn present_question(&mut self, i: usize) {
        let Some(question) = self.questions.get(i) else {
            warn!(target: "quiz", index = i, total = self.questions.len(), "No such question");
            return;
        };
        debug!(target: "quiz", qid = question.id, "Presenting question");
        self.transcript.system(question.text.clone());
        self.index = i;
        self.restart_timer();
        self.phase = Phase::AwaitingAnswer(i);
    }

    fn restart_timer(&mut self) {
        if let Some(mut previous) = self.timer.take() {
            previous.stop();
        }
        self.timer_generation += 1;
        self.timer = Some(QuestionTimer::start(self.timer_generation, self.events.clone()));
    }

    /// Send one answer for verification. Returns false (and does nothing) unless the
    /// session is waiting for an answer and the text is non-blank.
    #[instrument(level = "info", skip(self, raw), fields(phase = ?self.phase, answer_len = raw.len()))]
    pub fn submit_answer(&mut self, raw: &str) -> bool {
        let Phase::AwaitingAnswer(i) = self.phase else {
            debug!(target: "quiz", "Not awaiting an answer; ignoring submission");
            return false;
        };
        let text = raw.trim();
        if text.is_empty() {
            return false;
        }

        let elapsed_seconds = self.timer.as_ref().map_or(0, |t| t.elapsed());
        let attempt = Attempt {
            team_identifier: self.team.clone(),
            question_id: i,
            answer: normalize_answer(text),
            elapsed_seconds,
            score: calculate_score(elapsed_seconds),
        };
        debug!(target: "quiz", qid = i, answer_len = attempt.answer.len(), elapsed_seconds, score = attempt.score, "Submitting answer");
        self.transcript.user(text);
        self.phase = Phase::Verifying(i);

        let service = self.service.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = service
                .verify_answer(&attempt)
                .await
                .map_err(VerificationTransportError::from);
            let _ = events.send(Event::Verdict { attempt, outcome });
        });
        true
    }

    /// Apply one event. Events for a phase the session has left are dropped.
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Tick { generation } => {
                let live = self.timer.as_ref().filter(|t| t.is_running());
                if live.map(QuestionTimer::generation) != Some(generation) {
                    trace!(target: "quiz", generation, "Tick from a replaced timer");
                }
            }
            Event::QuestionsLoaded(result) => self.on_questions_loaded(result),
            Event::Verdict { attempt, outcome } => self.on_verdict(attempt, outcome),
            Event::ShowQuestion(i) => {
                if self.phase == Phase::Presenting(i) {
                    self.present_question(i);
                } else {
                    debug!(target: "quiz", index = i, phase = ?self.phase, "Dropping stale show");
                }
            }
        }
    }

    #[instrument(level = "info", skip_all)]
    fn on_questions_loaded(&mut self, result: Result<Vec<Question>, LoadError>) {
        if self.phase != Phase::Loading {
            warn!(target: "quiz", phase = ?self.phase, "Questions arrived outside Loading; ignored");
            return;
        }
        match result {
            Ok(questions) => {
                info!(target: "quiz", count = questions.len(), resume_at = self.resume_at, "Questions loaded");
                self.questions = questions;
                let start = std::mem::take(&mut self.resume_at);
                if start >= self.questions.len() {
                    self.complete();
                } else {
                    self.present_question(start);
                }
            }
            Err(e) => {
                error!(target: "quiz", error = %e, "Question load failed");
                self.phase = Phase::Idle;
                self.transcript.system(match e {
                    LoadError::NoQuestionsAvailable => "No questions available.",
                    LoadError::LoadFailed(_) => "Failed to load questions.",
                });
            }
        }
    }

    #[instrument(level = "info", skip_all, fields(qid = attempt.question_id))]
    fn on_verdict(&mut self, attempt: Attempt, outcome: Result<bool, VerificationTransportError>) {
        let i = attempt.question_id;
        if self.phase != Phase::Verifying(i) {
            warn!(target: "quiz", phase = ?self.phase, "Verdict arrived outside Verifying; ignored");
            return;
        }
        match outcome {
            Ok(true) => {
                if let Some(timer) = self.timer.as_mut() {
                    timer.stop();
                }
                info!(target: "quiz", qid = i, elapsed = attempt.elapsed_seconds, score = attempt.score, "Correct answer");
                self.transcript.system(format!(
                    "Correct! Solved in {} seconds. Score: {}.",
                    attempt.elapsed_seconds, attempt.score
                ));

                let next = i + 1;
                self.index = next;
                self.persist_index(next);
                if next < self.questions.len() {
                    self.phase = Phase::Presenting(next);
                    self.schedule_show(next);
                } else {
                    self.complete();
                }
            }
            Ok(false) => {
                info!(target: "quiz", qid = i, "Wrong answer");
                self.transcript.system("Wrong answer. Try again.");
                self.phase = Phase::AwaitingAnswer(i);
            }
            Err(e) => {
                error!(target: "quiz", qid = i, error = %e, "Verification failed");
                self.transcript.system("Server error. Try again.");
                self.phase = Phase::AwaitingAnswer(i);
            }
        }
    }

    fn schedule_show(&self, i: usize) {
        let events = self.events.clone();
        let delay = self.settings.advance_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(Event::ShowQuestion(i));
        });
    }

    fn complete(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
        self.index = self.questions.len();
        self.phase = Phase::Complete;
        self.transcript.system("🎉 Quiz completed!");
        if let Err(e) = self.store.remove(INDEX_KEY) {
            warn!(target: "quizgate", error = %e, "Failed to clear persisted index");
        }
        info!(target: "quiz", team = %self.team, total = self.questions.len(), "Quiz complete");
    }

    fn persist_index(&mut self, index: usize) {
        if let Err(e) = self.store.set(INDEX_KEY, &index.to_string()) {
            warn!(target: "quizgate", index, error = %e, "Failed to persist index");
        }
    }

    /// Stop the timer before the session is thrown away.
    pub fn shutdown(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
    }
}
