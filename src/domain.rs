//! Domain models used by the client: questions, attempts, the transcript and runner phases.

/// One quiz question. `id` is its position in the loaded list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
  pub id: usize,
  pub text: String,
}

/// A single submission, built when the user answers and dropped once the verdict arrives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attempt {
  pub team_identifier: String,
  pub question_id: usize,
  /// Lowercased, trimmed answer text.
  pub answer: String,
  pub elapsed_seconds: u64,
  pub score: u64,
}

/// Where the runner is in the question walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
  /// Gate not passed yet.
  Locked,
  /// Question list requested, no answer yet.
  Loading,
  /// Loading failed or returned nothing; waits for a reload.
  Idle,
  /// Question `i` is scheduled to be shown (pacing delay after a correct answer).
  Presenting(usize),
  AwaitingAnswer(usize),
  Verifying(usize),
  Complete,
}

impl Phase {
  pub fn is_unlocked(&self) -> bool {
    !matches!(self, Phase::Locked)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
  User,
  System,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
  pub speaker: Speaker,
  pub text: String,
}

/// Append-only chat log. Purely presentational: nothing reads it back for control flow.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
  entries: Vec<TranscriptEntry>,
}

impl Transcript {
  pub fn system(&mut self, text: impl Into<String>) {
    self.entries.push(TranscriptEntry { speaker: Speaker::System, text: text.into() });
  }

  pub fn user(&mut self, text: impl Into<String>) {
    self.entries.push(TranscriptEntry { speaker: Speaker::User, text: text.into() });
  }

  pub fn entries(&self) -> &[TranscriptEntry] {
    &self.entries
  }

  #[cfg(test)]
  pub fn contains(&self, needle: &str) -> bool {
    self.entries.iter().any(|e| e.text.contains(needle))
  }
}
