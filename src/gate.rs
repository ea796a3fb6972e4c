//! Access gate: team identifier + shared phrase check, and the persisted unlock.

use tracing::{info, warn};

use crate::error::AccessError;
use crate::store::{SessionStore, INDEX_KEY, TEAM_KEY, UNLOCKED_KEY};

/// Successful gate check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unlocked {
  pub team: String,
  /// False when the session was already unlocked and nothing changed.
  pub fresh: bool,
}

/// Unlock state found in the store at start-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Restored {
  pub team: String,
  pub index: usize,
}

/// Validate inputs. Returns the trimmed team identifier.
pub fn validate(team: &str, phrase: &str, secret: &str) -> Result<String, AccessError> {
  let team = team.trim();
  if team.is_empty() {
    return Err(AccessError::MissingTeamIdentifier);
  }
  if phrase.trim().to_lowercase() != secret.trim().to_lowercase() {
    return Err(AccessError::InvalidAccessPhrase);
  }
  Ok(team.to_string())
}

/// Record a fresh unlock: flag, team and index 0.
pub fn persist_unlock(store: &mut dyn SessionStore, team: &str) {
  for (key, value) in [(UNLOCKED_KEY, "true"), (TEAM_KEY, team), (INDEX_KEY, "0")] {
    if let Err(e) = store.set(key, value) {
      warn!(target: "quizgate", key, error = %e, "Failed to persist unlock");
    }
  }
}

/// Read back a previous unlock. Needs the flag and a team; a bad index restarts at 0.
pub fn restore(store: &dyn SessionStore) -> Option<Restored> {
  if store.get(UNLOCKED_KEY).as_deref() != Some("true") {
    return None;
  }
  let team = store.get(TEAM_KEY).map(|t| t.trim().to_string()).unwrap_or_default();
  if team.is_empty() {
    warn!(target: "quizgate", "Unlock flag set without a team identifier; showing the gate");
    return None;
  }
  let index = match store.get(INDEX_KEY) {
    None => 0,
    Some(raw) => raw.trim().parse::<usize>().unwrap_or_else(|e| {
      warn!(target: "quizgate", %raw, error = %e, "Unreadable persisted index; starting over");
      0
    }),
  };
  info!(target: "quizgate", %team, index, "Restored unlocked session");
  Some(Restored { team, index })
}
