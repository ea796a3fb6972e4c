//! Loading client configuration (service endpoints, access phrase, pacing, session store)
//! from TOML, then applying environment overrides.
//!
//! See `ClientConfig` for the expected schema. Every section and key is optional.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ClientConfig {
  #[serde(default)]
  pub service: ServiceCfg,
  #[serde(default)]
  pub access: AccessCfg,
  #[serde(default)]
  pub pacing: PacingCfg,
  #[serde(default)]
  pub session: SessionCfg,
}

/// Where the question/verification service lives.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServiceCfg {
  pub base_url: String,
  pub questions_path: String,
  pub verify_path: String,
}

impl Default for ServiceCfg {
  fn default() -> Self {
    Self {
      base_url: "http://127.0.0.1:8000".into(),
      questions_path: "/questions".into(),
      verify_path: "/check-answer".into(),
    }
  }
}

/// The shared phrase every team must type. Compared case-insensitively.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AccessCfg {
  pub phrase: String,
}

impl Default for AccessCfg {
  fn default() -> Self {
    Self { phrase: "Relicarium".into() }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PacingCfg {
  /// Pause between a correct answer and the next question.
  pub advance_delay_ms: u64,
}

impl Default for PacingCfg {
  fn default() -> Self {
    Self { advance_delay_ms: 1000 }
  }
}

impl PacingCfg {
  pub fn advance_delay(&self) -> Duration {
    Duration::from_millis(self.advance_delay_ms)
  }
}

/// Session persistence. With no `store_dir`, progress lives in memory only.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionCfg {
  pub store_dir: Option<PathBuf>,
}

impl Default for SessionCfg {
  fn default() -> Self {
    Self { store_dir: Some(PathBuf::from(".quizgate")) }
  }
}

/// Attempt to load `ClientConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_client_config_from_env() -> Option<ClientConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<ClientConfig>(&s) {
      Ok(cfg) => {
        info!(target: "quizgate", %path, "Loaded client config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quizgate", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quizgate", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

impl ClientConfig {
  /// File config (or defaults) with QUIZ_SERVICE_URL, QUIZ_ACCESS_PHRASE and QUIZ_STORE_DIR applied on top.
  pub fn from_env() -> Self {
    let mut cfg = load_client_config_from_env().unwrap_or_default();
    cfg.apply_overrides(|key| std::env::var(key).ok());
    cfg
  }

  fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
    if let Some(url) = var("QUIZ_SERVICE_URL") {
      self.service.base_url = url;
    }
    if let Some(phrase) = var("QUIZ_ACCESS_PHRASE") {
      self.access.phrase = phrase;
    }
    if let Some(dir) = var("QUIZ_STORE_DIR") {
      // Empty value switches persistence off.
      self.session.store_dir = if dir.is_empty() { None } else { Some(PathBuf::from(dir)) };
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_defaults() {
    let cfg: ClientConfig = toml::from_str(
      r#"
        [service]
        base_url = "http://quiz.local:9000"

        [pacing]
        advance_delay_ms = 250
      "#,
    )
    .unwrap();
    assert_eq!(cfg.service.base_url, "http://quiz.local:9000");
    assert_eq!(cfg.service.verify_path, "/check-answer");
    assert_eq!(cfg.access.phrase, "Relicarium");
    assert_eq!(cfg.pacing.advance_delay(), Duration::from_millis(250));
  }

  #[test]
  fn env_overrides_win_over_file() {
    let mut cfg = ClientConfig::default();
    cfg.apply_overrides(|key| match key {
      "QUIZ_SERVICE_URL" => Some("http://other:1".into()),
      "QUIZ_STORE_DIR" => Some(String::new()),
      _ => None,
    });
    assert_eq!(cfg.service.base_url, "http://other:1");
    assert_eq!(cfg.access.phrase, "Relicarium");
    assert!(cfg.session.store_dir.is_none());
  }
}
