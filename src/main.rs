//! quizgate · timed team quiz client
//!
//! - Access gate (team number + shared access code)
//! - Questions fetched once from the quiz service, answered one at a time
//! - Per-question timer, server-side answer verification
//! - Progress persisted per tab so a restart resumes where the team left off
//!
//! Important env variables:
//!   QUIZ_CONFIG_PATH   : path to TOML config (service, access, pacing, session)
//!   QUIZ_SERVICE_URL   : quiz service base URL (default "http://127.0.0.1:8000")
//!   QUIZ_ACCESS_PHRASE : shared access code (default "Relicarium")
//!   QUIZ_STORE_DIR     : directory for tab session files; empty disables persistence
//!   QUIZ_TAB_ID        : reuse a previous tab's session (a fresh id is generated otherwise)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod error;
mod config;
mod protocol;
mod store;
mod gate;
mod timer;
mod client;
mod session;
mod console;

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::client::{HttpQuestionService, QuestionService};
use crate::config::ClientConfig;
use crate::session::SessionSettings;
use crate::store::StoreLocation;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = ClientConfig::from_env();
  let tab_id = std::env::var("QUIZ_TAB_ID")
    .ok()
    .map(|id| id.trim().to_string())
    .filter(|id| !id.is_empty())
    .unwrap_or_else(|| Uuid::new_v4().to_string());

  let http = Arc::new(HttpQuestionService::new(&cfg.service)?);
  info!(target: "quizgate", base_url = %http.base_url, %tab_id, "Quiz client starting");

  // Reachability is informational only; the quiz does not wait for it.
  let probe = http.clone();
  tokio::spawn(async move {
    let _ = probe.health_check().await;
  });

  let location = StoreLocation::new(cfg.session.store_dir.clone(), &tab_id);
  if let StoreLocation::File { dir, .. } = &location {
    println!("Session tab {tab_id} (set QUIZ_TAB_ID={tab_id} to resume, data in {})", dir.display());
  }

  let service: Arc<dyn QuestionService> = http;
  console::run(SessionSettings::from(&cfg), location, service).await?;
  Ok(())
}
