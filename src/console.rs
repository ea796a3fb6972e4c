//! Terminal surface: gate prompts, transcript output and the live timer.
//!
//! Enter is the activation key: it submits the gate form while locked and the
//! answer once unlocked. Lines starting with `:` are console commands
//! (`:reload`, `:quit`). The timer is shown in the terminal title so it can tick
//! without disturbing the line being typed.

use std::io::{self, Write};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, instrument};

use crate::client::QuestionService;
use crate::domain::{Phase, Speaker};
use crate::error::AccessError;
use crate::session::{Event, QuizSession, SessionSettings};
use crate::store::StoreLocation;

const IDLE_TITLE: &str = "quizgate";

/// What the event loop should do after a line was handled.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
  Continue,
  Reload,
  Quit,
}

/// The two-field gate form, filled one line at a time.
#[derive(Debug, PartialEq, Eq)]
enum GateField {
  Team,
  Phrase { team: String },
}

pub struct Console<W: Write> {
  out: W,
  field: GateField,
  /// Transcript entries already written.
  shown: usize,
  title: Option<String>,
}

impl<W: Write> Console<W> {
  pub fn new(out: W) -> Self {
    Self { out, field: GateField::Team, shown: 0, title: None }
  }

  /// Fresh screen for a (re)started session.
  pub fn begin(&mut self, session: &QuizSession) -> io::Result<()> {
    self.field = GateField::Team;
    self.shown = 0;
    if session.phase() == Phase::Locked {
      writeln!(self.out, "Enter your team number and the access code.")?;
      self.prompt(session)?;
    } else {
      writeln!(self.out, "Welcome back, team {}. Resuming…", session.team())?;
    }
    self.render(session)
  }

  /// Handle one submitted line (the activation key).
  #[instrument(level = "debug", skip_all, fields(phase = ?session.phase()))]
  pub fn activate(&mut self, session: &mut QuizSession, line: &str) -> io::Result<Action> {
    let trimmed = line.trim();
    match trimmed {
      ":quit" | ":q" => return Ok(Action::Quit),
      ":reload" => return Ok(Action::Reload),
      _ => {}
    }

    if session.phase() != Phase::Locked {
      if !session.submit_answer(line) {
        debug!(target: "quizgate", "Input ignored in current phase");
      }
      return Ok(Action::Continue);
    }

    match std::mem::replace(&mut self.field, GateField::Team) {
      GateField::Team => {
        self.field = GateField::Phrase { team: line.to_string() };
      }
      GateField::Phrase { team } => match session.check_access(&team, line) {
        Ok(unlocked) => {
          debug!(target: "quizgate", fresh = unlocked.fresh, "Gate passed");
          writeln!(self.out, "Access granted for team {}. Loading questions…", unlocked.team)?;
        }
        Err(e) => {
          if let Some(slot) = session.gate_error() {
            writeln!(self.out, "✖ {slot}")?;
          }
          if e == AccessError::InvalidAccessPhrase {
            self.field = GateField::Phrase { team };
          }
        }
      },
    }
    self.render(session)?;
    if session.phase() == Phase::Locked {
      self.prompt(session)?;
    }
    Ok(Action::Continue)
  }

  fn prompt(&mut self, session: &QuizSession) -> io::Result<()> {
    if session.phase() != Phase::Locked {
      return Ok(());
    }
    match self.field {
      GateField::Team => write!(self.out, "Team number: ")?,
      GateField::Phrase { .. } => write!(self.out, "Access code: ")?,
    }
    self.out.flush()
  }

  /// Write new transcript lines and the timer title.
  pub fn render(&mut self, session: &QuizSession) -> io::Result<()> {
    let entries = session.transcript().entries();
    let mut wrote = false;
    for entry in entries.iter().skip(self.shown) {
      // User lines are already on screen as typed input.
      if entry.speaker == Speaker::System {
        writeln!(self.out, "quiz › {}", entry.text)?;
        wrote = true;
      }
    }
    self.shown = entries.len();

    if wrote {
      if matches!(session.phase(), Phase::AwaitingAnswer(_)) {
        write!(self.out, "[{}/{}] > ", session.index() + 1, session.questions().len())?;
      }
    }

    let title = session.timer_display();
    if title != self.title {
      write!(self.out, "\x1b]0;{}\x07", title.as_deref().unwrap_or(IDLE_TITLE))?;
      self.title = title;
    }
    self.out.flush()
  }

  pub fn finish(&mut self) -> io::Result<()> {
    write!(self.out, "\x1b]0;{IDLE_TITLE}\x07")?;
    writeln!(self.out)?;
    self.out.flush()
  }
}

fn boot(
  settings: &SessionSettings,
  location: &StoreLocation,
  service: &Arc<dyn QuestionService>,
) -> (QuizSession, UnboundedReceiver<Event>) {
  let (tx, rx) = mpsc::unbounded_channel();
  let session = QuizSession::restore(settings.clone(), location.open(), service.clone(), tx);
  (session, rx)
}

/// Event loop: stdin lines, session events and Ctrl-C, handled one at a time.
/// A reload replaces the session and its channel, so late responses for the old
/// session go nowhere.
#[instrument(level = "info", skip_all)]
pub async fn run(
  settings: SessionSettings,
  location: StoreLocation,
  service: Arc<dyn QuestionService>,
) -> io::Result<()> {
  let mut console = Console::new(io::stdout());
  let (mut session, mut events) = boot(&settings, &location, &service);
  console.begin(&session)?;

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let ctrl_c = tokio::signal::ctrl_c();
  tokio::pin!(ctrl_c);

  loop {
    tokio::select! {
      line = lines.next_line() => {
        let Some(line) = line? else { break };
        match console.activate(&mut session, &line)? {
          Action::Continue => {}
          Action::Quit => break,
          Action::Reload => {
            info!(target: "quizgate", "Reloading session from store");
            session.shutdown();
            (session, events) = boot(&settings, &location, &service);
            console.begin(&session)?;
            continue;
          }
        }
      }
      Some(event) = events.recv() => session.handle(event),
      _ = &mut ctrl_c => break,
    }
    console.render(&session)?;
  }

  session.shutdown();
  console.finish()
}

#[cfg(test)]
mod tests {
  use super::*;

  use crate::session::tests::{pump_until, settings, FakeService};
  use crate::store::MemoryStore;

  fn output(console: &Console<Vec<u8>>) -> String {
    String::from_utf8_lossy(&console.out).into_owned()
  }

  #[tokio::test]
  async fn gate_form_walks_team_then_phrase() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let svc = FakeService::three();
    let mut session = QuizSession::new(settings(), Box::new(MemoryStore::new()), svc, tx);
    let mut console = Console::new(Vec::new());
    console.begin(&session).unwrap();
    assert!(output(&console).ends_with("Team number: "));

    console.activate(&mut session, "").unwrap();
    assert!(output(&console).ends_with("Access code: "));
    console.activate(&mut session, "Relicarium").unwrap();
    assert!(output(&console).contains("✖ Please enter your team number."));
    assert!(output(&console).ends_with("Team number: "));

    console.activate(&mut session, "Team 7").unwrap();
    console.activate(&mut session, "nope").unwrap();
    console.activate(&mut session, "still nope").unwrap();
    assert_eq!(output(&console).matches("✖ Invalid code. Access denied.").count(), 2);
    assert!(output(&console).ends_with("Access code: "));
    assert_eq!(session.gate_error(), Some(AccessError::InvalidAccessPhrase));

    console.activate(&mut session, "RELICARIUM").unwrap();
    assert_eq!(session.phase(), Phase::Loading);
    assert!(output(&console).contains("Access granted for team Team 7."));
  }

  #[tokio::test(start_paused = true)]
  async fn renders_questions_and_timer_title() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let svc = FakeService::three();
    let mut session = QuizSession::new(settings(), Box::new(MemoryStore::new()), svc, tx);
    let mut console = Console::new(Vec::new());
    session.check_access("Team 7", "relicarium").unwrap();
    pump_until(&mut session, &mut rx, |s| s.phase() == Phase::AwaitingAnswer(0)).await;

    console.render(&session).unwrap();
    let out = output(&console);
    assert!(out.contains("quiz › 2+2?"));
    assert!(out.contains("[1/3] > "));
    assert!(out.contains("\x1b]0;Time: 0s\x07"));

    console.activate(&mut session, "5").unwrap();
    assert_eq!(session.phase(), Phase::Verifying(0));
    pump_until(&mut session, &mut rx, |s| s.phase() == Phase::AwaitingAnswer(0)).await;
    console.render(&session).unwrap();
    let out = output(&console);
    assert_eq!(out.matches("2+2?").count(), 1);
    assert!(!out.contains("quiz › 5"));
    assert!(out.contains("quiz › Wrong answer. Try again."));
  }

  #[tokio::test]
  async fn commands_are_recognised_in_any_phase() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let svc = FakeService::three();
    let mut session = QuizSession::new(settings(), Box::new(MemoryStore::new()), svc, tx);
    let mut console = Console::new(Vec::new());
    assert_eq!(console.activate(&mut session, " :reload ").unwrap(), Action::Reload);
    assert_eq!(console.activate(&mut session, ":quit").unwrap(), Action::Quit);
    assert_eq!(console.activate(&mut session, ":q").unwrap(), Action::Quit);
  }

  #[tokio::test]
  async fn reboot_resumes_from_the_same_store() {
    let svc: Arc<dyn QuestionService> = FakeService::three();
    let location = StoreLocation::Memory(MemoryStore::new());
    let (mut first, mut rx) = boot(&settings(), &location, &svc);
    assert_eq!(first.phase(), Phase::Locked);
    first.check_access("Team 7", "Relicarium").unwrap();
    pump_until(&mut first, &mut rx, |s| s.phase() == Phase::AwaitingAnswer(0)).await;
    first.submit_answer("4");
    pump_until(&mut first, &mut rx, |s| s.phase() == Phase::Presenting(1)).await;
    first.shutdown();

    let (mut second, mut rx) = boot(&settings(), &location, &svc);
    assert_eq!(second.phase(), Phase::Loading);
    pump_until(&mut second, &mut rx, |s| s.phase() == Phase::AwaitingAnswer(1)).await;
    assert_eq!(second.team(), "Team 7");
  }
}
