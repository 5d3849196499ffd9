//! Terminal front end
//!
//! Owns the terminal for the lifetime of a run. Key events and task results
//! are merged in one `select!` loop and handed to the controller one at a
//! time.

mod app;
mod input;
mod view;

use app::Ui;
use crossterm::event::EventStream;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::workflow::{Connector, Message, Runtime, RuntimeAction, Session, SyncPolicy};

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Raw mode plus alternate screen, restored on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = stdout.execute(EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("Failed to disable raw mode: {}", e);
        }
        if let Err(e) = self.terminal.backend_mut().execute(LeaveAlternateScreen) {
            warn!("Failed to leave alternate screen: {}", e);
        }
        let _ = self.terminal.show_cursor();
    }
}

/// Run the wizard until it quits and return the final session.
pub async fn run(connector: Arc<dyn Connector>, policy: SyncPolicy) -> io::Result<Session> {
    let mut guard = TerminalGuard::enter()?;
    let mut runtime = Runtime::new(connector, policy);
    let result = event_loop(&mut guard.terminal, &mut runtime).await;
    runtime.shutdown();
    drop(guard);
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    runtime: &mut Runtime,
) -> io::Result<Session> {
    let mut session = Session::new();
    let mut ui = Ui::new();
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    let first = session.start();
    runtime.apply(&session, first);

    loop {
        terminal.draw(|frame| view::render(frame, &session, &mut ui))?;

        let message = tokio::select! {
            _ = ticker.tick() => {
                if session.phase().is_waiting() {
                    ui.tick();
                }
                continue;
            }
            Some(message) = runtime.recv() => message,
            event = events.next() => match event {
                Some(Ok(event)) => {
                    match ui.handle_event(session.phase(), session.workspaces().len(), event) {
                        Some(message) => message,
                        None => continue,
                    }
                }
                Some(Err(e)) => return Err(e),
                None => Message::Abort,
            },
        };

        let effect = session.update(message);
        match runtime.apply(&session, effect) {
            RuntimeAction::Continue => {}
            RuntimeAction::Prefill { field, value } => ui.prefill(field, &value),
            RuntimeAction::Quit => break,
        }
    }

    info!(phase = %session.phase(), "Wizard finished");
    Ok(session)
}
