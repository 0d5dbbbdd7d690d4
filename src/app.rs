use crate::{
    catalog::{Catalog, Selection, SelectionError, StratagemDefinition},
    clock::{Clock, SystemClock},
    drill::Drill,
    effects::{BellEffects, Effects},
    evaluation::{EvaluationStatus, EvaluationTask},
    input::{command_for_key, Command},
    runtime::{AppEvent, EventSource, Runner, Ticker},
    stats::SessionStatistics,
};
use ratatui::{backend::Backend, Terminal};
use std::io;
use tracing::{debug, info};

/// Top-level state of the terminal app: the drill, the practice selection and
/// the post-session report.
pub struct App<C: Clock = SystemClock, E: Effects = BellEffects> {
    catalog: Catalog,
    selection: Selection,
    /// Index into the catalog for the selection line
    cursor: usize,
    drill: Drill<C, E>,
    evaluation: EvaluationTask,
    /// Final statistics of the session the open report describes
    report: Option<SessionStatistics>,
    should_quit: bool,
}

impl<C: Clock, E: Effects> App<C, E> {
    /// The drill's pool is replaced by the catalog entries in `selection`
    pub fn new(
        catalog: Catalog,
        selection: Selection,
        mut drill: Drill<C, E>,
        evaluation: EvaluationTask,
    ) -> Self {
        drill.set_pool(catalog.pool(&selection));
        Self {
            catalog,
            selection,
            cursor: 0,
            drill,
            evaluation,
            report: None,
            should_quit: false,
        }
    }

    /// Apply one event. Returns true when the screen needs redrawing.
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Key(key) => match command_for_key(&key) {
                Some(command) => {
                    self.handle_command(command);
                    true
                }
                None => false,
            },
            AppEvent::Resize => true,
            AppEvent::Tick => self.on_tick(),
            AppEvent::Closed => {
                info!("event source closed");
                self.should_quit = true;
                true
            }
        }
    }

    pub fn handle_command(&mut self, command: Command) {
        if self.report.is_some() {
            match command {
                Command::StartStop | Command::Dismiss => self.dismiss_report(),
                Command::Quit => self.should_quit = true,
                Command::ToggleRandom => self.toggle_random_mode(),
                Command::Direction(_)
                | Command::NextEntry
                | Command::PrevEntry
                | Command::ToggleEntry => {}
            }
            return;
        }

        match command {
            Command::Direction(dir) => {
                self.drill.submit(dir);
            }
            Command::StartStop => {
                if self.drill.is_session_active() {
                    self.stop_session();
                } else {
                    self.drill.start_session();
                }
            }
            Command::ToggleRandom => self.toggle_random_mode(),
            Command::NextEntry => self.move_cursor(1),
            Command::PrevEntry => self.move_cursor(-1),
            Command::ToggleEntry => {
                if let Some(id) = self.cursor_entry().map(|s| s.id.clone()) {
                    match self.toggle_selection(&id) {
                        Ok(selected) => debug!(%id, selected, "selection toggled"),
                        Err(e) => debug!(%id, "selection unchanged: {}", e),
                    }
                }
            }
            Command::Dismiss | Command::Quit => self.should_quit = true,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.catalog.entries().len() as isize;
        if len > 0 {
            self.cursor = (self.cursor as isize + delta).rem_euclid(len) as usize;
        }
    }

    /// Advance timers and collect a finished evaluation. Returns true when
    /// anything visible may have changed.
    pub fn on_tick(&mut self) -> bool {
        self.drill.on_tick();
        let was_pending = self.evaluation.is_pending();
        self.evaluation.poll();
        self.drill.is_session_active() || (was_pending && !self.evaluation.is_pending())
    }

    fn stop_session(&mut self) {
        if let Some(stats) = self.drill.stop_session() {
            self.evaluation.request(stats);
            self.report = Some(stats);
        }
    }

    fn dismiss_report(&mut self) {
        self.evaluation.dismiss();
        self.report = None;
    }

    fn toggle_random_mode(&mut self) {
        let on = !self.drill.random_mode();
        if self.drill.set_random_mode(on) {
            info!(random_mode = on, "session abandoned by mode switch");
        }
    }

    /// Add or remove a catalog id from practice. The running attempt keeps its
    /// target; the new pool applies from the next pick.
    pub fn toggle_selection(&mut self, id: &str) -> Result<bool, SelectionError> {
        let selected = self.selection.toggle(&self.catalog, id)?;
        self.drill.set_pool(self.catalog.pool(&self.selection));
        Ok(selected)
    }

    pub fn drill(&self) -> &Drill<C, E> {
        &self.drill
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Catalog entry under the selection cursor
    pub fn cursor_entry(&self) -> Option<&StratagemDefinition> {
        self.catalog.entries().get(self.cursor)
    }

    pub fn report(&self) -> Option<&SessionStatistics> {
        self.report.as_ref()
    }

    pub fn evaluation_status(&self) -> EvaluationStatus<'_> {
        self.evaluation.status()
    }

    pub fn is_remote_evaluation(&self) -> bool {
        self.evaluation.adapter().is_remote()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// Draw and process events until the app asks to quit
pub fn run<B, S, T, C, E>(
    terminal: &mut Terminal<B>,
    app: &mut App<C, E>,
    runner: &Runner<S, T>,
) -> io::Result<()>
where
    B: Backend,
    S: EventSource,
    T: Ticker,
    C: Clock,
    E: Effects,
{
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    while !app.should_quit() {
        if app.handle_event(runner.step()) {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }
    Ok(())
}
