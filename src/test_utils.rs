//! In-memory transport with canned results, scripted failures and a step log.
//!
//! Useful for exercising the executor without a database, and for checking what
//! the executor does on error paths and under contention.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::binder::BindValue;
use crate::config::ConnectOptions;
use crate::error::ExecutorError;
use crate::statement::{Connector, Session, StatementHandle};
use crate::types::{BindDescriptor, FetchStatus, OutputColumn};

/// Raw wire bytes of one column; `None` is SQL NULL.
pub type Cell = Option<Vec<u8>>;

/// Encode a value the way the binder would, for building canned rows.
///
/// # Panics
/// If `value` cannot be encoded; canned rows are fixed test data.
pub fn cell<T: BindValue>(value: T) -> Cell {
    match value.encode() {
        Ok(bytes) => Some(bytes),
        Err(e) => panic!("cannot encode canned cell: {e}"),
    }
}

/// Protocol steps recorded in the [`EventLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Prepare,
    BindParams,
    BindOutputs,
    Execute,
    Fetch,
    FetchColumn,
    CloseStatement,
    CloseSession,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub query: String,
    pub step: Step,
}

/// Shared, ordered record of every protocol step across all sessions that hold it.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    fn push(&self, query: &str, step: Step) {
        let mut events = match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(Event {
            query: query.to_owned(),
            step,
        });
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        match self.0.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[must_use]
    pub fn count(&self, step: Step) -> usize {
        self.events().iter().filter(|e| e.step == step).count()
    }

    #[must_use]
    pub fn steps_for(&self, query: &str) -> Vec<Step> {
        self.events()
            .into_iter()
            .filter(|e| e.query == query)
            .map(|e| e.step)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
struct Script {
    field_count: usize,
    rows: Vec<Vec<Cell>>,
    affected_rows: u64,
    failure: Option<(Step, String)>,
    panic_at: Option<Step>,
    fail_fetch_after: Option<(usize, String)>,
}

/// A fake connection that answers known queries from scripts.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSession {
    scripts: HashMap<String, Script>,
    delay: Duration,
    log: EventLog,
    closed: bool,
}

impl ScriptedSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `query` returns `rows`, each with `field_count` cells.
    #[must_use]
    pub fn with_rows(mut self, query: &str, field_count: usize, rows: Vec<Vec<Cell>>) -> Self {
        let script = self.scripts.entry(query.to_owned()).or_default();
        script.field_count = field_count;
        script.rows = rows;
        script.affected_rows = script.rows.len() as u64;
        self
    }

    /// `query` has no result set and reports `affected` rows.
    #[must_use]
    pub fn with_affected(mut self, query: &str, affected: u64) -> Self {
        let script = self.scripts.entry(query.to_owned()).or_default();
        script.field_count = 0;
        script.affected_rows = affected;
        self
    }

    /// `query` fails at `step` with `message`.
    #[must_use]
    pub fn failing(mut self, query: &str, step: Step, message: &str) -> Self {
        self.scripts.entry(query.to_owned()).or_default().failure =
            Some((step, message.to_owned()));
        self
    }

    /// `query` panics at `step`, as a buggy driver would, while the executor lock is held.
    #[must_use]
    pub fn panicking(mut self, query: &str, step: Step) -> Self {
        self.scripts.entry(query.to_owned()).or_default().panic_at = Some(step);
        self
    }

    /// Fetching from `query` fails once `rows` rows have been delivered.
    #[must_use]
    pub fn failing_fetch_after(mut self, query: &str, rows: usize, message: &str) -> Self {
        self.scripts.entry(query.to_owned()).or_default().fail_fetch_after =
            Some((rows, message.to_owned()));
        self
    }

    /// Sleep this long in every protocol step.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Record steps into an existing log.
    #[must_use]
    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    #[must_use]
    pub fn log(&self) -> EventLog {
        self.log.clone()
    }
}

impl Session for ScriptedSession {
    type Statement<'s>
        = ScriptedStatement<'s>
    where
        Self: 's;

    fn prepare<'s>(&'s mut self, query: &str) -> Result<ScriptedStatement<'s>, ExecutorError> {
        if self.closed {
            return Err(ExecutorError::Connect("session closed".into()));
        }
        self.log.push(query, Step::Prepare);
        thread::sleep(self.delay);
        let script = self
            .scripts
            .get(query)
            .ok_or_else(|| ExecutorError::Prepare(format!("unknown statement: {query}")))?;
        if let Some((Step::Prepare, msg)) = &script.failure {
            return Err(ExecutorError::Prepare(msg.clone()));
        }
        Ok(ScriptedStatement {
            query: query.to_owned(),
            param_count: query.matches('?').count(),
            script,
            log: &self.log,
            delay: self.delay,
            cursor: 0,
            current: None,
            executed: false,
            closed: false,
        })
    }

    fn close(&mut self) -> Result<(), ExecutorError> {
        if !self.closed {
            self.closed = true;
            self.log.push("", Step::CloseSession);
        }
        Ok(())
    }
}

/// Statement produced by [`ScriptedSession::prepare`].
#[derive(Debug)]
pub struct ScriptedStatement<'s> {
    query: String,
    param_count: usize,
    script: &'s Script,
    log: &'s EventLog,
    delay: Duration,
    cursor: usize,
    current: Option<usize>,
    executed: bool,
    closed: bool,
}

impl ScriptedStatement<'_> {
    fn step(&self, step: Step) -> Result<(), String> {
        self.log.push(&self.query, step);
        thread::sleep(self.delay);
        if self.script.panic_at == Some(step) {
            panic!("scripted panic at {step:?} for {}", self.query);
        }
        match &self.script.failure {
            Some((failing, msg)) if *failing == step => Err(msg.clone()),
            _ => Ok(()),
        }
    }

    fn write(cell: &Cell, output: &mut OutputColumn) {
        match cell {
            Some(bytes) => output.fill(bytes),
            None => output.set_null(),
        }
    }
}

impl StatementHandle for ScriptedStatement<'_> {
    fn field_count(&self) -> usize {
        self.script.field_count
    }

    fn param_count(&self) -> usize {
        self.param_count
    }

    fn bind_params(&mut self, params: &[BindDescriptor]) -> Result<(), ExecutorError> {
        self.step(Step::BindParams).map_err(ExecutorError::Bind)?;
        if params.len() != self.param_count {
            return Err(ExecutorError::Bind(format!(
                "statement has {} placeholders, got {} parameters",
                self.param_count,
                params.len()
            )));
        }
        Ok(())
    }

    fn bind_outputs(&mut self, outputs: &[OutputColumn]) -> Result<(), ExecutorError> {
        self.step(Step::BindOutputs).map_err(ExecutorError::Bind)?;
        if outputs.len() != self.script.field_count {
            return Err(ExecutorError::Bind(format!(
                "result has {} columns, got {} buffers",
                self.script.field_count,
                outputs.len()
            )));
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<(), ExecutorError> {
        self.step(Step::Execute).map_err(ExecutorError::Exec)?;
        self.executed = true;
        Ok(())
    }

    fn fetch_next(&mut self, outputs: &mut [OutputColumn]) -> Result<FetchStatus, ExecutorError> {
        self.step(Step::Fetch).map_err(ExecutorError::Fetch)?;
        if !self.executed {
            return Err(ExecutorError::Fetch("statement not executed".into()));
        }
        if let Some((after, msg)) = &self.script.fail_fetch_after {
            if self.cursor >= *after {
                return Err(ExecutorError::Fetch(msg.clone()));
            }
        }
        let Some(row) = self.script.rows.get(self.cursor) else {
            self.current = None;
            return Ok(FetchStatus::EndOfData);
        };
        self.current = Some(self.cursor);
        self.cursor += 1;
        for (cell, output) in row.iter().zip(outputs.iter_mut()) {
            Self::write(cell, output);
        }
        if outputs.iter().any(OutputColumn::is_truncated) {
            Ok(FetchStatus::Truncated)
        } else {
            Ok(FetchStatus::Row)
        }
    }

    fn fetch_column(&mut self, index: usize, output: &mut OutputColumn) -> Result<(), ExecutorError> {
        self.step(Step::FetchColumn).map_err(ExecutorError::Fetch)?;
        let cell = self
            .current
            .and_then(|row| self.script.rows[row].get(index))
            .ok_or_else(|| ExecutorError::Fetch(format!("no current value for column {index}")))?;
        Self::write(cell, output);
        Ok(())
    }

    fn affected_rows(&self) -> u64 {
        if self.executed {
            self.script.affected_rows
        } else {
            0
        }
    }

    fn close(&mut self) -> Result<(), ExecutorError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.step(Step::CloseStatement).map_err(ExecutorError::Other)
    }
}

/// Hands out clones of a template session, or refuses every connection.
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    template: Result<ScriptedSession, String>,
}

impl ScriptedConnector {
    #[must_use]
    pub fn serving(session: ScriptedSession) -> Self {
        Self {
            template: Ok(session),
        }
    }

    #[must_use]
    pub fn refusing(message: &str) -> Self {
        Self {
            template: Err(message.to_owned()),
        }
    }
}

impl Connector for ScriptedConnector {
    type Session = ScriptedSession;

    fn connect(&self, _options: &ConnectOptions) -> Result<ScriptedSession, ExecutorError> {
        self.template.clone().map_err(ExecutorError::Connect)
    }
}
