//! Command invoker with single-step undo history.

use tabula_core::Result;

use crate::command::{Command, CommandKind, Executed, Outcome};

struct HistoryEntry<'c> {
    command: Box<dyn Command + 'c>,
    executed: Executed,
}

/// Runs commands and keeps a LIFO history of what ran.
///
/// History only grows through [`CommandInvoker::execute_command`] and only
/// shrinks through [`CommandInvoker::undo_last`]. An undone command is
/// discarded; there is no redo.
#[derive(Default)]
pub struct CommandInvoker<'c> {
    history: Vec<HistoryEntry<'c>>,
}

impl<'c> CommandInvoker<'c> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute `command`, record it, and return its outcome unchanged.
    ///
    /// A command whose execution fails is not recorded.
    pub fn execute_command<C>(&mut self, command: C) -> Result<Outcome>
    where
        C: Command + 'c,
    {
        let (outcome, executed) = command.execute()?;
        self.history.push(HistoryEntry {
            command: Box::new(command),
            executed,
        });
        Ok(outcome)
    }

    /// Undo the most recently executed command.
    ///
    /// Returns `Ok(false)` when the history is empty. The entry is removed
    /// before its undo runs, so a failing undo is not retried by the next
    /// call.
    pub fn undo_last(&mut self) -> Result<bool> {
        let Some(entry) = self.history.pop() else {
            return Ok(false);
        };
        let kind = entry.command.kind();
        tracing::debug!(%kind, table = %entry.command.payload().table, "undo");
        entry.command.undo(entry.executed)?;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Kind of the command [`CommandInvoker::undo_last`] would undo next.
    pub fn last_kind(&self) -> Option<CommandKind> {
        self.history.last().map(|e| e.command.kind())
    }
}

impl std::fmt::Debug for CommandInvoker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<CommandKind> = self.history.iter().map(|e| e.command.kind()).collect();
        f.debug_struct("CommandInvoker")
            .field("history", &kinds)
            .finish()
    }
}
