//! Result-table browser state.
//!
//! `BrowserController` never talks to the backend itself. Each transition
//! returns the fetch the caller has to issue, and the caller hands the result
//! back together with the ticket it was given. Only the most recently issued
//! table ticket is honoured; older results are dropped.

use tracing::debug;

use crate::domain::{BrowserRow, BrowserTable, TableData};
use crate::gateway::GatewayError;

/// Identifies one table fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTicket {
    pub generation: u64,
    pub table: String,
}

/// A fetch the caller must perform on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserFetch {
    Tables,
    Table(TableTicket),
}

#[derive(Debug, Clone, Default)]
pub struct BrowserController {
    tables: Vec<BrowserTable>,
    selected_table: Option<String>,
    data: TableData,
    loading: bool,
    error: Option<String>,
    tables_loaded: bool,
    tables_pending: bool,
    generation: u64,
}

impl BrowserController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tables(&self) -> &[BrowserTable] {
        &self.tables
    }

    pub fn selected_table(&self) -> Option<&str> {
        self.selected_table.as_deref()
    }

    /// Position of the selected table in the list.
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected_table.as_deref()?;
        self.tables.iter().position(|t| t.table_name == selected)
    }

    pub fn rows(&self) -> &[BrowserRow] {
        &self.data.rows
    }

    pub fn columns(&self) -> &[String] {
        &self.data.columns
    }

    pub fn row_count(&self) -> usize {
        self.data.row_count
    }

    pub fn column_count(&self) -> usize {
        self.data.column_count
    }

    pub fn display_name(&self) -> &str {
        &self.data.display_name
    }

    /// The currently shown table, rows and metadata together.
    pub fn data(&self) -> &TableData {
        &self.data
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn tables_loaded(&self) -> bool {
        self.tables_loaded
    }

    /// First visit: ask for the table list once.
    pub fn mount(&mut self) -> Option<BrowserFetch> {
        if self.tables_loaded || self.tables_pending {
            return None;
        }
        self.tables_pending = true;
        Some(BrowserFetch::Tables)
    }

    /// Explicitly reload the table list, e.g. after a failed mount.
    ///
    /// Returns `None` while a list request is already outstanding.
    pub fn refresh_tables(&mut self) -> Option<BrowserFetch> {
        self.tables_loaded = false;
        self.mount()
    }

    /// Apply the table list. On success the selection moves to the first
    /// table (or stays on the current one if it is still listed) and the
    /// ticket for its data is returned.
    pub fn apply_tables(&mut self, result: Result<Vec<BrowserTable>, GatewayError>) -> Option<TableTicket> {
        self.tables_pending = false;
        self.tables_loaded = true;

        match result {
            Ok(tables) => {
                self.tables = tables;
                self.error = None;
                let keep = self
                    .selected_table
                    .as_deref()
                    .filter(|name| self.tables.iter().any(|t| t.table_name == *name))
                    .map(str::to_string);
                match keep.or_else(|| self.tables.first().map(|t| t.table_name.clone())) {
                    Some(name) => self.select(&name),
                    None => {
                        self.retire();
                        self.selected_table = None;
                        self.data = TableData::default();
                        None
                    }
                }
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }

    /// Select a table and ask for its rows. An empty name is ignored.
    pub fn select(&mut self, table: &str) -> Option<TableTicket> {
        if table.is_empty() {
            return None;
        }
        self.selected_table = Some(table.to_string());
        Some(self.issue(table.to_string()))
    }

    /// Move the selection by `delta` positions, clamped to the list.
    pub fn select_offset(&mut self, delta: isize) -> Option<TableTicket> {
        if self.tables.is_empty() {
            return None;
        }
        let current = self.selected_index().unwrap_or(0) as isize;
        let last = self.tables.len() as isize - 1;
        let next = (current + delta).clamp(0, last) as usize;
        if Some(next) == self.selected_index() {
            return None;
        }
        let name = self.tables[next].table_name.clone();
        self.select(&name)
    }

    /// Fetch the selected table again.
    pub fn refresh(&mut self) -> Option<TableTicket> {
        let table = self.selected_table.clone()?;
        Some(self.issue(table))
    }

    /// Apply a table fetch. Returns `false` when the ticket was superseded
    /// and the result discarded.
    pub fn apply_table(&mut self, ticket: &TableTicket, result: Result<TableData, GatewayError>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                table = %ticket.table,
                generation = ticket.generation,
                latest = self.generation,
                "discarding stale table response"
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(data) => {
                self.data = data;
                self.error = None;
            }
            Err(e) => {
                self.data = TableData::default();
                self.error = Some(e.to_string());
            }
        }
        true
    }

    fn issue(&mut self, table: String) -> TableTicket {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        TableTicket {
            generation: self.generation,
            table,
        }
    }

    /// Invalidate any outstanding table ticket.
    fn retire(&mut self) {
        self.generation += 1;
        self.loading = false;
    }
}
