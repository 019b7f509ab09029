//! Scriptable in-memory driver for integration tests.
//!
//! Each query string is mapped to a scripted outcome (result rows, write
//! counters, or a driver error); shared state records what the client layer
//! asked the driver to do, so tests can assert on executed queries, escape
//! calls, and the number of rows actually pulled.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use mariadb_client_rs::driver::{
    ConnectParams, Driver, DriverError, ResultHandle, RowHandle, RowOffset, Session,
};
use mariadb_client_rs::Column;

pub fn init_logger() {
    let _ = flexi_logger::Logger::try_with_env_or_str("info").and_then(|l| l.start());
}

/// A NULL field value.
pub fn null() -> Option<Vec<u8>> {
    None
}

/// A text field value.
pub fn b(text: &str) -> Option<Vec<u8>> {
    Some(text.as_bytes().to_vec())
}

/// Column descriptors with the given names.
pub fn cols(names: &[&str]) -> Vec<Column> {
    names.iter().map(|n| Column::named(*n)).collect()
}

/// Scripted outcome for one query string.
#[derive(Clone, Default)]
pub struct Script {
    pub error: Option<DriverError>,
    pub store_error: Option<DriverError>,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Option<Vec<u8>>>>,
    pub last_insert_id: u64,
    pub affected_rows: u64,
}

impl Script {
    /// A query producing the given columns and rows.
    pub fn result(columns: Vec<Column>, rows: Vec<Vec<Option<Vec<u8>>>>) -> Self {
        Self {
            columns,
            rows,
            ..Self::default()
        }
    }

    /// A write statement producing no result set.
    pub fn write(last_insert_id: u64, affected_rows: u64) -> Self {
        Self {
            last_insert_id,
            affected_rows,
            ..Self::default()
        }
    }

    /// A query the driver rejects.
    pub fn failure(code: u32, message: &str) -> Self {
        Self {
            error: Some(DriverError::new(code, message)),
            ..Self::default()
        }
    }

    /// A query whose result set fetch fails after a successful execute.
    pub fn store_failure(columns: Vec<Column>, code: u32, message: &str) -> Self {
        Self {
            columns,
            store_error: Some(DriverError::new(code, message)),
            ..Self::default()
        }
    }
}

/// Observable driver-side state shared between the test and the session.
#[derive(Default)]
pub struct MockState {
    pub executed: Vec<String>,
    pub escape_calls: usize,
    pub rows_fetched: u64,
    pub closed: bool,
}

pub struct MockDriver {
    scripts: HashMap<String, Script>,
    connect_error: Option<DriverError>,
    state: Rc<RefCell<MockState>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            connect_error: None,
            state: Rc::default(),
        }
    }

    pub fn failing_connect(code: u32, message: &str) -> Self {
        Self {
            connect_error: Some(DriverError::new(code, message)),
            ..Self::new()
        }
    }

    /// Script the outcome of one query string.
    pub fn on(mut self, query: &str, script: Script) -> Self {
        self.scripts.insert(query.to_owned(), script);
        self
    }

    /// Handle on the shared observable state.
    pub fn state(&self) -> Rc<RefCell<MockState>> {
        Rc::clone(&self.state)
    }

    /// A session sharing this driver's scripts and state.
    pub fn session(&self) -> Box<dyn Session> {
        Box::new(MockSession {
            scripts: self.scripts.clone(),
            state: Rc::clone(&self.state),
            pending: None,
            field_count: 0,
            last_insert_id: 0,
            affected_rows: 0,
        })
    }
}

impl Driver for MockDriver {
    fn connect(&self, _params: &ConnectParams) -> Result<Box<dyn Session>, DriverError> {
        match &self.connect_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.session()),
        }
    }
}

struct MockSession {
    scripts: HashMap<String, Script>,
    state: Rc<RefCell<MockState>>,
    pending: Option<Script>,
    field_count: u32,
    last_insert_id: u64,
    affected_rows: u64,
}

impl Session for MockSession {
    fn execute(&mut self, query: &str) -> Result<(), DriverError> {
        self.state.borrow_mut().executed.push(query.to_owned());
        // unscripted queries succeed without a result set
        let script = self.scripts.get(query).cloned().unwrap_or_default();
        if let Some(error) = script.error {
            self.pending = None;
            self.field_count = 0;
            return Err(error);
        }
        self.field_count = script.columns.len() as u32;
        self.last_insert_id = script.last_insert_id;
        self.affected_rows = script.affected_rows;
        self.pending = Some(script);
        Ok(())
    }

    fn field_count(&self) -> u32 {
        self.field_count
    }

    fn store_result(&mut self) -> Result<Box<dyn ResultHandle>, DriverError> {
        self.materialize()
    }

    fn use_result(&mut self) -> Result<Box<dyn ResultHandle>, DriverError> {
        self.materialize()
    }

    fn escape(&self, value: &[u8]) -> Vec<u8> {
        self.state.borrow_mut().escape_calls += 1;
        let mut out = Vec::with_capacity(value.len());
        for &byte in value {
            match byte {
                b'\'' => out.extend_from_slice(b"\\'"),
                b'\\' => out.extend_from_slice(b"\\\\"),
                0 => out.extend_from_slice(b"\\0"),
                b'\n' => out.extend_from_slice(b"\\n"),
                b'\r' => out.extend_from_slice(b"\\r"),
                _ => out.push(byte),
            }
        }
        out
    }

    fn last_insert_id(&self) -> u64 {
        self.last_insert_id
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn close(&mut self) {
        self.state.borrow_mut().closed = true;
    }
}

impl MockSession {
    fn materialize(&mut self) -> Result<Box<dyn ResultHandle>, DriverError> {
        let script = self
            .pending
            .take()
            .ok_or_else(|| DriverError::new(2014, "commands out of sync"))?;
        if let Some(error) = script.store_error {
            return Err(error);
        }
        Ok(Box::new(MockResultHandle {
            columns: script.columns,
            rows: script.rows,
            pos: 0,
            state: Rc::clone(&self.state),
        }))
    }
}

struct MockResultHandle {
    columns: Vec<Column>,
    rows: Vec<Vec<Option<Vec<u8>>>>,
    pos: usize,
    state: Rc<RefCell<MockState>>,
}

impl ResultHandle for MockResultHandle {
    fn fetch_row(&mut self) -> Option<Box<dyn RowHandle>> {
        let fields = self.rows.get(self.pos)?.clone();
        self.pos += 1;
        self.state.borrow_mut().rows_fetched += 1;
        Some(Box::new(MockRowHandle { fields }))
    }

    fn columns(&self) -> Vec<Column> {
        self.columns.clone()
    }

    fn field_count(&self) -> u32 {
        self.columns.len() as u32
    }

    fn row_count(&self) -> u64 {
        self.rows.len() as u64
    }

    fn seek(&mut self, index: u64) {
        self.pos = index as usize;
    }

    fn tell(&self) -> RowOffset {
        RowOffset::new(self.pos as u64)
    }

    fn seek_offset(&mut self, offset: RowOffset) {
        self.pos = offset.raw() as usize;
    }
}

struct MockRowHandle {
    fields: Vec<Option<Vec<u8>>>,
}

impl RowHandle for MockRowHandle {
    fn field(&self, index: usize) -> Option<&[u8]> {
        self.fields.get(index).and_then(|f| f.as_deref())
    }

    fn lengths(&self) -> Option<Vec<usize>> {
        Some(
            self.fields
                .iter()
                .map(|f| f.as_ref().map_or(0, Vec::len))
                .collect(),
        )
    }
}
