//! The driver seam: traits for the lower-level synchronous database driver.
//!
//! The client layer depends on exactly these primitives and nothing else.
//! A driver implementation supplies socket I/O, the wire protocol, and
//! authentication; this crate ships none of its own. All calls block the
//! calling thread until the driver returns.

use std::ops::{BitOr, BitOrAssign};

use crate::column::Column;

/// Error reported by the driver: a numeric code plus a textual message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("driver error {code}: {message}")]
pub struct DriverError {
    pub code: u32,
    pub message: String,
}

impl DriverError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Entry point into a driver: opens sessions.
pub trait Driver {
    /// Open a session for the given parameters.
    fn connect(&self, params: &ConnectParams) -> Result<Box<dyn Session>, DriverError>;
}

/// One driver session.
///
/// The contract mirrors the classic C client API: `execute` sends a query,
/// `field_count` reports the column count of the last query, and
/// `store_result` / `use_result` materialize its result set. `store_result`
/// and `use_result` are invoked only when `field_count()` is non-zero.
pub trait Session {
    /// Send one query string.
    fn execute(&mut self, query: &str) -> Result<(), DriverError>;

    /// Column count of the last executed query (0 for statements that
    /// produce no result set).
    fn field_count(&self) -> u32;

    /// Fetch the full result set of the last query into driver-side memory.
    fn store_result(&mut self) -> Result<Box<dyn ResultHandle>, DriverError>;

    /// Initiate an on-demand, row-by-row fetch of the last query's result.
    /// The session cannot issue a new query until the returned handle is
    /// exhausted or released.
    fn use_result(&mut self) -> Result<Box<dyn ResultHandle>, DriverError>;

    /// Escape an arbitrary byte string for inclusion inside a single-quoted
    /// SQL literal. Must handle embedded NUL bytes and binary data up to the
    /// input length, not just NUL-terminated text.
    fn escape(&self, value: &[u8]) -> Vec<u8>;

    /// Last auto-generated row identifier.
    fn last_insert_id(&self) -> u64;

    /// Number of rows affected by the last write statement.
    fn affected_rows(&self) -> u64;

    /// Close the session. Called at most once.
    fn close(&mut self);
}

/// One result set held by the driver.
pub trait ResultHandle {
    /// Pull the next raw row; `None` when the result is exhausted.
    fn fetch_row(&mut self) -> Option<Box<dyn RowHandle>>;

    /// Column descriptors of this result.
    fn columns(&self) -> Vec<Column>;

    /// Column count of this result.
    fn field_count(&self) -> u32;

    /// Total buffered row count. Meaningful for stored results only.
    fn row_count(&self) -> u64;

    /// Reposition the cursor to the 0-based row index. Stored results only.
    fn seek(&mut self, index: u64);

    /// Current cursor position as an opaque token. Stored results only.
    fn tell(&self) -> RowOffset;

    /// Restore a cursor position previously obtained from [`Self::tell`].
    fn seek_offset(&mut self, offset: RowOffset);
}

/// One raw row within a result set.
pub trait RowHandle {
    /// Raw bytes of the field at `index`; `None` for SQL NULL.
    fn field(&self, index: usize) -> Option<&[u8]>;

    /// Per-field byte lengths, or `None` if the driver cannot supply them.
    fn lengths(&self) -> Option<Vec<usize>>;
}

/// Opaque row position token for stored results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowOffset(u64);

impl RowOffset {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Client capability flags passed to the driver at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientFlags(u32);

impl ClientFlags {
    pub const FOUND_ROWS: ClientFlags = ClientFlags(0x0000_0002);
    pub const COMPRESS: ClientFlags = ClientFlags(0x0000_0020);
    pub const SSL: ClientFlags = ClientFlags(0x0000_0800);
    pub const MULTI_STATEMENTS: ClientFlags = ClientFlags(0x0001_0000);

    /// No flags set.
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: ClientFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ClientFlags {
    type Output = ClientFlags;

    fn bitor(self, rhs: ClientFlags) -> ClientFlags {
        ClientFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for ClientFlags {
    fn bitor_assign(&mut self, rhs: ClientFlags) {
        self.0 |= rhs.0;
    }
}

/// Connection parameters handed to [`Driver::connect`].
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub flags: ClientFlags,
}

impl ConnectParams {
    /// Create parameters for the given host, port and database; credentials
    /// default to empty and flags to none.
    pub fn new(host: impl Into<String>, port: u16, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            user: String::new(),
            password: String::new(),
            database: database.into(),
            flags: ClientFlags::empty(),
        }
    }

    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_flags(mut self, flags: ClientFlags) -> Self {
        self.flags = flags;
        self
    }
}
