//! Connection: session ownership, query execution, escape services.

use log::debug;

use crate::driver::{ConnectParams, Driver, Session};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::result::{ResultSet, StoredResult, UsedResult};
use crate::statement::Statement;

/// Anything that can resolve to a query string for a given connection:
/// plain text passes through, a [`Statement`] builds its template against
/// the connection's escaping rules.
pub trait QueryText {
    fn resolve(&self, connection: &Connection) -> Result<String>;
}

impl QueryText for str {
    fn resolve(&self, _connection: &Connection) -> Result<String> {
        Ok(self.to_owned())
    }
}

impl QueryText for String {
    fn resolve(&self, _connection: &Connection) -> Result<String> {
        Ok(self.clone())
    }
}

impl QueryText for Statement {
    fn resolve(&self, connection: &Connection) -> Result<String> {
        self.query(connection)
    }
}

/// A database connection.
///
/// Owns the driver session for its lifetime and at most one outstanding
/// result set; executing a new query releases the previous result first.
/// Single-threaded, synchronous, blocking.
#[derive(Debug)]
pub struct Connection {
    session: Handle<Box<dyn Session>>,
    result: Option<ResultSet>,
    field_count: u32,
}

impl Connection {
    /// Open a connection through the given driver.
    pub fn connect<D: Driver + ?Sized>(driver: &D, params: &ConnectParams) -> Result<Self> {
        debug!(
            "connecting to {}:{}/{}",
            params.host, params.port, params.database
        );
        let session = driver.connect(params).map_err(|e| Error::Connect {
            code: e.code,
            message: e.message,
        })?;
        Ok(Self::from_session(session))
    }

    /// Wrap an already-opened driver session.
    pub fn from_session(session: Box<dyn Session>) -> Self {
        Self {
            session: Handle::new(session),
            result: None,
            field_count: 0,
        }
    }

    /// Execute a query, storing its result set (if any) on the connection.
    pub fn execute<Q: QueryText + ?Sized>(&mut self, query: &Q) -> Result<()> {
        self.execute_stored(query).map(|_| ())
    }

    /// Execute a query and return the last auto-generated row identifier.
    pub fn execute_id<Q: QueryText + ?Sized>(&mut self, query: &Q) -> Result<u64> {
        let text = query.resolve(self)?;
        self.run(&text)?;
        let session = self.session.get().ok_or(Error::ConnectionClosed)?;
        Ok(session.last_insert_id())
    }

    /// Execute a query and return the number of affected rows.
    pub fn execute_rows<Q: QueryText + ?Sized>(&mut self, query: &Q) -> Result<u64> {
        let text = query.resolve(self)?;
        self.run(&text)?;
        let session = self.session.get().ok_or(Error::ConnectionClosed)?;
        Ok(session.affected_rows())
    }

    /// Execute a query, materializing its full result set driver-side.
    ///
    /// Returns `None` when the query produced no result (field count 0).
    pub fn execute_stored<Q: QueryText + ?Sized>(
        &mut self,
        query: &Q,
    ) -> Result<Option<&mut StoredResult>> {
        let text = query.resolve(self)?;
        self.run(&text)?;
        if self.field_count == 0 {
            return Ok(None);
        }
        let handle = {
            let session = self.session.get_mut().ok_or(Error::ConnectionClosed)?;
            session.store_result().map_err(|e| Error::StoreResult {
                code: e.code,
                message: e.message,
                query: text,
            })?
        };
        self.result = Some(ResultSet::Stored(StoredResult::new(handle)));
        Ok(self.result.as_mut().and_then(ResultSet::as_stored))
    }

    /// Execute a query, streaming its result set row by row.
    ///
    /// Returns `None` when the query produced no result. The connection
    /// cannot issue another query until the streaming result is drained or
    /// released; releasing it drains automatically.
    pub fn execute_used<Q: QueryText + ?Sized>(
        &mut self,
        query: &Q,
    ) -> Result<Option<&mut UsedResult>> {
        let text = query.resolve(self)?;
        self.run(&text)?;
        if self.field_count == 0 {
            return Ok(None);
        }
        let handle = {
            let session = self.session.get_mut().ok_or(Error::ConnectionClosed)?;
            session.use_result().map_err(|e| Error::StoreResult {
                code: e.code,
                message: e.message,
                query: text,
            })?
        };
        self.result = Some(ResultSet::Used(UsedResult::new(handle)));
        Ok(self.result.as_mut().and_then(ResultSet::as_used))
    }

    /// The currently owned result, if any.
    pub fn result(&mut self) -> Option<&mut ResultSet> {
        self.result.as_mut()
    }

    /// Column count of the last query, independent of whether a result
    /// object was materialized.
    pub fn field_count(&self) -> u32 {
        self.field_count
    }

    /// Driver-escaped form of an arbitrary byte string, suitable for safe
    /// inclusion inside a single-quoted SQL literal. Binary-safe.
    pub fn escape(&self, value: impl AsRef<[u8]>) -> Result<Vec<u8>> {
        let session = self.session.get().ok_or(Error::ConnectionClosed)?;
        Ok(session.escape(value.as_ref()))
    }

    /// [`Self::escape`] for text. Escaping inserts only ASCII sequences, so
    /// valid UTF-8 input yields valid UTF-8 output; a driver that breaks
    /// that expectation is reported as a conversion failure, not mangled.
    pub fn escape_str(&self, value: &str) -> Result<String> {
        let escaped = self.escape(value.as_bytes())?;
        String::from_utf8(escaped).map_err(|e| Error::conversion("String", e.to_string()))
    }

    /// Close the session. Idempotent; also performed on drop.
    pub fn close(&mut self) {
        // release (and drain) any outstanding result before the session goes
        self.result = None;
        if let Some(mut session) = self.session.take() {
            debug!("closing connection");
            session.close();
        }
    }

    // Releases the previous result, sends the query, records the field count.
    fn run(&mut self, query: &str) -> Result<()> {
        self.result = None;
        let session = self.session.get_mut().ok_or(Error::ConnectionClosed)?;
        debug!("executing query: {query}");
        session.execute(query).map_err(|e| Error::Execute {
            code: e.code,
            message: e.message,
            query: query.to_owned(),
        })?;
        self.field_count = session.field_count();
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverError, ResultHandle};

    // A session whose escaping emits bytes that are not valid UTF-8.
    struct ManglingSession;

    impl Session for ManglingSession {
        fn execute(&mut self, _query: &str) -> std::result::Result<(), DriverError> {
            Ok(())
        }

        fn field_count(&self) -> u32 {
            0
        }

        fn store_result(&mut self) -> std::result::Result<Box<dyn ResultHandle>, DriverError> {
            Err(DriverError::new(0, "no result"))
        }

        fn use_result(&mut self) -> std::result::Result<Box<dyn ResultHandle>, DriverError> {
            Err(DriverError::new(0, "no result"))
        }

        fn escape(&self, _value: &[u8]) -> Vec<u8> {
            vec![0xff, 0xfe]
        }

        fn last_insert_id(&self) -> u64 {
            0
        }

        fn affected_rows(&self) -> u64 {
            0
        }

        fn close(&mut self) {}
    }

    #[test]
    fn test_escape_str_rejects_invalid_utf8_from_driver() {
        let conn = Connection::from_session(Box::new(ManglingSession));
        assert_eq!(conn.escape(b"x".as_slice()).unwrap(), vec![0xff, 0xfe]);
        let err = conn.escape_str("x").unwrap_err();
        assert!(matches!(err, Error::Conversion { target: "String", .. }));
    }
}
