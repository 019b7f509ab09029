//! RAII transaction guard.

use log::warn;

use crate::connection::Connection;
use crate::error::Result;

/// A transaction scope on a connection.
///
/// Issues `BEGIN` on creation; an open guard rolls back when dropped, so
/// a transaction left behind by an early return or a propagating error is
/// never silently committed.
pub struct Transaction<'a> {
    connection: &'a mut Connection,
    open: bool,
}

impl<'a> Transaction<'a> {
    /// Start a transaction.
    pub fn begin(connection: &'a mut Connection) -> Result<Self> {
        connection.execute("BEGIN")?;
        Ok(Self {
            connection,
            open: true,
        })
    }

    /// The connection this transaction runs on.
    pub fn connection(&mut self) -> &mut Connection {
        self.connection
    }

    /// Commit and consume the guard.
    pub fn commit(mut self) -> Result<()> {
        self.open = false;
        self.connection.execute("COMMIT")
    }

    /// Roll back and consume the guard.
    pub fn rollback(mut self) -> Result<()> {
        self.open = false;
        self.connection.execute("ROLLBACK")
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(e) = self.connection.execute("ROLLBACK") {
                warn!("rollback on drop failed: {e}");
            }
        }
    }
}
