//! Client-side access layer for MariaDB-style databases.
//!
//! Connection management, query execution, result-set iteration, and a
//! lightweight named-parameter templating mechanism (`?name?` escaped,
//! `?name!` verbatim), layered over a synchronous driver supplied by the
//! caller through the traits in [`driver`].
//!
//! # Example
//!
//! ```no_run
//! use mariadb_client_rs::{ConnectParams, Connection, Driver, Result, Statement};
//!
//! fn list_users(driver: &dyn Driver) -> Result<()> {
//!     let params = ConnectParams::new("localhost", 3306, "appdb")
//!         .with_credentials("appuser", "secret");
//!     let mut conn = Connection::connect(driver, &params)?;
//!
//!     let mut stmt = Statement::new("SELECT id, name FROM users WHERE role = ?role?")?;
//!     stmt.set("role", "admin")?;
//!
//!     if let Some(result) = conn.execute_stored(&stmt)? {
//!         while let Some(row) = result.next() {
//!             let id: u64 = row.at_name("id")?.get()?;
//!             let name: String = row.at_name("name")?.get()?;
//!             println!("{id}: {name}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod column;
pub mod connection;
pub mod driver;
pub mod error;
pub mod field;
pub mod handle;
pub mod result;
pub mod row;
pub mod statement;
pub mod transaction;

pub use column::Column;
pub use connection::{Connection, QueryText};
pub use driver::{
    ClientFlags, ConnectParams, Driver, DriverError, ResultHandle, RowHandle, RowOffset, Session,
};
pub use error::{Error, ErrorCode, Result};
pub use field::{Field, FromField};
pub use handle::Handle;
pub use result::{ResultSet, StoredResult, UsedResult};
pub use row::{Fields, Row};
pub use statement::{ParameterKey, Statement};
pub use transaction::Transaction;
