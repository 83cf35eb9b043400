// SQLite transport - runs the typed executor against rusqlite
//
// - config: connector and open options
// - connection: the session wrapping a rusqlite connection
// - prepared: the statement handle (bind, execute, fetch)
// - params: bind descriptors to SQLite values
// - query: SQLite values into output buffers

pub mod config;
pub mod connection;
pub mod params;
pub mod prepared;
pub mod query;

pub use config::{SqliteConnector, SqliteOptions};
pub use connection::SqliteSession;
pub use prepared::SqlitePreparedStatement;
