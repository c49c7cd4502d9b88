/*!
# GeoDrop Database

SQLite-backed [`geodrop_claims::DropStore`].

Each drop is one row in the `drops` table. The claim is a single conditional
`UPDATE ... WHERE claim_state = 'unclaimed'` inside an immediate transaction,
so any number of [`DropDatabase`] handles, in one process or several, can race
on the same file and at most one of them wins.
*/

pub mod database;
pub mod errors;
pub mod schema;

// Re-export main types for convenience
pub use database::DropDatabase;
pub use errors::{DbError, DbResult};
