//! Row locking.
//!
//! `SELECT ... FOR UPDATE` serializes writers on Postgres. SQLite has no row
//! locks; there a write transaction already holds the whole database.

use sea_orm::{ConnectionTrait, DbBackend, EntityTrait, QuerySelect, Select};

/// Adds `FOR UPDATE` to `select` where the backend supports it.
pub(crate) fn for_update<E, C>(select: Select<E>, conn: &C) -> Select<E>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    match conn.get_database_backend() {
        DbBackend::Sqlite => select,
        _ => select.lock_exclusive(),
    }
}
