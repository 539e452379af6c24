//! Replacing a Postgres database reached directly with `dropdb`/`createdb`/`pg_restore`.

pub(crate) mod db_restore;
