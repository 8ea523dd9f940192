//! Infrastructure: SQLite connection, migrations, media files.

pub mod db;
pub mod media;

pub(crate) use db::get_connection;
pub use db::{init_db, init_test_db, DbPool};
pub use media::MediaStore;
