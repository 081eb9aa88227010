mod pool;

pub use pool::{create_pool, redacted_url, run_migrations, Database, DatabaseError, DEFAULT_MIGRATIONS_PATH};
