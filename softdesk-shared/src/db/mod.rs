/// Database layer for SoftDesk
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: embedded schema migrations
///
/// Entity models and their queries live in the crate-level `models` module.

pub mod migrations;
pub mod pool;
