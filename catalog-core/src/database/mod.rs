pub mod memory;
pub mod ports;
pub mod postgres;

pub use memory::InMemoryMediaFileLinkRepository;
pub use ports::MediaFileLinkRepository;
pub use postgres::{PoolStats, PostgresDatabase, PostgresMediaFileLinkRepository};
