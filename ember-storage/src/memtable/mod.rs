pub mod table;
pub mod types;

pub use table::{FlushSink, MemTable};
pub use types::{MemTableConfig, MemTableStats};
