pub mod in_memory;
pub mod rate_table;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
