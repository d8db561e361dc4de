//! Database schema, table descriptors and entity models

pub mod init;
pub mod models;
pub mod table;

pub use init::*;
pub use models::*;
pub use table::*;
