pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod operations;

pub use config::StoreConfig;
pub use error::{ModelError, StoreError};
pub use models::label::{Label, LabelId, LabelRegistry};
pub use models::symbol::{Currency, Symbol};
pub use models::transaction::{RecordKey, RecordLine, TransactionRecord, TransactionType};
