mod errors;
mod record;

pub use errors::{FetchError, ParseItemError, SinkError};
pub use record::{RawPayload, TransactionRecord, UNKNOWN};
