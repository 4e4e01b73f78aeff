// Job persistence: the flat row model the backend keeps, and a JSON-file
// implementation of the `JobStore` gateway for local use.

pub mod file;
pub mod record;

pub use file::JsonFileJobStore;
pub use record::{JobRecord, StatusNote};
