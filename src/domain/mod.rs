pub mod page;
pub mod types;

pub use page::{FetchError, Page};
pub use types::{Hit, HitKind, Rating, ScanResult, Severity};
