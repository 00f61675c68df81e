// File: ./src/model/mod.rs
pub mod extract;
pub mod meeting;
pub mod normalize;
pub mod record;

pub use extract::{Extracted, StartSource, extract};
pub use meeting::Meeting;
pub use normalize::normalize;
pub use record::{RawRecord, RecordFields};
