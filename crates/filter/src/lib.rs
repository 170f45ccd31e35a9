//! # Maildex Filter
//!
//! Pure text transforms for the mail ingest pipeline.
//!
//! ```text
//! Raw mail text
//!     │
//!     ├──> NoisePolicy::clean (strip header/envelope lines, drop blanks)
//!     │      └─> Cleaned body
//!     │
//!     └──> tokenize ──> count
//!            └─> FrequencyMap (word -> occurrences)
//! ```
//!
//! Everything in this crate is a total function over strings: no I/O,
//! no failure modes. Callers decode file bytes (lossily, if needed)
//! before handing text in.

mod noise;
mod words;

pub use noise::NoisePolicy;
pub use words::{count, tokenize, FrequencyMap};
