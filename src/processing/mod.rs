//! In-memory record transformations.
//!
//! The processing layer operates on [`crate::types::RecordSet`] values produced by ingestion and
//! on normalized batches. Everything here is pure and in-memory.
//!
//! Currently implemented:
//!
//! - [`dedup()`]: exact-duplicate row suppression
//! - [`fill_nulls()`]: sentinel filling for unmapped columns
//! - [`merge()`]: source-ordered concatenation of normalized batches
//!
//! ## Example: dedup → fill
//!
//! ```rust
//! use weather_etl::processing::{dedup, fill_nulls, MISSING_SENTINEL};
//! use weather_etl::types::{RecordSet, Value};
//!
//! let rs = RecordSet::new(
//!     vec!["city".to_string(), "note".to_string()],
//!     vec![
//!         vec![Value::Utf8("X".to_string()), Value::Null],
//!         vec![Value::Utf8("X".to_string()), Value::Null],
//!     ],
//! );
//!
//! let unique = dedup(&rs);
//! assert_eq!(unique.row_count(), 1);
//!
//! let filled = fill_nulls(&unique, &Value::Utf8(MISSING_SENTINEL.to_string()), ["city"]);
//! assert_eq!(filled.rows[0][1], Value::Utf8("N/A".to_string()));
//! ```

pub mod dedup;
pub mod fill;
pub mod merge;

pub use dedup::dedup;
pub use fill::{fill_nulls, MISSING_SENTINEL};
pub use merge::merge;
