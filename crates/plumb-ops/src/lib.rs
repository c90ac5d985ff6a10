//! Ready-made pipeline steps for plumb
//!
//! A catalog of curried transformations over lists, maps, and single
//! values. Every entry follows the same convention: configuration
//! parameters first, the data parameter last, so a configured entry is a
//! one-argument callable that drops straight into a pipe.
//!
//! ```ignore
//! use plumb::{It, P};
//! use plumb_ops::iterables::{filter_, map_, sum};
//! use plumb_ops::values::is_odd;
//!
//! let total = (P >> vec![1, 2, 3, 4]
//!     | filter_(is_odd())
//!     | map_(It * It)
//!     | sum())
//! .get()?;
//! ```
//!
//! Entries whose natural name collides with common vocabulary carry a
//! trailing underscore (`map_`, `filter_`, `all_`, `any_`, `slice_`);
//! the [`overrides`] module re-exports them under the plain names for
//! callers who prefer a glob import.

pub mod iterables;
pub mod mappings;
pub mod overrides;
pub mod values;

pub use iterables::{
    all_, any_, distinct, drop, drop_while, filter_, find, first, flatten, fold, group_by,
    join_to_str, last, map_, slice_, slice_step, sorted_by, sum, take, take_while, windowed,
};
pub use mappings::{item_view, key_view, sorted_by_key, sorted_by_value, sorted_dict, value_view};
pub use values::{
    and_, clamp, is_congruent, is_even, is_none, is_not_none, is_odd, lclamp, not_, or_, raise_,
    rclamp,
};
