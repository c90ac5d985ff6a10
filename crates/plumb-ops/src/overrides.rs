//! Prelude-name import surface
//!
//! Re-exports the whole catalog with the underscore-suffixed entries
//! renamed to their plain forms. Opt in with a glob when shadowing
//! `Iterator`-flavored vocabulary locally is acceptable:
//!
//! ```ignore
//! use plumb_ops::overrides::*;
//!
//! let evens = (P >> nums | filter(is_even()) | map(It * 10)).get()?;
//! ```

pub use crate::iterables::{
    all_ as all, any_ as any, filter_ as filter, map_ as map, slice_ as slice,
};

pub use crate::iterables::{
    distinct, drop, drop_while, find, first, flatten, fold, group_by, join_to_str, last,
    slice_step, sorted_by, sum, take, take_while, windowed,
};
pub use crate::mappings::{
    item_view, key_view, sorted_by_key, sorted_by_value, sorted_dict, value_view,
};
pub use crate::values::{
    and_, clamp, is_congruent, is_even, is_none, is_not_none, is_odd, lclamp, not_, or_, raise_,
    rclamp,
};
