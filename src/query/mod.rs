//! Query adapter: subject + query kind in, typed `PollResult` out.

mod adapter;
pub mod flux;

pub use adapter::{
    merge_latest, round_one_decimal, shape_history, shape_images, QueryAdapter, DEFAULT_VIEW,
};
