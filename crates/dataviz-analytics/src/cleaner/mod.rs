//! Stateless cleaning operations.
//!
//! Every operation borrows the input dataset and returns a new one; the
//! caller's frame is never modified.

mod duplicates;
mod imputation;
mod outliers;

pub use duplicates::{duplicate_count, remove_duplicates};
pub use imputation::{FillMethod, fill_missing, fill_missing_with};
pub use outliers::{
    OutlierBounds, count_outliers, inlier_mask, remove_outliers, remove_outliers_with,
};
