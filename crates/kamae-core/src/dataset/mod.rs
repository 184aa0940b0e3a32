pub mod filter;
pub mod reshape;
pub mod split;
pub mod wide;

pub use filter::{
    DEFAULT_MAX_LENGTH, DropReason, DropStats, LengthFilter, TokenCounter, Verdict, check_stance,
};
pub use reshape::{Reshaped, reshape};
pub use split::{DEFAULT_SEED, DEFAULT_TEST_SIZE, Split, label_counts, shuffle, stratified_split};
pub use wide::{TEXT_COLUMN, WideRow, WideTable};
