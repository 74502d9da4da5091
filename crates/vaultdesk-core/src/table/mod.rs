// ── List-view state ──

mod filter;
mod setting;

pub use filter::{DEFAULT_PAGE_SIZE, SortOrder, TableFilter};
pub use setting::{Column, PAGE_SIZE_OPTIONS, TableSetting};
