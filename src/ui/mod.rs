pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, key, section, status, success, summary_row, warn};
pub use progress::{PageBar, Spinner};
pub use table::{catalog_table, query_table, stats_table, TableBuilder};
pub use theme::{theme, Theme};
