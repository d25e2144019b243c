pub mod icons;
pub mod output;
pub mod progress;
pub mod progress_message;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, section, success, summary_row, timing, warn};
pub use progress::ProgressManager;
pub use progress_message::ProgressMessage;
pub use table::{TableBuilder, stats_table};
pub use theme::{theme, Theme};
