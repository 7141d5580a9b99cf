mod inbox;
mod types;

pub use inbox::{load_inbox, pending_task_count, process_unprocessed, save_inbox};
