pub mod progress_line;
