pub mod cancel;
pub mod directories;
pub mod events;
pub mod files;
pub mod operation;
pub mod path;
pub mod progress;
pub mod scanner;
