pub mod log;
pub mod outcome;
pub mod request;
pub mod scan_result;
