//! Terminal display and formatting utilities.
//!
//! Handles colorized JSON output, token status rendering, and the
//! verification and certificate reports.

pub mod json_printer;
pub mod report;
pub mod token_status;
