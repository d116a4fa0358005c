pub mod colors;
pub mod models;
pub mod recurrence;
pub mod streak;
pub mod time_parser;
pub mod validators;
