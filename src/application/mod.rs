pub mod accounts;
pub mod bootstrap;
pub mod calendar;
pub mod commands;
pub mod task_sync;
pub mod tasks;
pub mod timer;
