pub mod account_repository;
pub mod config;
pub mod error;
pub mod event_repository;
pub mod storage;
pub mod task_repository;
pub mod timer_repository;
