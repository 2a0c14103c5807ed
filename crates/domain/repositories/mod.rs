pub mod analyzer;
pub mod jobs;
pub mod storage;
pub mod transaction;
pub mod users;
pub mod videos;
