pub mod jobs;
pub mod transaction;
pub mod users;
pub mod videos;
