pub mod analysis;
pub mod credits;
pub mod enums;
pub mod job_status;
pub mod transaction;
pub mod videos;
