pub mod captions;
pub mod highlights;
pub mod jobs;
pub mod thumbnails;
pub mod users;
pub mod videos;
