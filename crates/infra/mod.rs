pub mod analyzer;
pub mod db;
pub mod storages;
