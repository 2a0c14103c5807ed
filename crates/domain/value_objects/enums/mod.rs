pub mod job_statuses;
