pub mod credit_ledger;
pub mod job_status;
pub mod job_tasks;
pub mod processing;
pub mod videos;

#[cfg(test)]
pub(crate) mod test_support;
