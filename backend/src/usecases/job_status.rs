use std::sync::Arc;

use crates::domain::{
    repositories::{jobs::ProcessingJobRepository, storage::FileStorage},
    value_objects::{
        enums::job_statuses::JobStatus,
        job_status::{CaptionDto, HighlightDto, JobStatusView, JobSummaryDto, ThumbnailDto},
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::processing::{ProcessingError, ProcessingResult};

pub struct JobStatusUseCase<J, S>
where
    J: ProcessingJobRepository + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    job_repo: Arc<J>,
    storage: Arc<S>,
}

impl<J, S> JobStatusUseCase<J, S>
where
    J: ProcessingJobRepository + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    pub fn new(job_repo: Arc<J>, storage: Arc<S>) -> Self {
        Self { job_repo, storage }
    }

    /// Artifacts are only read for completed jobs, whatever rows exist otherwise.
    pub async fn get_status(&self, job_id: Uuid) -> ProcessingResult<JobStatusView> {
        let job = self
            .job_repo
            .find_job_by_id(job_id)
            .await
            .map_err(|err| {
                error!(%job_id, db_error = ?err, "job_status: failed to load job");
                ProcessingError::Internal(err)
            })?
            .ok_or(ProcessingError::JobNotFound)?;

        if job.job_status() != JobStatus::Completed {
            return Ok(JobStatusView::without_artifacts(job));
        }

        let highlights = self.job_repo.list_highlights(job_id).await?;
        let thumbnails = self.job_repo.list_thumbnails(job_id).await?;
        let captions = self.job_repo.list_captions(job_id).await?;

        let mut view = JobStatusView::without_artifacts(job);
        view.highlights = highlights.into_iter().map(HighlightDto::from).collect();
        view.thumbnails = thumbnails.into_iter().map(ThumbnailDto::from).collect();
        view.captions = captions.into_iter().map(CaptionDto::from).collect();

        Ok(view)
    }

    /// Status as seen by `caller`. Jobs without an owner are readable by anyone.
    pub async fn get_status_for(
        &self,
        job_id: Uuid,
        caller: Option<Uuid>,
    ) -> ProcessingResult<JobStatusView> {
        let view = self.get_status(job_id).await?;

        match view.user_id {
            Some(owner) if caller != Some(owner) => {
                warn!(%job_id, ?caller, "job_status: status requested by non-owner");
                Err(ProcessingError::Forbidden)
            }
            _ => Ok(view),
        }
    }

    pub async fn list_jobs(&self, user_id: Uuid) -> ProcessingResult<Vec<JobSummaryDto>> {
        let jobs = self
            .job_repo
            .list_jobs_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "job_status: failed to list jobs");
                ProcessingError::Internal(err)
            })?;

        Ok(jobs.into_iter().map(JobSummaryDto::from).collect())
    }

    pub async fn delete_job(&self, job_id: Uuid, user_id: Uuid) -> ProcessingResult<()> {
        let job = self
            .job_repo
            .find_job_by_id(job_id)
            .await?
            .ok_or(ProcessingError::JobNotFound)?;

        if job.user_id != Some(user_id) {
            warn!(%job_id, %user_id, "job_status: delete requested by non-owner");
            return Err(ProcessingError::Forbidden);
        }

        if job.job_status() == JobStatus::Processing {
            return Err(ProcessingError::JobInProgress);
        }

        // Rendered files may live outside the job directory; collect them before the
        // rows cascade away.
        let mut artifact_paths: Vec<String> = self
            .job_repo
            .list_highlights(job_id)
            .await?
            .into_iter()
            .map(|highlight| highlight.file_path)
            .collect();
        artifact_paths.extend(
            self.job_repo
                .list_thumbnails(job_id)
                .await?
                .into_iter()
                .map(|thumbnail| thumbnail.file_path),
        );

        let deleted = self.job_repo.delete_job(job_id).await.map_err(|err| {
            error!(%job_id, db_error = ?err, "job_status: failed to delete job");
            ProcessingError::Internal(err)
        })?;

        if deleted == 0 {
            return Err(ProcessingError::JobNotFound);
        }

        for relative in &artifact_paths {
            let Some(path) = self.storage.to_absolute_path(relative) else {
                warn!(%job_id, path = %relative, "job_status: artifact path outside media root, not removed");
                continue;
            };
            if let Err(err) = self.storage.delete_file(&path).await {
                warn!(%job_id, path = %path.display(), error = ?err, "job_status: failed to remove artifact");
            }
        }

        if let Err(err) = self.storage.cleanup_job_files(job_id).await {
            warn!(%job_id, error = ?err, "job_status: failed to remove job files");
        }

        info!(%job_id, %user_id, "job_status: job deleted");
        Ok(())
    }
}
