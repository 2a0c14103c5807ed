use std::sync::Arc;

use axum::http::StatusCode;
use crates::domain::{
    entities::{
        captions::InsertCaptionEntity, highlights::InsertHighlightEntity,
        jobs::InsertProcessingJobEntity, thumbnails::InsertThumbnailEntity, videos::VideoEntity,
    },
    repositories::{
        analyzer::VideoAnalyzer, jobs::ProcessingJobRepository, storage::FileStorage,
        transaction::TransactionRepository, users::UserRepository, videos::VideoRepository,
    },
    value_objects::{
        analysis::{AnalysisResult, RenderRequest},
        credits::CreditDenial,
        transaction::{OperationOutcome, TransactionBatch, TransactionError, TxOperation},
    },
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::usecases::{
    credit_ledger::{CreditError, CreditLedger},
    job_tasks::JobTaskRegistry,
};

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("payment required: {0}")]
    PaymentRequired(CreditDenial),
    #[error("video not found")]
    VideoNotFound,
    #[error("invalid video: {0}")]
    InvalidVideo(String),
    #[error("job not found")]
    JobNotFound,
    #[error("job belongs to another user")]
    Forbidden,
    #[error("job is still processing")]
    JobInProgress,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ProcessingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProcessingError::PaymentRequired(_) => StatusCode::PAYMENT_REQUIRED,
            ProcessingError::VideoNotFound | ProcessingError::JobNotFound => {
                StatusCode::NOT_FOUND
            }
            ProcessingError::InvalidVideo(_) => StatusCode::BAD_REQUEST,
            ProcessingError::Forbidden => StatusCode::FORBIDDEN,
            ProcessingError::JobInProgress => StatusCode::CONFLICT,
            ProcessingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The coordinator failure behind this error, if there is one.
    pub fn transaction_error(&self) -> Option<&TransactionError> {
        match self {
            ProcessingError::Internal(err) => err.downcast_ref::<TransactionError>(),
            _ => None,
        }
    }
}

impl From<CreditError> for ProcessingError {
    fn from(value: CreditError) -> Self {
        match value.denial() {
            Some(reason) => ProcessingError::PaymentRequired(reason),
            None => match value {
                CreditError::Internal(err) => ProcessingError::Internal(err),
                other => ProcessingError::Internal(anyhow::Error::new(other)),
            },
        }
    }
}

impl From<TransactionError> for ProcessingError {
    fn from(value: TransactionError) -> Self {
        ProcessingError::Internal(anyhow::Error::new(value))
    }
}

pub type ProcessingResult<T> = std::result::Result<T, ProcessingError>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobCreated {
    pub job_id: Uuid,
}

pub const PROGRESS_CREDITS_SETTLED: i32 = 10;
pub const PROGRESS_ANALYZED: i32 = 60;
pub const PROGRESS_PERSISTED: i32 = 80;

pub fn highlight_path(job_id: Uuid, number: usize) -> String {
    format!("jobs/{job_id}/highlights/highlight_{number}.mp4")
}

pub fn thumbnail_path(job_id: Uuid, number: usize) -> String {
    format!("jobs/{job_id}/thumbnails/thumbnail_{number}.jpg")
}

/// Insert operations for every derived record: highlights, then thumbnails, then
/// captions, each in analyzer order.
pub fn artifact_batch(job_id: Uuid, analysis: &AnalysisResult) -> TransactionBatch {
    let highlights = analysis.highlights.iter().enumerate().map(|(i, spec)| {
        TxOperation::InsertHighlight(InsertHighlightEntity {
            job_id,
            title: spec.title.clone(),
            description: spec.description.clone(),
            file_path: highlight_path(job_id, i + 1),
            start_time: spec.start_time,
            end_time: spec.end_time,
            duration: spec.duration,
            confidence: spec.confidence,
        })
    });

    let thumbnails = analysis.thumbnails.iter().enumerate().map(|(i, spec)| {
        TxOperation::InsertThumbnail(InsertThumbnailEntity {
            job_id,
            file_path: thumbnail_path(job_id, i + 1),
            timestamp: spec.timestamp,
            confidence: spec.confidence,
            description: spec.description.clone(),
        })
    });

    let captions = analysis.captions.iter().map(|spec| {
        TxOperation::InsertCaption(InsertCaptionEntity {
            job_id,
            platform: spec.platform.clone(),
            content: spec.content.clone(),
            hashtags: spec.hashtags.clone(),
        })
    });

    highlights.chain(thumbnails).chain(captions).collect()
}

/// Everything a background job needs, cloned into its task.
struct JobRunner<J, T, U, A, S>
where
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    job_repo: Arc<J>,
    transaction_repo: Arc<T>,
    credit_ledger: Arc<CreditLedger<U>>,
    analyzer: Arc<A>,
    storage: Arc<S>,
}

impl<J, T, U, A, S> Clone for JobRunner<J, T, U, A, S>
where
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            job_repo: Arc::clone(&self.job_repo),
            transaction_repo: Arc::clone(&self.transaction_repo),
            credit_ledger: Arc::clone(&self.credit_ledger),
            analyzer: Arc::clone(&self.analyzer),
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<J, T, U, A, S> JobRunner<J, T, U, A, S>
where
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    async fn run(self, job_id: Uuid, user_id: Option<Uuid>, video_location: String) {
        info!(%job_id, ?user_id, "processing: job started");

        let outcome = match user_id {
            Some(user_id) => {
                self.credit_ledger
                    .execute_with_rollback(user_id, || self.process(job_id, &video_location))
                    .await
            }
            None => self.process(job_id, &video_location).await,
        };

        match outcome {
            Ok(()) => info!(%job_id, "processing: job completed"),
            Err(err) => self.fail(job_id, err).await,
        }
    }

    async fn process(&self, job_id: Uuid, video_location: &str) -> ProcessingResult<()> {
        self.report_progress(job_id, PROGRESS_CREDITS_SETTLED).await;

        let analysis = self.analyzer.analyze(video_location.to_string()).await?;
        info!(
            %job_id,
            highlights = analysis.highlights.len(),
            thumbnails = analysis.thumbnails.len(),
            captions = analysis.captions.len(),
            media_available = analysis.media_available,
            "processing: analysis finished"
        );
        self.report_progress(job_id, PROGRESS_ANALYZED).await;

        let batch = artifact_batch(job_id, &analysis);
        let (highlight_ids, thumbnail_ids) = if batch.is_empty() {
            debug!(%job_id, "processing: analysis produced no artifacts");
            (Vec::new(), Vec::new())
        } else {
            let outcomes = self.transaction_repo.execute(batch).await?;
            let mut ids = outcomes.iter().map(OperationOutcome::inserted_id);
            let highlight_ids: Vec<Uuid> = ids
                .by_ref()
                .take(analysis.highlights.len())
                .flatten()
                .collect();
            let thumbnail_ids: Vec<Uuid> =
                ids.take(analysis.thumbnails.len()).flatten().collect();
            (highlight_ids, thumbnail_ids)
        };
        self.report_progress(job_id, PROGRESS_PERSISTED).await;

        if analysis.media_available {
            self.render_media(job_id, video_location, analysis, &highlight_ids, &thumbnail_ids)
                .await?;
        } else {
            debug!(%job_id, "processing: metadata-only result, nothing to render");
        }

        if !self.job_repo.mark_job_completed(job_id).await? {
            warn!(%job_id, "processing: job was no longer processing at completion");
        }

        Ok(())
    }

    /// Renders media into the job directory, then points the committed rows at the
    /// produced files. Path updates are best-effort.
    async fn render_media(
        &self,
        job_id: Uuid,
        video_location: &str,
        analysis: AnalysisResult,
        highlight_ids: &[Uuid],
        thumbnail_ids: &[Uuid],
    ) -> ProcessingResult<()> {
        let request = RenderRequest {
            video_location: video_location.to_string(),
            highlights: analysis.highlights,
            thumbnails: analysis.thumbnails,
            out_dir: self.storage.job_output_dir(job_id),
        };

        let rendered = self.analyzer.render(request).await?;
        info!(
            %job_id,
            highlights = rendered.highlights.len(),
            thumbnails = rendered.thumbnails.len(),
            "processing: media rendered"
        );

        for (highlight_id, path) in highlight_ids.iter().zip(&rendered.highlights) {
            let Some(relative) = self.storage.to_relative_path(path) else {
                warn!(
                    %job_id,
                    %highlight_id,
                    path = %path.display(),
                    "processing: rendered highlight outside media root, keeping planned path"
                );
                continue;
            };
            if let Err(err) = self
                .job_repo
                .update_highlight_file_path(*highlight_id, relative)
                .await
            {
                warn!(
                    %job_id,
                    %highlight_id,
                    db_error = ?err,
                    "processing: failed to store rendered highlight path"
                );
            }
        }

        for (thumbnail_id, path) in thumbnail_ids.iter().zip(&rendered.thumbnails) {
            let Some(relative) = self.storage.to_relative_path(path) else {
                warn!(
                    %job_id,
                    %thumbnail_id,
                    path = %path.display(),
                    "processing: rendered thumbnail outside media root, keeping planned path"
                );
                continue;
            };
            if let Err(err) = self
                .job_repo
                .update_thumbnail_file_path(*thumbnail_id, relative)
                .await
            {
                warn!(
                    %job_id,
                    %thumbnail_id,
                    db_error = ?err,
                    "processing: failed to store rendered thumbnail path"
                );
            }
        }

        Ok(())
    }

    async fn fail(&self, job_id: Uuid, err: ProcessingError) {
        let message = err.to_string();
        error!(%job_id, error = %message, "processing: job failed");

        if let Some(tx_err) = err.transaction_error().filter(|e| !e.nothing_written()) {
            error!(
                %job_id,
                error = %tx_err,
                "processing: artifact batch may be partially written, manual reconciliation required"
            );
        }

        if let Err(cleanup_err) = self.storage.cleanup_job_files(job_id).await {
            warn!(%job_id, error = ?cleanup_err, "processing: failed to clean up job files");
        }

        match self.job_repo.mark_job_failed(job_id, message).await {
            Ok(true) => {}
            Ok(false) => warn!(%job_id, "processing: job already terminal, failure not recorded"),
            Err(db_err) => {
                error!(%job_id, db_error = ?db_err, "processing: failed to record job failure");
            }
        }
    }

    async fn report_progress(&self, job_id: Uuid, progress: i32) {
        if let Err(err) = self.job_repo.update_progress(job_id, progress).await {
            warn!(%job_id, progress, db_error = ?err, "processing: failed to update progress");
        }
    }
}

pub struct ProcessingUseCase<V, J, T, U, A, S>
where
    V: VideoRepository + Send + Sync + 'static,
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    video_repo: Arc<V>,
    runner: JobRunner<J, T, U, A, S>,
    tasks: Arc<JobTaskRegistry>,
}

impl<V, J, T, U, A, S> ProcessingUseCase<V, J, T, U, A, S>
where
    V: VideoRepository + Send + Sync + 'static,
    J: ProcessingJobRepository + Send + Sync + 'static,
    T: TransactionRepository + Send + Sync + 'static,
    U: UserRepository + Send + Sync + 'static,
    A: VideoAnalyzer + Send + Sync + 'static,
    S: FileStorage + Send + Sync + 'static,
{
    pub fn new(
        video_repo: Arc<V>,
        job_repo: Arc<J>,
        transaction_repo: Arc<T>,
        credit_ledger: Arc<CreditLedger<U>>,
        analyzer: Arc<A>,
        storage: Arc<S>,
        tasks: Arc<JobTaskRegistry>,
    ) -> Self {
        Self {
            video_repo,
            runner: JobRunner {
                job_repo,
                transaction_repo,
                credit_ledger,
                analyzer,
                storage,
            },
            tasks,
        }
    }

    /// Creates the job and hands the work to a background task. Only a missing video or
    /// a credit denial fail here; later failures land on the job row.
    pub async fn start_processing(
        &self,
        video_id: Uuid,
        user_id: Option<Uuid>,
    ) -> ProcessingResult<JobCreated> {
        info!(%video_id, ?user_id, "processing: start requested");

        let video = self
            .video_repo
            .find_video_by_id(video_id)
            .await
            .map_err(|err| {
                error!(%video_id, db_error = ?err, "processing: failed to load video");
                ProcessingError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%video_id, "processing: video not found");
                ProcessingError::VideoNotFound
            })?;

        let video_location = self.video_location(&video).ok_or_else(|| {
            warn!(%video_id, "processing: video has neither a file nor a source URL");
            ProcessingError::VideoNotFound
        })?;

        if let Some(user_id) = user_id {
            let check = self.runner.credit_ledger.check_credits(Some(user_id)).await?;
            if !check.can_proceed {
                let reason = check.reason.unwrap_or(CreditDenial::InsufficientCredits);
                warn!(
                    %user_id,
                    %video_id,
                    %reason,
                    status = StatusCode::PAYMENT_REQUIRED.as_u16(),
                    "processing: credit check denied"
                );
                return Err(ProcessingError::PaymentRequired(reason));
            }
        }

        let job_id = self
            .runner
            .job_repo
            .create_job(InsertProcessingJobEntity::processing(video_id, user_id))
            .await
            .map_err(|err| {
                error!(%video_id, db_error = ?err, "processing: failed to create job");
                ProcessingError::Internal(err)
            })?;

        let runner = self.runner.clone();
        self.tasks
            .spawn(job_id, runner.run(job_id, user_id, video_location));

        info!(%job_id, %video_id, ?user_id, "processing: job scheduled");
        Ok(JobCreated { job_id })
    }

    fn video_location(&self, video: &VideoEntity) -> Option<String> {
        match (&video.file_path, &video.source_url) {
            (Some(file_path), _) => self
                .runner
                .storage
                .to_absolute_path(file_path)
                .map(|path| path.to_string_lossy().into_owned()),
            (None, Some(source_url)) => Some(source_url.clone()),
            (None, None) => None,
        }
    }
}
