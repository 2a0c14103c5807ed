//! In-memory repositories and collaborator stubs for use-case scenario tests.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{
        captions::CaptionEntity,
        highlights::HighlightEntity,
        jobs::{InsertProcessingJobEntity, ProcessingJobEntity},
        thumbnails::ThumbnailEntity,
        users::UserEntity,
        videos::{InsertVideoEntity, VideoEntity},
    },
    repositories::{
        analyzer::VideoAnalyzer,
        jobs::ProcessingJobRepository,
        storage::{FileStorage, is_confined},
        transaction::TransactionRepository,
        users::UserRepository,
        videos::VideoRepository,
    },
    value_objects::{
        analysis::{
            AnalysisResult, CaptionSpec, HighlightSpec, RenderRequest, RenderedMedia,
            ThumbnailSpec,
        },
        enums::job_statuses::JobStatus,
        transaction::{
            FetchedRow, OperationOutcome, TransactionBatch, TransactionError, TxOperation,
        },
    },
};
use uuid::Uuid;

#[derive(Clone, Default)]
struct State {
    users: HashMap<Uuid, UserEntity>,
    videos: HashMap<Uuid, VideoEntity>,
    jobs: HashMap<Uuid, ProcessingJobEntity>,
    highlights: Vec<HighlightEntity>,
    thumbnails: Vec<ThumbnailEntity>,
    captions: Vec<CaptionEntity>,
}

/// One store backing every repository trait, so a scenario observes users, jobs and
/// derived rows exactly as the orchestrator left them.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    fail_transaction_at: Mutex<Option<usize>>,
    fail_path_updates: AtomicBool,
    fail_increments: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn seed_user(
        &self,
        credits: i32,
        is_subscribed: bool,
        subscription_expires_at: Option<DateTime<Utc>>,
    ) -> Uuid {
        let now = Utc::now();
        let user = UserEntity {
            id: Uuid::new_v4(),
            email: Some("viewer@example.com".to_string()),
            credits,
            is_subscribed,
            subscription_expires_at,
            created_at: now,
            updated_at: now,
        };
        let id = user.id;
        self.lock().users.insert(id, user);
        id
    }

    pub fn seed_video(&self, user_id: Option<Uuid>) -> Uuid {
        let video = VideoEntity {
            id: Uuid::new_v4(),
            user_id,
            file_path: Some("uploads/match.mp4".to_string()),
            source_url: None,
            title: Some("Match day".to_string()),
            created_at: Utc::now(),
        };
        let id = video.id;
        self.lock().videos.insert(id, video);
        id
    }

    pub fn seed_job(&self, user_id: Option<Uuid>, video_id: Uuid, status: JobStatus) -> Uuid {
        let now = Utc::now();
        let job = ProcessingJobEntity {
            id: Uuid::new_v4(),
            user_id,
            video_id,
            status: status.to_string(),
            progress: if status == JobStatus::Completed { 100 } else { 0 },
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        let id = job.id;
        self.lock().jobs.insert(id, job);
        id
    }

    pub fn seed_highlight(&self, job_id: Uuid, title: &str, start_time: f64) {
        self.seed_highlight_at(
            job_id,
            title,
            start_time,
            format!("jobs/{job_id}/highlights/{title}.mp4"),
        );
    }

    pub fn seed_highlight_at(
        &self,
        job_id: Uuid,
        title: &str,
        start_time: f64,
        file_path: String,
    ) {
        self.lock().highlights.push(HighlightEntity {
            id: Uuid::new_v4(),
            job_id,
            title: title.to_string(),
            description: None,
            file_path,
            start_time,
            end_time: start_time + 5.0,
            duration: 5.0,
            confidence: 0.8,
            created_at: Utc::now(),
        });
    }

    pub fn seed_thumbnail(&self, job_id: Uuid, timestamp: f64) {
        self.lock().thumbnails.push(ThumbnailEntity {
            id: Uuid::new_v4(),
            job_id,
            file_path: format!("jobs/{job_id}/thumbnails/{timestamp}.jpg"),
            timestamp,
            confidence: 0.7,
            description: None,
            created_at: Utc::now(),
        });
    }

    pub fn seed_caption(&self, job_id: Uuid, platform: &str) {
        self.lock().captions.push(CaptionEntity {
            id: Uuid::new_v4(),
            job_id,
            platform: platform.to_string(),
            content: format!("{platform} caption"),
            hashtags: vec!["#clips".to_string()],
            created_at: Utc::now(),
        });
    }

    pub fn user(&self, user_id: Uuid) -> UserEntity {
        self.lock().users[&user_id].clone()
    }

    pub fn job(&self, job_id: Uuid) -> ProcessingJobEntity {
        self.lock().jobs[&job_id].clone()
    }

    pub fn job_count(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn has_job(&self, job_id: Uuid) -> bool {
        self.lock().jobs.contains_key(&job_id)
    }

    pub fn derived_counts(&self, job_id: Uuid) -> (usize, usize, usize) {
        let state = self.lock();
        (
            state.highlights.iter().filter(|h| h.job_id == job_id).count(),
            state.thumbnails.iter().filter(|t| t.job_id == job_id).count(),
            state.captions.iter().filter(|c| c.job_id == job_id).count(),
        )
    }

    /// Makes the next transaction fail at the given operation index.
    pub fn fail_transaction_at(&self, index: usize) {
        *self
            .fail_transaction_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(index);
    }

    pub fn fail_path_updates(&self) {
        self.fail_path_updates.store(true, Ordering::SeqCst);
    }

    pub fn fail_increments(&self) {
        self.fail_increments.store(true, Ordering::SeqCst);
    }

    fn take_transaction_failure(&self) -> Option<usize> {
        self.fail_transaction_at
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

fn apply(state: &mut State, operation: TxOperation) -> Result<OperationOutcome> {
    let now = Utc::now();
    match operation {
        TxOperation::InsertHighlight(insert) => {
            if !state.jobs.contains_key(&insert.job_id) {
                bail!("highlights_job_id_fkey violated");
            }
            let id = Uuid::new_v4();
            state.highlights.push(HighlightEntity {
                id,
                job_id: insert.job_id,
                title: insert.title,
                description: insert.description,
                file_path: insert.file_path,
                start_time: insert.start_time,
                end_time: insert.end_time,
                duration: insert.duration,
                confidence: insert.confidence,
                created_at: now,
            });
            Ok(OperationOutcome::Inserted { id })
        }
        TxOperation::InsertThumbnail(insert) => {
            if !state.jobs.contains_key(&insert.job_id) {
                bail!("thumbnails_job_id_fkey violated");
            }
            let id = Uuid::new_v4();
            state.thumbnails.push(ThumbnailEntity {
                id,
                job_id: insert.job_id,
                file_path: insert.file_path,
                timestamp: insert.timestamp,
                confidence: insert.confidence,
                description: insert.description,
                created_at: now,
            });
            Ok(OperationOutcome::Inserted { id })
        }
        TxOperation::InsertCaption(insert) => {
            if !state.jobs.contains_key(&insert.job_id) {
                bail!("captions_job_id_fkey violated");
            }
            let id = Uuid::new_v4();
            state.captions.push(CaptionEntity {
                id,
                job_id: insert.job_id,
                platform: insert.platform,
                content: insert.content,
                hashtags: insert.hashtags,
                created_at: now,
            });
            Ok(OperationOutcome::Inserted { id })
        }
        TxOperation::Execute { sql, .. } => Err(anyhow!("raw statements are not supported: {sql}")),
        TxOperation::FetchJob { job_id } => Ok(OperationOutcome::Row(
            state.jobs.get(&job_id).cloned().map(FetchedRow::Job),
        )),
        TxOperation::FetchUser { user_id } => Ok(OperationOutcome::Row(
            state.users.get(&user_id).cloned().map(FetchedRow::User),
        )),
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn execute(
        &self,
        batch: TransactionBatch,
    ) -> Result<Vec<OperationOutcome>, TransactionError> {
        if batch.is_empty() {
            return Err(TransactionError::EmptyBatch);
        }

        let fail_at = self.take_transaction_failure();
        let mut state = self.lock();
        let mut working = state.clone();
        let mut outcomes = Vec::with_capacity(batch.len());

        for (index, operation) in batch.into_operations().into_iter().enumerate() {
            if fail_at == Some(index) {
                return Err(TransactionError::OperationFailed {
                    index,
                    source: anyhow!("injected failure"),
                });
            }
            let outcome = apply(&mut working, operation)
                .map_err(|source| TransactionError::OperationFailed { index, source })?;
            outcomes.push(outcome);
        }

        *state = working;
        Ok(outcomes)
    }

    async fn execute_single(
        &self,
        operation: TxOperation,
    ) -> Result<OperationOutcome, TransactionError> {
        let mut outcomes = self.execute(TransactionBatch::single(operation)).await?;
        outcomes
            .pop()
            .ok_or(TransactionError::EmptyBatch)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        Ok(self.lock().users.get(&user_id).cloned())
    }

    async fn clear_subscription(&self, user_id: Uuid) -> Result<()> {
        if let Some(user) = self.lock().users.get_mut(&user_id) {
            user.is_subscribed = false;
            user.subscription_expires_at = None;
        }
        Ok(())
    }

    async fn decrement_credit_if_positive(&self, user_id: Uuid) -> Result<usize> {
        let mut state = self.lock();
        match state.users.get_mut(&user_id) {
            Some(user) if user.credits > 0 => {
                user.credits -= 1;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn increment_credits(&self, user_id: Uuid, amount: i32) -> Result<usize> {
        if self.fail_increments.load(Ordering::SeqCst) {
            bail!("connection reset by peer");
        }
        match self.lock().users.get_mut(&user_id) {
            Some(user) => {
                user.credits += amount;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl VideoRepository for InMemoryStore {
    async fn find_video_by_id(&self, video_id: Uuid) -> Result<Option<VideoEntity>> {
        Ok(self.lock().videos.get(&video_id).cloned())
    }

    async fn insert_video(&self, insert_video_entity: InsertVideoEntity) -> Result<Uuid> {
        let video = VideoEntity {
            id: Uuid::new_v4(),
            user_id: insert_video_entity.user_id,
            file_path: insert_video_entity.file_path,
            source_url: insert_video_entity.source_url,
            title: insert_video_entity.title,
            created_at: Utc::now(),
        };
        let id = video.id;
        self.lock().videos.insert(id, video);
        Ok(id)
    }
}

#[async_trait]
impl ProcessingJobRepository for InMemoryStore {
    async fn create_job(&self, insert_job_entity: InsertProcessingJobEntity) -> Result<Uuid> {
        let now = Utc::now();
        let job = ProcessingJobEntity {
            id: Uuid::new_v4(),
            user_id: insert_job_entity.user_id,
            video_id: insert_job_entity.video_id,
            status: insert_job_entity.status,
            progress: insert_job_entity.progress,
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        let id = job.id;
        self.lock().jobs.insert(id, job);
        Ok(id)
    }

    async fn find_job_by_id(&self, job_id: Uuid) -> Result<Option<ProcessingJobEntity>> {
        Ok(self.lock().jobs.get(&job_id).cloned())
    }

    async fn list_jobs_by_user(&self, user_id: Uuid) -> Result<Vec<ProcessingJobEntity>> {
        let mut jobs: Vec<ProcessingJobEntity> = self
            .lock()
            .jobs
            .values()
            .filter(|job| job.user_id == Some(user_id))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn update_progress(&self, job_id: Uuid, progress: i32) -> Result<()> {
        if let Some(job) = self.lock().jobs.get_mut(&job_id) {
            if job.job_status() == JobStatus::Processing {
                job.progress = progress.clamp(0, 100);
            }
        }
        Ok(())
    }

    async fn mark_job_completed(&self, job_id: Uuid) -> Result<bool> {
        match self.lock().jobs.get_mut(&job_id) {
            Some(job) if job.job_status() == JobStatus::Processing => {
                job.status = JobStatus::Completed.to_string();
                job.progress = 100;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_job_failed(&self, job_id: Uuid, error_message: String) -> Result<bool> {
        match self.lock().jobs.get_mut(&job_id) {
            Some(job) if job.job_status() == JobStatus::Processing => {
                job.status = JobStatus::Failed.to_string();
                job.error_message = Some(error_message);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_highlights(&self, job_id: Uuid) -> Result<Vec<HighlightEntity>> {
        let mut rows: Vec<HighlightEntity> = self
            .lock()
            .highlights
            .iter()
            .filter(|h| h.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        Ok(rows)
    }

    async fn list_thumbnails(&self, job_id: Uuid) -> Result<Vec<ThumbnailEntity>> {
        let mut rows: Vec<ThumbnailEntity> = self
            .lock()
            .thumbnails
            .iter()
            .filter(|t| t.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Ok(rows)
    }

    async fn list_captions(&self, job_id: Uuid) -> Result<Vec<CaptionEntity>> {
        Ok(self
            .lock()
            .captions
            .iter()
            .filter(|c| c.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn update_highlight_file_path(
        &self,
        highlight_id: Uuid,
        file_path: String,
    ) -> Result<()> {
        if self.fail_path_updates.load(Ordering::SeqCst) {
            bail!("statement timeout");
        }
        let mut state = self.lock();
        let row = state
            .highlights
            .iter_mut()
            .find(|h| h.id == highlight_id)
            .ok_or_else(|| anyhow!("highlight not found"))?;
        row.file_path = file_path;
        Ok(())
    }

    async fn update_thumbnail_file_path(
        &self,
        thumbnail_id: Uuid,
        file_path: String,
    ) -> Result<()> {
        if self.fail_path_updates.load(Ordering::SeqCst) {
            bail!("statement timeout");
        }
        let mut state = self.lock();
        let row = state
            .thumbnails
            .iter_mut()
            .find(|t| t.id == thumbnail_id)
            .ok_or_else(|| anyhow!("thumbnail not found"))?;
        row.file_path = file_path;
        Ok(())
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<usize> {
        let mut state = self.lock();
        if state.jobs.remove(&job_id).is_none() {
            return Ok(0);
        }
        state.highlights.retain(|h| h.job_id != job_id);
        state.thumbnails.retain(|t| t.job_id != job_id);
        state.captions.retain(|c| c.job_id != job_id);
        Ok(1)
    }
}

pub fn analysis(highlights: usize, thumbnails: usize, captions: usize) -> AnalysisResult {
    AnalysisResult {
        highlights: (0..highlights)
            .map(|i| HighlightSpec {
                title: format!("Moment {}", i + 1),
                // Reverse order so readers have to sort.
                start_time: (highlights - i) as f64 * 10.0,
                end_time: (highlights - i) as f64 * 10.0 + 6.0,
                duration: 6.0,
                confidence: 0.9,
                description: None,
            })
            .collect(),
        thumbnails: (0..thumbnails)
            .map(|i| ThumbnailSpec {
                timestamp: (thumbnails - i) as f64 * 3.0,
                confidence: 0.75,
                description: Some(format!("frame {}", i + 1)),
            })
            .collect(),
        captions: (0..captions)
            .map(|i| CaptionSpec {
                platform: format!("platform-{}", i + 1),
                content: "You have to see this".to_string(),
                hashtags: vec!["#highlights".to_string()],
            })
            .collect(),
        media_available: false,
    }
}

/// Analyzer returning a canned result, or failing with a canned message.
pub struct StubAnalyzer {
    analysis: std::result::Result<AnalysisResult, String>,
    render: Option<std::result::Result<RenderedMedia, String>>,
    pub analyze_calls: AtomicUsize,
    pub render_requests: Mutex<Vec<RenderRequest>>,
}

impl StubAnalyzer {
    pub fn returning(analysis: AnalysisResult) -> Self {
        Self {
            analysis: Ok(analysis),
            render: None,
            analyze_calls: AtomicUsize::new(0),
            render_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            analysis: Err(message.to_string()),
            render: None,
            analyze_calls: AtomicUsize::new(0),
            render_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_render(mut self, render: std::result::Result<RenderedMedia, String>) -> Self {
        self.render = Some(render);
        self
    }

    pub fn render_requests(&self) -> Vec<RenderRequest> {
        self.render_requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl VideoAnalyzer for StubAnalyzer {
    async fn analyze(&self, _video_location: String) -> Result<AnalysisResult> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.analysis.clone().map_err(|message| anyhow!(message))
    }

    async fn render(&self, request: RenderRequest) -> Result<RenderedMedia> {
        self.render_requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);
        match &self.render {
            Some(result) => result.clone().map_err(|message| anyhow!(message.clone())),
            None => Ok(RenderedMedia::default()),
        }
    }
}

pub const MEDIA_ROOT: &str = "/srv/media";

/// Path-only storage that records which jobs and files were cleaned up.
#[derive(Default)]
pub struct RecordingStorage {
    cleaned_jobs: Mutex<Vec<Uuid>>,
    deleted_files: Mutex<Vec<PathBuf>>,
    fail_cleanup: AtomicBool,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_cleanup() -> Self {
        let storage = Self::default();
        storage.fail_cleanup.store(true, Ordering::SeqCst);
        storage
    }

    pub fn deleted_files(&self) -> Vec<PathBuf> {
        self.deleted_files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn cleaned_jobs(&self) -> Vec<Uuid> {
        self.cleaned_jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl FileStorage for RecordingStorage {
    fn to_relative_path(&self, absolute: &Path) -> Option<String> {
        absolute
            .strip_prefix(MEDIA_ROOT)
            .ok()
            .filter(|relative| is_confined(relative))
            .map(|relative| relative.to_string_lossy().into_owned())
    }

    fn to_absolute_path(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        is_confined(relative).then(|| Path::new(MEDIA_ROOT).join(relative))
    }

    fn job_output_dir(&self, job_id: Uuid) -> PathBuf {
        Path::new(MEDIA_ROOT).join("jobs").join(job_id.to_string())
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        self.deleted_files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_path_buf());
        Ok(())
    }

    async fn cleanup_job_files(&self, job_id: Uuid) -> Result<()> {
        self.cleaned_jobs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(job_id);
        if self.fail_cleanup.load(Ordering::SeqCst) {
            bail!("permission denied");
        }
        Ok(())
    }
}
