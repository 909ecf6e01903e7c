use super::pipeline::{OrderPipeline, ProgressObserver};
use super::progress_tracker::ProgressTracker;
use contracts::usecases::common::{UseCaseError, UseCaseResult};
use contracts::usecases::u508_fill_order_template::{
    FillProgress, FillRequest, FillResponse, FillStartStatus, PipelineStage,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::config::StorageConfig;

/// Завершенные сессии старше этого срока удаляются при запуске новых
const SESSION_RETENTION_HOURS: i64 = 24;

/// Наблюдатель, пишущий прогресс в трекер сессии
struct SessionObserver {
    tracker: Arc<ProgressTracker>,
    session_id: String,
}

impl ProgressObserver for SessionObserver {
    fn on_stage(&self, stage: PipelineStage, message: &str) {
        self.tracker.record_stage(&self.session_id, stage, message);
    }

    fn on_detail(&self, message: &str) {
        self.tracker.record_detail(&self.session_id, message);
    }

    fn on_failure(&self, error: &UseCaseError) {
        self.tracker.fail_session(&self.session_id, error.clone());
    }
}

/// Executor для UseCase заполнения шаблона заказа
#[derive(Clone)]
pub struct FillExecutor {
    progress_tracker: Arc<ProgressTracker>,
    pipeline: Arc<OrderPipeline>,
    storage: StorageConfig,
}

/// Файл заказа для одного запуска. Текст из запроса сохраняется во временный файл.
struct OrderSource {
    path: PathBuf,
    temporary: bool,
}

impl OrderSource {
    fn release(self) {
        if !self.temporary {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("Cannot remove {}: {}", self.path.display(), e);
        }
    }
}

/// Идентификатор загруженного файла: только UUID, без путей
fn uploaded_file(dir: &Path, file_id: &str, extension: &str) -> UseCaseResult<PathBuf> {
    let id = Uuid::parse_str(file_id.trim())
        .map_err(|_| UseCaseError::validation(format!("Некорректный идентификатор файла: {}", file_id)))?;
    let path = dir.join(format!("{}.{}", id, extension));
    if !path.is_file() {
        return Err(UseCaseError::not_found("Файл не найден").with_details(path.display().to_string()));
    }
    Ok(path)
}

impl FillExecutor {
    pub fn new(
        progress_tracker: Arc<ProgressTracker>,
        pipeline: Arc<OrderPipeline>,
        storage: StorageConfig,
    ) -> Self {
        Self {
            progress_tracker,
            pipeline,
            storage,
        }
    }

    /// Запустить заполнение (создает async task и возвращает session_id)
    pub async fn start_fill(&self, request: FillRequest) -> UseCaseResult<FillResponse> {
        tracing::info!(
            "Starting order fill: order_file_id={:?}, inline_order={}, template_file_id={}",
            request.order_file_id,
            request.order_content.is_some(),
            request.template_file_id
        );

        for stale in self
            .progress_tracker
            .cleanup_old_sessions(SESSION_RETENTION_HOURS)
        {
            if let Err(e) = std::fs::remove_file(&stale) {
                tracing::warn!("Cannot remove stale result {}: {}", stale.display(), e);
            }
        }

        let template_path = uploaded_file(&self.storage.upload_dir, &request.template_file_id, "xlsx")?;
        let order = self.resolve_order(&request)?;

        let session_id = Uuid::new_v4().to_string();
        let output_path = self.storage.output_dir.join(format!("{}.xlsx", session_id));

        self.progress_tracker
            .create_session(session_id.clone(), output_path.clone());

        if let Err(e) = std::fs::copy(&template_path, &output_path) {
            tracing::error!(
                "Session {}: cannot copy template to {}: {}",
                session_id,
                output_path.display(),
                e
            );
            let error = UseCaseError::internal("Не удалось подготовить копию шаблона")
                .with_details(e.to_string());
            let message = error.message.clone();
            self.progress_tracker.fail_session(&session_id, error);
            order.release();
            return Ok(FillResponse {
                session_id,
                status: FillStartStatus::Failed,
                message,
            });
        }

        // Запустить заполнение в фоне
        let self_clone = self.clone();
        let session_id_clone = session_id.clone();

        tokio::spawn(async move {
            self_clone
                .run_session(session_id_clone, order, output_path)
                .await;
        });

        Ok(FillResponse {
            session_id,
            status: FillStartStatus::Started,
            message: "Заполнение шаблона запущено".to_string(),
        })
    }

    fn resolve_order(&self, request: &FillRequest) -> UseCaseResult<OrderSource> {
        if let Some(content) = request.order_content.as_deref().filter(|c| !c.trim().is_empty()) {
            let path = self
                .storage
                .upload_dir
                .join(format!("{}.txt", Uuid::new_v4()));
            std::fs::write(&path, content).map_err(|e| {
                UseCaseError::internal("Не удалось сохранить текст заказа").with_details(e.to_string())
            })?;
            return Ok(OrderSource {
                path,
                temporary: true,
            });
        }

        match request.order_file_id.as_deref() {
            Some(file_id) => Ok(OrderSource {
                path: uploaded_file(&self.storage.upload_dir, file_id, "txt")?,
                temporary: false,
            }),
            None => Err(UseCaseError::validation(
                "Нужно указать файл заказа или текст заказа",
            )),
        }
    }

    async fn run_session(&self, session_id: String, order: OrderSource, output_path: PathBuf) {
        let observer = SessionObserver {
            tracker: self.progress_tracker.clone(),
            session_id: session_id.clone(),
        };

        let result = self.pipeline.run(&order.path, &output_path, &observer).await;
        order.release();

        match result {
            Ok(outcome) => tracing::info!(
                "Session {} completed: {} cells written to {}",
                session_id,
                outcome.summary.cells_written,
                output_path.display()
            ),
            Err(e) => tracing::error!("Session {} failed: {}", session_id, e),
        }
    }

    /// Получить текущий прогресс заполнения
    pub fn get_progress(&self, session_id: &str) -> Option<FillProgress> {
        self.progress_tracker.get_progress(session_id)
    }

    pub fn list_sessions(&self) -> Vec<FillProgress> {
        self.progress_tracker.list_sessions()
    }

    /// Путь к результату, если сессия завершилась успешно
    pub fn result_file(&self, session_id: &str) -> Option<PathBuf> {
        self.progress_tracker.result_file(session_id)
    }

    /// Удалить сессию и ее файл результата
    pub fn delete_session(&self, session_id: &str) -> bool {
        match self.progress_tracker.remove_session(session_id) {
            Some(output_file) => {
                if let Err(e) = std::fs::remove_file(&output_file) {
                    tracing::warn!("Cannot remove {}: {}", output_file.display(), e);
                }
                true
            }
            None => false,
        }
    }

    pub fn catalog(&self) -> &[String] {
        self.pipeline.catalog()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::xlsx::test_support::{write_template, TemplateFixture};
    use crate::shared::xlsx::TemplateSheet;
    use crate::usecases::u508_fill_order_template::mapping_oracle::tests::FakeOracle;
    use crate::usecases::u508_fill_order_template::TemplateLayout;
    use contracts::usecases::u508_fill_order_template::FillStatus;
    use std::time::Duration;

    struct Setup {
        _dir: tempfile::TempDir,
        executor: FillExecutor,
        template_id: String,
        template_path: PathBuf,
    }

    fn setup() -> Setup {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            upload_dir: dir.path().join("uploads"),
            output_dir: dir.path().join("outputs"),
            log_dir: dir.path().join("logs"),
        };
        storage.ensure_dirs().unwrap();

        let template_id = Uuid::new_v4().to_string();
        let template_path = storage.upload_dir.join(format!("{}.xlsx", template_id));
        write_template(&template_path, &TemplateFixture::standard());

        let oracle = Arc::new(FakeOracle::new(&[("150g鲜装牛肉丸", "四海150g鲜装牛肉丸")]));
        let pipeline = Arc::new(OrderPipeline::new(
            oracle,
            vec!["四海150g鲜装牛肉丸".to_string()],
            TemplateLayout::default(),
        ));
        let executor = FillExecutor::new(Arc::new(ProgressTracker::new()), pipeline, storage);

        Setup {
            _dir: dir,
            executor,
            template_id,
            template_path,
        }
    }

    async fn wait_terminal(executor: &FillExecutor, session_id: &str) -> FillProgress {
        for _ in 0..200 {
            if let Some(progress) = executor.get_progress(session_id) {
                if progress.status.is_terminal() {
                    return progress;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session {} did not finish", session_id);
    }

    #[tokio::test]
    async fn test_inline_order_fills_copy() {
        let s = setup();
        let original = std::fs::read(&s.template_path).unwrap();

        let response = s
            .executor
            .start_fill(FillRequest {
                order_file_id: None,
                order_content: Some("黄记:\n150g鲜装牛肉丸:2件\n".to_string()),
                template_file_id: s.template_id.clone(),
            })
            .await
            .unwrap();
        assert_eq!(response.status, FillStartStatus::Started);

        let progress = wait_terminal(&s.executor, &response.session_id).await;
        assert_eq!(progress.status, FillStatus::Completed);
        assert_eq!(progress.percent, 100);

        let result = s.executor.result_file(&response.session_id).unwrap();
        let sheet = TemplateSheet::open(&result).unwrap();
        assert_eq!(sheet.text(3, 4).as_deref(), Some("2"));
        assert_eq!(std::fs::read(&s.template_path).unwrap(), original);

        assert!(s.executor.delete_session(&response.session_id));
        assert!(!result.exists());
        assert!(!s.executor.delete_session(&response.session_id));
    }

    fn txt_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
            .count()
    }

    #[tokio::test]
    async fn test_inline_order_file_is_removed_after_run() {
        let s = setup();

        let response = s
            .executor
            .start_fill(FillRequest {
                order_file_id: None,
                order_content: Some("黄记:\n150g鲜装牛肉丸:2件\n".to_string()),
                template_file_id: s.template_id.clone(),
            })
            .await
            .unwrap();
        wait_terminal(&s.executor, &response.session_id).await;

        // сессия становится конечной до освобождения файла заказа
        for _ in 0..200 {
            if txt_files(&s.executor.storage.upload_dir) == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(txt_files(&s.executor.storage.upload_dir), 0);
    }

    #[tokio::test]
    async fn test_uploaded_order_file_is_kept() {
        let s = setup();
        let order_id = Uuid::new_v4().to_string();
        let order_path = s.executor.storage.upload_dir.join(format!("{}.txt", order_id));
        std::fs::write(&order_path, "黄记:\n150g鲜装牛肉丸:2件\n").unwrap();

        let response = s
            .executor
            .start_fill(FillRequest {
                order_file_id: Some(order_id),
                order_content: None,
                template_file_id: s.template_id.clone(),
            })
            .await
            .unwrap();
        let progress = wait_terminal(&s.executor, &response.session_id).await;

        assert_eq!(progress.status, FillStatus::Completed);
        assert!(order_path.exists());
    }

    #[tokio::test]
    async fn test_template_copy_failure_reports_failed_start() {
        let mut s = setup();
        s.executor.storage.output_dir = s.executor.storage.upload_dir.join("missing");

        let response = s
            .executor
            .start_fill(FillRequest {
                order_file_id: None,
                order_content: Some("黄记\n鱼蛋1".to_string()),
                template_file_id: s.template_id.clone(),
            })
            .await
            .unwrap();

        assert_eq!(response.status, FillStartStatus::Failed);
        let progress = s.executor.get_progress(&response.session_id).unwrap();
        assert_eq!(progress.status, FillStatus::Failed);
        assert_eq!(progress.error.map(|e| e.code), Some("INTERNAL_ERROR".to_string()));
        assert_eq!(txt_files(&s.executor.storage.upload_dir), 0);
    }

    #[tokio::test]
    async fn test_empty_order_fails_session() {
        let s = setup();
        let order_id = Uuid::new_v4().to_string();
        std::fs::write(
            s.executor.storage.upload_dir.join(format!("{}.txt", order_id)),
            "\n\n",
        )
        .unwrap();

        let response = s
            .executor
            .start_fill(FillRequest {
                order_file_id: Some(order_id),
                order_content: None,
                template_file_id: s.template_id.clone(),
            })
            .await
            .unwrap();

        let progress = wait_terminal(&s.executor, &response.session_id).await;
        assert_eq!(progress.status, FillStatus::Failed);
        assert_eq!(progress.percent, -1);
        assert_eq!(progress.error.map(|e| e.code), Some("EMPTY_ORDER".to_string()));
        assert_eq!(s.executor.result_file(&response.session_id), None);
    }

    #[tokio::test]
    async fn test_rejects_bad_file_ids() {
        let s = setup();

        let traversal = s
            .executor
            .start_fill(FillRequest {
                order_file_id: None,
                order_content: Some("黄记\n鱼蛋1".to_string()),
                template_file_id: "../secret".to_string(),
            })
            .await;
        assert_eq!(traversal.unwrap_err().code, "VALIDATION_ERROR");

        let missing = s
            .executor
            .start_fill(FillRequest {
                order_file_id: Some(Uuid::new_v4().to_string()),
                order_content: None,
                template_file_id: s.template_id.clone(),
            })
            .await;
        assert_eq!(missing.unwrap_err().code, "NOT_FOUND");

        let no_order = s
            .executor
            .start_fill(FillRequest {
                order_file_id: None,
                order_content: None,
                template_file_id: s.template_id.clone(),
            })
            .await;
        assert_eq!(no_order.unwrap_err().code, "VALIDATION_ERROR");
        assert!(s.executor.list_sessions().is_empty());
    }
}
