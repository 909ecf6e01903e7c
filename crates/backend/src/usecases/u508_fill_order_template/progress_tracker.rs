use contracts::usecases::common::UseCaseError;
use contracts::usecases::u508_fill_order_template::{
    FillProgress, FillStatus, PipelineStage, ProgressLogEntry, ProgressLogKind,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

struct SessionEntry {
    progress: FillProgress,
    /// Файл, который станет результатом после Completed
    output_file: PathBuf,
}

/// Трекер прогресса заполнения (in-memory, для real-time мониторинга)
#[derive(Clone)]
pub struct ProgressTracker {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

fn log_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Создать новую сессию в состоянии Pending
    pub fn create_session(&self, session_id: String, output_file: PathBuf) {
        let progress = FillProgress {
            session_id: session_id.clone(),
            status: FillStatus::Pending,
            stage: PipelineStage::Pending,
            percent: PipelineStage::Pending.percent(),
            message: "Ожидание запуска".to_string(),
            logs: Vec::new(),
            result_file: None,
            error: None,
            started_at: chrono::Utc::now(),
            completed_at: None,
        };
        self.write().insert(
            session_id,
            SessionEntry {
                progress,
                output_file,
            },
        );
    }

    /// Получить текущий прогресс сессии
    pub fn get_progress(&self, session_id: &str) -> Option<FillProgress> {
        self.read().get(session_id).map(|entry| entry.progress.clone())
    }

    /// Все сессии, новые первыми
    pub fn list_sessions(&self) -> Vec<FillProgress> {
        let mut sessions: Vec<_> = self.read().values().map(|e| e.progress.clone()).collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions
    }

    /// Переход на этап. Недопустимые переходы и события после конечного
    /// этапа игнорируются.
    pub fn record_stage(&self, session_id: &str, stage: PipelineStage, message: &str) {
        let mut sessions = self.write();
        let Some(entry) = sessions.get_mut(session_id) else {
            return;
        };
        let progress = &mut entry.progress;

        let repeated = progress.stage == stage && !stage.is_terminal();
        if !repeated && !progress.stage.can_advance_to(stage) {
            tracing::warn!(
                "Session {}: ignoring transition {:?} -> {:?}",
                session_id,
                progress.stage,
                stage
            );
            return;
        }

        progress.stage = stage;
        progress.status = stage.status();
        progress.percent = stage.percent();
        progress.message = message.to_string();
        progress.logs.push(ProgressLogEntry {
            time: log_time(),
            message: message.to_string(),
            percent: Some(stage.percent()),
            kind: ProgressLogKind::Progress,
        });

        if stage == PipelineStage::Completed {
            progress.result_file = Some(entry.output_file.display().to_string());
        }
        if stage.is_terminal() {
            progress.completed_at = Some(chrono::Utc::now());
        }
    }

    /// Дополнительная строка журнала без смены этапа
    pub fn record_detail(&self, session_id: &str, message: &str) {
        if let Some(entry) = self.write().get_mut(session_id) {
            entry.progress.logs.push(ProgressLogEntry {
                time: log_time(),
                message: message.to_string(),
                percent: None,
                kind: ProgressLogKind::Detail,
            });
        }
    }

    /// Перевести сессию в Failed с итоговой ошибкой
    pub fn fail_session(&self, session_id: &str, error: UseCaseError) {
        self.record_stage(session_id, PipelineStage::Failed, &error.message);
        if let Some(entry) = self.write().get_mut(session_id) {
            if entry.progress.stage == PipelineStage::Failed && entry.progress.error.is_none() {
                entry.progress.error = Some(error);
            }
        }
    }

    /// Путь результата, только для Completed
    pub fn result_file(&self, session_id: &str) -> Option<PathBuf> {
        self.read()
            .get(session_id)
            .filter(|entry| entry.progress.status == FillStatus::Completed)
            .map(|entry| entry.output_file.clone())
    }

    /// Удалить сессию; возвращает файл сессии для удаления с диска
    pub fn remove_session(&self, session_id: &str) -> Option<PathBuf> {
        self.write().remove(session_id).map(|entry| entry.output_file)
    }

    /// Удалить старые завершенные сессии (для очистки памяти)
    pub fn cleanup_old_sessions(&self, max_age_hours: i64) -> Vec<PathBuf> {
        let now = chrono::Utc::now();
        let mut removed = Vec::new();
        self.write().retain(|_, entry| {
            let keep = match entry.progress.completed_at {
                Some(completed_at) => (now - completed_at).num_hours() < max_age_hours,
                None => true, // Не удаляем активные сессии
            };
            if !keep {
                removed.push(entry.output_file.clone());
            }
            keep
        });
        removed
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with_session() -> ProgressTracker {
        let tracker = ProgressTracker::new();
        tracker.create_session("s1".to_string(), PathBuf::from("outputs/s1.xlsx"));
        tracker
    }

    #[test]
    fn test_completed_session_exposes_result() {
        let tracker = tracker_with_session();
        assert_eq!(tracker.result_file("s1"), None);

        for stage in [
            PipelineStage::Reading,
            PipelineStage::Parsing,
            PipelineStage::Mapping,
            PipelineStage::Standardizing,
            PipelineStage::Writing,
            PipelineStage::Completed,
        ] {
            tracker.record_stage("s1", stage, "step");
        }

        let progress = tracker.get_progress("s1").unwrap();
        assert_eq!(progress.status, FillStatus::Completed);
        assert_eq!(progress.percent, 100);
        assert_eq!(progress.logs.len(), 6);
        assert_eq!(progress.result_file.as_deref(), Some("outputs/s1.xlsx"));
        assert!(progress.completed_at.is_some());
        assert_eq!(tracker.result_file("s1"), Some(PathBuf::from("outputs/s1.xlsx")));
    }

    #[test]
    fn test_terminal_state_is_final() {
        let tracker = tracker_with_session();
        tracker.record_stage("s1", PipelineStage::Reading, "reading");
        tracker.fail_session("s1", UseCaseError::new("EMPTY_ORDER", "empty"));
        tracker.record_stage("s1", PipelineStage::Parsing, "late event");

        let progress = tracker.get_progress("s1").unwrap();
        assert_eq!(progress.status, FillStatus::Failed);
        assert_eq!(progress.percent, -1);
        assert_eq!(progress.error.map(|e| e.code), Some("EMPTY_ORDER".to_string()));
        assert_eq!(progress.result_file, None);
        assert_eq!(tracker.result_file("s1"), None);
    }

    #[test]
    fn test_stage_cannot_be_skipped() {
        let tracker = tracker_with_session();
        tracker.record_stage("s1", PipelineStage::Writing, "too early");
        assert_eq!(tracker.get_progress("s1").unwrap().stage, PipelineStage::Pending);
    }

    #[test]
    fn test_details_do_not_change_percent() {
        let tracker = tracker_with_session();
        tracker.record_stage("s1", PipelineStage::Reading, "reading");
        tracker.record_detail("s1", "2 blocks");
        let progress = tracker.get_progress("s1").unwrap();
        assert_eq!(progress.percent, 10);
        assert_eq!(progress.logs[1].kind, ProgressLogKind::Detail);
        assert_eq!(progress.logs[1].percent, None);
    }

    #[test]
    fn test_remove_and_cleanup() {
        let tracker = tracker_with_session();
        tracker.create_session("s2".to_string(), PathBuf::from("outputs/s2.xlsx"));
        tracker.fail_session("s2", UseCaseError::internal("boom"));

        assert!(tracker.cleanup_old_sessions(24).is_empty());
        assert_eq!(tracker.cleanup_old_sessions(0), vec![PathBuf::from("outputs/s2.xlsx")]);
        assert_eq!(tracker.list_sessions().len(), 1);

        assert_eq!(tracker.remove_session("s1"), Some(PathBuf::from("outputs/s1.xlsx")));
        assert!(tracker.get_progress("s1").is_none());
    }
}
