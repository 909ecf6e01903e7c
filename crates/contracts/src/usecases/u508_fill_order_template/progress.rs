use crate::usecases::common::UseCaseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Прогресс заполнения шаблона (для real-time мониторинга)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillProgress {
    #[serde(rename = "sessionId")]
    pub session_id: String,

    pub status: FillStatus,

    /// Текущий этап конвейера
    pub stage: PipelineStage,

    /// 0..=100, либо -1 при ошибке
    pub percent: i32,

    /// Последнее сообщение о прогрессе
    pub message: String,

    #[serde(default)]
    pub logs: Vec<ProgressLogEntry>,

    /// Путь к заполненному файлу (только для Completed)
    #[serde(rename = "resultFile")]
    pub result_file: Option<String>,

    /// Итоговая ошибка (только для Failed)
    pub error: Option<UseCaseError>,

    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,

    #[serde(rename = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Статус сессии. Completed и Failed являются конечными.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FillStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl FillStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, FillStatus::Completed | FillStatus::Failed)
    }
}

/// Этапы конвейера:
/// `Pending → Reading → Parsing → Mapping → Standardizing → Writing → Completed`,
/// `Failed` достижим из любого неконечного этапа.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Pending,
    Reading,
    Parsing,
    Mapping,
    Standardizing,
    Writing,
    Completed,
    Failed,
}

impl PipelineStage {
    /// Процент, сообщаемый наблюдателю при входе в этап
    pub fn percent(self) -> i32 {
        match self {
            PipelineStage::Pending => 0,
            PipelineStage::Reading => 10,
            PipelineStage::Parsing => 20,
            PipelineStage::Mapping => 40,
            PipelineStage::Standardizing => 60,
            PipelineStage::Writing => 80,
            PipelineStage::Completed => 100,
            PipelineStage::Failed => -1,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Completed | PipelineStage::Failed)
    }

    /// Следующий этап при успешном выполнении текущего
    pub fn successor(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Pending => Some(PipelineStage::Reading),
            PipelineStage::Reading => Some(PipelineStage::Parsing),
            PipelineStage::Parsing => Some(PipelineStage::Mapping),
            PipelineStage::Mapping => Some(PipelineStage::Standardizing),
            PipelineStage::Standardizing => Some(PipelineStage::Writing),
            PipelineStage::Writing => Some(PipelineStage::Completed),
            PipelineStage::Completed | PipelineStage::Failed => None,
        }
    }

    pub fn can_advance_to(self, next: PipelineStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == PipelineStage::Failed || self.successor() == Some(next)
    }

    pub fn status(self) -> FillStatus {
        match self {
            PipelineStage::Pending => FillStatus::Pending,
            PipelineStage::Completed => FillStatus::Completed,
            PipelineStage::Failed => FillStatus::Failed,
            _ => FillStatus::Running,
        }
    }
}

/// Запись журнала сессии
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressLogEntry {
    /// Время в формате HH:MM:SS
    pub time: String,
    pub message: String,
    /// Есть только у записей о смене этапа
    pub percent: Option<i32>,
    pub kind: ProgressLogKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressLogKind {
    /// Смена этапа
    Progress,
    /// Подробность внутри этапа (пропущенная строка, ненайденный магазин и т.п.)
    Detail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_chain_reaches_completed() {
        let mut stage = PipelineStage::Pending;
        let mut visited = vec![stage];
        while let Some(next) = stage.successor() {
            assert!(stage.can_advance_to(next));
            stage = next;
            visited.push(stage);
        }
        assert_eq!(stage, PipelineStage::Completed);
        assert_eq!(visited.len(), 7);
        assert_eq!(stage.percent(), 100);
    }

    #[test]
    fn test_failed_reachable_from_non_terminal_only() {
        assert!(PipelineStage::Pending.can_advance_to(PipelineStage::Failed));
        assert!(PipelineStage::Writing.can_advance_to(PipelineStage::Failed));
        assert!(!PipelineStage::Completed.can_advance_to(PipelineStage::Failed));
        assert!(!PipelineStage::Failed.can_advance_to(PipelineStage::Pending));
        assert_eq!(PipelineStage::Failed.percent(), -1);
    }

    #[test]
    fn test_stage_cannot_skip() {
        assert!(!PipelineStage::Reading.can_advance_to(PipelineStage::Mapping));
        assert!(!PipelineStage::Mapping.can_advance_to(PipelineStage::Parsing));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&PipelineStage::Standardizing.status()).unwrap();
        assert_eq!(json, "\"running\"");
    }
}
