// ==========================================
// 机台生产排程 - 排程事件
// ==========================================
// 职责: 重排/删除落库后通知下游（看板刷新、报表缓存等）
// 说明: 这里只定义 trait，适配器由接入方实现；发布失败不影响排程结果
// ==========================================

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::schedule::ScheduleResult;

pub type PublishResult = Result<String, Box<dyn Error + Send + Sync>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEventType {
    /// 机台排程已整体重排
    ScheduleRegenerated,
    /// 机台排程（或其中一行）已删除
    ScheduleDeleted,
}

impl fmt::Display for ScheduleEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScheduleEventType::ScheduleRegenerated => "ScheduleRegenerated",
            ScheduleEventType::ScheduleDeleted => "ScheduleDeleted",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEvent {
    pub machine_no: String,
    pub event_type: ScheduleEventType,
    /// 触发事件的操作名
    pub source: String,
    /// 写入或删除的排程行数
    pub rows_affected: usize,
    /// 受影响的日期范围（None 表示整台机台）
    pub affected_date_range: Option<(NaiveDate, NaiveDate)>,
}

impl ScheduleEvent {
    /// 重排完成事件，日期范围取新排程的首尾日期
    pub fn regenerated(result: &ScheduleResult, source: &str) -> Self {
        let affected_date_range = match (result.days.first(), result.last_date()) {
            (Some(first), Some(last)) => Some((first.schedule_date, last)),
            _ => None,
        };
        Self {
            machine_no: result.machine_no.clone(),
            event_type: ScheduleEventType::ScheduleRegenerated,
            source: source.to_string(),
            rows_affected: result.days.len(),
            affected_date_range,
        }
    }

    /// 删除事件
    pub fn deleted(machine_no: &str, rows_affected: usize, source: &str) -> Self {
        Self {
            machine_no: machine_no.to_string(),
            event_type: ScheduleEventType::ScheduleDeleted,
            source: source.to_string(),
            rows_affected,
            affected_date_range: None,
        }
    }

    pub fn with_date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.affected_date_range = Some((from, to));
        self
    }
}

/// 排程事件发布者
pub trait ScheduleEventPublisher: Send + Sync {
    /// # 返回
    /// - `Ok(task_id)`: 下游任务 ID，不支持时为空字符串
    fn publish(&self, event: ScheduleEvent) -> PublishResult;
}

/// 只写调试日志的发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl ScheduleEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: ScheduleEvent) -> PublishResult {
        tracing::debug!(
            machine_no = %event.machine_no,
            event_type = %event.event_type,
            "未接入下游，跳过排程事件"
        );
        Ok(String::new())
    }
}

/// 可选发布者（未配置时退化为 NoOp）
#[derive(Clone, Default)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn ScheduleEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn new(inner: Option<Arc<dyn ScheduleEventPublisher>>) -> Self {
        Self { inner }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    pub fn publish(&self, event: ScheduleEvent) -> PublishResult {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => NoOpEventPublisher.publish(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::ScheduleDay;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<ScheduleEvent>>,
    }

    impl ScheduleEventPublisher for Recording {
        fn publish(&self, event: ScheduleEvent) -> PublishResult {
            self.events.lock().unwrap().push(event);
            Ok("task-1".to_string())
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(day_number: i32, date: NaiveDate) -> ScheduleDay {
        ScheduleDay {
            day_number,
            schedule_date: date,
            product_name: "A".to_string(),
            product_code: "P-A".to_string(),
            production_quantity: 5,
            daily_capacity: 5,
            remaining_quantity: 0,
            order_id: None,
        }
    }

    #[test]
    fn test_regenerated_event_spans_plan_dates() {
        let mut result = ScheduleResult::empty("M01", d(2024, 6, 1));
        let event = ScheduleEvent::regenerated(&result, "test");
        assert_eq!(event.affected_date_range, None);
        assert_eq!(event.rows_affected, 0);

        result.days = vec![row(1, d(2024, 6, 1)), row(2, d(2024, 6, 3))];
        let event = ScheduleEvent::regenerated(&result, "test");
        assert_eq!(event.affected_date_range, Some((d(2024, 6, 1), d(2024, 6, 3))));
        assert_eq!(event.rows_affected, 2);
        assert_eq!(event.event_type.to_string(), "ScheduleRegenerated");
    }

    #[test]
    fn test_optional_publisher_forwards_when_configured() {
        let recording = Arc::new(Recording::default());
        let publisher = OptionalEventPublisher::new(Some(recording.clone()));
        assert!(publisher.is_configured());

        let event = ScheduleEvent::deleted("M01", 3, "test");
        assert_eq!(publisher.publish(event).unwrap(), "task-1");
        assert_eq!(recording.events.lock().unwrap()[0].rows_affected, 3);
    }

    #[test]
    fn test_unconfigured_publisher_is_noop() {
        let publisher = OptionalEventPublisher::default();
        assert!(!publisher.is_configured());
        let event = ScheduleEvent::deleted("M01", 1, "test");
        assert_eq!(publisher.publish(event).unwrap(), "");
    }
}
