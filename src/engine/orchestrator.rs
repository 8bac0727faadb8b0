// ==========================================
// 机台生产排程 - 引擎编排器
// ==========================================
// 用途: 串联 需求队列构建 → 可完成性预判 → 逐日分配 → 结果组装
// 说明: 纯计算，无 I/O；不同机台的调用互不影响，可并行
// ==========================================

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::domain::equipment::EquipmentInfo;
use crate::domain::order::OrderProduct;
use crate::domain::schedule::ScheduleResult;
use crate::engine::allocator::Allocator;
use crate::engine::calendar::{CalendarPolicy, Horizon};
use crate::engine::demand_queue::DemandQueue;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::feasibility::{FeasibilityChecker, FeasibilityReport};

// ==========================================
// ScheduleRequest - 排程请求
// ==========================================
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub machine_no: String,
    pub schedule_start_date: NaiveDate,
    pub products: Vec<OrderProduct>,
    pub equipment: Option<EquipmentInfo>,
}

impl ScheduleRequest {
    pub fn new(
        machine_no: impl Into<String>,
        schedule_start_date: NaiveDate,
        products: Vec<OrderProduct>,
    ) -> Self {
        Self {
            machine_no: machine_no.into(),
            schedule_start_date,
            products,
            equipment: None,
        }
    }

    pub fn with_equipment(mut self, equipment: Option<EquipmentInfo>) -> Self {
        self.equipment = equipment;
        self
    }
}

// ==========================================
// ScheduleEngine - 排程引擎
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ScheduleEngine {
    calendar: CalendarPolicy,
    checker: FeasibilityChecker,
    allocator: Allocator,
}

impl ScheduleEngine {
    /// 创建引擎
    ///
    /// # 参数
    /// - calendar: 日历策略（休息日）
    pub fn new(calendar: CalendarPolicy) -> Self {
        Self {
            calendar,
            checker: FeasibilityChecker::new(),
            allocator: Allocator::new(),
        }
    }

    pub fn calendar(&self) -> &CalendarPolicy {
        &self.calendar
    }

    /// 计算单台机台的排程
    ///
    /// # 参数
    /// - `request`: 排程请求
    /// - `horizon`: 工作日上限（Unbounded 表示排到队列排空）
    ///
    /// # 返回
    /// - Ok(ScheduleResult): 排程结果；无待排产品时为空结果且 can_complete_target = true
    /// - Err(InvalidCapacity / InvalidQuantity): 输入非法，未产生任何排程行
    #[instrument(skip(self, request, horizon), fields(
        machine_no = %request.machine_no,
        start_date = %request.schedule_start_date,
        products_count = request.products.len(),
        horizon = ?horizon.limit()
    ))]
    pub fn plan(&self, request: &ScheduleRequest, horizon: Horizon) -> EngineResult<ScheduleResult> {
        let mut queue = match DemandQueue::build(&request.machine_no, &request.products) {
            Ok(queue) => queue,
            Err(EngineError::EmptyDemand { .. }) => {
                info!("无待排产品，生成空排程");
                let mut result = ScheduleResult::empty(&request.machine_no, request.schedule_start_date);
                result.horizon_days = horizon.limit();
                self.attach_equipment(&mut result, request.equipment.as_ref());
                return Ok(result);
            }
            Err(e) => {
                warn!(error = %e, "需求队列构建失败");
                return Err(e);
            }
        };

        let mut report = self.checker.evaluate(&queue, horizon);

        let calendar = self.calendar.walk(request.schedule_start_date, horizon);
        let allocation = self.allocator.allocate(&mut queue, calendar);
        self.checker.reconcile(&mut report, &allocation);

        info!(
            days = allocation.days.len(),
            required_days = report.required_days,
            can_complete_target = report.can_complete_target,
            "排程计算完成"
        );

        let mut result = ScheduleResult {
            machine_no: request.machine_no.clone(),
            schedule_start_date: request.schedule_start_date,
            days: allocation.days,
            can_complete_target: report.can_complete_target,
            required_days: report.required_days,
            horizon_days: report.horizon_days,
            equipment_id: None,
            equipment_no: None,
        };
        self.attach_equipment(&mut result, request.equipment.as_ref());

        Ok(result)
    }

    /// 仅判定可完成性（不限天数，不生成排程行）
    pub fn check_feasibility(&self, request: &ScheduleRequest) -> EngineResult<FeasibilityReport> {
        match DemandQueue::build(&request.machine_no, &request.products) {
            Ok(queue) => Ok(self.checker.evaluate(&queue, Horizon::Unbounded)),
            Err(EngineError::EmptyDemand { .. }) => Ok(FeasibilityReport {
                required_days: 0,
                horizon_days: None,
                fits_horizon: true,
                can_complete_target: true,
            }),
            Err(e) => Err(e),
        }
    }

    fn attach_equipment(&self, result: &mut ScheduleResult, equipment: Option<&EquipmentInfo>) {
        if let Some(equipment) = equipment {
            result.equipment_id = Some(equipment.equipment_id);
            result.equipment_no = Some(equipment.equipment_no.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_plan_empty_roster_is_vacuously_complete() {
        let engine = ScheduleEngine::default();
        let result = engine
            .plan(&ScheduleRequest::new("M01", d(2024, 6, 1), vec![]), Horizon::Unbounded)
            .unwrap();
        assert!(result.days.is_empty());
        assert!(result.can_complete_target);
    }

    #[test]
    fn test_plan_invalid_capacity_is_rejected() {
        let engine = ScheduleEngine::default();
        let request = ScheduleRequest::new(
            "M01",
            d(2024, 6, 1),
            vec![OrderProduct::new("A", "P-A", 10, 0, 1)],
        );
        assert!(matches!(
            engine.plan(&request, Horizon::Unbounded),
            Err(EngineError::InvalidCapacity { .. })
        ));
        assert!(engine.check_feasibility(&request).is_err());
    }

    #[test]
    fn test_plan_passes_equipment_identity_through() {
        let engine = ScheduleEngine::default();
        let equipment = EquipmentInfo {
            equipment_id: 42,
            equipment_no: "EQ-42".to_string(),
            machine_no: "M01".to_string(),
            ..Default::default()
        };
        let request = ScheduleRequest::new(
            "M01",
            d(2024, 6, 1),
            vec![OrderProduct::new("A", "P-A", 10, 10, 1)],
        )
        .with_equipment(Some(equipment));

        let result = engine.plan(&request, Horizon::Unbounded).unwrap();
        assert_eq!(result.equipment_id, Some(42));
        assert_eq!(result.equipment_no.as_deref(), Some("EQ-42"));
        assert_eq!(result.days.len(), 1);
    }

    #[test]
    fn test_bounded_plan_reports_incomplete() {
        let engine = ScheduleEngine::default();
        let request = ScheduleRequest::new(
            "M01",
            d(2024, 6, 1),
            vec![OrderProduct::new("A", "P-A", 500, 10, 1)],
        );
        let result = engine.plan(&request, Horizon::WorkingDays(30)).unwrap();
        assert_eq!(result.days.len(), 30);
        assert!(!result.can_complete_target);
        assert_eq!(result.required_days, 50);
        assert_eq!(result.horizon_days, Some(30));

        let report = engine.check_feasibility(&request).unwrap();
        assert!(report.can_complete_target);
    }
}
