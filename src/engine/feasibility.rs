// ==========================================
// 机台生产排程 - 可完成性判定
// ==========================================
// 口径: can_complete_target 只由队列是否在天数上限内排空决定
//       不比较交期（没有交期输入）
// ==========================================

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::allocator::Allocation;
use crate::engine::calendar::Horizon;
use crate::engine::demand_queue::DemandQueue;

/// 可完成性报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityReport {
    /// 不限天数时计划所需工作日数
    pub required_days: i64,
    /// 本次使用的天数上限
    pub horizon_days: Option<usize>,
    /// 计划是否落在天数上限之内
    pub fits_horizon: bool,
    pub can_complete_target: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FeasibilityChecker;

impl FeasibilityChecker {
    pub fn new() -> Self {
        Self
    }

    /// 分配前预判
    ///
    /// 每个作业需要 ceil(订单数量 / 日产能) 个工作日，且作业之间不共享工作日，
    /// 因此总和就是不限天数时的计划长度
    pub fn evaluate(&self, queue: &DemandQueue, horizon: Horizon) -> FeasibilityReport {
        let required_days = queue.required_days();
        let fits_horizon = match horizon.limit() {
            Some(limit) => required_days <= limit as i64,
            None => true,
        };

        FeasibilityReport {
            required_days,
            horizon_days: horizon.limit(),
            fits_horizon,
            can_complete_target: fits_horizon,
        }
    }

    /// 以实际分配结果为准修正报告
    pub fn reconcile(&self, report: &mut FeasibilityReport, allocation: &Allocation) {
        if report.can_complete_target != allocation.exhausted {
            warn!(
                predicted = report.can_complete_target,
                exhausted = allocation.exhausted,
                required_days = report.required_days,
                "可完成性预判与分配结果不一致，以分配结果为准"
            );
        }
        report.fits_horizon = allocation.exhausted;
        report.can_complete_target = allocation.exhausted;
    }
}
