// ==========================================
// 机台生产排程 - 产能分配器
// ==========================================
// 职责: 按工作日序列逐日分配需求队列
// 规则:
// 1) 每个工作日只排一个产品，按该产品日产能生产
// 2) 当天排产 = min(剩余数量, 日产能)
// 3) 作业排完后，下一个工作日才切换到下一个作业（不拆分当日产能）
// 4) 队列排空或工作日序列耗尽时停止
// ==========================================

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::schedule::ScheduleDay;
use crate::engine::demand_queue::DemandQueue;

/// 分配结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    pub days: Vec<ScheduleDay>,
    /// 队列是否已排空
    pub exhausted: bool,
}

// ==========================================
// Allocator - 产能分配器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct Allocator {
    // 无状态引擎
}

impl Allocator {
    pub fn new() -> Self {
        Self {}
    }

    /// 分配需求队列
    ///
    /// # 参数
    /// - `queue`: 需求队列（作业剩余数量会被原地递减）
    /// - `calendar`: 工作日序列（有界或无界）
    ///
    /// # 返回
    /// 逐日排程行 + 队列是否排空
    ///
    /// # 终止性
    /// 日产能 > 0 保证每个工作日至少减少 1 个单位，无界序列也必然结束
    pub fn allocate<I>(&self, queue: &mut DemandQueue, calendar: I) -> Allocation
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut days = Vec::new();
        let mut day_number: i32 = 0;

        for schedule_date in calendar {
            let Some(job) = queue.current() else {
                break;
            };

            let production_quantity = job.take_daily();
            day_number += 1;

            days.push(ScheduleDay {
                day_number,
                schedule_date,
                product_name: job.product_name.clone(),
                product_code: job.product_code.clone(),
                production_quantity,
                daily_capacity: job.daily_capacity,
                remaining_quantity: job.remaining_quantity,
                order_id: job.order_id,
            });
        }

        let exhausted = queue.is_exhausted();
        debug!(days = days.len(), exhausted, "分配完成");

        Allocation { days, exhausted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderProduct;
    use crate::engine::calendar::{CalendarPolicy, Horizon};
    use chrono::{Datelike, Weekday};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn queue(products: &[OrderProduct]) -> DemandQueue {
        DemandQueue::build("M01", products).unwrap()
    }

    #[test]
    fn test_allocate_reference_plan() {
        let mut q = queue(&[
            OrderProduct::new("A", "P-A", 25, 10, 1),
            OrderProduct::new("B", "P-B", 5, 5, 2),
        ]);
        let calendar = CalendarPolicy::default().walk(d(2024, 6, 1), Horizon::Unbounded);
        let allocation = Allocator::new().allocate(&mut q, calendar);

        assert!(allocation.exhausted);
        let rows: Vec<_> = allocation
            .days
            .iter()
            .map(|r| {
                (
                    r.day_number,
                    r.schedule_date,
                    r.product_name.as_str(),
                    r.production_quantity,
                    r.remaining_quantity,
                )
            })
            .collect();
        assert_eq!(
            rows,
            vec![
                (1, d(2024, 6, 1), "A", 10, 15),
                (2, d(2024, 6, 3), "A", 10, 5),
                (3, d(2024, 6, 4), "A", 5, 0),
                (4, d(2024, 6, 5), "B", 5, 0),
            ]
        );
    }

    #[test]
    fn test_no_capacity_carry_over_between_jobs() {
        // A 最后一天只排 1 个，剩余产能不会挪给 B
        let mut q = queue(&[
            OrderProduct::new("A", "P-A", 11, 10, 1),
            OrderProduct::new("B", "P-B", 4, 4, 2),
        ]);
        let calendar = CalendarPolicy::default().walk(d(2024, 6, 3), Horizon::Unbounded);
        let allocation = Allocator::new().allocate(&mut q, calendar);

        assert_eq!(allocation.days.len(), 3);
        assert_eq!(allocation.days[1].product_code, "P-A");
        assert_eq!(allocation.days[1].production_quantity, 1);
        assert_eq!(allocation.days[2].product_code, "P-B");
    }

    #[test]
    fn test_bounded_horizon_leaves_queue_unfinished() {
        let mut q = queue(&[OrderProduct::new("A", "P-A", 100, 10, 1)]);
        let calendar = CalendarPolicy::default().walk(d(2024, 6, 1), Horizon::WorkingDays(4));
        let allocation = Allocator::new().allocate(&mut q, calendar);

        assert!(!allocation.exhausted);
        assert_eq!(allocation.days.len(), 4);
        assert_eq!(allocation.days.last().map(|r| r.remaining_quantity), Some(60));
    }

    #[test]
    fn test_horizon_exactly_fits_plan() {
        let mut q = queue(&[OrderProduct::new("A", "P-A", 30, 10, 1)]);
        let calendar = CalendarPolicy::default().walk(d(2024, 6, 1), Horizon::WorkingDays(3));
        let allocation = Allocator::new().allocate(&mut q, calendar);
        assert!(allocation.exhausted);
        assert_eq!(allocation.days.len(), 3);
    }

    #[test]
    fn test_zero_quantity_job_emits_no_row() {
        let mut q = queue(&[
            OrderProduct::new("A", "P-A", 0, 10, 1),
            OrderProduct::new("B", "P-B", 3, 10, 2),
        ]);
        let calendar = CalendarPolicy::default().walk(d(2024, 6, 3), Horizon::Unbounded);
        let allocation = Allocator::new().allocate(&mut q, calendar);

        assert_eq!(allocation.days.len(), 1);
        assert_eq!(allocation.days[0].product_code, "P-B");
        assert_eq!(allocation.days[0].day_number, 1);
    }

    #[test]
    fn test_day_numbers_contiguous_across_sundays() {
        let mut q = queue(&[OrderProduct::new("A", "P-A", 200, 7, 1)]);
        let calendar = CalendarPolicy::default().walk(d(2024, 1, 1), Horizon::Unbounded);
        let allocation = Allocator::new().allocate(&mut q, calendar);

        assert_eq!(allocation.days.len(), 29);
        for (idx, row) in allocation.days.iter().enumerate() {
            assert_eq!(row.day_number, idx as i32 + 1);
            assert_ne!(row.schedule_date.weekday(), Weekday::Sun);
        }
        let total: i64 = allocation.days.iter().map(|r| r.production_quantity).sum();
        assert_eq!(total, 200);
    }
}
