// ==========================================
// 机台生产排程 - 工作日历遍历
// ==========================================
// 职责: 从起始日期起按天前进，跳过休息日，产出有序工作日序列
// 输入: 起始日期 + 日历策略 + 天数上限
// 输出: 惰性、可重启的日期迭代器（无外部状态）
// ==========================================

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::types::weekday_code;
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// Horizon - 排程天数上限
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    /// 不限天数（可完成性判定使用）
    Unbounded,
    /// 最多考虑 N 个工作日（展示/导出使用）
    WorkingDays(usize),
}

impl Horizon {
    /// 从可选天数构造
    pub fn from_limit(limit: Option<usize>) -> Self {
        match limit {
            Some(days) => Horizon::WorkingDays(days),
            None => Horizon::Unbounded,
        }
    }

    /// 天数上限（None 表示不限）
    pub fn limit(&self) -> Option<usize> {
        match self {
            Horizon::Unbounded => None,
            Horizon::WorkingDays(days) => Some(*days),
        }
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon::Unbounded
    }
}

// ==========================================
// CalendarPolicy - 日历策略
// ==========================================
// 默认: 仅星期天休息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarPolicy {
    // 按 num_days_from_monday 索引，true 表示休息
    rest_mask: [bool; 7],
}

impl CalendarPolicy {
    /// 仅星期天休息
    pub fn sunday_rest() -> Self {
        let mut rest_mask = [false; 7];
        rest_mask[Weekday::Sun.num_days_from_monday() as usize] = true;
        Self { rest_mask }
    }

    /// 按休息日列表构造
    ///
    /// # 返回
    /// - Ok(CalendarPolicy): 至少保留一个工作日
    /// - Err(EngineError::InvalidCalendar): 一周七天全部休息
    pub fn with_rest_days(rest_days: &[Weekday]) -> EngineResult<Self> {
        let mut rest_mask = [false; 7];
        for day in rest_days {
            rest_mask[day.num_days_from_monday() as usize] = true;
        }

        if rest_mask.iter().all(|rest| *rest) {
            return Err(EngineError::InvalidCalendar(
                "一周七天均为休息日，无法排程".to_string(),
            ));
        }

        Ok(Self { rest_mask })
    }

    /// 是否为工作日
    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.rest_mask[date.weekday().num_days_from_monday() as usize]
    }

    /// 休息日列表（周一到周日顺序）
    pub fn rest_days(&self) -> Vec<Weekday> {
        let mut days = Vec::new();
        let mut day = Weekday::Mon;
        for rest in self.rest_mask {
            if rest {
                days.push(day);
            }
            day = day.succ();
        }
        days
    }

    /// 休息日编码，如 "SAT,SUN"
    pub fn rest_days_code(&self) -> String {
        self.rest_days()
            .into_iter()
            .map(weekday_code)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// 从起始日期遍历工作日
    ///
    /// 起始日期为休息日时，从下一个工作日开始
    pub fn walk(&self, start: NaiveDate, horizon: Horizon) -> WorkingDays {
        WorkingDays {
            policy: *self,
            cursor: Some(start),
            remaining: horizon.limit(),
        }
    }

    /// 起始日期起的前 count 个工作日（导出列头使用）
    pub fn working_dates(&self, start: NaiveDate, count: usize) -> Vec<NaiveDate> {
        self.walk(start, Horizon::WorkingDays(count)).collect()
    }
}

impl Default for CalendarPolicy {
    fn default() -> Self {
        Self::sunday_rest()
    }
}

// ==========================================
// WorkingDays - 工作日迭代器
// ==========================================
#[derive(Debug, Clone)]
pub struct WorkingDays {
    policy: CalendarPolicy,
    cursor: Option<NaiveDate>,
    remaining: Option<usize>,
}

impl Iterator for WorkingDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.remaining == Some(0) {
            return None;
        }

        // 策略至少保留一个工作日，7 步之内必然命中
        loop {
            let date = self.cursor?;
            self.cursor = date.succ_opt();

            if self.policy.is_working_day(date) {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                }
                return Some(date);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(n) => (0, Some(n)),
            None => (0, None),
        }
    }
}
