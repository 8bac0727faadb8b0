// ==========================================
// 机台生产排程 - 排程领域模型
// ==========================================
// 职责: 排程作业、逐日排程行、排程结果、落库记录
// 红线: 0 <= remaining_quantity <= order_quantity
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::order::OrderProduct;

// ==========================================
// Job - 排程作业（一个产品在一台机台上的需求）
// ==========================================
// 生命周期: 单次排程调用内构建，分配完成后丢弃
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub product_name: String,    // 产品名称
    pub product_code: String,    // 产品编码
    pub order_quantity: i64,     // 订单数量（合同需求，不变）
    pub daily_capacity: i64,     // 日产能（> 0）
    pub sort_order: i32,         // 优先级
    pub remaining_quantity: i64, // 剩余数量（由分配器递减）
    pub order_id: Option<i64>,   // 关联订单ID
}

impl Job {
    /// 从订单产品构建作业，剩余数量初始化为订单数量
    pub fn from_product(product: &OrderProduct) -> Self {
        Self {
            product_name: product.product_name.clone(),
            product_code: product.product_code.clone(),
            order_quantity: product.order_quantity,
            daily_capacity: product.daily_capacity,
            sort_order: product.sort_order,
            remaining_quantity: product.order_quantity,
            order_id: product.order_id,
        }
    }

    /// 是否已全部排完
    pub fn is_satisfied(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// 排完整个订单所需的工作日数（向上取整）
    ///
    /// 日产能非正时返回 0，由构建器负责拒绝此类作业
    pub fn required_days(&self) -> i64 {
        if self.daily_capacity <= 0 || self.order_quantity <= 0 {
            return 0;
        }
        // 等价于向上取整，订单数量接近 i64::MAX 时也不会溢出
        (self.order_quantity - 1) / self.daily_capacity + 1
    }

    /// 领取一天的产量：min(剩余数量, 日产能)，并递减剩余数量
    pub(crate) fn take_daily(&mut self) -> i64 {
        let assigned = self.remaining_quantity.min(self.daily_capacity);
        self.remaining_quantity -= assigned;
        assigned
    }
}

// ==========================================
// ScheduleDay - 逐日排程行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDay {
    pub day_number: i32,           // 第几个工作日（从1开始，休息日不计）
    pub schedule_date: NaiveDate,  // 排程日期（不会落在休息日）
    pub product_name: String,      // 产品名称
    pub product_code: String,      // 产品编码
    pub production_quantity: i64,  // 当天排产数量
    pub daily_capacity: i64,       // 产品日产能
    pub remaining_quantity: i64,   // 当天排产后的剩余数量
    pub order_id: Option<i64>,     // 关联订单ID
}

// ==========================================
// ScheduleResult - 单台机台的排程结果
// ==========================================
// 用途: 引擎输出，交给 ScheduleRepository::regenerate 落库
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub machine_no: String,
    pub schedule_start_date: NaiveDate,
    pub days: Vec<ScheduleDay>,
    pub can_complete_target: bool,
    pub required_days: i64,           // 不限天数时的计划长度
    pub horizon_days: Option<usize>,  // 本次排程使用的天数上限（None 表示不限）

    // ===== 透传的设备身份 =====
    pub equipment_id: Option<i64>,
    pub equipment_no: Option<String>,
}

impl ScheduleResult {
    /// 空排程（无需求）
    pub fn empty(machine_no: &str, schedule_start_date: NaiveDate) -> Self {
        Self {
            machine_no: machine_no.to_string(),
            schedule_start_date,
            days: Vec::new(),
            can_complete_target: true,
            required_days: 0,
            horizon_days: None,
            equipment_id: None,
            equipment_no: None,
        }
    }

    /// 某产品的排产总量
    pub fn total_for_product(&self, product_code: &str) -> i64 {
        self.days
            .iter()
            .filter(|d| d.product_code == product_code)
            .map(|d| d.production_quantity)
            .sum()
    }

    /// 最后一个排程日期
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.days.last().map(|d| d.schedule_date)
    }
}

// ==========================================
// ScheduleRecord - production_schedule 表记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRecord {
    pub id: i64,
    pub machine_no: String,
    pub equipment_id: Option<i64>,
    pub equipment_no: Option<String>,
    pub schedule_date: NaiveDate,
    pub day_number: i32,
    pub product_code: String,
    pub product_name: String,
    pub production_quantity: i64,
    pub daily_capacity: i64,
    pub remaining_quantity: i64,
    pub order_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

impl ScheduleRecord {
    /// 转换为逐日排程行
    pub fn to_day(&self) -> ScheduleDay {
        ScheduleDay {
            day_number: self.day_number,
            schedule_date: self.schedule_date,
            product_name: self.product_name.clone(),
            product_code: self.product_code.clone(),
            production_quantity: self.production_quantity,
            daily_capacity: self.daily_capacity,
            remaining_quantity: self.remaining_quantity,
            order_id: self.order_id,
        }
    }
}

// ==========================================
// ScheduleRun - production_schedule_run 表记录
// ==========================================
// 用途: 记录最近一次重排的起始日期与可完成标志
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRun {
    pub machine_no: String,
    pub schedule_start_date: NaiveDate,
    pub can_complete_target: bool,
    pub horizon_days: Option<i64>,
    pub required_days: i64,
    pub generated_at: NaiveDateTime,
}

// ==========================================
// ScheduleQuery - 排程查询条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleQuery {
    pub machine_no: Option<String>,     // 机台号（空白视为不过滤）
    pub start_date: Option<NaiveDate>,  // 只看该日期及之后的排程
}

impl ScheduleQuery {
    pub fn for_machine(machine_no: impl Into<String>) -> Self {
        Self {
            machine_no: Some(machine_no.into()),
            start_date: None,
        }
    }

    pub fn starting(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// 规范化后的机台号过滤条件
    pub fn machine_filter(&self) -> Option<&str> {
        self.machine_no
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}
