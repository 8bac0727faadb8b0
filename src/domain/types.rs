// ==========================================
// 机台生产排程 - 领域类型定义
// ==========================================
// 职责: 订单状态枚举、星期解析等基础类型
// ==========================================

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// OrderStatus - 生产订单状态
// ==========================================
// 存储: production_order.status (INTEGER)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,      // 0 - 待生产
    InProduction, // 1 - 生产中
    Completed,    // 2 - 已完成
    Cancelled,    // 3 - 已取消
}

impl OrderStatus {
    /// 参与排程的订单状态（待生产 + 生产中）
    pub const QUEUED: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::InProduction];

    /// 数据库存储码
    pub fn code(&self) -> i32 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::InProduction => 1,
            OrderStatus::Completed => 2,
            OrderStatus::Cancelled => 3,
        }
    }

    /// 从数据库存储码解析
    ///
    /// # 返回
    /// - Some(OrderStatus): 合法状态码
    /// - None: 未知状态码
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(OrderStatus::Pending),
            1 => Some(OrderStatus::InProduction),
            2 => Some(OrderStatus::Completed),
            3 => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// 是否参与排程
    pub fn is_queued(&self) -> bool {
        Self::QUEUED.contains(self)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "PENDING"),
            OrderStatus::InProduction => write!(f, "IN_PRODUCTION"),
            OrderStatus::Completed => write!(f, "COMPLETED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

// ==========================================
// 星期解析
// ==========================================

/// 解析星期缩写（MON/TUE/.../SUN，大小写不敏感）
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "MON" => Some(Weekday::Mon),
        "TUE" => Some(Weekday::Tue),
        "WED" => Some(Weekday::Wed),
        "THU" => Some(Weekday::Thu),
        "FRI" => Some(Weekday::Fri),
        "SAT" => Some(Weekday::Sat),
        "SUN" => Some(Weekday::Sun),
        _ => None,
    }
}

/// 星期缩写（与 parse_weekday 互逆）
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_code_mapping() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::InProduction,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(OrderStatus::from_code(9), None);
    }

    #[test]
    fn test_only_pending_and_in_production_are_queued() {
        assert!(OrderStatus::Pending.is_queued());
        assert!(OrderStatus::InProduction.is_queued());
        assert!(!OrderStatus::Completed.is_queued());
        assert!(!OrderStatus::Cancelled.is_queued());
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("sun"), Some(Weekday::Sun));
        assert_eq!(parse_weekday(" SAT "), Some(Weekday::Sat));
        assert_eq!(parse_weekday("sunday"), None);
        assert_eq!(parse_weekday(weekday_code(Weekday::Wed)), Some(Weekday::Wed));
    }
}
