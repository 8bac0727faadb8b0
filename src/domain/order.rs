// ==========================================
// 机台生产排程 - 生产订单领域模型
// ==========================================
// 职责: 订单与订单产品（排程需求来源）
// 说明: 订单的增删改属于外部协作方，本模块只读
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::OrderStatus;

// ==========================================
// ProductionOrder - 生产订单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub id: i64,                    // 订单ID
    pub order_no: String,           // 订单编号
    pub machine_no: String,         // 机台号
    pub status: OrderStatus,        // 订单状态
    pub create_time: NaiveDateTime, // 创建时间
}

// ==========================================
// OrderProduct - 订单产品（一条排程需求）
// ==========================================
// 用途: 需求队列构建器的输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProduct {
    pub product_name: String,  // 产品名称
    pub product_code: String,  // 产品编码
    pub order_quantity: i64,   // 订单数量
    pub daily_capacity: i64,   // 日产能
    pub sort_order: i32,       // 排序（越小越优先）
    pub order_id: Option<i64>, // 关联订单ID
}

impl OrderProduct {
    /// 构造不关联订单的产品需求
    pub fn new(
        product_name: impl Into<String>,
        product_code: impl Into<String>,
        order_quantity: i64,
        daily_capacity: i64,
        sort_order: i32,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            product_code: product_code.into(),
            order_quantity,
            daily_capacity,
            sort_order,
            order_id: None,
        }
    }

    /// 关联订单ID
    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }
}
