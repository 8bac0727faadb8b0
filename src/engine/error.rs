// ==========================================
// 机台生产排程 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 输入非法时在分配前拒绝，不产生任何排程行
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 机台没有任何待排产品（调用方可视为空排程）
    #[error("无待排产品: machine_no={machine_no}")]
    EmptyDemand { machine_no: String },

    /// 日产能必须大于 0
    #[error("日产能非法: product_code={product_code}, product_name={product_name}, daily_capacity={daily_capacity}")]
    InvalidCapacity {
        product_code: String,
        product_name: String,
        daily_capacity: i64,
    },

    /// 订单数量不能为负
    #[error("订单数量非法: product_code={product_code}, product_name={product_name}, order_quantity={order_quantity}")]
    InvalidQuantity {
        product_code: String,
        product_name: String,
        order_quantity: i64,
    },

    /// 日历策略没有任何工作日
    #[error("日历策略非法: {0}")]
    InvalidCalendar(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
