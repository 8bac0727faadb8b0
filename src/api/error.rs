// ==========================================
// 机台生产排程 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换 Repository / Engine 错误为用户友好的错误消息
// 约束: 所有错误信息必须包含显式原因
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 排程输入错误
    // ==========================================
    /// 日产能非法（<= 0）
    #[error("日产能非法: product_code={product_code}, product_name={product_name}, daily_capacity={daily_capacity}")]
    InvalidCapacity {
        product_code: String,
        product_name: String,
        daily_capacity: i64,
    },

    /// 订单数量非法（< 0）
    #[error("订单数量非法: product_code={product_code}, product_name={product_name}, order_quantity={order_quantity}")]
    InvalidQuantity {
        product_code: String,
        product_name: String,
        order_quantity: i64,
    },

    #[error("日历配置非法: {0}")]
    InvalidCalendar(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导出错误
    // ==========================================
    #[error("导出失败: {0}")]
    ExportError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidCapacity {
                product_code,
                product_name,
                daily_capacity,
            } => ApiError::InvalidCapacity {
                product_code,
                product_name,
                daily_capacity,
            },
            EngineError::InvalidQuantity {
                product_code,
                product_name,
                order_quantity,
            } => ApiError::InvalidQuantity {
                product_code,
                product_name,
                order_quantity,
            },
            EngineError::InvalidCalendar(msg) => ApiError::InvalidCalendar(msg),
            // 编排器已把空名单转换为空排程，这里只在直接调用队列构建时出现
            EngineError::EmptyDemand { machine_no } => {
                ApiError::NotFound(format!("机台{}无待排产品", machine_no))
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "ProductionSchedule".to_string(),
            id: "42".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("ProductionSchedule"));
                assert!(msg.contains("42"));
            }
            _ => panic!("Expected NotFound"),
        }

        let api_err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(api_err, ApiError::DatabaseConnectionError(_)));
    }

    #[test]
    fn test_engine_error_conversion() {
        let api_err: ApiError = EngineError::InvalidCapacity {
            product_code: "P-1".to_string(),
            product_name: "齿轮".to_string(),
            daily_capacity: 0,
        }
        .into();
        match api_err {
            ApiError::InvalidCapacity {
                product_code,
                daily_capacity,
                ..
            } => {
                assert_eq!(product_code, "P-1");
                assert_eq!(daily_capacity, 0);
            }
            _ => panic!("Expected InvalidCapacity"),
        }

        let msg = ApiError::from(EngineError::InvalidCalendar("x".to_string())).to_string();
        assert!(msg.contains("日历配置非法"));
    }
}
