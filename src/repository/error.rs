// ==========================================
// 机台生产排程 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 按 SQLite 错误码归类，不解析错误消息文本
// ==========================================

use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    // ===== 连接 / 锁 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    /// 共享连接的 Mutex 中毒
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    /// 事务提交失败或数据库繁忙
    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 约束 =====
    /// 同一机台出现重复的 day_number 等
    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    // ===== 落库数据无法解析 =====
    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let detail = msg.unwrap_or_else(|| code.to_string());
                match code.code {
                    ErrorCode::ConstraintViolation => match code.extended_code {
                        ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                            RepositoryError::UniqueConstraintViolation(detail)
                        }
                        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                            RepositoryError::ForeignKeyViolation(detail)
                        }
                        _ => RepositoryError::DatabaseQueryError(detail),
                    },
                    ErrorCode::CannotOpen | ErrorCode::NotADatabase => {
                        RepositoryError::DatabaseConnectionError(detail)
                    }
                    ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                        RepositoryError::DatabaseTransactionError(detail)
                    }
                    _ => RepositoryError::DatabaseQueryError(detail),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::not_found("row", "unknown"),
            rusqlite::Error::FromSqlConversionFailure(idx, ty, cause) => {
                RepositoryError::FieldValueError {
                    field: format!("column#{}", idx),
                    message: format!("{} ({})", cause, ty),
                }
            }
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
