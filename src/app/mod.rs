// ==========================================
// 机台生产排程 - 应用层
// ==========================================
// 职责: 装配共享状态,供命令行入口调用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
