// ==========================================
// 机台生产排程 - 排程 API
// ==========================================
// 职责: 生成/重排、查询、导出、删除机台排程
// 红线: 输入非法时不触碰已落库排程
// ==========================================

use std::collections::HashMap;
use std::error::Error;
use std::io;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::equipment::EquipmentInfo;
use crate::domain::schedule::{ScheduleDay, ScheduleQuery, ScheduleRecord, ScheduleResult, ScheduleRun};
use crate::engine::error::EngineError;
use crate::engine::events::{OptionalEventPublisher, ScheduleEvent, ScheduleEventPublisher};
use crate::engine::exporter::{self, ExportRow, Exporter, RosterEntry};
use crate::engine::{CalendarPolicy, ScheduleEngine, ScheduleRequest};
use crate::perf::PerfGuard;
use crate::repository::{EquipmentRepository, OrderRepository, ScheduleRepository};

// ==========================================
// DTO
// ==========================================

/// 单台机台的排程视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub machine_no: String,
    pub schedule_start_date: Option<NaiveDate>,
    pub can_complete_target: bool,
    pub required_days: i64,
    pub horizon_days: Option<i64>,

    // ===== 设备身份（透传） =====
    pub equipment_id: Option<i64>,
    pub equipment_no: Option<String>,
    pub equipment_name: Option<String>,
    pub group_name: Option<String>,

    pub days: Vec<ScheduleDay>,
}

impl ScheduleView {
    fn from_result(result: &ScheduleResult, equipment: Option<&EquipmentInfo>) -> Self {
        Self {
            machine_no: result.machine_no.clone(),
            schedule_start_date: Some(result.schedule_start_date),
            can_complete_target: result.can_complete_target,
            required_days: result.required_days,
            horizon_days: result.horizon_days.map(|h| h as i64),
            equipment_id: result.equipment_id,
            equipment_no: result.equipment_no.clone(),
            equipment_name: equipment.and_then(|e| e.equipment_name.clone()),
            group_name: equipment.and_then(|e| e.group_name.clone()),
            days: result.days.clone(),
        }
    }

    // 从未排过程的机台: 空视图，可完成标志为 false
    fn from_stored(
        machine_no: &str,
        run: Option<ScheduleRun>,
        records: &[ScheduleRecord],
        equipment: Option<&EquipmentInfo>,
    ) -> Self {
        let first = records.first();
        Self {
            machine_no: machine_no.to_string(),
            schedule_start_date: run.as_ref().map(|r| r.schedule_start_date),
            can_complete_target: run.as_ref().map(|r| r.can_complete_target).unwrap_or(false),
            required_days: run.as_ref().map(|r| r.required_days).unwrap_or(0),
            horizon_days: run.as_ref().and_then(|r| r.horizon_days),
            equipment_id: first
                .and_then(|r| r.equipment_id)
                .or_else(|| equipment.map(|e| e.equipment_id)),
            equipment_no: first
                .and_then(|r| r.equipment_no.clone())
                .or_else(|| equipment.map(|e| e.equipment_no.clone())),
            equipment_name: equipment.and_then(|e| e.equipment_name.clone()),
            group_name: equipment.and_then(|e| e.group_name.clone()),
            days: records.iter().map(ScheduleRecord::to_day).collect(),
        }
    }
}

/// 排程明细行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDetailView {
    pub id: i64,
    pub machine_no: String,
    pub equipment_id: Option<i64>,
    pub equipment_no: Option<String>,
    pub equipment_name: Option<String>,
    pub group_name: Option<String>,
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

/// 导出结果：日期列 + 每台机台一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleExport {
    pub dates: Vec<NaiveDate>,
    pub header: Vec<String>,
    pub rows: Vec<ExportRow>,
}

// ==========================================
// ScheduleApi - 排程 API
// ==========================================
pub struct ScheduleApi {
    schedule_repo: Arc<ScheduleRepository>,
    order_repo: Arc<OrderRepository>,
    equipment_repo: Arc<EquipmentRepository>,
    config_manager: Arc<ConfigManager>,
    exporter: Exporter,
    event_publisher: OptionalEventPublisher,
}

impl ScheduleApi {
    /// 创建新的 ScheduleApi 实例
    pub fn new(
        schedule_repo: Arc<ScheduleRepository>,
        order_repo: Arc<OrderRepository>,
        equipment_repo: Arc<EquipmentRepository>,
        config_manager: Arc<ConfigManager>,
        event_publisher: Option<Arc<dyn ScheduleEventPublisher>>,
    ) -> Self {
        Self {
            schedule_repo,
            order_repo,
            equipment_repo,
            config_manager,
            exporter: Exporter::new(),
            event_publisher: OptionalEventPublisher::new(event_publisher),
        }
    }

    /// 基于共享连接装配全部依赖
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        event_publisher: Option<Arc<dyn ScheduleEventPublisher>>,
    ) -> ApiResult<Self> {
        let config_manager = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self::new(
            Arc::new(ScheduleRepository::from_connection(conn.clone())),
            Arc::new(OrderRepository::from_connection(conn.clone())),
            Arc::new(EquipmentRepository::from_connection(conn)),
            Arc::new(config_manager),
            event_publisher,
        ))
    }

    // ==========================================
    // 生成 / 重排
    // ==========================================

    /// 生成机台排程并整体替换已落库排程
    ///
    /// # 参数
    /// - machine_no: 机台号
    /// - start_date: 排程起始日期（休息日时顺延到下一个工作日）
    ///
    /// # 返回
    /// - Ok(ScheduleView): 新排程；机台无排队订单时为空排程且可完成
    /// - Err(InvalidCapacity / InvalidQuantity): 输入非法，旧排程保持不变
    pub fn generate_schedule(&self, machine_no: &str, start_date: NaiveDate) -> ApiResult<ScheduleView> {
        let _perf = PerfGuard::new("generate_schedule");
        let machine_no = require_machine_no(machine_no)?;

        let calendar = self.calendar_policy()?;
        let horizon = self.config_manager.plan_horizon().map_err(config_error)?;

        let products = self.order_repo.find_queued_products(machine_no)?;
        let equipment = self.equipment_repo.find_by_machine_no(machine_no)?;

        let request = ScheduleRequest::new(machine_no, start_date, products)
            .with_equipment(equipment.clone());
        let result = ScheduleEngine::new(calendar).plan(&request, horizon)?;

        let inserted = self.schedule_repo.regenerate(&result)?;
        tracing::info!(
            machine_no,
            start_date = %start_date,
            inserted,
            can_complete_target = result.can_complete_target,
            "排程已重排"
        );

        self.publish(ScheduleEvent::regenerated(&result, "generate_schedule"));

        Ok(ScheduleView::from_result(&result, equipment.as_ref()))
    }

    /// 订单产品名单变更后的重排入口
    pub fn on_roster_changed(&self, machine_no: &str, start_date: NaiveDate) -> ApiResult<ScheduleView> {
        tracing::info!(machine_no, start_date = %start_date, "产品名单变更，触发重排");
        self.generate_schedule(machine_no, start_date)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询机台的已落库排程
    ///
    /// # 参数
    /// - machine_no: 机台号
    /// - start_date: 可选，只返回该日期及之后的行
    pub fn get_schedule_by_machine(
        &self,
        machine_no: &str,
        start_date: Option<NaiveDate>,
    ) -> ApiResult<ScheduleView> {
        let machine_no = require_machine_no(machine_no)?;

        let records = self.schedule_repo.find_by_machine(machine_no, start_date)?;
        let run = self.schedule_repo.find_run(machine_no)?;
        let equipment = self.equipment_repo.find_by_machine_no(machine_no)?;

        Ok(ScheduleView::from_stored(
            machine_no,
            run,
            &records,
            equipment.as_ref(),
        ))
    }

    /// 按条件列出各机台排程（每台有排程的机台一个视图）
    pub fn list_schedules(&self, query: &ScheduleQuery) -> ApiResult<Vec<ScheduleView>> {
        let _perf = PerfGuard::new("list_schedules");

        let machine_nos = self.schedule_repo.list_machine_nos(query)?;
        machine_nos
            .iter()
            .map(|m| self.get_schedule_by_machine(m, query.start_date))
            .collect()
    }

    /// 按条件查询排程明细（附带设备名称/分组）
    pub fn list_schedule_details(&self, query: &ScheduleQuery) -> ApiResult<Vec<ScheduleDetailView>> {
        let _perf = PerfGuard::new("list_schedule_details");

        let records = self.schedule_repo.find_by_query(query)?;
        let mut equipment_cache: HashMap<String, Option<EquipmentInfo>> = HashMap::new();

        let mut details = Vec::with_capacity(records.len());
        for record in records {
            if !equipment_cache.contains_key(&record.machine_no) {
                let equipment = self.equipment_repo.find_by_machine_no(&record.machine_no)?;
                equipment_cache.insert(record.machine_no.clone(), equipment);
            }
            let equipment = equipment_cache
                .get(&record.machine_no)
                .and_then(|e| e.as_ref());

            details.push(ScheduleDetailView {
                id: record.id,
                equipment_name: equipment.and_then(|e| e.equipment_name.clone()),
                group_name: equipment.and_then(|e| e.group_name.clone()),
                machine_no: record.machine_no,
                equipment_id: record.equipment_id,
                equipment_no: record.equipment_no,
                schedule_date: record.schedule_date,
                day_number: record.day_number,
                product_code: record.product_code,
                product_name: record.product_name,
                production_quantity: record.production_quantity,
                daily_capacity: record.daily_capacity,
                remaining_quantity: record.remaining_quantity,
                order_id: record.order_id,
                created_at: record.created_at,
            });
        }

        Ok(details)
    }

    // ==========================================
    // 导出
    // ==========================================

    /// 导出宽表
    ///
    /// # 参数
    /// - query: start_date 必填；machine_no 为空时导出所有有排程的机台
    /// - dates: 日期列；为空时取 start_date 起 export_horizon_days 个工作日
    pub fn export_schedule(
        &self,
        query: &ScheduleQuery,
        dates: Option<Vec<NaiveDate>>,
    ) -> ApiResult<ScheduleExport> {
        let _perf = PerfGuard::new("export_schedule");

        let start_date = query
            .start_date
            .ok_or_else(|| ApiError::InvalidInput("导出必须指定开始日期".to_string()))?;

        let dates = match dates {
            Some(dates) => dates,
            None => {
                let days = self.config_manager.export_horizon_days().map_err(config_error)?;
                self.calendar_policy()?.working_dates(start_date, days)
            }
        };

        let mut rows = Vec::new();
        for machine_no in self.schedule_repo.list_machine_nos(query)? {
            let records = self.schedule_repo.find_by_machine(&machine_no, Some(start_date))?;
            let days: Vec<ScheduleDay> = records.iter().map(ScheduleRecord::to_day).collect();
            let equipment = self.equipment_repo.find_by_machine_no(&machine_no)?;
            let roster: Vec<RosterEntry> = self
                .order_repo
                .find_queued_products(&machine_no)?
                .iter()
                .map(RosterEntry::from)
                .collect();

            rows.push(self.exporter.project(
                &machine_no,
                &days,
                equipment.as_ref(),
                roster,
                &dates,
            ));
        }

        tracing::info!(
            machines = rows.len(),
            date_columns = dates.len(),
            "排程导出完成"
        );

        Ok(ScheduleExport {
            header: exporter::header(&dates),
            dates,
            rows,
        })
    }

    /// 导出宽表并写为 CSV
    pub fn export_schedule_csv<W: io::Write>(
        &self,
        query: &ScheduleQuery,
        dates: Option<Vec<NaiveDate>>,
        writer: W,
    ) -> ApiResult<()> {
        let export = self.export_schedule(query, dates)?;
        exporter::write_csv(&export.rows, &export.dates, writer)
            .map_err(|e| ApiError::ExportError(e.to_string()))
    }

    // ==========================================
    // 删除
    // ==========================================

    /// 删除机台全部排程（物理删除）
    ///
    /// # 返回
    /// - Ok(usize): 删除的排程行数
    pub fn delete_schedule_by_machine(&self, machine_no: &str) -> ApiResult<usize> {
        let machine_no = require_machine_no(machine_no)?;

        let deleted = self.schedule_repo.delete_by_machine(machine_no)?;
        tracing::info!(machine_no, deleted, "机台排程已删除");

        self.publish(ScheduleEvent::deleted(
            machine_no,
            deleted,
            "delete_schedule_by_machine",
        ));
        Ok(deleted)
    }

    /// 按ID删除单条排程行（物理删除）
    ///
    /// # 返回
    /// - Ok(()): 删除成功
    /// - Err(ApiError::NotFound): 排程行不存在
    pub fn delete_schedule_by_id(&self, id: i64) -> ApiResult<()> {
        let record = self
            .schedule_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("排程记录(id={})不存在", id)))?;

        self.schedule_repo.delete_by_id(id)?;
        tracing::info!(id, machine_no = %record.machine_no, "排程行已删除");

        self.publish(
            ScheduleEvent::deleted(&record.machine_no, 1, "delete_schedule_by_id")
                .with_date_range(record.schedule_date, record.schedule_date),
        );
        Ok(())
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn calendar_policy(&self) -> ApiResult<CalendarPolicy> {
        self.config_manager.calendar_policy().map_err(config_error)
    }

    fn publish(&self, event: ScheduleEvent) {
        let event_type = event.event_type;
        if let Err(e) = self.event_publisher.publish(event) {
            tracing::warn!(event_type = %event_type, "排程事件发布失败: {}", e);
        }
    }
}

fn require_machine_no(machine_no: &str) -> ApiResult<&str> {
    let trimmed = machine_no.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("机台号不能为空".to_string()));
    }
    Ok(trimmed)
}

fn config_error(err: Box<dyn Error>) -> ApiError {
    match err.downcast::<EngineError>() {
        Ok(engine_err) => ApiError::from(*engine_err),
        Err(other) => ApiError::InternalError(format!("配置读取失败: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_machine_no() {
        assert_eq!(require_machine_no("  M1 ").unwrap(), "M1");
        assert!(matches!(
            require_machine_no("   "),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_stored_view_without_run_is_not_completable() {
        let view = ScheduleView::from_stored("M1", None, &[], None);
        assert!(!view.can_complete_target);
        assert!(view.days.is_empty());
        assert!(view.schedule_start_date.is_none());
    }

    #[test]
    fn test_config_error_maps_calendar() {
        let err: Box<dyn Error> = Box::new(EngineError::InvalidCalendar("all rest".to_string()));
        assert!(matches!(config_error(err), ApiError::InvalidCalendar(_)));

        let err: Box<dyn Error> = "boom".into();
        assert!(matches!(config_error(err), ApiError::InternalError(_)));
    }
}
