// ==========================================
// ScheduleApi 端到端测试
// ==========================================
// 测试目标: 订单名单 -> 引擎 -> 落库 -> 查询/导出/删除 全链路
// 覆盖范围: 重排触发、非法输入不落库、订单状态过滤、导出宽表、事件发布
// ==========================================


use std::error::Error;
use std::sync::{Arc, Mutex};

use production_schedule::api::{ApiError, ScheduleApi};
use production_schedule::config::{config_keys, ConfigManager};
use production_schedule::domain::{OrderStatus, ScheduleQuery};
use production_schedule::engine::{ScheduleEvent, ScheduleEventPublisher, ScheduleEventType};
use production_schedule::logging;
use rusqlite::Connection;
use test_helpers::*;

// ==========================================
// 测试辅助
// ==========================================

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<ScheduleEvent>>,
}

impl ScheduleEventPublisher for RecordingPublisher {
    fn publish(&self, event: ScheduleEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        self.events.lock().unwrap().push(event);
        Ok("task-1".to_string())
    }
}

struct Fixture {
    _temp_file: tempfile::NamedTempFile,
    conn: Arc<Mutex<Connection>>,
    api: ScheduleApi,
    publisher: Arc<RecordingPublisher>,
}

fn setup() -> Fixture {
    logging::init_test();
    let (temp_file, db_path) = create_test_db().unwrap();
    let conn = open_shared_conn(&db_path).unwrap();
    let publisher = Arc::new(RecordingPublisher::default());
    let shared: Arc<dyn ScheduleEventPublisher> = publisher.clone();
    let api = ScheduleApi::from_connection(conn.clone(), Some(shared)).unwrap();
    Fixture {
        _temp_file: temp_file,
        conn,
        api,
        publisher,
    }
}

// ==========================================
// 测试用例 1: 生成 + 查询
// ==========================================

#[test]
fn test_generate_and_read_back() {
    println!("\n=== 测试：生成后查询 ===");

    let fx = setup();
    seed_standard_machine(&fx.conn.lock().unwrap()).unwrap();

    let view = fx.api.generate_schedule("M1", d(2024, 6, 1)).unwrap();
    assert!(view.can_complete_target);
    assert_eq!(view.days.len(), 4);
    assert_eq!(view.equipment_no.as_deref(), Some("EQ-001"));
    assert_eq!(view.equipment_name.as_deref(), Some("注塑机1号"));
    assert_eq!(view.days[1].schedule_date, d(2024, 6, 3));

    let stored = fx.api.get_schedule_by_machine("M1", None).unwrap();
    assert_eq!(stored.days, view.days);
    assert!(stored.can_complete_target);
    assert_eq!(stored.schedule_start_date, Some(d(2024, 6, 1)));

    let from_tuesday = fx
        .api
        .get_schedule_by_machine("M1", Some(d(2024, 6, 4)))
        .unwrap();
    assert_eq!(from_tuesday.days.len(), 2);

    let events = fx.publisher.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, ScheduleEventType::ScheduleRegenerated);
    assert_eq!(
        events[0].affected_date_range,
        Some((d(2024, 6, 1), d(2024, 6, 5)))
    );

    println!("✓ 生成结果已落库并可查询");
}

#[test]
fn test_never_scheduled_machine_is_empty_and_not_completable() {
    let fx = setup();
    let view = fx.api.get_schedule_by_machine("M9", None).unwrap();
    assert!(view.days.is_empty());
    assert!(!view.can_complete_target);

    assert!(matches!(
        fx.api.get_schedule_by_machine(" ", None),
        Err(ApiError::InvalidInput(_))
    ));
}

// ==========================================
// 测试用例 2: 非法日产能不触碰已落库排程
// ==========================================

#[test]
fn test_invalid_capacity_leaves_rows_untouched() {
    println!("\n=== 测试：非法日产能 ===");

    let fx = setup();
    let (_order_id, _a, b) = seed_standard_machine(&fx.conn.lock().unwrap()).unwrap();

    let before = fx.api.generate_schedule("M1", d(2024, 6, 3)).unwrap();

    set_daily_capacity(&fx.conn.lock().unwrap(), b, 0).unwrap();
    let err = fx.api.on_roster_changed("M1", d(2024, 6, 10)).unwrap_err();
    match err {
        ApiError::InvalidCapacity {
            product_code,
            daily_capacity,
            ..
        } => {
            assert_eq!(product_code, "P-B");
            assert_eq!(daily_capacity, 0);
        }
        other => panic!("Expected InvalidCapacity, got {:?}", other),
    }

    let after = fx.api.get_schedule_by_machine("M1", None).unwrap();
    assert_eq!(after.days, before.days);
    assert_eq!(after.schedule_start_date, Some(d(2024, 6, 3)));

    println!("✓ 旧排程保持不变");
}

// ==========================================
// 测试用例 3: 订单状态变化触发重排
// ==========================================

#[test]
fn test_cancelled_order_drops_out_on_regeneration() {
    println!("\n=== 测试：取消订单后重排 ===");

    let fx = setup();
    let (order_id, _, _) = seed_standard_machine(&fx.conn.lock().unwrap()).unwrap();
    let second = {
        let c = fx.conn.lock().unwrap();
        let o = insert_order(&c, "PO-002", "M1", OrderStatus::Pending, "2024-05-21 08:00:00").unwrap();
        insert_product(&c, o, "产品C", "P-C", 20, 10, 1).unwrap();
        o
    };

    let view = fx.api.generate_schedule("M1", d(2024, 6, 3)).unwrap();
    // 名单: 新订单在前 C(1), A(1), B(2)；按 sort_order 稳定排序后顺序不变
    let codes: Vec<&str> = view.days.iter().map(|r| r.product_code.as_str()).collect();
    assert_eq!(codes, vec!["P-C", "P-C", "P-A", "P-A", "P-A", "P-B"]);

    set_order_status(&fx.conn.lock().unwrap(), second, OrderStatus::Cancelled).unwrap();
    let view = fx.api.on_roster_changed("M1", d(2024, 6, 3)).unwrap();
    assert!(view.days.iter().all(|r| r.product_code != "P-C"));
    assert_eq!(view.days.len(), 4);

    // 全部完成后重排为空排程，标志为可完成
    set_order_status(&fx.conn.lock().unwrap(), order_id, OrderStatus::Completed).unwrap();
    let view = fx.api.on_roster_changed("M1", d(2024, 6, 3)).unwrap();
    assert!(view.days.is_empty());
    assert!(view.can_complete_target);

    let stored = fx.api.get_schedule_by_machine("M1", None).unwrap();
    assert!(stored.days.is_empty());
    assert!(stored.can_complete_target);

    println!("✓ 名单变化后旧行被清除");
}

// ==========================================
// 测试用例 4: 排程天数上限配置
// ==========================================

#[test]
fn test_plan_horizon_config_caps_persisted_plan() {
    println!("\n=== 测试：排程天数上限 ===");

    let fx = setup();
    seed_standard_machine(&fx.conn.lock().unwrap()).unwrap();
    ConfigManager::from_connection(fx.conn.clone())
        .unwrap()
        .set_global_config_value(config_keys::PLAN_HORIZON_DAYS, "2")
        .unwrap();

    let view = fx.api.generate_schedule("M1", d(2024, 6, 3)).unwrap();
    assert_eq!(view.days.len(), 2);
    assert!(!view.can_complete_target);
    assert_eq!(view.required_days, 4);

    let stored = fx.api.get_schedule_by_machine("M1", None).unwrap();
    assert!(!stored.can_complete_target);
    assert_eq!(stored.horizon_days, Some(2));

    println!("✓ 上限生效且标志落库");
}

#[test]
fn test_zero_plan_horizon_config_is_unbounded() {
    let fx = setup();
    seed_standard_machine(&fx.conn.lock().unwrap()).unwrap();
    ConfigManager::from_connection(fx.conn.clone())
        .unwrap()
        .set_global_config_value(config_keys::PLAN_HORIZON_DAYS, "0")
        .unwrap();

    let view = fx.api.generate_schedule("M1", d(2024, 6, 3)).unwrap();
    assert_eq!(view.days.len(), 4);
    assert!(view.can_complete_target);

    let stored = fx.api.get_schedule_by_machine("M1", None).unwrap();
    assert_eq!(stored.days.len(), 4);
    assert_eq!(stored.horizon_days, None);
}

// ==========================================
// 测试用例 5: 导出
// ==========================================

#[test]
fn test_export_wide_rows() {
    println!("\n=== 测试：导出宽表 ===");

    let fx = setup();
    seed_standard_machine(&fx.conn.lock().unwrap()).unwrap();
    fx.api.generate_schedule("M1", d(2024, 6, 1)).unwrap();

    // 缺少开始日期
    assert!(matches!(
        fx.api.export_schedule(&ScheduleQuery::default(), None),
        Err(ApiError::InvalidInput(_))
    ));

    // 显式日期列：包含周日与排程结束后的日期
    let dates = vec![d(2024, 6, 1), d(2024, 6, 2), d(2024, 6, 5), d(2024, 6, 6)];
    let query = ScheduleQuery::default().starting(d(2024, 6, 1));
    let export = fx.api.export_schedule(&query, Some(dates)).unwrap();

    assert_eq!(export.rows.len(), 1);
    assert_eq!(export.header.len(), 8 + 4 * 3);
    let row = &export.rows[0];
    assert_eq!(row.machine_no, "M1");
    assert_eq!(row.group_name.as_deref(), Some("一车间"));
    assert_eq!(row.roster.len(), 2);
    assert_eq!(row.cells[0].as_ref().unwrap().production_quantity, 10);
    assert!(row.cells[1].is_none());
    assert_eq!(row.cells[2].as_ref().unwrap().product_name, "产品B");
    assert!(row.cells[3].is_none());

    // 默认日期列: export_horizon_days 个工作日
    let export = fx.api.export_schedule(&query, None).unwrap();
    assert_eq!(export.dates.len(), 30);
    assert!(!export.dates.contains(&d(2024, 6, 2)));

    let mut buf: Vec<u8> = Vec::new();
    fx.api
        .export_schedule_csv(&query, Some(vec![d(2024, 6, 1)]), &mut buf)
        .unwrap();
    let csv_text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = csv_text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("2024-06-01 产品"));
    assert!(lines[1].starts_with("M1,EQ-001"));
    assert!(lines[1].ends_with("产品A,10,15"));

    println!("✓ 宽表列与 CSV 输出正确");
}

// ==========================================
// 测试用例 6: 明细 + 删除
// ==========================================

#[test]
fn test_details_and_delete() {
    println!("\n=== 测试：明细与删除 ===");

    let fx = setup();
    seed_standard_machine(&fx.conn.lock().unwrap()).unwrap();
    {
        let c = fx.conn.lock().unwrap();
        let o = insert_order(&c, "PO-M2", "M2", OrderStatus::Pending, "2024-05-21 08:00:00").unwrap();
        insert_product(&c, o, "产品Z", "P-Z", 10, 10, 1).unwrap();
    }
    fx.api.generate_schedule("M1", d(2024, 6, 3)).unwrap();
    fx.api.generate_schedule("M2", d(2024, 6, 3)).unwrap();

    let views = fx.api.list_schedules(&ScheduleQuery::default()).unwrap();
    assert_eq!(views.len(), 2);

    let details = fx.api.list_schedule_details(&ScheduleQuery::default()).unwrap();
    assert_eq!(details.len(), 5);
    assert_eq!(details[0].equipment_name.as_deref(), Some("注塑机1号"));
    assert!(details.iter().filter(|r| r.machine_no == "M2").all(|r| r.equipment_name.is_none()));

    let id = details[0].id;
    fx.api.delete_schedule_by_id(id).unwrap();
    assert!(matches!(
        fx.api.delete_schedule_by_id(id),
        Err(ApiError::NotFound(_))
    ));

    assert_eq!(fx.api.delete_schedule_by_machine("M2").unwrap(), 1);
    let view = fx.api.get_schedule_by_machine("M2", None).unwrap();
    assert!(view.days.is_empty());
    assert!(!view.can_complete_target);

    let events = fx.publisher.events.lock().unwrap();
    let deleted = events
        .iter()
        .filter(|e| e.event_type == ScheduleEventType::ScheduleDeleted)
        .count();
    assert_eq!(deleted, 2);

    println!("✓ 删除后事件已发布");
}
