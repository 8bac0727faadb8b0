// ==========================================
// 机台生产排程 - 排程导出投影
// ==========================================
// 职责: 把逐日排程行投影为宽表（一台机台一行，每个日期一组三列）
// 说明: 日期列由调用方给出，便于多台机台对齐列头
//       电子表格排版属于展示层，这里只输出结构化行与 CSV
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;

use crate::domain::equipment::EquipmentInfo;
use crate::domain::order::OrderProduct;
use crate::domain::schedule::ScheduleDay;

/// 静态列缺省占位
const PLACEHOLDER: &str = "-";

/// 静态列列头
pub const STATIC_HEADERS: [&str; 8] = [
    "机台号",
    "设备编号",
    "设备名称",
    "组别",
    "设备型号",
    "产品名称",
    "订单数量",
    "日产能",
];

// ==========================================
// 导出数据结构
// ==========================================

/// 机台当前产品清单中的一项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub product_name: String,
    pub order_quantity: i64,
    pub daily_capacity: i64,
}

impl From<&OrderProduct> for RosterEntry {
    fn from(product: &OrderProduct) -> Self {
        Self {
            product_name: product.product_name.clone(),
            order_quantity: product.order_quantity,
            daily_capacity: product.daily_capacity,
        }
    }
}

/// 某日期的三列：产品 / 排产数量 / 剩余数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCell {
    pub product_name: String,
    pub production_quantity: i64,
    pub remaining_quantity: i64,
}

/// 一台机台的导出行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub machine_no: String,
    pub equipment_no: Option<String>,
    pub equipment_name: Option<String>,
    pub group_name: Option<String>,
    pub equipment_model: Option<String>,
    pub roster: Vec<RosterEntry>,
    /// 与日期列一一对应，None 表示当天无排产
    pub cells: Vec<Option<ExportCell>>,
}

// ==========================================
// Exporter - 导出投影
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct Exporter;

impl Exporter {
    pub fn new() -> Self {
        Self
    }

    /// 投影单台机台
    ///
    /// # 参数
    /// - `machine_no`: 机台号
    /// - `days`: 该机台的排程行
    /// - `equipment`: 设备身份（可选）
    /// - `roster`: 机台当前产品清单
    /// - `dates`: 日期列
    ///
    /// # 说明
    /// 同一日期存在多行时取第一行
    pub fn project(
        &self,
        machine_no: &str,
        days: &[ScheduleDay],
        equipment: Option<&EquipmentInfo>,
        roster: Vec<RosterEntry>,
        dates: &[NaiveDate],
    ) -> ExportRow {
        let mut by_date: HashMap<NaiveDate, &ScheduleDay> = HashMap::with_capacity(days.len());
        for day in days {
            by_date.entry(day.schedule_date).or_insert(day);
        }

        let cells = dates
            .iter()
            .map(|date| {
                by_date.get(date).map(|day| ExportCell {
                    product_name: day.product_name.clone(),
                    production_quantity: day.production_quantity,
                    remaining_quantity: day.remaining_quantity,
                })
            })
            .collect();

        ExportRow {
            machine_no: machine_no.to_string(),
            equipment_no: equipment.map(|e| e.equipment_no.clone()),
            equipment_name: equipment.and_then(|e| e.equipment_name.clone()),
            group_name: equipment.and_then(|e| e.group_name.clone()),
            equipment_model: equipment.and_then(|e| e.equipment_model.clone()),
            roster,
            cells,
        }
    }
}

// ==========================================
// CSV 输出
// ==========================================

/// 导出列头：静态列 + 每个日期三列
pub fn header(dates: &[NaiveDate]) -> Vec<String> {
    let mut columns: Vec<String> = STATIC_HEADERS.iter().map(|h| h.to_string()).collect();
    for date in dates {
        let label = date.format("%Y-%m-%d");
        columns.push(format!("{} 产品", label));
        columns.push(format!("{} 排产数量", label));
        columns.push(format!("{} 剩余数量", label));
    }
    columns
}

fn or_placeholder(value: &Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.clone(),
        _ => PLACEHOLDER.to_string(),
    }
}

fn join_roster<F>(roster: &[RosterEntry], field: F) -> String
where
    F: Fn(&RosterEntry) -> String,
{
    if roster.is_empty() {
        return PLACEHOLDER.to_string();
    }
    roster.iter().map(field).collect::<Vec<_>>().join(", ")
}

/// 单行转为 CSV 记录
pub fn to_record(row: &ExportRow) -> Vec<String> {
    let mut record = vec![
        row.machine_no.clone(),
        or_placeholder(&row.equipment_no),
        or_placeholder(&row.equipment_name),
        or_placeholder(&row.group_name),
        or_placeholder(&row.equipment_model),
        join_roster(&row.roster, |r| r.product_name.clone()),
        join_roster(&row.roster, |r| r.order_quantity.to_string()),
        join_roster(&row.roster, |r| r.daily_capacity.to_string()),
    ];

    for cell in &row.cells {
        match cell {
            Some(cell) => {
                record.push(cell.product_name.clone());
                record.push(cell.production_quantity.to_string());
                record.push(cell.remaining_quantity.to_string());
            }
            None => record.extend([String::new(), String::new(), String::new()]),
        }
    }
    record
}

/// 写出 CSV
pub fn write_csv<W: io::Write>(
    rows: &[ExportRow],
    dates: &[NaiveDate],
    writer: W,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(header(dates))?;
    for row in rows {
        csv_writer.write_record(to_record(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}
