// ==========================================
// 机台生产排程 - 命令行入口
// ==========================================
// 用法:
//   production-schedule init
//   production-schedule generate <machine_no> <YYYY-MM-DD>
//   production-schedule show <machine_no> [YYYY-MM-DD]
//   production-schedule details [machine_no]
//   production-schedule export <YYYY-MM-DD> [machine_no]
//   production-schedule delete <machine_no>
//   production-schedule delete-row <id>
//
// 数据库路径: PRODUCTION_SCHEDULE_DB_PATH 或用户数据目录
// 输出: JSON/CSV 写 stdout，日志写 stderr
// ==========================================

use anyhow::{bail, Context};
use chrono::NaiveDate;
use serde::Serialize;

use production_schedule::app::{get_default_db_path, AppState};
use production_schedule::domain::ScheduleQuery;
use production_schedule::logging;

const USAGE: &str = "\
用法:
  production-schedule init
  production-schedule generate <machine_no> <YYYY-MM-DD>
  production-schedule show <machine_no> [YYYY-MM-DD]
  production-schedule details [machine_no]
  production-schedule export <YYYY-MM-DD> [machine_no]
  production-schedule delete <machine_no>
  production-schedule delete-row <id>";

fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let db_path = get_default_db_path();
    tracing::info!(
        "{} v{} - 使用数据库: {}",
        production_schedule::APP_NAME,
        production_schedule::VERSION,
        db_path
    );

    let state = AppState::new(db_path, None).map_err(anyhow::Error::msg)?;
    let api = &state.schedule_api;

    match command {
        "init" => {
            println!("数据库已初始化: {}", state.db_path);
        }
        "generate" => {
            let machine_no = required_arg(&args, 1, "machine_no")?;
            let start_date = parse_date(required_arg(&args, 2, "start_date")?)?;
            print_json(&api.generate_schedule(machine_no, start_date)?)?;
        }
        "show" => {
            let machine_no = required_arg(&args, 1, "machine_no")?;
            let start_date = args.get(2).map(|s| parse_date(s)).transpose()?;
            print_json(&api.get_schedule_by_machine(machine_no, start_date)?)?;
        }
        "details" => {
            let query = ScheduleQuery {
                machine_no: args.get(1).cloned(),
                start_date: None,
            };
            print_json(&api.list_schedule_details(&query)?)?;
        }
        "export" => {
            let start_date = parse_date(required_arg(&args, 1, "start_date")?)?;
            let query = ScheduleQuery {
                machine_no: args.get(2).cloned(),
                start_date: Some(start_date),
            };
            let stdout = std::io::stdout();
            api.export_schedule_csv(&query, None, stdout.lock())?;
        }
        "delete" => {
            let machine_no = required_arg(&args, 1, "machine_no")?;
            let deleted = api.delete_schedule_by_machine(machine_no)?;
            println!("已删除 {} 条排程", deleted);
        }
        "delete-row" => {
            let raw = required_arg(&args, 1, "id")?;
            let id: i64 = raw
                .trim()
                .parse()
                .with_context(|| format!("无效的排程ID: {}", raw))?;
            api.delete_schedule_by_id(id)?;
            println!("已删除排程记录 id={}", id);
        }
        other => {
            eprintln!("{}", USAGE);
            bail!("未知命令: {}", other);
        }
    }

    Ok(())
}

fn required_arg<'a>(args: &'a [String], idx: usize, name: &str) -> anyhow::Result<&'a str> {
    match args.get(idx) {
        Some(v) if !v.trim().is_empty() => Ok(v.as_str()),
        _ => bail!("缺少参数 <{}>\n{}", name, USAGE),
    }
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("日期格式应为 YYYY-MM-DD: {}", raw))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
