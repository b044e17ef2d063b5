// ==========================================
// 客户释放单看板系统 - 命令行入口
// ==========================================
// 口径: 所有子命令输出 JSON 三元组 {ok, message, data};
//       失败退出码 1, 成功退出码 0
// ==========================================

use chrono::NaiveDate;
use serde::Serialize;
use std::process::ExitCode;

use release_kanban::api::{self, ApiError, ApiResult, KanbanQuery, MrpQuery};
use release_kanban::app::{get_default_db_path, AppState, CommandResponse};
use release_kanban::calendar;
use release_kanban::domain::types::{ItemType, OrderTypeFilter, ScheduleStatus};
use release_kanban::logging;

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return ExitCode::FAILURE;
    }

    let db_path = get_default_db_path();
    let state = match AppState::open(&db_path.to_string_lossy()) {
        Ok(s) => s,
        Err(e) => {
            emit::<()>(Err(ApiError::Storage(e.to_string())));
            return ExitCode::FAILURE;
        }
    };

    let ok = dispatch(&state, &args);
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn dispatch(state: &AppState, args: &[String]) -> bool {
    let cmd = args[0].as_str();
    let rest = &args[1..];

    match cmd {
        "import" => {
            let Some(path) = rest.first() else {
                return usage_error("import <文件路径> [--by 操作人]");
            };
            let by = flag_value(rest, "--by");
            emit(api::import_api::import_release(state, path, by.as_deref()))
        }
        "imports" => emit(api::import_api::list_imports(state)),
        "delete-import" => match rest.first().and_then(|s| s.parse::<i64>().ok()) {
            Some(id) => emit(api::import_api::delete_import(state, id).map(|_| id)),
            None => usage_error("delete-import <版本ID>"),
        },
        "kanban" => {
            let query = KanbanQuery {
                import_id: flag_value(rest, "--import").and_then(|s| s.parse().ok()),
                start: flag_date(rest, "--start"),
                end: flag_date(rest, "--end"),
                order_type: flag_value(rest, "--type")
                    .map(|s| OrderTypeFilter::from_str(&s))
                    .unwrap_or_default(),
            };
            if flag_present(rest, "--out") {
                emit(api::kanban_api::export_kanban(state, &query, out_flag(rest).as_deref()))
            } else {
                emit(api::kanban_api::kanban(state, &query))
            }
        }
        "mrp" => {
            let (Some(start), Some(end)) = (
                rest.first().and_then(|s| calendar::parse_date_lenient(s)),
                rest.get(1).and_then(|s| calendar::parse_date_lenient(s)),
            ) else {
                return usage_error(
                    "mrp <起始日> <结束日> [--import ID] [--type F|P] [--types RM,PKG] [--daily] [--out [文件.csv]]",
                );
            };
            let query = MrpQuery {
                start,
                end,
                import_id: flag_value(rest, "--import").and_then(|s| s.parse().ok()),
                order_type: flag_value(rest, "--type")
                    .map(|s| OrderTypeFilter::from_str(&s))
                    .unwrap_or_default(),
                include_types: parse_types(flag_value(rest, "--types")),
                day_mode: flag_present(rest, "--daily"),
            };
            if flag_present(rest, "--out") {
                emit(api::mrp_api::export_mrp(state, &query, out_flag(rest).as_deref()))
            } else {
                emit(api::mrp_api::mrp(state, &query))
            }
        }
        "inventory" => dispatch_inventory(state, rest),
        "schedule" => dispatch_schedule(state, rest),
        _ => {
            print_usage();
            false
        }
    }
}

fn dispatch_inventory(state: &AppState, args: &[String]) -> bool {
    let Some(sub) = args.first() else {
        return usage_error("inventory <set|list> ...");
    };
    let rest = &args[1..];

    match sub.as_str() {
        "set" => {
            let (Some(code), Some(qty)) = (
                rest.first(),
                rest.get(1).and_then(|s| calendar::parse_quantity(s)),
            ) else {
                return usage_error("inventory set <料号> <数量> [--loc 库位]");
            };
            let location = flag_value(rest, "--loc");
            emit(api::inventory_api::set_on_hand(state, code, location.as_deref(), qty))
        }
        "list" => match rest.first() {
            Some(code) => emit(api::inventory_api::list_inventory(state, code)),
            None => usage_error("inventory list <料号>"),
        },
        _ => usage_error("inventory <set|list> ..."),
    }
}

fn dispatch_schedule(state: &AppState, args: &[String]) -> bool {
    let Some(sub) = args.first() else {
        return usage_error("schedule <create|list|get|update|delete|set-cell|calc-mrp|mrp-rows|grid> ...");
    };
    let rest = &args[1..];

    match sub.as_str() {
        "create" => {
            let (Some(name), Some(start), Some(end)) = (
                rest.first(),
                rest.get(1).and_then(|s| calendar::parse_date_lenient(s)),
                rest.get(2).and_then(|s| calendar::parse_date_lenient(s)),
            ) else {
                return usage_error("schedule create <名称> <起始日> <结束日>");
            };
            emit(api::schedule_api::create_schedule(state, name, start, end))
        }
        "list" => emit(api::schedule_api::list_schedules(state)),
        "get" => match rest.first() {
            Some(id) => emit(api::schedule_api::get_schedule(state, id)),
            None => usage_error("schedule get <排程ID>"),
        },
        "update" => {
            let (Some(id), Some(name), Some(start), Some(end)) = (
                rest.first(),
                rest.get(1),
                rest.get(2).and_then(|s| calendar::parse_date_lenient(s)),
                rest.get(3).and_then(|s| calendar::parse_date_lenient(s)),
            ) else {
                return usage_error("schedule update <排程ID> <名称> <起始日> <结束日> [--status DRAFT|ACTIVE|ARCHIVED]");
            };
            let status = flag_value(rest, "--status")
                .map(|s| ScheduleStatus::from_db_str(&s))
                .unwrap_or(ScheduleStatus::Draft);
            emit(
                api::schedule_api::update_schedule(state, id, name, start, end, status)
                    .map(|_| id.clone()),
            )
        }
        "delete" => match rest.first() {
            Some(id) => emit(api::schedule_api::delete_schedule(state, id).map(|_| id.clone())),
            None => usage_error("schedule delete <排程ID>"),
        },
        "set-cell" => {
            let (Some(id), Some(item_id), Some(date), Some(qty)) = (
                rest.first(),
                rest.get(1).and_then(|s| s.parse::<i64>().ok()),
                rest.get(2).and_then(|s| calendar::parse_date_lenient(s)),
                rest.get(3).and_then(|s| calendar::parse_quantity(s)),
            ) else {
                return usage_error("schedule set-cell <排程ID> <物料ID> <生产日> <计划量>");
            };
            emit(api::schedule_api::set_cell(state, id, item_id, date, qty))
        }
        "calc-mrp" => match rest.first() {
            Some(id) => {
                let types = parse_types(flag_value(rest, "--types"));
                emit(api::schedule_api::calc_daily_mrp(state, id, &types))
            }
            None => usage_error("schedule calc-mrp <排程ID> [--types RM,PKG]"),
        },
        "mrp-rows" => match rest.first() {
            Some(id) => emit(api::schedule_api::schedule_mrp_rows(state, id)),
            None => usage_error("schedule mrp-rows <排程ID>"),
        },
        "grid" => match rest.first() {
            Some(id) => emit(api::schedule_api::schedule_grid(state, id, &[])),
            None => usage_error("schedule grid <排程ID>"),
        },
        _ => usage_error("schedule <create|list|get|update|delete|set-cell|calc-mrp|mrp-rows|grid> ..."),
    }
}

// ==========================================
// 参数与输出辅助
// ==========================================

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn flag_present(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

/// --out 的值可省略 (省略时导出到配置目录); 后随另一 flag 时视为省略
fn out_flag(args: &[String]) -> Option<String> {
    flag_value(args, "--out").filter(|v| !v.starts_with("--"))
}

fn flag_date(args: &[String], flag: &str) -> Option<NaiveDate> {
    flag_value(args, flag).and_then(|s| calendar::parse_date_lenient(&s))
}

fn parse_types(raw: Option<String>) -> Vec<ItemType> {
    raw.map(|s| {
        s.split(',')
            .filter(|p| !p.trim().is_empty())
            .map(ItemType::from_db_str)
            .collect()
    })
    .unwrap_or_default()
}

fn emit<T: Serialize>(result: ApiResult<T>) -> bool {
    let response: CommandResponse<T> = result.into();
    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("{{\"ok\":false,\"message\":\"序列化失败: {}\"}}", e),
    }
    response.ok
}

fn usage_error(usage: &str) -> bool {
    emit::<()>(Err(ApiError::InvalidArgument(format!("用法: {}", usage))))
}

fn print_usage() {
    eprintln!(
        "release-kanban {}\n\n\
         用法:\n\
         \x20 import <文件路径> [--by 操作人]      导入释放单\n\
         \x20 imports                              导入历史\n\
         \x20 delete-import <版本ID>               删除导入版本\n\
         \x20 kanban [--import ID] [--start 日期] [--end 日期] [--type all|F|P] [--out [文件.csv]]\n\
         \x20 mrp <起始日> <结束日> [--import ID] [--type F|P] [--types RM,PKG] [--daily] [--out [文件.csv]]\n\
         \x20 inventory set <料号> <数量> [--loc 库位] | inventory list <料号>\n\
         \x20 schedule create|list|get|update|delete|set-cell|calc-mrp|mrp-rows|grid ...\n\n\
         数据库路径: 环境变量 {} 或系统数据目录",
        release_kanban::VERSION,
        release_kanban::app::DB_PATH_ENV,
    );
}
