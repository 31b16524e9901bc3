// ==========================================
// 产线排产系统 - 运维入口
// ==========================================
// 用法:
//   production-line-aps [db_path]
//
// 打开（必要时初始化）数据库，按产线输出有效排产概览
// ==========================================

use production_line_aps::app::{get_default_db_path, AppState};
use production_line_aps::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", production_line_aps::APP_NAME, production_line_aps::VERSION);
    tracing::info!("==================================================");

    let db_path = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    let lines = state.schedule_api.list_lines()?;
    if lines.is_empty() {
        println!("(无产线)");
        return Ok(());
    }

    for line in lines {
        let schedules = state.schedule_api.list_schedules_by_line(&line.line_id)?;
        println!(
            "[{}] {} 日产能={} 启用={} 排产数={}",
            line.line_code,
            line.line_name,
            line.daily_capacity,
            line.is_active,
            schedules.len()
        );
        for s in schedules {
            println!(
                "  {} {}~{} (当前完工 {}, 延期 {} 天) {}/{} {}",
                s.schedule_id,
                s.start_date,
                s.finish_date,
                s.current_finish_date,
                s.days_extended,
                s.qty_completed,
                s.qty_total_target,
                s.status
            );
        }
    }

    Ok(())
}
