// ==========================================
// 甜甜圈成本核算系统 - 入口
// ==========================================
// 说明: 无头入口，装配引擎、初始化并输出一次核算摘要；
//       UI 外壳接入时以 AppState 为唯一入口
// ==========================================

use hpp_donat::app::{get_default_db_path, AppState};
use hpp_donat::engine::events::OptionalEventPublisher;
use hpp_donat::helpers::format_rupiah;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hpp_donat::logging::init();

    tracing::info!("{} v{} 启动", hpp_donat::APP_NAME, hpp_donat::VERSION);

    let db_path = get_default_db_path();
    let state = AppState::new(db_path, OptionalEventPublisher::none())?;
    let service = state.service.clone();

    service.initialize().await?;

    let calc = service.calculation();
    let varian = service
        .varian_aktif()
        .map(|v| v.nama_varian)
        .unwrap_or_default();

    tracing::info!(
        "变体 [{}]: HPP {} | 售价 {} | 单个利润 {} | 月利润估算 {}",
        varian,
        format_rupiah(calc.hpp_final),
        format_rupiah(calc.harga_jual),
        format_rupiah(calc.profit_per_donat),
        format_rupiah(calc.estimasi_bulanan),
    );

    service.dispose();
    Ok(())
}
