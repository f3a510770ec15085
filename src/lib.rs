// ==========================================
// 甜甜圈成本核算系统 (HPP Donat) - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 本地成本/定价/利润联动计算引擎
// 说明: UI 外壳（窗口/表单/图表）不在本库范围内，
//       仅通过状态快照与事件接口对接
// ==========================================

// 初始化国际化系统（用户提示文案为印尼语）
rust_i18n::i18n!("locales", fallback = "id");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 计算与状态机
pub mod engine;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 展示辅助（货币格式化）
pub mod helpers;

// 应用层 - 依赖装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AppStatus, Bahan, CalculationOutput, ProduksiSetting, Resep, ResepItem, ResepVarian, Satuan,
    Topping,
};

// 引擎
pub use engine::{
    AppStateService, BahanEdit, CostEngine, ProduksiSettingEdit, ProductionEngine, ProfitEngine,
    ResepEdit, StateEngineConfig, StateError, ToppingEdit,
};

// 事件
pub use engine::events::{NoOpEventPublisher, StateEvent, StateEventKind, StateEventPublisher};

// 仓储
pub use repository::{DatabaseInitializer, RepositoryError, RepositoryResult};

// 应用装配
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "HPP Donat 甜甜圈成本核算系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.2";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
