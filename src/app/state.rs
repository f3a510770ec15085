// ==========================================
// 甜甜圈成本核算系统 - 应用状态装配
// ==========================================
// 职责: 打开数据库、跑初始化迁移、构造注入全部协作者
// 说明: 无全局单例，全部依赖经构造函数显式注入
// ==========================================

use std::sync::{Arc, Mutex};

use crate::db::open_sqlite_connection;
use crate::engine::events::OptionalEventPublisher;
use crate::engine::{AppStateService, StateEngineConfig};
use crate::repository::{
    BahanRepository, DatabaseInitializer, ProductionDataCoordinator, ProduksiSettingRepository,
    RepositoryResult, ResepRepository, ToppingRepository, VarianRepository,
};

/// 应用状态
///
/// 持有状态引擎实例与数据库路径；
/// UI 外壳以此为唯一入口
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 状态引擎（核心）
    pub service: Arc<AppStateService>,
}

impl AppState {
    /// 创建 AppState 实例
    ///
    /// # 参数
    /// - `db_path`: 数据库文件路径
    /// - `events`: 可选的事件发布者（UI 绑定层适配器）
    ///
    /// # 说明
    /// 依次: 打开连接 -> 初始化/迁移数据库 -> 装配仓储 -> 装配引擎。
    /// 任何一步失败都是启动致命错误。
    pub fn new(db_path: String, events: OptionalEventPublisher) -> RepositoryResult<Self> {
        Self::with_config(db_path, StateEngineConfig::default(), events)
    }

    pub fn with_config(
        db_path: String,
        config: StateEngineConfig,
        events: OptionalEventPublisher,
    ) -> RepositoryResult<Self> {
        tracing::info!("初始化 AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)?;
        let conn = Arc::new(Mutex::new(conn));

        // 建表与前向迁移（旧库不丢数据）
        DatabaseInitializer::new(conn.clone()).initialize()?;

        // ===== 仓储层 =====
        let bahan_repo = Arc::new(BahanRepository::new(conn.clone()));
        let resep_repo = Arc::new(ResepRepository::new(conn.clone()));
        let varian_repo = Arc::new(VarianRepository::new(conn.clone()));
        let topping_repo = Arc::new(ToppingRepository::new(conn.clone()));
        let setting_repo = Arc::new(ProduksiSettingRepository::new(conn.clone()));
        let coordinator = Arc::new(ProductionDataCoordinator::new(conn.clone()));

        // ===== 引擎层 =====
        let service = Arc::new(AppStateService::new(
            bahan_repo,
            resep_repo,
            varian_repo,
            topping_repo,
            setting_repo,
            coordinator,
            config,
            events,
        ));

        tracing::info!("AppState 初始化完成");
        Ok(Self { db_path, service })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 HPP_DONAT_DB_PATH 优先（调试/测试/CI）
/// - 否则用户数据目录/hpp-donat/hpp_donat.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("HPP_DONAT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./hpp_donat.db");

    if let Some(data_dir) = dirs::data_dir() {
        path = data_dir.join("hpp-donat");
        std::fs::create_dir_all(&path).ok();
        path = path.join("hpp_donat.db");
    }

    path.to_string_lossy().to_string()
}
