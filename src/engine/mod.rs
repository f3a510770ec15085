// ==========================================
// 甜甜圈成本核算系统 - 引擎层
// ==========================================
// 职责: 纯计算（成本/产量/利润）、输入规范化、状态机
// 红线: 计算函数无状态、无 I/O；重算永不失败
// ==========================================

pub mod config;
pub mod costing;
pub mod error;
pub mod events;
pub mod normalizer;
pub mod state;

pub use config::StateEngineConfig;
pub use costing::{CostEngine, ProductionEngine, ProfitEngine};
pub use error::{StateError, StateResult};
pub use state::{AppStateService, BahanEdit, ProduksiSettingEdit, ResepEdit, SaveKey, ToppingEdit};
