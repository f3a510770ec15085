// ==========================================
// 甜甜圈成本核算系统 - 仓储层
// ==========================================
// 职责: SQLite CRUD + 多行事务操作，按配方变体限定范围
// 约定: 金额/数量在内存中为 Decimal，列类型为 REAL，
//       转换只发生在本层边界
// ==========================================

pub mod bahan_repo;
pub mod error;
pub mod initializer;
pub mod produksi_setting_repo;
pub mod production_data_repo;
pub mod resep_repo;
pub mod topping_repo;
pub mod varian_repo;

pub use bahan_repo::BahanRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use initializer::DatabaseInitializer;
pub use produksi_setting_repo::ProduksiSettingRepository;
pub use production_data_repo::ProductionDataCoordinator;
pub use resep_repo::ResepRepository;
pub use topping_repo::ToppingRepository;
pub use varian_repo::VarianRepository;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

/// Decimal -> REAL 列值（落库方向）
pub(crate) fn decimal_to_real(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// REAL 列值 -> Decimal（读取方向，normalize 去除尾随零）
pub(crate) fn real_to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default().normalize()
}
