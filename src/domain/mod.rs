// ==========================================
// 甜甜圈成本核算系统 - 领域层
// ==========================================
// 职责: 定义实体与派生输出模型
// 红线: 领域结构体不含业务逻辑（计算在引擎层）
// ==========================================

pub mod bahan;
pub mod calculation;
pub mod produksi;
pub mod resep;
pub mod status;
pub mod topping;

pub use bahan::{Bahan, Satuan};
pub use calculation::CalculationOutput;
pub use produksi::ProduksiSetting;
pub use resep::{Resep, ResepItem, ResepVarian};
pub use status::AppStatus;
pub use topping::Topping;
