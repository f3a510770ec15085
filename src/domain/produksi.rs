// ==========================================
// 甜甜圈成本核算系统 - 生产参数领域模型
// ==========================================
// 对齐: ProduksiSetting 表（单例，Id 恒为 1）
// 生命周期: 首次访问时以默认值懒创建，只更新不删除
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProduksiSetting {
    pub id: i64,                          // 恒为 1
    pub jumlah_donat_dihasilkan: Decimal, // 每批产量（>0）
    pub berat_per_donat: Decimal,         // 单个重量（>0，仅展示参考，不参与重算）
    pub waste_persen: Decimal,            // 损耗百分比 [0, 99]
    pub target_profit_persen: Decimal,    // 目标利润率 [1, 95]
    pub hari_produksi_per_bulan: i64,     // 每月生产天数 [1, 31]
}

impl Default for ProduksiSetting {
    fn default() -> Self {
        Self {
            id: 1,
            jumlah_donat_dihasilkan: Decimal::from(100),
            berat_per_donat: Decimal::from(50),
            waste_persen: Decimal::ZERO,
            target_profit_persen: Decimal::from(30),
            hari_produksi_per_bulan: 26,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let setting = ProduksiSetting::default();
        assert_eq!(setting.id, 1);
        assert_eq!(setting.jumlah_donat_dihasilkan, Decimal::from(100));
        assert_eq!(setting.berat_per_donat, Decimal::from(50));
        assert_eq!(setting.target_profit_persen, Decimal::from(30));
        assert_eq!(setting.hari_produksi_per_bulan, 26);
    }
}
