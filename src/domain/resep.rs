// ==========================================
// 甜甜圈成本核算系统 - 配方领域模型
// ==========================================
// 对齐: ResepVarian 表 / Resep 表（UNIQUE(VarianId, BahanId)）
// 说明: ResepItem 是面向展示的反规范化行，
//       冗余携带原料字段并附带派生结果
// ==========================================

use crate::domain::bahan::{Bahan, Satuan};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// ResepVarian - 配方变体
// ==========================================
// 不变量: 全集合中恰好一个变体 is_active = true（由状态引擎维护）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResepVarian {
    pub id: i64,
    pub nama_varian: String, // 变体名称（全局唯一，非空）
    pub is_active: bool,
}

// ==========================================
// Resep - 用量行（持久化形态）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resep {
    pub id: i64,
    pub bahan_id: i64,
    pub varian_id: i64,
    pub jumlah_dipakai: Decimal, // 用量（>=0，单位随原料）
}

// ==========================================
// ResepItem - 用量行（展示形态）
// ==========================================
// 冗余字段在原料变更时由状态引擎同步
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResepItem {
    pub id: i64,
    pub bahan_id: i64,
    pub varian_id: i64,

    // ===== 冗余的原料字段（展示便利）=====
    pub nama_bahan: String,
    pub satuan: Satuan,
    pub netto_per_pack: Decimal,
    pub harga_per_pack: Decimal,

    // ===== 输入 =====
    pub jumlah_dipakai: Decimal,

    // ===== 派生结果（每次重算覆盖）=====
    pub modal_bahan: Decimal,       // 本行成本贡献
    pub kontribusi_persen: Decimal, // 占面团总成本百分比
    pub validation_message: String, // "OK" 或解释性状态
}

impl ResepItem {
    /// 由持久化行 + 原料主数据组装展示行
    pub fn from_parts(resep: &Resep, bahan: &Bahan) -> Self {
        Self {
            id: resep.id,
            bahan_id: resep.bahan_id,
            varian_id: resep.varian_id,
            nama_bahan: bahan.nama_bahan.clone(),
            satuan: bahan.satuan,
            netto_per_pack: bahan.netto_per_pack,
            harga_per_pack: bahan.harga_per_pack,
            jumlah_dipakai: resep.jumlah_dipakai,
            modal_bahan: Decimal::ZERO,
            kontribusi_persen: Decimal::ZERO,
            validation_message: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_copies_bahan_fields() {
        let bahan = Bahan {
            id: 7,
            nama_bahan: "Tepung".to_string(),
            satuan: Satuan::Gram,
            netto_per_pack: Decimal::from(1000),
            harga_per_pack: Decimal::from(15000),
        };
        let resep = Resep {
            id: 3,
            bahan_id: 7,
            varian_id: 1,
            jumlah_dipakai: Decimal::from(500),
        };

        let item = ResepItem::from_parts(&resep, &bahan);
        assert_eq!(item.id, 3);
        assert_eq!(item.bahan_id, 7);
        assert_eq!(item.nama_bahan, "Tepung");
        assert_eq!(item.jumlah_dipakai, Decimal::from(500));
        assert_eq!(item.modal_bahan, Decimal::ZERO);
    }
}
