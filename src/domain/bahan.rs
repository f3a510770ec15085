// ==========================================
// 甜甜圈成本核算系统 - 原料领域模型
// ==========================================
// 对齐: Bahan 表（Id / NamaBahan / Satuan / NettoPerPack / HargaPerPack）
// 用途: 主数据，被所有配方变体的用量行引用
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Satuan - 计量单位
// ==========================================
// 约束: 仅允许 7 种单位，未知输入回退为 gram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Satuan {
    #[default]
    Gram,
    Kg,
    Ml,
    Liter,
    Butir,
    Pcs,
    Sendok,
}

impl Satuan {
    /// 转换为存储字符串（小写）
    pub fn as_str(&self) -> &'static str {
        match self {
            Satuan::Gram => "gram",
            Satuan::Kg => "kg",
            Satuan::Ml => "ml",
            Satuan::Liter => "liter",
            Satuan::Butir => "butir",
            Satuan::Pcs => "pcs",
            Satuan::Sendok => "sendok",
        }
    }

    /// 从任意输入解析（trim + 小写；非法值回退 gram）
    pub fn parse(s: &str) -> Satuan {
        match s.trim().to_lowercase().as_str() {
            "kg" => Satuan::Kg,
            "ml" => Satuan::Ml,
            "liter" => Satuan::Liter,
            "butir" => Satuan::Butir,
            "pcs" => Satuan::Pcs,
            "sendok" => Satuan::Sendok,
            _ => Satuan::Gram,
        }
    }
}

// ==========================================
// Bahan - 原料主数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bahan {
    pub id: i64,                  // 主键（SQLite AUTOINCREMENT）
    pub nama_bahan: String,       // 原料名称（非空，空输入回退占位名）
    pub satuan: Satuan,           // 计量单位
    pub netto_per_pack: Decimal,  // 每包净含量（>0）
    pub harga_per_pack: Decimal,  // 每包价格（>=0）
}

impl Bahan {
    /// 新建原料的占位默认值（"添加原料"按钮语义）
    pub fn baru() -> Self {
        Self {
            id: 0,
            nama_bahan: "Bahan Baru".to_string(),
            satuan: Satuan::Gram,
            netto_per_pack: Decimal::from(1000),
            harga_per_pack: Decimal::ZERO,
        }
    }
}
