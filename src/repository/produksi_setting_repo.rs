// ==========================================
// 甜甜圈成本核算系统 - 生产参数仓储
// ==========================================
// 表: ProduksiSetting (单例行，Id 恒为 1)
// 生命周期: 首次访问时以默认值懒创建，只更新不删除
// ==========================================

use crate::domain::ProduksiSetting;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{decimal_to_real, real_to_decimal};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

fn map_row(row: &Row) -> rusqlite::Result<ProduksiSetting> {
    Ok(ProduksiSetting {
        id: row.get("Id")?,
        jumlah_donat_dihasilkan: real_to_decimal(row.get("JumlahDonatDihasilkan")?),
        berat_per_donat: real_to_decimal(row.get("BeratPerDonat")?),
        waste_persen: real_to_decimal(row.get("WastePersen")?),
        target_profit_persen: real_to_decimal(row.get("TargetProfitPersen")?),
        hari_produksi_per_bulan: row.get("HariProduksiPerBulan")?,
    })
}

pub struct ProduksiSettingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProduksiSettingRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取单例行；不存在则以默认值创建后返回
    pub fn get_or_create(&self) -> RepositoryResult<ProduksiSetting> {
        let conn = self.get_conn()?;

        let existing = conn
            .query_row(
                "SELECT Id, JumlahDonatDihasilkan, BeratPerDonat, WastePersen, TargetProfitPersen, HariProduksiPerBulan
                 FROM ProduksiSetting WHERE Id = 1",
                [],
                map_row,
            )
            .optional()?;

        if let Some(setting) = existing {
            return Ok(setting);
        }

        let defaults = ProduksiSetting::default();
        conn.execute(
            "INSERT INTO ProduksiSetting (Id, JumlahDonatDihasilkan, BeratPerDonat, WastePersen, TargetProfitPersen, HariProduksiPerBulan)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)",
            params![
                decimal_to_real(defaults.jumlah_donat_dihasilkan),
                decimal_to_real(defaults.berat_per_donat),
                decimal_to_real(defaults.waste_persen),
                decimal_to_real(defaults.target_profit_persen),
                defaults.hari_produksi_per_bulan,
            ],
        )?;
        Ok(defaults)
    }

    pub fn update(&self, setting: &ProduksiSetting) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE ProduksiSetting
             SET JumlahDonatDihasilkan = ?1, BeratPerDonat = ?2, WastePersen = ?3,
                 TargetProfitPersen = ?4, HariProduksiPerBulan = ?5
             WHERE Id = 1",
            params![
                decimal_to_real(setting.jumlah_donat_dihasilkan),
                decimal_to_real(setting.berat_per_donat),
                decimal_to_real(setting.waste_persen),
                decimal_to_real(setting.target_profit_persen),
                setting.hari_produksi_per_bulan,
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProduksiSetting".to_string(),
                id: "1".to_string(),
            });
        }
        Ok(())
    }
}
