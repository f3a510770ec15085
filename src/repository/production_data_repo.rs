// ==========================================
// 甜甜圈成本核算系统 - 复合原子操作协调器
// ==========================================
// 职责: 跨 Bahan/Resep 两表的多行事务操作
// 红线: 全部成功或全部回滚，这里是核心唯一要求
//       真正多行事务语义的地方
// ==========================================

use crate::domain::{Bahan, Resep};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::decimal_to_real;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

pub struct ProductionDataCoordinator {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionDataCoordinator {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增原料并为每个已有变体补一条用量行（单事务）
    ///
    /// # 参数
    /// - `bahan`: 待插入原料（Id 忽略）
    /// - `varian_ids`: 需要补行的变体 Id 列表
    /// - `jumlah_awal`: 各用量行的初始用量（通常为 0）
    ///
    /// # 返回
    /// - 带新 Id 的原料 + 全部新建用量行
    pub fn add_bahan_with_resep_rows(
        &self,
        bahan: &Bahan,
        varian_ids: &[i64],
        jumlah_awal: Decimal,
    ) -> RepositoryResult<(Bahan, Vec<Resep>)> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute(
            "INSERT INTO Bahan (NamaBahan, Satuan, NettoPerPack, HargaPerPack) VALUES (?1, ?2, ?3, ?4)",
            params![
                bahan.nama_bahan,
                bahan.satuan.as_str(),
                decimal_to_real(bahan.netto_per_pack),
                decimal_to_real(bahan.harga_per_pack),
            ],
        )?;

        let mut inserted_bahan = bahan.clone();
        inserted_bahan.id = tx.last_insert_rowid();

        let mut inserted_rows = Vec::with_capacity(varian_ids.len());
        for varian_id in varian_ids {
            tx.execute(
                "INSERT INTO Resep (BahanId, VarianId, JumlahDipakai) VALUES (?1, ?2, ?3)",
                params![inserted_bahan.id, varian_id, decimal_to_real(jumlah_awal)],
            )?;
            inserted_rows.push(Resep {
                id: tx.last_insert_rowid(),
                bahan_id: inserted_bahan.id,
                varian_id: *varian_id,
                jumlah_dipakai: jumlah_awal,
            });
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok((inserted_bahan, inserted_rows))
    }

    /// 删除原料及其所有变体下的用量行（单事务，FK 级联兜底）
    pub fn delete_bahan_and_resep_rows(&self, bahan_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        tx.execute("DELETE FROM Resep WHERE BahanId = ?1", params![bahan_id])?;
        tx.execute("DELETE FROM Bahan WHERE Id = ?1", params![bahan_id])?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}
