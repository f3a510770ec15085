// ==========================================
// 甜甜圈成本核算系统 - 用量行仓储
// ==========================================
// 表: Resep (Id, BahanId, VarianId, JumlahDipakai)
// 约束: UNIQUE(VarianId, BahanId)；两个 FK 均级联删除
// ==========================================

use crate::domain::Resep;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{decimal_to_real, real_to_decimal};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

fn map_row(row: &Row) -> rusqlite::Result<Resep> {
    Ok(Resep {
        id: row.get("Id")?,
        bahan_id: row.get("BahanId")?,
        varian_id: row.get("VarianId")?,
        jumlah_dipakai: real_to_decimal(row.get("JumlahDipakai")?),
    })
}

pub struct ResepRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ResepRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Resep>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT Id, BahanId, VarianId, JumlahDipakai FROM Resep ORDER BY Id")?;
        let rows = stmt.query_map([], map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_by_varian(&self, varian_id: i64) -> RepositoryResult<Vec<Resep>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT Id, BahanId, VarianId, JumlahDipakai FROM Resep WHERE VarianId = ?1 ORDER BY Id",
        )?;
        let rows = stmt.query_map(params![varian_id], map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// 插入并返回带新 Id 的实体
    pub fn insert(&self, resep: &Resep) -> RepositoryResult<Resep> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO Resep (BahanId, VarianId, JumlahDipakai) VALUES (?1, ?2, ?3)",
            params![
                resep.bahan_id,
                resep.varian_id,
                decimal_to_real(resep.jumlah_dipakai),
            ],
        )?;

        let mut inserted = resep.clone();
        inserted.id = conn.last_insert_rowid();
        Ok(inserted)
    }

    /// 批量插入（单事务，全部成功或全部回滚）
    pub fn insert_many(&self, reseps: &[Resep]) -> RepositoryResult<Vec<Resep>> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut inserted = Vec::with_capacity(reseps.len());
        for resep in reseps {
            tx.execute(
                "INSERT INTO Resep (BahanId, VarianId, JumlahDipakai) VALUES (?1, ?2, ?3)",
                params![
                    resep.bahan_id,
                    resep.varian_id,
                    decimal_to_real(resep.jumlah_dipakai),
                ],
            )?;
            let mut row = resep.clone();
            row.id = tx.last_insert_rowid();
            inserted.push(row);
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(inserted)
    }

    pub fn update_jumlah_dipakai(&self, id: i64, jumlah_dipakai: Decimal) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE Resep SET JumlahDipakai = ?1 WHERE Id = ?2",
            params![decimal_to_real(jumlah_dipakai), id],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Resep".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn delete_by_bahan(&self, bahan_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM Resep WHERE BahanId = ?1", params![bahan_id])?;
        Ok(())
    }

    /// 把指定变体的全部用量清零（不触碰其他变体）
    pub fn reset_by_varian(&self, varian_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "UPDATE Resep SET JumlahDipakai = 0 WHERE VarianId = ?1",
            params![varian_id],
        )?;
        Ok(())
    }
}
