// ==========================================
// 甜甜圈成本核算系统 - 原料仓储
// ==========================================
// 表: Bahan (Id, NamaBahan, Satuan, NettoPerPack, HargaPerPack)
// ==========================================

use crate::domain::{Bahan, Satuan};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{decimal_to_real, real_to_decimal};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

fn map_row(row: &Row) -> rusqlite::Result<Bahan> {
    let satuan: String = row.get("Satuan")?;
    Ok(Bahan {
        id: row.get("Id")?,
        nama_bahan: row.get("NamaBahan")?,
        satuan: Satuan::parse(&satuan),
        netto_per_pack: real_to_decimal(row.get("NettoPerPack")?),
        harga_per_pack: real_to_decimal(row.get("HargaPerPack")?),
    })
}

pub struct BahanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BahanRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Bahan>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT Id, NamaBahan, Satuan, NettoPerPack, HargaPerPack FROM Bahan ORDER BY Id",
        )?;
        let rows = stmt.query_map([], map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// 插入并返回带新 Id 的实体
    pub fn insert(&self, bahan: &Bahan) -> RepositoryResult<Bahan> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO Bahan (NamaBahan, Satuan, NettoPerPack, HargaPerPack) VALUES (?1, ?2, ?3, ?4)",
            params![
                bahan.nama_bahan,
                bahan.satuan.as_str(),
                decimal_to_real(bahan.netto_per_pack),
                decimal_to_real(bahan.harga_per_pack),
            ],
        )?;

        let mut inserted = bahan.clone();
        inserted.id = conn.last_insert_rowid();
        Ok(inserted)
    }

    pub fn update(&self, bahan: &Bahan) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE Bahan SET NamaBahan = ?1, Satuan = ?2, NettoPerPack = ?3, HargaPerPack = ?4 WHERE Id = ?5",
            params![
                bahan.nama_bahan,
                bahan.satuan.as_str(),
                decimal_to_real(bahan.netto_per_pack),
                decimal_to_real(bahan.harga_per_pack),
                bahan.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Bahan".to_string(),
                id: bahan.id.to_string(),
            });
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM Bahan WHERE Id = ?1", params![id])?;
        Ok(())
    }
}
