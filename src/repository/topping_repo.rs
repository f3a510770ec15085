// ==========================================
// 甜甜圈成本核算系统 - 配料仓储
// ==========================================
// 表: Topping (Id, NamaTopping, BiayaPerDonat, IsActive)
// 说明: 配料与变体无关，全局共享
// ==========================================

use crate::domain::Topping;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{decimal_to_real, real_to_decimal};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

fn map_row(row: &Row) -> rusqlite::Result<Topping> {
    let is_active: i64 = row.get("IsActive")?;
    Ok(Topping {
        id: row.get("Id")?,
        nama_topping: row.get("NamaTopping")?,
        biaya_per_donat: real_to_decimal(row.get("BiayaPerDonat")?),
        is_active: is_active != 0,
    })
}

pub struct ToppingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ToppingRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Topping>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT Id, NamaTopping, BiayaPerDonat, IsActive FROM Topping ORDER BY Id")?;
        let rows = stmt.query_map([], map_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// 插入并返回带新 Id 的实体
    pub fn insert(&self, topping: &Topping) -> RepositoryResult<Topping> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO Topping (NamaTopping, BiayaPerDonat, IsActive) VALUES (?1, ?2, ?3)",
            params![
                topping.nama_topping,
                decimal_to_real(topping.biaya_per_donat),
                topping.is_active as i64,
            ],
        )?;

        let mut inserted = topping.clone();
        inserted.id = conn.last_insert_rowid();
        Ok(inserted)
    }

    pub fn update(&self, topping: &Topping) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "UPDATE Topping SET NamaTopping = ?1, BiayaPerDonat = ?2, IsActive = ?3 WHERE Id = ?4",
            params![
                topping.nama_topping,
                decimal_to_real(topping.biaya_per_donat),
                topping.is_active as i64,
                topping.id,
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Topping".to_string(),
                id: topping.id.to_string(),
            });
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM Topping WHERE Id = ?1", params![id])?;
        Ok(())
    }
}
