// ==========================================
// 机台生产排程 - 设备数据仓储（只读）
// ==========================================

use crate::domain::equipment::EquipmentInfo;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct EquipmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EquipmentRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按机台号查询设备（同一机台多台设备时取最早登记的一台）
    pub fn find_by_machine_no(&self, machine_no: &str) -> RepositoryResult<Option<EquipmentInfo>> {
        let conn = self.get_conn()?;
        let equipment = conn
            .query_row(
                r#"
                SELECT id, equipment_no, machine_no, equipment_name, group_name, equipment_model
                FROM equipment
                WHERE machine_no = ?1 AND deleted = 0
                ORDER BY id ASC
                LIMIT 1
                "#,
                params![machine_no],
                |row| {
                    Ok(EquipmentInfo {
                        equipment_id: row.get(0)?,
                        equipment_no: row.get(1)?,
                        machine_no: row.get(2)?,
                        equipment_name: row.get(3)?,
                        group_name: row.get(4)?,
                        equipment_model: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(equipment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    #[test]
    fn test_find_by_machine_no_skips_deleted() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO equipment (equipment_no, machine_no, equipment_name, deleted)
            VALUES ('EQ-OLD', 'M1', '旧注塑机', 1);
            INSERT INTO equipment (equipment_no, machine_no, equipment_name, group_name)
            VALUES ('EQ-01', 'M1', '注塑机', '一车间');
            "#,
        )
        .unwrap();
        let repo = EquipmentRepository::from_connection(Arc::new(Mutex::new(conn)));

        let eq = repo.find_by_machine_no("M1").unwrap().unwrap();
        assert_eq!(eq.equipment_no, "EQ-01");
        assert_eq!(eq.group_name.as_deref(), Some("一车间"));
        assert!(eq.equipment_model.is_none());
        assert!(repo.find_by_machine_no("M9").unwrap().is_none());
    }
}
