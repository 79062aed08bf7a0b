//! Player Snapshot Table
//!
//! Row format and statements for the table mirroring online players.

use sqlx::{AnyConnection, Connection};

use crate::host::TrackedEntity;

pub const SNAPSHOT_TABLE: &str = "player_tracker";

const CREATE_SNAPSHOT_TABLE: &str = "CREATE TABLE IF NOT EXISTS player_tracker (\
     name VARCHAR(64) NOT NULL, \
     group_name VARCHAR(64) NOT NULL, \
     dimension INTEGER NOT NULL, \
     x INTEGER NOT NULL, \
     y INTEGER NOT NULL, \
     z INTEGER NOT NULL, \
     hidden BOOLEAN NOT NULL)";

const CLEAR_SNAPSHOT: &str = "DELETE FROM player_tracker";

const INSERT_SNAPSHOT_ROW: &str = "INSERT INTO player_tracker \
     (name, group_name, dimension, x, y, z, hidden) VALUES (?, ?, ?, ?, ?, ?, ?)";

// == Snapshot Row ==
/// One row of the snapshot table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    pub name: String,
    pub group: String,
    pub dimension: i32,
    pub x: i32,
    /// Never negative; riding a boat or minecart can report bogus heights
    pub y: i32,
    pub z: i32,
    pub hidden: bool,
}

impl From<&TrackedEntity> for SnapshotRow {
    fn from(entity: &TrackedEntity) -> Self {
        Self {
            name: entity.name.clone(),
            group: entity.group.clone(),
            dimension: entity.dimension.index(),
            x: entity.position.x,
            y: entity.position.y.max(0),
            z: entity.position.z,
            hidden: entity.hidden,
        }
    }
}

/// Replaces the table's contents with `rows` in one transaction.
///
/// Returns the number of rows written.
pub(crate) async fn replace_rows(
    conn: &mut AnyConnection,
    rows: &[SnapshotRow],
) -> Result<u64, sqlx::Error> {
    sqlx::query(CREATE_SNAPSHOT_TABLE).execute(&mut *conn).await?;

    let mut tx = conn.begin().await?;

    sqlx::query(CLEAR_SNAPSHOT).execute(&mut *tx).await?;

    let mut written = 0;
    for row in rows {
        written += sqlx::query(INSERT_SNAPSHOT_ROW)
            .bind(row.name.as_str())
            .bind(row.group.as_str())
            .bind(row.dimension)
            .bind(row.x)
            .bind(row.y)
            .bind(row.z)
            .bind(row.hidden)
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}
