// ============================================================================
// Storefront Infrastructure - PostgreSQL Menu Repository
// File: crates/storefront-infrastructure/src/database/postgres/menu_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, warn};
use uuid::Uuid;

use storefront_core::domain::{LinkType, MenuChangeSet, MenuItem, MenuSnapshot};
use storefront_core::error::DomainError;
use storefront_core::repositories::MenuRepository;

pub struct PgMenuRepository {
    pool: PgPool,
}

impl PgMenuRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct MenuItemRow {
    pub id: Uuid,
    pub storefront_id: Uuid,
    pub label: String,
    pub link_type: String,
    pub target: String,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub is_visible: bool,
    pub show_dropdown: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            storefront_id: row.storefront_id,
            label: row.label,
            link_type: LinkType::from_str(&row.link_type).unwrap_or_default(),
            target: row.target,
            parent_id: row.parent_id,
            sort_order: row.sort_order,
            is_visible: row.is_visible,
            show_dropdown: row.show_dropdown,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e: sqlx::Error| {
        error!("Database error {}: {}", context, e);
        DomainError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    async fn load_snapshot(&self, storefront_id: &Uuid) -> Result<MenuSnapshot, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("starting snapshot transaction"))?;

        // both reads must observe the same commit
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(db_error("setting snapshot isolation"))?;

        let revision: Option<i64> = sqlx::query_scalar(
            "SELECT revision FROM storefront_menus WHERE storefront_id = $1",
        )
        .bind(storefront_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("loading menu revision"))?;

        let rows: Vec<MenuItemRow> = sqlx::query_as(
            r#"
            SELECT
                id, storefront_id, label, link_type, target,
                parent_id, sort_order, is_visible, show_dropdown,
                created_at, modified_at
            FROM storefront_menu_items
            WHERE storefront_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(storefront_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(db_error("loading menu items"))?;

        tx.commit()
            .await
            .map_err(db_error("closing snapshot transaction"))?;

        debug!(
            "Loaded {} menu item(s) for storefront {}",
            rows.len(),
            storefront_id
        );

        Ok(MenuSnapshot {
            storefront_id: *storefront_id,
            revision: revision.unwrap_or(0),
            items: rows.into_iter().map(Into::into).collect(),
        })
    }

    async fn commit(
        &self,
        storefront_id: &Uuid,
        expected_revision: i64,
        changes: &MenuChangeSet,
    ) -> Result<i64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("starting menu transaction"))?;

        sqlx::query(
            r#"
            INSERT INTO storefront_menus (storefront_id)
            VALUES ($1)
            ON CONFLICT (storefront_id) DO NOTHING
            "#,
        )
        .bind(storefront_id)
        .execute(&mut *tx)
        .await
        .map_err(db_error("registering storefront menu"))?;

        // serialization point for every writer of this storefront
        let current: i64 = sqlx::query_scalar(
            "SELECT revision FROM storefront_menus WHERE storefront_id = $1 FOR UPDATE",
        )
        .bind(storefront_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("locking storefront menu"))?;

        if current != expected_revision {
            warn!(
                "Storefront {} menu moved from revision {} to {}; refusing stale write",
                storefront_id, expected_revision, current
            );
            tx.rollback()
                .await
                .map_err(db_error("rolling back stale write"))?;
            return Err(DomainError::ConcurrentModification);
        }

        for item in &changes.upserts {
            sqlx::query(
                r#"
                INSERT INTO storefront_menu_items (
                    id, storefront_id, label, link_type, target,
                    parent_id, sort_order, is_visible, show_dropdown,
                    created_at, modified_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (id) DO UPDATE
                SET
                    label = EXCLUDED.label,
                    link_type = EXCLUDED.link_type,
                    target = EXCLUDED.target,
                    parent_id = EXCLUDED.parent_id,
                    sort_order = EXCLUDED.sort_order,
                    is_visible = EXCLUDED.is_visible,
                    show_dropdown = EXCLUDED.show_dropdown,
                    modified_at = EXCLUDED.modified_at
                WHERE storefront_menu_items.storefront_id = EXCLUDED.storefront_id
                "#,
            )
            .bind(item.id)
            .bind(storefront_id)
            .bind(&item.label)
            .bind(item.link_type.as_str())
            .bind(&item.target)
            .bind(item.parent_id)
            .bind(item.sort_order)
            .bind(item.is_visible)
            .bind(item.show_dropdown)
            .bind(item.created_at)
            .bind(item.modified_at)
            .execute(&mut *tx)
            .await
            .map_err(db_error("writing menu item"))?;
        }

        if !changes.deletes.is_empty() {
            sqlx::query(
                "DELETE FROM storefront_menu_items WHERE storefront_id = $1 AND id = ANY($2)",
            )
            .bind(storefront_id)
            .bind(&changes.deletes)
            .execute(&mut *tx)
            .await
            .map_err(db_error("deleting menu items"))?;
        }

        let revision: i64 = sqlx::query_scalar(
            r#"
            UPDATE storefront_menus
            SET revision = revision + 1, modified_at = NOW()
            WHERE storefront_id = $1
            RETURNING revision
            "#,
        )
        .bind(storefront_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("bumping menu revision"))?;

        // deferred parent FK is checked here
        tx.commit()
            .await
            .map_err(db_error("committing menu transaction"))?;

        Ok(revision)
    }
}
