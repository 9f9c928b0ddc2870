use anyhow::Context;
use chrono::{DateTime, Utc};
use contracts::domain::a001_pass::aggregate::{EventAttendance, Pass, PassId};
use contracts::domain::common::EntityMetadata;
use contracts::enums::pass_type::PassType;
use uuid::Uuid;

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, QueryOrder, QuerySelect, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_pass")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub barcode: String,
    pub attendee_name: Option<String>,
    pub pass_type: String,
    pub events_json: String,
    pub total_price: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_scanned: bool,
    pub scan_time: Option<DateTime<Utc>>,
    pub is_sold: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Pass {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> anyhow::Result<Self> {
        let uuid = Uuid::parse_str(&m.id).with_context(|| format!("bad pass id '{}'", m.id))?;
        let pass_type = PassType::from_code(&m.pass_type)
            .ok_or_else(|| anyhow::anyhow!("unknown pass type '{}' in {}", m.pass_type, m.id))?;
        let events: Vec<EventAttendance> = serde_json::from_str(&m.events_json)
            .with_context(|| format!("bad events_json for pass {}", m.id))?;

        Ok(Pass {
            id: PassId::new(uuid),
            barcode: m.barcode,
            attendee_name: m.attendee_name,
            pass_type,
            events,
            total_price: u32::try_from(m.total_price)?,
            email: m.email,
            phone: m.phone,
            is_scanned: m.is_scanned,
            scan_time: m.scan_time,
            is_sold: m.is_sold,
            metadata: EntityMetadata {
                created_at: m.created_at,
                updated_at: m.updated_at,
                version: m.version,
            },
        })
    }
}

fn to_domain(models: Vec<Model>) -> anyhow::Result<Vec<Pass>> {
    models.into_iter().map(Pass::try_from).collect()
}

/// Все пропуска, новые первыми
pub async fn list_all(conn: &DatabaseConnection) -> anyhow::Result<Vec<Pass>> {
    let models = Entity::find()
        .order_by_desc(Column::CreatedAt)
        .all(conn)
        .await?;
    let mut items = to_domain(models)?;
    items.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
    Ok(items)
}

pub async fn list_by_type(
    conn: &DatabaseConnection,
    pass_type: PassType,
) -> anyhow::Result<Vec<Pass>> {
    let models = Entity::find()
        .filter(Column::PassType.eq(pass_type.code()))
        .all(conn)
        .await?;
    to_domain(models)
}

pub async fn get_by_id(conn: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<Pass>> {
    let result = Entity::find_by_id(id.to_string()).one(conn).await?;
    result.map(Pass::try_from).transpose()
}

pub async fn get_by_barcode(
    conn: &DatabaseConnection,
    barcode: &str,
) -> anyhow::Result<Option<Pass>> {
    let result = Entity::find()
        .filter(Column::Barcode.eq(barcode))
        .one(conn)
        .await?;
    result.map(Pass::try_from).transpose()
}

pub async fn barcode_exists<C: ConnectionTrait>(conn: &C, barcode: &str) -> anyhow::Result<bool> {
    let count = Entity::find()
        .filter(Column::Barcode.eq(barcode))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Штрихкоды, начинающиеся с префикса (LIKE в SQLite регистронезависим)
pub async fn list_barcodes_with_prefix<C: ConnectionTrait>(
    conn: &C,
    prefix: &str,
) -> anyhow::Result<Vec<String>> {
    let barcodes = Entity::find()
        .select_only()
        .column(Column::Barcode)
        .filter(Column::Barcode.starts_with(prefix))
        .into_tuple::<String>()
        .all(conn)
        .await?;
    Ok(barcodes)
}

pub async fn insert<C: ConnectionTrait>(conn: &C, aggregate: &Pass) -> anyhow::Result<Uuid> {
    let uuid = aggregate.id.value();
    let active = ActiveModel {
        id: Set(uuid.to_string()),
        barcode: Set(aggregate.barcode.clone()),
        attendee_name: Set(aggregate.attendee_name.clone()),
        pass_type: Set(aggregate.pass_type.code().to_string()),
        events_json: Set(serde_json::to_string(&aggregate.events)?),
        total_price: Set(i64::from(aggregate.total_price)),
        email: Set(aggregate.email.clone()),
        phone: Set(aggregate.phone.clone()),
        is_scanned: Set(aggregate.is_scanned),
        scan_time: Set(aggregate.scan_time),
        is_sold: Set(aggregate.is_sold),
        created_at: Set(aggregate.metadata.created_at),
        updated_at: Set(aggregate.metadata.updated_at),
        version: Set(aggregate.metadata.version),
    };
    active.insert(conn).await?;
    Ok(uuid)
}

/// Записать изменяемые поля пропуска
///
/// `is_scanned` и `scan_time` не пишутся: их меняют только
/// условные обновления `mark_scanned_*`. Версия увеличивается в SQL.
pub async fn update(conn: &DatabaseConnection, aggregate: &Pass) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::AttendeeName, Expr::value(aggregate.attendee_name.clone()))
        .col_expr(Column::PassType, Expr::value(aggregate.pass_type.code()))
        .col_expr(
            Column::EventsJson,
            Expr::value(serde_json::to_string(&aggregate.events)?),
        )
        .col_expr(Column::TotalPrice, Expr::value(i64::from(aggregate.total_price)))
        .col_expr(Column::Email, Expr::value(aggregate.email.clone()))
        .col_expr(Column::Phone, Expr::value(aggregate.phone.clone()))
        .col_expr(Column::IsSold, Expr::value(aggregate.is_sold))
        .col_expr(Column::UpdatedAt, Expr::value(aggregate.metadata.updated_at))
        .col_expr(Column::Version, Expr::col(Column::Version).add(1))
        .filter(Column::Id.eq(aggregate.to_string_id()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Отметить пропуск отсканированным, если он ещё не отсканирован
///
/// Возвращает `false`, если строка не найдена или уже отсканирована.
pub async fn mark_scanned_by_barcode(
    conn: &DatabaseConnection,
    barcode: &str,
    at: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::IsScanned, Expr::value(true))
        .col_expr(Column::ScanTime, Expr::value(Some(at)))
        .col_expr(Column::UpdatedAt, Expr::value(at))
        .col_expr(Column::Version, Expr::col(Column::Version).add(1))
        .filter(Column::Barcode.eq(barcode))
        .filter(Column::IsScanned.eq(false))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

pub async fn mark_scanned_by_id(
    conn: &DatabaseConnection,
    id: Uuid,
    at: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::IsScanned, Expr::value(true))
        .col_expr(Column::ScanTime, Expr::value(Some(at)))
        .col_expr(Column::UpdatedAt, Expr::value(at))
        .col_expr(Column::Version, Expr::col(Column::Version).add(1))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::IsScanned.eq(false))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

pub async fn delete(conn: &DatabaseConnection, id: Uuid) -> anyhow::Result<bool> {
    let result = Entity::delete_by_id(id.to_string()).exec(conn).await?;
    Ok(result.rows_affected > 0)
}
