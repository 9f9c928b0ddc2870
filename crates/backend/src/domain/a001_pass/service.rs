use chrono::Utc;
use contracts::domain::a001_pass::aggregate::{
    CreatePassDto, IssueBatchDto, MergeEventsDto, Pass, PassId, UpdatePassDto,
};
use contracts::domain::a001_pass::merge::merge_events;
use contracts::domain::a001_pass::query::{self, PassListQuery};
use contracts::domain::common::{AggregateId, AggregateRoot};
use contracts::enums::pass_type::PassType;
use contracts::shared::catalog::Catalog;
use contracts::shared::validation::normalize_optional;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::sync::Arc;
use uuid::Uuid;

use super::error::{is_unique_violation, PassError, PassResult};
use super::repository;
use crate::shared::config::BarcodeConfig;

/// Максимальный размер одной пачки при пакетном выпуске
pub const MAX_BATCH_SIZE: u32 = 500;

/// Жизненный цикл пропусков, сканирование и выборки
#[derive(Clone)]
pub struct PassService {
    conn: DatabaseConnection,
    catalog: Arc<Catalog>,
    barcodes: BarcodeConfig,
}

fn parse_id(id: &str) -> PassResult<Uuid> {
    PassId::from_string(id)
        .map(|id| id.value())
        .map_err(|_| PassError::not_found())
}

fn parse_pass_type(code: &str) -> PassResult<PassType> {
    PassType::from_code(code.trim()).ok_or_else(|| PassError::validation("Invalid pass type"))
}

fn next_free_barcode<'a>(
    taken: impl IntoIterator<Item = &'a str>,
    prefix: &str,
    width: usize,
) -> PassResult<String> {
    query::next_barcode(taken, prefix, width).ok_or_else(|| {
        PassError::Validation(format!("No free barcode left for prefix {}", prefix))
    })
}

/// Проверить и записать новый пропуск в рамках переданного соединения
async fn insert_checked<C: ConnectionTrait>(conn: &C, mut pass: Pass) -> PassResult<Pass> {
    pass.validate().map_err(PassError::Validation)?;

    if repository::barcode_exists(conn, &pass.barcode).await? {
        tracing::warn!("Rejected duplicate barcode {}", pass.barcode);
        return Err(PassError::duplicate_barcode());
    }

    pass.before_write();
    match repository::insert(conn, &pass).await {
        Ok(_) => Ok(pass),
        Err(e) if is_unique_violation(&e) => {
            tracing::warn!("Concurrent insert of barcode {}", pass.barcode);
            Err(PassError::duplicate_barcode())
        }
        Err(e) => Err(e.into()),
    }
}

impl PassService {
    pub fn new(conn: DatabaseConnection, catalog: Arc<Catalog>, barcodes: BarcodeConfig) -> Self {
        Self {
            conn,
            catalog,
            barcodes,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub async fn create(&self, dto: CreatePassDto) -> PassResult<Pass> {
        let barcode = normalize_optional(dto.barcode.as_deref());
        let pass_type = normalize_optional(dto.pass_type.as_deref());
        let (Some(barcode), Some(pass_type)) = (barcode, pass_type) else {
            return Err(PassError::validation("Barcode and pass type are required"));
        };
        let pass_type = parse_pass_type(&pass_type)?;

        let events = dto.events.unwrap_or_default();
        if pass_type == PassType::Regular && events.is_empty() {
            return Err(PassError::validation(
                "At least one event must be selected for regular passes",
            ));
        }

        let pass = Pass::new_for_insert(
            barcode,
            pass_type,
            events,
            dto.attendee_name,
            dto.email,
            dto.phone,
            dto.is_sold.unwrap_or(false),
            &self.catalog,
        );

        self.insert_new(pass).await
    }

    async fn insert_new(&self, pass: Pass) -> PassResult<Pass> {
        let pass = insert_checked(&self.conn, pass).await?;
        tracing::info!(
            "Created {} pass {} ({}), total {}",
            pass.pass_type,
            pass.barcode,
            pass.to_string_id(),
            pass.total_price
        );
        Ok(pass)
    }

    /// Записать все пропуска одной транзакцией: при ошибке не сохраняется ни один
    async fn insert_all(&self, passes: Vec<Pass>) -> PassResult<Vec<Pass>> {
        let txn = self.conn.begin().await.map_err(anyhow::Error::from)?;
        let mut inserted = Vec::with_capacity(passes.len());
        for pass in passes {
            inserted.push(insert_checked(&txn, pass).await?);
        }
        txn.commit().await.map_err(anyhow::Error::from)?;
        Ok(inserted)
    }

    /// Частичное обновление; `events` заменяет список целиком
    ///
    /// Если после замены списка все мероприятия посещены, пропуск
    /// помечается отсканированным условной записью.
    pub async fn update(&self, dto: UpdatePassDto) -> PassResult<Pass> {
        let id = match dto.id.as_deref().map(str::trim) {
            None | Some("") => return Err(PassError::validation("Pass ID is required")),
            Some(id) => parse_id(id)?,
        };

        let mut pass = repository::get_by_id(&self.conn, id)
            .await?
            .ok_or_else(PassError::not_found)?;

        let outcome = pass
            .update(&dto, &self.catalog)
            .map_err(PassError::Validation)?;
        pass.validate().map_err(PassError::Validation)?;
        pass.before_write();

        if !repository::update(&self.conn, &pass).await? {
            return Err(PassError::not_found());
        }

        if outcome.events_replaced && !pass.is_scanned && pass.all_events_visited() {
            let now = Utc::now();
            if repository::mark_scanned_by_id(&self.conn, id, now).await? {
                tracing::info!("Pass {} auto-scanned: all events visited", pass.barcode);
            }
        }

        tracing::info!("Updated pass {} (v{})", pass.barcode, pass.metadata.version);
        self.reload(id).await
    }

    /// Слить частичный список мероприятий с сохранённым и обновить пропуск
    pub async fn merge_events(&self, dto: MergeEventsDto) -> PassResult<Pass> {
        let id = match dto.id.as_deref().map(str::trim) {
            None | Some("") => return Err(PassError::validation("Pass ID is required")),
            Some(id) => id.to_string(),
        };
        let current = self.get_by_id(&id).await?;
        let merged = merge_events(&current.events, &dto.events);

        self.update(UpdatePassDto {
            id: Some(id),
            events: Some(merged),
            ..Default::default()
        })
        .await
    }

    pub async fn set_sold(&self, id: &str, is_sold: bool) -> PassResult<Pass> {
        self.update(UpdatePassDto {
            id: Some(id.to_string()),
            is_sold: Some(is_sold),
            ..Default::default()
        })
        .await
    }

    pub async fn delete(&self, id: &str) -> PassResult<()> {
        let uuid = parse_id(id)?;
        if !repository::delete(&self.conn, uuid).await? {
            return Err(PassError::not_found());
        }
        tracing::info!("Deleted pass {}", uuid);
        Ok(())
    }

    /// Выпустить пачку непроданных пакетных пропусков с последовательными штрихкодами
    pub async fn issue_batch(&self, dto: IssueBatchDto) -> PassResult<Vec<Pass>> {
        let pass_type = parse_pass_type(&dto.pass_type)?;
        if !pass_type.is_bundle() {
            return Err(PassError::validation(
                "Batch issue is only available for bundle passes",
            ));
        }
        if dto.count == 0 || dto.count > MAX_BATCH_SIZE {
            return Err(PassError::Validation(format!(
                "Count must be between 1 and {}",
                MAX_BATCH_SIZE
            )));
        }

        let prefix = self.resolve_prefix(dto.prefix.as_deref())?;
        let mut taken = repository::list_barcodes_with_prefix(&self.conn, &prefix).await?;

        let mut batch = Vec::with_capacity(dto.count as usize);
        for _ in 0..dto.count {
            let barcode = next_free_barcode(
                taken.iter().map(String::as_str),
                &prefix,
                self.barcodes.width,
            )?;
            let pass = Pass::new_for_insert(
                barcode.clone(),
                pass_type,
                vec![],
                None,
                None,
                None,
                false,
                &self.catalog,
            );
            batch.push(pass);
            taken.push(barcode);
        }

        let issued = self.insert_all(batch).await?;
        tracing::info!("Issued {} {} passes with prefix {}", issued.len(), pass_type, prefix);
        Ok(issued)
    }

    // ------------------------------------------------------------------
    // Scan
    // ------------------------------------------------------------------

    /// Отметить проход по штрихкоду
    ///
    /// Проверка и установка флага выполняются одной условной записью.
    pub async fn scan(&self, barcode: &str) -> PassResult<Pass> {
        let barcode = barcode.trim();
        let now = Utc::now();

        if repository::mark_scanned_by_barcode(&self.conn, barcode, now).await? {
            tracing::info!("Scanned pass {}", barcode);
            return repository::get_by_barcode(&self.conn, barcode)
                .await?
                .ok_or_else(PassError::not_found);
        }

        match repository::get_by_barcode(&self.conn, barcode).await? {
            None => {
                tracing::warn!("Scan of unknown barcode {}", barcode);
                Err(PassError::not_found())
            }
            Some(pass) => {
                tracing::warn!("Repeated scan of pass {}", barcode);
                Err(PassError::AlreadyScanned {
                    scan_time: pass.scan_time,
                })
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub async fn list_all(&self) -> PassResult<Vec<Pass>> {
        Ok(repository::list_all(&self.conn).await?)
    }

    pub async fn search(&self, filter: &PassListQuery) -> PassResult<Vec<Pass>> {
        let passes = match filter.pass_type {
            Some(pass_type) => repository::list_by_type(&self.conn, pass_type).await?,
            None => repository::list_all(&self.conn).await?,
        };
        Ok(filter.apply(passes))
    }

    pub async fn get_by_id(&self, id: &str) -> PassResult<Pass> {
        self.reload(parse_id(id)?).await
    }

    pub async fn get_by_barcode(&self, barcode: &str) -> PassResult<Pass> {
        repository::get_by_barcode(&self.conn, barcode.trim())
            .await?
            .ok_or_else(PassError::not_found)
    }

    /// Следующий свободный штрихкод для префикса (по умолчанию из конфигурации)
    pub async fn next_barcode(&self, prefix: Option<&str>) -> PassResult<String> {
        let prefix = self.resolve_prefix(prefix)?;
        let taken = repository::list_barcodes_with_prefix(&self.conn, &prefix).await?;
        next_free_barcode(taken.iter().map(String::as_str), &prefix, self.barcodes.width)
    }

    /// Непроданный пропуск данного типа с наименьшим штрихкодом
    pub async fn lowest_unsold(&self, pass_type: &str) -> PassResult<Pass> {
        let pass_type = parse_pass_type(pass_type)?;
        let passes = repository::list_by_type(&self.conn, pass_type).await?;
        query::lowest_unsold(&passes, pass_type)
            .cloned()
            .ok_or_else(|| {
                PassError::NotFound(format!("No unsold {} passes available", pass_type))
            })
    }

    async fn reload(&self, id: Uuid) -> PassResult<Pass> {
        repository::get_by_id(&self.conn, id)
            .await?
            .ok_or_else(PassError::not_found)
    }

    fn resolve_prefix(&self, prefix: Option<&str>) -> PassResult<String> {
        let prefix = normalize_optional(prefix).unwrap_or_else(|| self.barcodes.prefix.clone());
        if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PassError::validation("Barcode prefix may contain only letters"));
        }
        Ok(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use contracts::domain::a001_pass::aggregate::EventAttendance;
    use contracts::domain::a001_pass::query::SoldFilter;

    async fn service() -> PassService {
        let conn = connect_in_memory().await.unwrap();
        PassService::new(conn, Arc::new(Catalog::builtin()), BarcodeConfig::default())
    }

    fn create_dto(barcode: &str, pass_type: &str, events: Vec<EventAttendance>) -> CreatePassDto {
        CreatePassDto {
            barcode: Some(barcode.into()),
            pass_type: Some(pass_type.into()),
            events: Some(events),
            ..Default::default()
        }
    }

    fn ev(name: &str, price: u32) -> EventAttendance {
        EventAttendance::new(name.into(), price)
    }

    fn regular_three() -> Vec<EventAttendance> {
        vec![ev("Hackathon", 100), ev("Open Mic", 0), ev("Tug of War", 20)]
    }

    #[tokio::test]
    async fn test_create_solo_gets_full_catalog() {
        let svc = service().await;
        let pass = svc
            .create(create_dto("CYP0001", "Solo", vec![ev("Ignored", 999)]))
            .await
            .unwrap();

        assert_eq!(pass.events.len(), 16);
        assert!(pass.events.iter().all(|e| !e.is_visited));
        assert!(!pass.events.iter().any(|e| e.name == "Ignored"));
        assert_eq!(pass.total_price, 410);
        assert!(!pass.is_sold);
        assert!(!pass.is_scanned);
    }

    #[tokio::test]
    async fn test_create_regular_sums_prices() {
        let svc = service().await;
        let pass = svc
            .create(create_dto("CYP0002", "regular", vec![ev("Hackathon", 100)]))
            .await
            .unwrap();
        assert_eq!(pass.total_price, 100);
        assert_eq!(pass.events.len(), 1);
    }

    #[tokio::test]
    async fn test_create_validation_errors() {
        let svc = service().await;

        let err = svc.create(create_dto("CYP0002", "regular", vec![])).await.unwrap_err();
        assert!(
            matches!(err, PassError::Validation(ref m) if m == "At least one event must be selected for regular passes")
        );

        let err = svc
            .create(CreatePassDto {
                barcode: Some("CYP0003".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::Validation(ref m) if m == "Barcode and pass type are required"));

        let err = svc.create(create_dto("CYP0004", "VIP", vec![])).await.unwrap_err();
        assert!(matches!(err, PassError::Validation(ref m) if m == "Invalid pass type"));

        let err = svc.create(create_dto("CYP-05", "Solo", vec![])).await.unwrap_err();
        assert!(matches!(err, PassError::Validation(_)));

        let err = svc
            .create(CreatePassDto {
                email: Some("not-an-email".into()),
                ..create_dto("CYP0006", "Solo", vec![])
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::Validation(_)));

        assert!(svc.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_barcode_conflicts_and_keeps_first() {
        let svc = service().await;
        let first = svc
            .create(CreatePassDto {
                attendee_name: Some("Ann Lee".into()),
                ..create_dto("CYP0001", "Solo", vec![])
            })
            .await
            .unwrap();

        let err = svc
            .create(create_dto("CYP0001", "regular", vec![ev("Hackathon", 100)]))
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::Conflict(_)));

        let stored = svc.get_by_barcode("CYP0001").await.unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.pass_type, PassType::Solo);
        assert_eq!(stored.attendee_name.as_deref(), Some("Ann Lee"));
    }

    #[tokio::test]
    async fn test_scan_is_reported_once() {
        let svc = service().await;
        svc.create(create_dto("CYP0001", "Solo", vec![])).await.unwrap();

        let scanned = svc.scan("CYP0001").await.unwrap();
        assert!(scanned.is_scanned);
        let first_time = scanned.scan_time.unwrap();

        match svc.scan("CYP0001").await.unwrap_err() {
            PassError::AlreadyScanned { scan_time } => assert_eq!(scan_time, Some(first_time)),
            other => panic!("unexpected error: {other:?}"),
        }

        let stored = svc.get_by_barcode("CYP0001").await.unwrap();
        assert_eq!(stored.scan_time, Some(first_time));
    }

    #[tokio::test]
    async fn test_scan_unknown_barcode() {
        let svc = service().await;
        assert!(matches!(svc.scan("UNKNOWN").await, Err(PassError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_visiting_single_event_scans_pass() {
        let svc = service().await;
        let pass = svc
            .create(create_dto("CYP0002", "regular", vec![ev("Hackathon", 100)]))
            .await
            .unwrap();

        let updated = svc
            .update(UpdatePassDto {
                id: Some(pass.to_string_id()),
                events: Some(vec![ev("Hackathon", 100).visited()]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(updated.is_scanned);
        assert!(updated.scan_time.is_some());
        assert_eq!(updated.total_price, 100);
    }

    #[tokio::test]
    async fn test_auto_scan_needs_every_event_visited() {
        let svc = service().await;
        let pass = svc
            .create(create_dto("CYP0003", "regular", regular_three()))
            .await
            .unwrap();
        let id = pass.to_string_id();

        let mut two_of_three = regular_three();
        two_of_three[0].is_visited = true;
        two_of_three[1].is_visited = true;
        let updated = svc
            .update(UpdatePassDto {
                id: Some(id.clone()),
                events: Some(two_of_three),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!updated.is_scanned);
        assert_eq!(updated.total_price, 120);

        let all_three: Vec<_> = regular_three().into_iter().map(|e| e.visited()).collect();
        let updated = svc
            .update(UpdatePassDto {
                id: Some(id),
                events: Some(all_three),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(updated.is_scanned);
    }

    #[tokio::test]
    async fn test_auto_scan_keeps_earlier_scan_time() {
        let svc = service().await;
        let pass = svc
            .create(create_dto("CYP0004", "regular", vec![ev("Hackathon", 100)]))
            .await
            .unwrap();
        let scanned = svc.scan("CYP0004").await.unwrap();

        let updated = svc
            .update(UpdatePassDto {
                id: Some(pass.to_string_id()),
                events: Some(vec![ev("Hackathon", 100).visited()]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.scan_time, scanned.scan_time);
    }

    #[tokio::test]
    async fn test_update_errors() {
        let svc = service().await;

        let err = svc.update(UpdatePassDto::default()).await.unwrap_err();
        assert!(matches!(err, PassError::Validation(_)));

        let err = svc
            .update(UpdatePassDto {
                id: Some(Uuid::new_v4().to_string()),
                is_sold: Some(true),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::NotFound(_)));

        let err = svc
            .update(UpdatePassDto {
                id: Some("not-a-uuid".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_switch_into_regular_without_events_is_rejected() {
        let svc = service().await;
        let pass = svc.create(create_dto("CYP0005", "Duo", vec![])).await.unwrap();

        let err = svc
            .update(UpdatePassDto {
                id: Some(pass.to_string_id()),
                pass_type: Some("regular".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::Validation(_)));

        let stored = svc.get_by_id(&pass.to_string_id()).await.unwrap();
        assert_eq!(stored.pass_type, PassType::Duo);
        assert_eq!(stored.total_price, 775);
    }

    #[tokio::test]
    async fn test_pass_type_change_recomputes_price() {
        let svc = service().await;
        let pass = svc
            .create(create_dto("CYP0006", "regular", vec![ev("Hackathon", 100)]))
            .await
            .unwrap();

        let updated = svc
            .update(UpdatePassDto {
                id: Some(pass.to_string_id()),
                pass_type: Some("Quadro".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.pass_type, PassType::Quadro);
        assert_eq!(updated.total_price, 1550);
        assert_eq!(updated.metadata.version, pass.metadata.version + 1);
    }

    #[tokio::test]
    async fn test_merge_keeps_visited_events() {
        let svc = service().await;
        let pass = svc
            .create(create_dto("CYP0007", "regular", vec![ev("Hackathon", 100), ev("Open Mic", 0)]))
            .await
            .unwrap();
        let id = pass.to_string_id();

        svc.update(UpdatePassDto {
            id: Some(id.clone()),
            events: Some(vec![ev("Hackathon", 100).visited(), ev("Open Mic", 0)]),
            ..Default::default()
        })
        .await
        .unwrap();

        // the edit form only sends unvisited events
        let merged = svc
            .merge_events(MergeEventsDto {
                id: Some(id),
                events: vec![ev("Open Mic", 0), ev("Tug of War", 20)],
            })
            .await
            .unwrap();

        let names: Vec<(&str, bool)> = merged
            .events
            .iter()
            .map(|e| (e.name.as_str(), e.is_visited))
            .collect();
        assert_eq!(
            names,
            vec![("Hackathon", true), ("Open Mic", false), ("Tug of War", false)]
        );
        assert_eq!(merged.total_price, 120);
        assert!(!merged.is_scanned);
    }

    #[tokio::test]
    async fn test_set_sold_and_delete() {
        let svc = service().await;
        let pass = svc.create(create_dto("CYP0008", "Trio", vec![])).await.unwrap();
        let id = pass.to_string_id();

        let sold = svc.set_sold(&id, true).await.unwrap();
        assert!(sold.is_sold);
        assert_eq!(sold.total_price, 1165);

        let unsold = svc.set_sold(&id, false).await.unwrap();
        assert!(!unsold.is_sold);

        svc.delete(&id).await.unwrap();
        assert!(matches!(svc.get_by_id(&id).await, Err(PassError::NotFound(_))));
        assert!(matches!(svc.delete(&id).await, Err(PassError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_and_lookups() {
        let svc = service().await;
        svc.create(CreatePassDto {
            attendee_name: Some("Ann Lee".into()),
            is_sold: Some(true),
            ..create_dto("CYP0010", "Solo", vec![])
        })
        .await
        .unwrap();
        svc.create(create_dto("CYP0002", "Solo", vec![])).await.unwrap();
        svc.create(create_dto("CYP0003", "regular", vec![ev("Hackathon", 100)]))
            .await
            .unwrap();

        let unsold_solo = svc
            .search(&PassListQuery {
                sold: SoldFilter::Unsold,
                pass_type: Some(PassType::Solo),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(unsold_solo.len(), 1);
        assert_eq!(unsold_solo[0].barcode, "CYP0002");

        let by_name = svc
            .search(&PassListQuery {
                q: Some("ann".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].barcode, "CYP0010");

        let everything = svc.search(&PassListQuery::default()).await.unwrap();
        let order: Vec<&str> = everything.iter().map(|p| p.barcode.as_str()).collect();
        assert_eq!(order, vec!["CYP0002", "CYP0003", "CYP0010"]);

        assert!(matches!(svc.get_by_barcode("NOPE").await, Err(PassError::NotFound(_))));
        assert!(matches!(svc.get_by_id("garbage").await, Err(PassError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_next_barcode_and_lowest_unsold() {
        let svc = service().await;
        assert_eq!(svc.next_barcode(None).await.unwrap(), "CYP0001");

        svc.create(create_dto("CYP0001", "Duo", vec![])).await.unwrap();
        svc.create(create_dto("CYP0009", "Duo", vec![])).await.unwrap();
        assert_eq!(svc.next_barcode(None).await.unwrap(), "CYP0010");
        assert_eq!(svc.next_barcode(Some("VIP")).await.unwrap(), "VIP0001");
        assert!(matches!(
            svc.next_barcode(Some("C-Y")).await,
            Err(PassError::Validation(_))
        ));

        let lowest = svc.lowest_unsold("Duo").await.unwrap();
        assert_eq!(lowest.barcode, "CYP0001");
        svc.set_sold(&lowest.to_string_id(), true).await.unwrap();
        assert_eq!(svc.lowest_unsold("Duo").await.unwrap().barcode, "CYP0009");

        assert!(matches!(svc.lowest_unsold("Trio").await, Err(PassError::NotFound(_))));
        assert!(matches!(svc.lowest_unsold("VIP").await, Err(PassError::Validation(_))));
    }

    #[tokio::test]
    async fn test_exhausted_barcode_suffix_is_validation_error() {
        let svc = service().await;
        svc.create(create_dto("CYP18446744073709551615", "Solo", vec![]))
            .await
            .unwrap();

        let err = svc.next_barcode(None).await.unwrap_err();
        assert!(matches!(err, PassError::Validation(ref m) if m.contains("No free barcode")));

        let err = svc
            .issue_batch(IssueBatchDto {
                pass_type: "Solo".into(),
                count: 1,
                prefix: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::Validation(_)));
        assert_eq!(svc.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_prefix_must_be_letters_only() {
        let svc = service().await;
        assert!(matches!(
            svc.next_barcode(Some("A1")).await,
            Err(PassError::Validation(ref m)) if m == "Barcode prefix may contain only letters"
        ));

        let err = svc
            .issue_batch(IssueBatchDto {
                pass_type: "Duo".into(),
                count: 2,
                prefix: Some("B2".into()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::Validation(_)));
        assert!(svc.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_insert_is_all_or_nothing() {
        let svc = service().await;
        svc.create(create_dto("CYP0002", "Solo", vec![])).await.unwrap();

        let batch: Vec<Pass> = ["CYP0001", "CYP0002", "CYP0003"]
            .into_iter()
            .map(|barcode| {
                Pass::new_for_insert(
                    barcode.into(),
                    PassType::Duo,
                    vec![],
                    None,
                    None,
                    None,
                    false,
                    svc.catalog(),
                )
            })
            .collect();

        let err = svc.insert_all(batch).await.unwrap_err();
        assert!(matches!(err, PassError::Conflict(_)));

        let stored = svc.list_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].pass_type, PassType::Solo);
        assert!(matches!(svc.get_by_barcode("CYP0001").await, Err(PassError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_emptied_bundle_events_scan_pass() {
        let svc = service().await;
        let pass = svc.create(create_dto("CYP0001", "Solo", vec![])).await.unwrap();

        let updated = svc
            .update(UpdatePassDto {
                id: Some(pass.to_string_id()),
                events: Some(vec![]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(updated.events.is_empty());
        assert!(updated.is_scanned);
        assert!(updated.scan_time.is_some());
        assert_eq!(updated.total_price, 410);
    }

    #[tokio::test]
    async fn test_bundle_snapshot_survives_catalog_change() {
        let svc = service().await;
        let pass = svc.create(create_dto("CYP0001", "Solo", vec![])).await.unwrap();
        let id = pass.to_string_id();

        let mut changed = Catalog::builtin();
        changed.events.truncate(3);
        for event in &mut changed.events {
            event.price += 1000;
        }
        for tier in &mut changed.tiers {
            tier.price += 1000;
        }
        let restarted = PassService::new(
            svc.conn.clone(),
            Arc::new(changed),
            BarcodeConfig::default(),
        );

        let loaded = restarted.get_by_id(&id).await.unwrap();
        assert_eq!(loaded.events, pass.events);
        assert_eq!(loaded.total_price, 410);

        let sold = restarted.set_sold(&id, true).await.unwrap();
        assert!(sold.is_sold);
        assert_eq!(sold.events, pass.events);
        assert_eq!(sold.events.len(), 16);
        assert_eq!(sold.total_price, 410);
    }

    #[tokio::test]
    async fn test_concurrent_scans_admit_once() {
        use crate::shared::data::db::{connect_temp_file, remove_temp_file};

        let (conn, path) = connect_temp_file().await.unwrap();
        let svc = PassService::new(conn, Arc::new(Catalog::builtin()), BarcodeConfig::default());
        svc.create(create_dto("CYP0001", "Solo", vec![])).await.unwrap();

        let (a, b) = tokio::join!(svc.scan("CYP0001"), svc.scan("CYP0001"));
        let results = [a, b];
        let admitted: Vec<&Pass> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(PassError::AlreadyScanned { .. })))
            .count();
        assert_eq!(admitted.len(), 1);
        assert_eq!(rejected, 1);

        let stored = svc.get_by_barcode("CYP0001").await.unwrap();
        assert_eq!(stored.scan_time, admitted[0].scan_time);
        assert_eq!(stored.metadata.version, 2);

        drop(svc);
        remove_temp_file(&path);
    }

    #[tokio::test]
    async fn test_issue_batch() {
        let svc = service().await;
        svc.create(create_dto("CYP0004", "Solo", vec![])).await.unwrap();

        let issued = svc
            .issue_batch(IssueBatchDto {
                pass_type: "Trio".into(),
                count: 3,
                prefix: None,
            })
            .await
            .unwrap();
        let barcodes: Vec<&str> = issued.iter().map(|p| p.barcode.as_str()).collect();
        assert_eq!(barcodes, vec!["CYP0005", "CYP0006", "CYP0007"]);
        assert!(issued.iter().all(|p| !p.is_sold && p.total_price == 1165));

        let err = svc
            .issue_batch(IssueBatchDto {
                pass_type: "regular".into(),
                count: 1,
                prefix: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::Validation(_)));

        let err = svc
            .issue_batch(IssueBatchDto {
                pass_type: "Solo".into(),
                count: MAX_BATCH_SIZE + 1,
                prefix: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PassError::Validation(_)));
    }
}
