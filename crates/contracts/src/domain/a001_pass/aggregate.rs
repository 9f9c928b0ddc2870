use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::domain::common::{AggregateId, AggregateRoot, EntityMetadata};
use crate::enums::pass_type::PassType;
use crate::shared::catalog::Catalog;
use crate::shared::validation::{
    normalize_optional, validate_attendee_name, validate_barcode, validate_email, validate_phone,
};

// ============================================================================
// ID Type
// ============================================================================

/// Уникальный идентификатор пропуска
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(pub Uuid);

impl PassId {
    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for PassId {
    fn as_string(&self) -> String {
        self.0.to_string()
    }

    fn from_string(s: &str) -> Result<Self, String> {
        Uuid::parse_str(s.trim())
            .map(PassId::new)
            .map_err(|e| format!("Invalid UUID: {}", e))
    }
}

// ============================================================================
// Event attendance
// ============================================================================

/// Посещение одного мероприятия по пропуску
///
/// Цена копируется в момент назначения и дальше из каталога не читается.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendance {
    pub name: String,
    pub price: u32,
    #[serde(default)]
    pub is_visited: bool,
}

impl EventAttendance {
    pub fn new(name: String, price: u32) -> Self {
        Self {
            name,
            price,
            is_visited: false,
        }
    }

    pub fn visited(mut self) -> Self {
        self.is_visited = true;
        self
    }

    fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Пропуск участника
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pass {
    pub id: PassId,
    pub barcode: String,
    pub attendee_name: Option<String>,
    pub pass_type: PassType,
    pub events: Vec<EventAttendance>,
    pub total_price: u32,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_scanned: bool,
    pub scan_time: Option<DateTime<Utc>>,
    pub is_sold: bool,

    #[serde(flatten)]
    pub metadata: EntityMetadata,
}

/// Что изменил патч; нужно сервису для правила автосканирования
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchOutcome {
    pub events_replaced: bool,
    pub pass_type_changed: bool,
}

impl Pass {
    /// Создать новый пропуск для вставки в БД
    ///
    /// Для пакетных тарифов переданные мероприятия игнорируются и
    /// заменяются полной копией каталога.
    #[allow(clippy::too_many_arguments)]
    pub fn new_for_insert(
        barcode: String,
        pass_type: PassType,
        events: Vec<EventAttendance>,
        attendee_name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        is_sold: bool,
        catalog: &Catalog,
    ) -> Self {
        let events = if pass_type.is_bundle() {
            catalog.snapshot()
        } else {
            events.into_iter().map(EventAttendance::normalized).collect()
        };

        let mut pass = Self {
            id: PassId::new_v4(),
            barcode: barcode.trim().to_string(),
            attendee_name: normalize_optional(attendee_name.as_deref()),
            pass_type,
            events,
            total_price: 0,
            email: normalize_optional(email.as_deref()).map(|e| e.to_lowercase()),
            phone: normalize_optional(phone.as_deref()),
            is_scanned: false,
            scan_time: None,
            is_sold,
            metadata: EntityMetadata::new(),
        };
        pass.recalculate_total(catalog);
        pass
    }

    /// Получить ID как строку
    pub fn to_string_id(&self) -> String {
        self.id.as_string()
    }

    /// Пересчитать итоговую цену
    pub fn recalculate_total(&mut self, catalog: &Catalog) {
        self.total_price = catalog.price(self.pass_type, &self.events);
    }

    /// Все мероприятия посещены; для пустого списка тоже `true`
    pub fn all_events_visited(&self) -> bool {
        self.events.iter().all(|e| e.is_visited)
    }

    /// Применить частичное обновление из DTO
    ///
    /// Применяются только переданные поля. Список мероприятий заменяется
    /// целиком, без слияния с текущим.
    pub fn update(&mut self, dto: &UpdatePassDto, catalog: &Catalog) -> Result<PatchOutcome, String> {
        let pass_type = match dto.pass_type.as_deref().map(str::trim) {
            Some(code) => Some(
                PassType::from_code(code).ok_or_else(|| format!("Invalid pass type '{}'", code))?,
            ),
            None => None,
        };

        if pass_type == Some(PassType::Regular)
            && self.pass_type != PassType::Regular
            && dto.events.is_none()
        {
            return Err("Switching a pass to regular requires an events selection".into());
        }

        let mut outcome = PatchOutcome::default();

        if let Some(events) = &dto.events {
            self.events = events.iter().cloned().map(EventAttendance::normalized).collect();
            outcome.events_replaced = true;
        }
        if let Some(pass_type) = pass_type {
            outcome.pass_type_changed = pass_type != self.pass_type;
            self.pass_type = pass_type;
        }

        if let Some(name) = &dto.attendee_name {
            self.attendee_name = normalize_optional(Some(name.as_str()));
        }
        if let Some(email) = &dto.email {
            self.email = normalize_optional(Some(email.as_str())).map(|e| e.to_lowercase());
        }
        if let Some(phone) = &dto.phone {
            self.phone = normalize_optional(Some(phone.as_str()));
        }
        if let Some(is_sold) = dto.is_sold {
            self.is_sold = is_sold;
        }

        if outcome.events_replaced || pass_type.is_some() {
            self.recalculate_total(catalog);
        }

        Ok(outcome)
    }

    /// Валидация данных
    pub fn validate(&self) -> Result<(), String> {
        validate_barcode(&self.barcode)?;

        if let Some(name) = &self.attendee_name {
            validate_attendee_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }

        if self.pass_type == PassType::Regular && self.events.is_empty() {
            return Err("At least one event must be selected for regular passes".into());
        }

        let mut names = HashSet::new();
        for event in &self.events {
            if event.name.is_empty() {
                return Err("Event name cannot be empty".into());
            }
            if !names.insert(event.name.as_str()) {
                return Err(format!("Event '{}' is listed more than once", event.name));
            }
        }

        if self.is_scanned != self.scan_time.is_some() {
            return Err("Scan time must be set exactly when the pass is scanned".into());
        }

        Ok(())
    }
}

impl AggregateRoot for Pass {
    type Id = PassId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.metadata
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "pass"
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// DTO для выпуска пропуска
///
/// Обязательные поля объявлены как `Option`, чтобы их отсутствие давало
/// понятную ошибку валидации, а не отказ десериализации.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreatePassDto {
    pub barcode: Option<String>,
    pub attendee_name: Option<String>,
    pub pass_type: Option<String>,
    pub events: Option<Vec<EventAttendance>>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_sold: Option<bool>,
}

/// DTO для частичного обновления (ID передаётся в теле)
///
/// Пустая строка в `attendeeName`, `email` или `phone` очищает поле.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePassDto {
    pub id: Option<String>,
    pub attendee_name: Option<String>,
    pub pass_type: Option<String>,
    pub events: Option<Vec<EventAttendance>>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_sold: Option<bool>,
}

/// DTO для слияния частичного списка мероприятий с сохранённым
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MergeEventsDto {
    pub id: Option<String>,
    pub events: Vec<EventAttendance>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSoldDto {
    pub is_sold: bool,
}

/// DTO для пакетного выпуска непроданных пропусков
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueBatchDto {
    pub pass_type: String,
    pub count: u32,
    pub prefix: Option<String>,
}
