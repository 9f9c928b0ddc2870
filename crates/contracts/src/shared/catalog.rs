//! Каталог мероприятий и пакетных тарифов.
//!
//! Каталог загружается один раз при старте процесса и дальше только читается.
//! Пакетные пропуска получают копию списка мероприятий на момент выпуска,
//! поэтому последующие изменения каталога на них не влияют.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::a001_pass::aggregate::EventAttendance;
use crate::enums::pass_type::PassType;

/// Мероприятие из каталога
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    pub name: String,
    pub price: u32,
    /// Тарифы, для которых мероприятие отмечено в афише
    #[serde(default)]
    pub pass_types: Vec<PassType>,
}

/// Пакетный тариф с фиксированной ценой
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDefinition {
    pub pass_type: PassType,
    pub price: u32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub events: Vec<EventDefinition>,
    pub tiers: Vec<TierDefinition>,
}

impl Catalog {
    /// Встроенный каталог фестиваля
    pub fn builtin() -> Self {
        use PassType::{Duo, Quadro, Solo, Trio};

        let all = [Solo, Duo, Trio, Quadro];
        let event = |name: &str, price: u32, pass_types: &[PassType]| EventDefinition {
            name: name.to_string(),
            price,
            pass_types: pass_types.to_vec(),
        };

        let events = vec![
            event("Blind Typing", 30, &[Solo]),
            event("Code & Chaos", 50, &[Solo]),
            event("Fandom Quiz", 30, &all),
            event("Frontend Blitz", 50, &[Solo, Quadro]),
            event("Game Development Battles", 100, &all),
            event("Hackathon", 100, &all),
            event("Paper Presentation", 50, &[Solo]),
            event("Poster Presentation", 100, &[Solo, Quadro]),
            event("Prompt Craft", 50, &[Solo, Quadro]),
            event("Treasure Hunt", 50, &[Solo, Quadro]),
            event("Dedicate a Song", 30, &[Solo]),
            event("Game Arcade", 50, &all),
            event("Ipl Auction", 50, &[Solo]),
            event("Meme Contest", 50, &[Solo]),
            event("Tug of War", 20, &[Solo]),
            event("Open Mic", 0, &[Solo]),
        ];

        let tier = |pass_type: PassType, price: u32, description: &str| TierDefinition {
            pass_type,
            price,
            description: description.to_string(),
        };

        let tiers = vec![
            tier(Solo, 410, "Access to all events for one person"),
            tier(Duo, 775, "Access to all events for two people"),
            tier(Trio, 1165, "Access to all events for three people"),
            tier(Quadro, 1550, "Access to all events for four people"),
        ];

        Self { events, tiers }
    }

    /// Проверка целостности каталога
    ///
    /// Имена мероприятий уникальны и не пусты, у каждого пакетного тарифа
    /// ровно одно определение, у `regular` определения нет.
    pub fn validate(&self) -> Result<(), String> {
        if self.events.is_empty() {
            return Err("Каталог не содержит мероприятий".into());
        }

        let mut names = HashSet::new();
        for event in &self.events {
            let name = event.name.trim();
            if name.is_empty() {
                return Err("Имя мероприятия не может быть пустым".into());
            }
            if !names.insert(name) {
                return Err(format!("Мероприятие '{}' указано дважды", name));
            }
        }

        for pass_type in PassType::all() {
            let count = self
                .tiers
                .iter()
                .filter(|t| t.pass_type == pass_type)
                .count();
            match (pass_type.is_bundle(), count) {
                (true, 1) | (false, 0) => {}
                (true, 0) => return Err(format!("Нет цены для тарифа {}", pass_type)),
                (false, _) => return Err("Тариф regular не имеет фиксированной цены".into()),
                (true, _) => return Err(format!("Тариф {} указан дважды", pass_type)),
            }
        }

        Ok(())
    }

    /// Фиксированная цена пакетного тарифа
    pub fn tier_price(&self, pass_type: PassType) -> Option<u32> {
        self.tiers
            .iter()
            .find(|t| t.pass_type == pass_type)
            .map(|t| t.price)
    }

    /// Копия полного списка мероприятий для нового пакетного пропуска
    pub fn snapshot(&self) -> Vec<EventAttendance> {
        self.events
            .iter()
            .map(|e| EventAttendance::new(e.name.clone(), e.price))
            .collect()
    }

    /// Итоговая цена пропуска
    ///
    /// Для `regular` это сумма цен мероприятий, для пакетных тарифов цена
    /// тарифа, независимо от состава списка.
    pub fn price(&self, pass_type: PassType, events: &[EventAttendance]) -> u32 {
        match pass_type {
            PassType::Regular => events
                .iter()
                .fold(0u32, |total, e| total.saturating_add(e.price)),
            bundle => self.tier_price(bundle).unwrap_or(0),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
