use serde::{Deserialize, Serialize};

/// Тип пропуска
///
/// `Regular` содержит выбранные покупателем мероприятия, остальные варианты
/// являются пакетными тарифами с фиксированной ценой.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PassType {
    #[serde(rename = "regular")]
    Regular,
    Solo,
    Duo,
    Trio,
    Quadro,
}

impl PassType {
    /// Получить код типа (совпадает с JSON-представлением)
    pub fn code(&self) -> &'static str {
        match self {
            PassType::Regular => "regular",
            PassType::Solo => "Solo",
            PassType::Duo => "Duo",
            PassType::Trio => "Trio",
            PassType::Quadro => "Quadro",
        }
    }

    /// Пакетный тариф (весь каталог по фиксированной цене)
    pub fn is_bundle(&self) -> bool {
        !matches!(self, PassType::Regular)
    }

    /// Получить все типы пропусков
    pub fn all() -> Vec<PassType> {
        vec![
            PassType::Regular,
            PassType::Solo,
            PassType::Duo,
            PassType::Trio,
            PassType::Quadro,
        ]
    }

    /// Только пакетные тарифы
    pub fn bundles() -> Vec<PassType> {
        Self::all().into_iter().filter(PassType::is_bundle).collect()
    }

    /// Парсинг из строки
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "regular" => Some(PassType::Regular),
            "Solo" => Some(PassType::Solo),
            "Duo" => Some(PassType::Duo),
            "Trio" => Some(PassType::Trio),
            "Quadro" => Some(PassType::Quadro),
            _ => None,
        }
    }
}

impl std::fmt::Display for PassType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
