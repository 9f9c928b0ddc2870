//! Фильтрация и сортировка списка пропусков.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::aggregate::Pass;
use crate::enums::pass_type::PassType;

/// Фильтр по статусу продажи
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoldFilter {
    #[default]
    All,
    Sold,
    Unsold,
}

impl SoldFilter {
    pub fn matches(&self, is_sold: bool) -> bool {
        match self {
            SoldFilter::All => true,
            SoldFilter::Sold => is_sold,
            SoldFilter::Unsold => !is_sold,
        }
    }
}

/// Параметры поиска по списку пропусков
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassListQuery {
    /// Подстрока для поиска по штрихкоду, имени и типу (без учёта регистра)
    pub q: Option<String>,
    #[serde(default)]
    pub sold: SoldFilter,
    pub pass_type: Option<PassType>,
}

impl PassListQuery {
    pub fn matches(&self, pass: &Pass) -> bool {
        let matches_text = match self.q.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => {
                let needle = text.to_lowercase();
                pass.barcode.to_lowercase().contains(&needle)
                    || pass
                        .attendee_name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&needle))
                    || pass.pass_type.code().to_lowercase().contains(&needle)
            }
        };

        let matches_type = self.pass_type.map_or(true, |t| t == pass.pass_type);

        matches_text && self.sold.matches(pass.is_sold) && matches_type
    }

    /// Отфильтровать и отсортировать по штрихкоду
    pub fn apply(&self, passes: Vec<Pass>) -> Vec<Pass> {
        let mut result: Vec<Pass> = passes.into_iter().filter(|p| self.matches(p)).collect();
        sort_by_barcode(&mut result);
        result
    }
}

/// Разделить штрихкод на нечисловой префикс и числовой хвост
///
/// `"CYP0012"` → `("CYP", Some(12))`, `"ABC"` → `("ABC", None)`.
/// Хвост, не помещающийся в `u64`, считается отсутствующим.
pub fn split_barcode(barcode: &str) -> (&str, Option<u64>) {
    let digits = barcode
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .count();
    let (prefix, suffix) = barcode.split_at(barcode.len() - digits);
    if suffix.is_empty() {
        return (barcode, None);
    }
    match suffix.parse::<u64>() {
        Ok(n) => (prefix, Some(n)),
        Err(_) => (barcode, None),
    }
}

/// Сравнение штрихкодов
///
/// При общем префиксе сравниваются числовые хвосты (`CYP2` < `CYP10`),
/// иначе обычное лексикографическое сравнение.
pub fn compare_barcodes(a: &str, b: &str) -> Ordering {
    match (split_barcode(a), split_barcode(b)) {
        ((pa, Some(na)), (pb, Some(nb))) if pa == pb => na.cmp(&nb).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

pub fn sort_by_barcode(passes: &mut [Pass]) {
    passes.sort_by(|a, b| compare_barcodes(&a.barcode, &b.barcode));
}

/// Следующий свободный штрихкод вида `prefix` + число с ведущими нулями
///
/// Учитываются только штрихкоды, у которых после префикса стоят одни цифры.
/// `None`, если номер после максимального не помещается в `u64`.
pub fn next_barcode<'a>(
    existing: impl IntoIterator<Item = &'a str>,
    prefix: &str,
    width: usize,
) -> Option<String> {
    let max = existing
        .into_iter()
        .filter_map(|barcode| barcode.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|rest| rest.parse::<u64>().ok())
        .max()
        .unwrap_or(0);

    let next = max.checked_add(1)?;
    Some(format!("{}{:0width$}", prefix, next, width = width))
}

/// Непроданный пропуск данного типа с наименьшим штрихкодом
pub fn lowest_unsold(passes: &[Pass], pass_type: PassType) -> Option<&Pass> {
    passes
        .iter()
        .filter(|p| p.pass_type == pass_type && !p.is_sold)
        .min_by(|a, b| compare_barcodes(&a.barcode, &b.barcode))
}
