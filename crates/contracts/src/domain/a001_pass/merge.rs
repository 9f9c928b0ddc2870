//! Слияние частичного списка мероприятий с сохранённым.
//!
//! Форма редактирования обычно показывает только непосещённые мероприятия.
//! Если отправить такой список как замену, посещённые отметки пропадут,
//! поэтому редактирование идёт через слияние по имени мероприятия.

use super::aggregate::EventAttendance;

/// Объединить текущий список мероприятий с входящим подмножеством
///
/// - совпавшие по имени записи берутся из `incoming`, на месте текущей;
/// - текущие записи, которых нет во входящем списке, сохраняются;
/// - новые имена добавляются в конец в порядке `incoming`.
///
/// Повторы имени во входящем списке схлопываются, побеждает первая запись.
pub fn merge_events(current: &[EventAttendance], incoming: &[EventAttendance]) -> Vec<EventAttendance> {
    let find_incoming = |name: &str| incoming.iter().find(|e| e.name.trim() == name.trim());

    let mut merged: Vec<EventAttendance> = current
        .iter()
        .map(|existing| find_incoming(&existing.name).unwrap_or(existing).clone())
        .collect();

    for event in incoming {
        if !merged.iter().any(|m| m.name.trim() == event.name.trim()) {
            merged.push(event.clone());
        }
    }

    merged
}
