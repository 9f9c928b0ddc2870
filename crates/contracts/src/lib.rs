//! Общие типы GatePass: агрегат пропуска, каталог мероприятий, DTO API.
//!
//! Крейт не выполняет ввод-вывод и используется как бэкендом, так и
//! клиентами HTTP API.

pub mod domain;
pub mod enums;
pub mod shared;
pub mod system;
