use axum::body::to_bytes;
use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::shared::format::format_number;

/// Middleware для логирования HTTP запросов
///
/// Пишет в лог метод, путь, статус, размер ответа и длительность.
/// Ответы 5xx логируются как error, 4xx как warn.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // Читаем тело ответа, чтобы узнать реальный размер
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(
                "{} {} -> {} | body error: {} | {}ms",
                method,
                uri.path(),
                parts.status.as_u16(),
                e,
                start.elapsed().as_millis()
            );
            return Response::from_parts(parts, Body::default());
        }
    };

    let status = parts.status;
    let size = format_number(bytes.len());
    let elapsed = start.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!("{} {} -> {} | {} B | {}ms", method, uri.path(), status.as_u16(), size, elapsed);
    } else if status.is_client_error() {
        tracing::warn!("{} {} -> {} | {} B | {}ms", method, uri.path(), status.as_u16(), size, elapsed);
    } else {
        tracing::info!("{} {} -> {} | {} B | {}ms", method, uri.path(), status.as_u16(), size, elapsed);
    }

    // Создаем новый ответ с прочитанным телом
    Response::from_parts(parts, Body::from(bytes))
}
