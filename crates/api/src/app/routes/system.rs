use axum::http::StatusCode;

pub async fn root() -> &'static str {
    "Sports Academies Is Now Open"
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
