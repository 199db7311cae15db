// Embedded admin page.

use axum::response::Html;

const ADMIN_HTML: &str = include_str!("../static/admin.html");

pub async fn admin_page() -> Html<&'static str> {
    Html(ADMIN_HTML)
}
