mod csv;
mod data;
pub mod handlers;
mod pdf;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::report_routes()
}
