//! CORS (§6: "CORS allows all origins"). Grounded on `control::cors`'s
//! layer shape; unlike the teacher, which reads an allow-list from
//! settings, this surface has no such configuration knob, so the layer is
//! simply wide open.

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::PUT, Method::OPTIONS])
        .allow_origin(Any)
}
