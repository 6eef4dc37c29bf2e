use axum::{
    http::HeaderValue,
    middleware,
    routing::get,
    Extension, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{protected::data, public};
use crate::middleware::basic_auth_middleware;
use crate::state::AppState;
use crate::types::Collection;

/// Full router: public routes, one route pair per collection behind the
/// credential gate, and the global layers.
pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    let mut api = state
        .collections
        .iter()
        .fold(Router::new(), |router, collection| router.merge(collection_routes(collection)));
    // route_layer panics on a router without routes
    if !state.collections.is_empty() {
        api = api.route_layer(middleware::from_fn_with_state(state.clone(), basic_auth_middleware));
    }

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(api)
        .fallback(public::not_found)
        .with_state(state)
        // Global middleware
        .layer(CatchPanicLayer::custom(public::handle_panic))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// The seven document operations for one collection. Any other method on
/// these paths gets the same 404 as an unknown path.
fn collection_routes(collection: &Collection) -> Router<AppState> {
    Router::new()
        // Collection-level operations
        .route(
            &collection.base_path(),
            get(data::collection_get)
                .post(data::collection_post)
                .delete(data::collection_delete)
                .fallback(public::not_found),
        )
        // Document-level operations
        .route(
            &collection.item_path(),
            get(data::record_get)
                .put(data::record_put)
                .patch(data::record_patch)
                .delete(data::record_delete)
                .fallback(public::not_found),
        )
        .layer(Extension(collection.clone()))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(allowed))
}
