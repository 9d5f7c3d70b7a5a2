use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::{self, AppState};
use crate::error::{method_not_allowed, not_found};
use crate::middleware::require_auth;
use crate::{highlights, newsletter, saved, stats};

/// Every JSON endpoint. Routes that act on behalf of a user sit behind
/// `require_auth`; the rest are public.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/highlights", post(highlights::create_highlight))
        .route(
            "/highlights/{id}",
            put(highlights::update_highlight).delete(highlights::delete_highlight),
        )
        .route("/highlights/{id}/like", post(highlights::like_highlight))
        .route(
            "/highlights/{id}/save",
            post(saved::save_highlight).delete(saved::unsave_highlight),
        )
        .route("/me/saved", get(saved::saved_highlights))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/highlights", get(highlights::list_highlights))
        .route("/highlights/featured", get(highlights::featured_highlights))
        .route("/highlights/{id}", get(highlights::get_highlight))
        .route("/categories", get(stats::categories))
        .route("/statistics", get(stats::statistics))
        .route("/newsletter/subscribe", post(newsletter::subscribe))
        .route("/newsletter/unsubscribe", post(newsletter::unsubscribe));

    // Protected first: on shared paths the public router's 405 fallback wins,
    // so a wrong method is not reported as 401.
    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
}
