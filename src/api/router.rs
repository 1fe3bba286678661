//! Route table: public `/auth` group, protected `/api` tree, CORS
//! restricted to the single configured origin.
//!
//! Middleware layering follows the extension pattern: `Extension(ctx)` is
//! outermost so the auth middleware can reach `ApiContext`; handlers get
//! the same context through `State`.
//!
//! NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::state::AppState;

pub fn api_router(state: Arc<AppState>) -> Router {
    let ctx = ApiContext::new(state);
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    let cors_origin = ctx
        .state
        .settings
        .cors_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:4200"));
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    // Public authentication surface
    let public = Router::new()
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/authenticate", post(endpoints::auth::authenticate))
        .route("/auth/activate-account", get(endpoints::auth::activate_account))
        .route("/auth/roles", get(endpoints::auth::roles))
        .with_state(ctx.clone());

    // Authenticated identity echo lives outside /api in the original surface
    let current_user = Router::new()
        .route("/auth/current-user", get(endpoints::auth::current_user))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let protected = Router::new()
        // Appointments
        .route("/appointments/book", post(endpoints::appointments::book))
        .route(
            "/appointments/my-appointments",
            get(endpoints::appointments::my_appointments),
        )
        .route(
            "/appointments/my-doctor-appointments",
            get(endpoints::appointments::my_doctor_appointments),
        )
        .route(
            "/appointments/secretary/:secretary_id",
            get(endpoints::appointments::secretary_appointments),
        )
        .route(
            "/appointments/status/:appointment_id",
            put(endpoints::appointments::update_status),
        )
        .route(
            "/appointments/update-my-appointment-status",
            put(endpoints::appointments::update_my_appointment_status),
        )
        .route(
            "/appointments/:appointment_id/fiche-patient",
            post(endpoints::appointments::save_record).get(endpoints::appointments::get_record),
        )
        .route(
            "/appointments/:appointment_id/interventions",
            get(endpoints::appointments::list_interventions)
                .post(endpoints::appointments::add_intervention),
        )
        // Patients & fiches
        .route("/patients/me", get(endpoints::patients::me))
        .route(
            "/patients/me/fiche",
            get(endpoints::patients::my_fiche)
                .post(endpoints::patients::save_my_fiche)
                .put(endpoints::patients::update_my_fiche),
        )
        .route(
            "/patients/me/fiche/document",
            get(endpoints::patients::view_my_document).post(endpoints::patients::upload_my_document),
        )
        .route(
            "/patients/me/fiche/document/download",
            get(endpoints::patients::download_my_document),
        )
        .route(
            "/patients/:patient_id/fiche",
            get(endpoints::patients::get_fiche)
                .post(endpoints::patients::save_fiche)
                .put(endpoints::patients::update_fiche),
        )
        // Users & secretaries
        .route("/users/profile", get(endpoints::users::profile).put(endpoints::users::update_profile))
        .route("/users/password", put(endpoints::users::change_password))
        .route(
            "/users/profile/picture",
            post(endpoints::users::upload_profile_picture),
        )
        .route(
            "/users/profile/picture/:file",
            get(endpoints::users::get_profile_picture),
        )
        .route("/users/cv/:file", get(endpoints::users::get_cv))
        .route("/users/doctors", get(endpoints::users::doctors))
        .route(
            "/users/doctors/unassigned",
            get(endpoints::users::unassigned_doctors),
        )
        .route("/users/doctors/:id", get(endpoints::users::doctor_by_id))
        .route(
            "/users/secretary/apply",
            post(endpoints::users::apply_as_secretary),
        )
        .route(
            "/users/secretary/doctor",
            get(endpoints::users::my_assigned_doctor),
        )
        .route(
            "/users/doctor/secretary-applications",
            get(endpoints::users::secretary_applications),
        )
        .route(
            "/users/doctor/secretaries",
            get(endpoints::users::assigned_secretaries),
        )
        .route(
            "/users/doctor/process-secretary",
            post(endpoints::users::process_secretary),
        )
        .route(
            "/users/doctor/secretary/:secretary_id",
            delete(endpoints::users::remove_secretary),
        )
        // Doctor verifications
        .route(
            "/doctor-verifications",
            post(endpoints::verifications::submit),
        )
        .route(
            "/doctor-verifications/specialties",
            get(endpoints::verifications::specialties),
        )
        .route(
            "/doctor-verifications/doctor/:doctor_id",
            get(endpoints::verifications::by_doctor),
        )
        .route(
            "/doctor-verifications/pending",
            get(endpoints::verifications::pending),
        )
        .route(
            "/doctor-verifications/approved",
            get(endpoints::verifications::approved),
        )
        .route(
            "/doctor-verifications/:id/status",
            put(endpoints::verifications::update_status),
        )
        .route(
            "/doctor-verifications/:id/cabinet-photo",
            post(endpoints::verifications::upload_cabinet_photo)
                .get(endpoints::verifications::get_cabinet_photo),
        )
        .route(
            "/doctor-verifications/:id/diploma-photo",
            post(endpoints::verifications::upload_diploma)
                .get(endpoints::verifications::get_diploma),
        )
        // Notifications
        .route("/notifications", get(endpoints::notifications::list))
        .route("/notifications/unread", get(endpoints::notifications::unread))
        .route(
            "/notifications/unread-count",
            get(endpoints::notifications::unread_count),
        )
        .route(
            "/notifications/mark-read/:id",
            put(endpoints::notifications::mark_read),
        )
        .route(
            "/notifications/mark-all-read",
            put(endpoints::notifications::mark_all_read),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx));

    Router::new()
        .merge(public)
        .merge(current_user)
        .nest("/api", protected)
        .layer(cors)
}
