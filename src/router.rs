//! Route table. Everything is nested under `/api/`.
//!
//! `/auth` is open; `/doctor` and `/receptionist` each sit behind the
//! bearer gate for their role.

use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::handlers::{auth, doctor, middleware, receptionist, AppState};
use crate::store::ClinicStore;

pub fn build_router<S: ClinicStore>(state: AppState<S>, cors_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth::login::<S>))
        .route("/logout", post(auth::logout::<S>));

    // axum 0.7 path params use `:param` syntax.
    let doctor_routes = Router::new()
        .route("/patients", get(doctor::list_patients::<S>))
        .route(
            "/prescriptions/:patient_id",
            post(doctor::create_prescription::<S>).put(doctor::update_prescription::<S>),
        )
        .route("/appointments", get(doctor::list_appointments::<S>))
        .route(
            "/appointments/by-date",
            get(doctor::appointments_by_date::<S>),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_doctor::<S>,
        ));

    let receptionist_routes = Router::new()
        .route(
            "/patients",
            post(receptionist::create_patient::<S>).get(receptionist::list_patients::<S>),
        )
        .route(
            "/patients/:patient_id",
            get(receptionist::get_patient::<S>)
                .put(receptionist::update_patient::<S>)
                .delete(receptionist::delete_patient::<S>),
        )
        .route(
            "/patients/:patient_id/appointments",
            post(receptionist::create_appointment::<S>)
                .get(receptionist::list_patient_appointments::<S>),
        )
        .route(
            "/patients/:patient_id/appointments/:appointment_id",
            get(receptionist::get_appointment::<S>)
                .put(receptionist::update_appointment::<S>)
                .delete(receptionist::delete_appointment::<S>),
        )
        .route("/appointments", get(receptionist::list_appointments::<S>))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_receptionist::<S>,
        ));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/doctor", doctor_routes)
        .nest("/receptionist", receptionist_routes);

    Router::new()
        .nest("/api", api)
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}
