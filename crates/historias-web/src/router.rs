//! Axum router — maps all URL paths to handlers.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    services::ServeDir,
    cors::CorsLayer,
    trace::TraceLayer,
    compression::CompressionLayer,
};
use crate::state::SharedState;
use crate::handlers::{
    historias::{historias_page, recargar},
    detalle::{nueva_historia, detalle_historia, guardar_historia},
    feedback::{preparar_feedback, enviar_feedback},
    metricas::{metricas_page, grafica_page},
    api::{api_historias, api_metricas, api_estado},
};

const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build and return the full Axum router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        // Pages
        .route("/",                  get(historias_page))
        .route("/historias/nueva",   get(nueva_historia))
        .route("/historias/guardar", post(guardar_historia))
        .route("/historias/{id}",    get(detalle_historia))
        .route("/feedback/preparar", post(preparar_feedback))
        .route("/feedback/enviar",   post(enviar_feedback))
        .route("/metricas",          get(metricas_page))
        .route("/metricas/grafica/{metric}", get(grafica_page))
        .route("/recargar",          post(recargar))

        // API endpoints
        .route("/api/historias", get(api_historias))
        .route("/api/metricas",  get(api_metricas))
        .route("/api/estado",    get(api_estado))

        // Static files
        .nest_service("/static", ServeDir::new(STATIC_DIR))

        // Middleware
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use historias_client::HttpBackend;
    use historias_common::Config;
    use historias_test_utils::{historiales_body, numbered_records, StubBackend, StubResponse};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn state_for(stub: &StubBackend) -> SharedState {
        let config = Config::from_toml(&format!(
            "[backend]\nbase_url = \"{}\"\ntimeout_secs = 1\nfeedback_api_key = \"clave\"\n",
            stub.base_url
        ))
        .unwrap();
        let backend = HttpBackend::new(&config.backend).unwrap();
        Arc::new(AppState::new(Arc::new(backend)))
    }

    async fn loaded(stub: &StubBackend) -> SharedState {
        let state = state_for(stub).await;
        state.reload().await;
        state
    }

    async fn default_stub() -> StubBackend {
        StubBackend::builder()
            .historiales(StubResponse::ok(historiales_body(&numbered_records(25))))
            .metrics(StubResponse::ok(json!([
                {"historia_id": "HC-001", "mejor_modelo": "spacy", "tiempo": "2", "accuracy": "0.8", "recall": 0.5, "f1": 0.6, "longitud_texto": 100, "fecha": "2024-05-02"},
                {"historia_id": "HC-002", "mejor_modelo": "regex", "tiempo": "4", "accuracy": "0.6", "recall": 0.7, "f1": 0.4, "longitud_texto": 200, "fecha": "2024-05-01"}
            ])))
            .spawn()
            .await
            .unwrap()
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn post_form(app: Router, uri: &str, body: &str) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    const FORM: &str = "id=&cedula=1020&nombre=Ana+Ruiz&edad=34&diagnostico=Asma\
        &fechaConsulta=2025-03-01&direccion=Calle+1&telefono=300&observaciones=Ninguna&eps=Sura";

    #[tokio::test]
    async fn test_pages_wait_for_load() {
        let stub = default_stub().await;
        let app = build_router(state_for(&stub).await);
        let (status, body) = get(app.clone(), "/").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("Cargando"));

        let (status, body) = get(app, "/api/estado").await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "loading");
    }

    #[tokio::test]
    async fn test_api_historias_pages_newest_first() {
        let stub = default_stub().await;
        let app = build_router(loaded(&stub).await);

        let (status, body) = get(app.clone(), "/api/historias?page=3").await;
        assert_eq!(status, StatusCode::OK);
        let view: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(view["total_pages"], 3);
        assert_eq!(view["rows"].as_array().unwrap().len(), 5);
        assert_eq!(view["range_start"], 21);
        assert_eq!(view["range_end"], 25);

        let (_, body) = get(app, "/api/historias?q=paciente%2025").await;
        let view: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(view["filtered_count"], 1);
        assert_eq!(view["rows"][0]["id"], "HC-025");
    }

    #[tokio::test]
    async fn test_table_page_renders_rows() {
        let stub = default_stub().await;
        let app = build_router(loaded(&stub).await);
        let (status, body) = get(app, "/?page=2").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Paciente 15"));
        assert!(body.contains("/historias/HC-015"));
        // Paciente 15 is 34 years old, so the fixture cedula is 1000000034
        assert!(body.contains("<td>1000000034</td>"));
        assert!(body.contains("11 - 20 de 25"));
    }

    #[tokio::test]
    async fn test_table_page_without_matches() {
        let stub = default_stub().await;
        let app = build_router(loaded(&stub).await);
        let (status, body) = get(app, "/?q=sin+coincidencias").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("No se encontraron registros."));
        assert!(body.contains("0 - 0 de 0"));
        assert!(!body.contains("Página"));
    }

    #[tokio::test]
    async fn test_api_metricas_summary() {
        let stub = default_stub().await;
        let app = build_router(loaded(&stub).await);
        let (_, body) = get(app, "/api/metricas").await;
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["summary"]["tiempo"], 3.0);
        assert_eq!(json["summary"]["accuracy"], 0.7);
        assert_eq!(json["summary"]["ultima_fecha"], "2024-05-02");
        assert_eq!(json["series"][1]["name"], "HC-2");
    }

    #[tokio::test]
    async fn test_metrics_page_and_zoom() {
        let stub = default_stub().await;
        let app = build_router(loaded(&stub).await);

        let (status, body) = get(app.clone(), "/metricas?detalle=recall").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("3.000s"));
        assert!(body.contains("Capacidad del modelo"));
        assert!(body.contains("<polyline"));

        let (status, _) = get(app.clone(), "/metricas/grafica/f1").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(app, "/metricas/grafica/desconocida").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_failed_load_shows_error() {
        let stub = StubBackend::builder()
            .metrics(StubResponse::status(500, json!({"detail": "base de datos caída"})))
            .spawn()
            .await
            .unwrap();
        let app = build_router(loaded(&stub).await);

        let (status, body) = get(app.clone(), "/").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("Error HTTP: 500: base de datos caída"));

        let (status, body) = get(app, "/api/historias").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let json: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["error"]["code"], "LOAD_FAILED");
    }

    #[tokio::test]
    async fn test_detail_page_and_unknown_id() {
        let stub = default_stub().await;
        let app = build_router(loaded(&stub).await);
        let (status, body) = get(app.clone(), "/historias/HC-003").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Paciente 3"));
        assert!(body.contains("2024-01-03"));

        let (status, _) = get(app, "/historias/HC-999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_save_appends_and_redirects() {
        let stub = default_stub().await;
        let state = loaded(&stub).await;
        let app = build_router(state.clone());

        let response = post_form(app.clone(), "/historias/guardar", FORM).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/?guardado=1");

        let sent = &stub.received_on("/pacientes")[0].body;
        assert!(sent.get("id").is_none());
        assert_eq!(sent["edad"], 34);
        assert_eq!(sent["fechaConsulta"], "2025-03-01T00:00:00.000Z");

        let (_, body) = get(app, "/?guardado=1").await;
        assert!(body.contains("Ana Ruiz"));
        assert!(body.contains("guardado correctamente"));
        assert_eq!(state.status().await.records, 26);
    }

    #[tokio::test]
    async fn test_blank_field_is_flagged_without_calling_backend() {
        let stub = default_stub().await;
        let app = build_router(loaded(&stub).await);
        let response = post_form(app, "/historias/guardar", &FORM.replace("eps=Sura", "eps=++")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("campo-invalido"));
        assert!(body.contains("Ana Ruiz"));
        assert!(stub.received_on("/pacientes").is_empty());
    }

    #[tokio::test]
    async fn test_backend_refusal_keeps_form_open() {
        let stub = StubBackend::builder()
            .pacientes(StubResponse::status(400, json!({"detail": "cedula duplicada"})))
            .spawn()
            .await
            .unwrap();
        let app = build_router(loaded(&stub).await);
        let response = post_form(app, "/historias/guardar", FORM).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("Error al guardar: Error HTTP: 400: cedula duplicada"));
        assert!(body.contains("Ana Ruiz"));
    }

    #[tokio::test]
    async fn test_feedback_flow() {
        let stub = default_stub().await;
        let app = build_router(loaded(&stub).await);

        let response = post_form(app.clone(), "/feedback/preparar", FORM).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("label.nombre"));

        let response = post_form(
            app,
            "/feedback/enviar",
            "text=%7B%7D&label.id=&label.nombre=Ana+Mar%C3%ADa&label.eps=Sura",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let received = stub.received_on("/feedback");
        assert_eq!(received[0].api_key.as_deref(), Some("clave"));
        assert_eq!(received[0].body["labels"]["nombre"], "Ana María");
        assert_eq!(received[0].body["text"], "{}");
    }

    #[tokio::test]
    async fn test_save_overlapping_reload_reloads_again() {
        let stub = StubBackend::builder()
            .historiales(StubResponse::ok(historiales_body(&numbered_records(25))))
            .metrics(StubResponse::ok(json!([])))
            .pacientes(StubResponse::ok(json!({"id": "HC-900"})).delayed(Duration::from_millis(300)))
            .spawn()
            .await
            .unwrap();
        let state = loaded(&stub).await;
        let app = build_router(state.clone());

        let save = tokio::spawn(post_form(app, "/historias/guardar", FORM));
        tokio::time::sleep(Duration::from_millis(50)).await;
        state.reload().await;
        let response = save.await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        for _ in 0..50 {
            if stub.received_on("/historiales").len() == 3 && state.status().await.status == "ready" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(stub.received_on("/historiales").len(), 3);
        assert_eq!(state.status().await.records, 25);
        assert!(state.with_dashboard(|d| d.find("HC-900").is_none()).await.unwrap());
    }
}
