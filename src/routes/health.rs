use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::store::StorageKind;

/// Health check endpoint
///
/// Reports liveness, the storage backend in use and the server time.
#[get("/health")]
pub async fn health(storage: web::Data<StorageKind>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "storage": *storage.get_ref(),
        "timestamp": Utc::now()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    #[actix_web::test]
    async fn test_health_endpoint() {
        let app = test::init_service(
            actix_web::App::new()
                .app_data(web::Data::new(StorageKind::Memory))
                .service(health),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());

        let json: serde_json::Value = test::read_body_json(resp).await;

        assert_eq!(json["status"], "ok");
        assert_eq!(json["storage"], "memory");
        assert!(json["timestamp"].is_string());
    }
}
