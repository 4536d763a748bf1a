use actix_web::{
    put,
    web::{Data, Path, ServiceConfig, scope},
    HttpResponse,
};
use actix_web_validator::Json;

use super::dto::StatusUpdate;
use super::service::CandidateService;
use crate::api::error::ServiceError;

#[put("/{candidate_id}/status")]
async fn update_candidate_status(
    service: Data<CandidateService>,
    path: Path<String>,
    update: Json<StatusUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.update_status(&path.into_inner(), &update).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn candidate_config(config: &mut ServiceConfig) {
    config.service(scope("candidates").service(update_candidate_status));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::candidate::dto::StatusUpdateResponse;
    use crate::api::testing::{seed, TestApp};
    use crate::api::validation::ErrorResponse;
    use crate::db::filter::Filter;
    use crate::db::models::{
        from_document, ApplicationHistoryEntry, APPLICATION_HISTORY, CANDIDATES, JOBS, JOB_HISTORY,
    };
    use crate::db::store::{DocumentStore, ID_FIELD};
    use crate::reconciler::ReconcilerConfig;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn test_status_update_records_history() {
        let app = TestApp::new();
        let key = seed(&app.store, CANDIDATES, json!({"job_id": "jb001", "status": "applied", "name": "Asha"})).await;
        let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

        let req = test::TestRequest::put()
            .uri(&format!("/candidates/{}/status", key))
            .set_json(json!({"status": "interview_selected", "notes": "strong", "updated_by": "hr-1"}))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: StatusUpdateResponse = test::read_body_json(resp).await;
        assert_eq!(body.old_status, "applied");
        assert_eq!(body.new_status, "interview_selected");

        let candidate = app
            .store
            .find_one(CANDIDATES, &Filter::new().eq(ID_FIELD, key.as_str()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(candidate["status"], "interview_selected");
        assert_eq!(candidate["last_updated_by"], "hr-1");
        assert_eq!(candidate["name"], "Asha");

        let entry = app
            .store
            .find_one(APPLICATION_HISTORY, &Filter::new().eq("candidate_id", key.as_str()))
            .await
            .unwrap()
            .unwrap();
        let entry: ApplicationHistoryEntry = from_document(entry).unwrap();
        assert_eq!(entry.job_id, "jb001");
        assert_eq!(entry.old_status, "applied");
        assert_eq!(entry.comment.as_deref(), Some("strong"));
    }

    #[actix_web::test]
    async fn test_status_update_sweeps_expired_jobs_first() {
        let app = TestApp::with_config(ReconcilerConfig {
            qualifying_statuses: vec!["placed".to_string()],
            ..ReconcilerConfig::default()
        });
        seed(&app.store, JOBS, json!({"job_id": "jb001", "status": "open", "end_date": "2020-01-01"})).await;
        let key = seed(&app.store, CANDIDATES, json!({"job_id": "jb001", "status": "applied"})).await;
        let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

        let req = test::TestRequest::put()
            .uri(&format!("/candidates/{}/status", key))
            .set_json(json!({"status": "placed"}))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        // The sweep ran before the placement landed.
        assert_eq!(app.store.count(JOBS, &Filter::new()).await.unwrap(), 0);
        assert_eq!(app.store.count(JOB_HISTORY, &Filter::new()).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_unknown_candidate_and_invalid_body() {
        let app = TestApp::new();
        let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

        let req = test::TestRequest::put()
            .uri("/candidates/nope/status")
            .set_json(json!({"status": "placed"}))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put()
            .uri("/candidates/nope/status")
            .set_json(json!({"status": ""}))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Validation failed");
        assert!(body.fields.get("status").is_some());
    }
}
