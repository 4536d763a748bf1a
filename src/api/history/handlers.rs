use actix_web::{
    delete, get,
    web::{Data, Query, ServiceConfig, scope},
    HttpResponse,
};
use actix_web_validator::Json;

use super::dto::{DeleteHistoryRequest, HistoryQuery};
use super::service::HistoryService;
use crate::api::error::ServiceError;

#[get("")]
async fn list_history(
    service: Data<HistoryService>,
    query: Query<HistoryQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = service.list(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[delete("")]
async fn delete_history(
    service: Data<HistoryService>,
    request: Json<DeleteHistoryRequest>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.delete_records(&request.ids).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn history_config(config: &mut ServiceConfig) {
    config.service(scope("job-history").service(list_history).service(delete_history));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::history::dto::{DeleteHistoryResponse, HistoryPage};
    use crate::api::testing::{seed, TestApp};
    use crate::db::filter::Filter;
    use crate::db::models::{JOBS, JOB_HISTORY};
    use crate::db::store::DocumentStore;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    fn record(original: &str, moved: &str) -> serde_json::Value {
        json!({
            "original_job_id": original,
            "moved_to_history_date": moved,
            "moved_to_history_reason": "end_date_passed_no_candidates",
            "job_id": format!("job-{}", original),
            "status": "demand closed",
            "end_date": "2020-01-01"
        })
    }

    #[actix_web::test]
    async fn test_history_is_paginated_newest_first() {
        let app = TestApp::new();
        seed(&app.store, JOB_HISTORY, record("a", "2024-01-01T00:00:00Z")).await;
        seed(&app.store, JOB_HISTORY, record("b", "2024-03-01T00:00:00Z")).await;
        seed(&app.store, JOB_HISTORY, record("c", "2024-02-01T00:00:00Z")).await;
        let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

        let resp = test::call_service(
            &service,
            test::TestRequest::get().uri("/job-history?page=1&limit=2").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page: HistoryPage = test::read_body_json(resp).await;
        assert_eq!(page.pagination.total_jobs, 3);
        assert_eq!(page.pagination.total_pages, 2);
        let order: Vec<&str> = page.jobs.iter().map(|r| r.original_job_id.as_str()).collect();
        assert_eq!(order, vec!["b", "c"]);

        let resp = test::call_service(
            &service,
            test::TestRequest::get().uri("/job-history?page=2&limit=2").to_request(),
        )
        .await;
        let page: HistoryPage = test::read_body_json(resp).await;
        assert_eq!(page.jobs.len(), 1);
        assert_eq!(page.jobs[0].original_job_id, "a");
    }

    #[actix_web::test]
    async fn test_listing_history_does_not_sweep() {
        let app = TestApp::new();
        seed(&app.store, JOBS, json!({"job_id": "jb001", "status": "open", "end_date": "2020-01-01"})).await;
        let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

        let resp = test::call_service(&service, test::TestRequest::get().uri("/job-history").to_request()).await;
        let page: HistoryPage = test::read_body_json(resp).await;
        assert_eq!(page.pagination.total_jobs, 0);
        assert_eq!(page.pagination.page, 1);
        assert_eq!(page.pagination.limit, 25);
        assert_eq!(app.store.count(JOBS, &Filter::new()).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn test_delete_selected_history_records() {
        let app = TestApp::new();
        let first = seed(&app.store, JOB_HISTORY, record("a", "2024-01-01T00:00:00Z")).await;
        seed(&app.store, JOB_HISTORY, record("b", "2024-02-01T00:00:00Z")).await;
        let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

        let req = test::TestRequest::delete()
            .uri("/job-history")
            .set_json(json!({"ids": [first, "unknown"]}))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: DeleteHistoryResponse = test::read_body_json(resp).await;
        assert_eq!(body.deleted_count, 1);
        assert_eq!(app.store.count(JOB_HISTORY, &Filter::new()).await.unwrap(), 1);

        let req = test::TestRequest::delete()
            .uri("/job-history")
            .set_json(json!({"ids": []}))
            .to_request();
        let resp = test::call_service(&service, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
