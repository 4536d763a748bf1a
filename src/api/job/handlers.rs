use actix_web::{
    get,
    web::{Data, Path, Query, ServiceConfig, scope},
    HttpResponse,
};

use super::dto::JobListQuery;
use super::service::JobService;
use crate::api::error::ServiceError;

#[get("")]
async fn list_jobs(
    service: Data<JobService>,
    query: Query<JobListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let response = service.list_jobs(&query).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/{job_id}")]
async fn get_job(
    service: Data<JobService>,
    path: Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let job = service.get_job(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(job))
}

pub fn job_config(config: &mut ServiceConfig) {
    config.service(scope("jobs").service(list_jobs).service(get_job));
}
