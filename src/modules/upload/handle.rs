use actix_multipart::Multipart;
use actix_web::{get, http::header, post, web, HttpRequest, HttpResponse};

use crate::{
    api::{error, success},
    middlewares::get_viewer,
    modules::upload::{
        model::{ChangePriorityModel, ResolveModel, UploadForm, UploadResponse},
        service::UploadService,
    },
    utils::ValidatedForm,
};

#[post("")]
pub async fn create_upload(
    upload_service: web::Data<UploadService>,
    payload: Multipart,
    req: HttpRequest,
) -> Result<success::Success<UploadResponse>, error::Error> {
    let viewer = get_viewer(&req);
    let form = UploadForm::from_multipart(payload).await?;
    let upload = upload_service.create_upload(form, viewer.as_ref()).await?;
    Ok(success::Success::created(Some(upload.into())).message("File uploaded successfully"))
}

#[get("/{id}")]
pub async fn upload_detail(
    upload_service: web::Data<UploadService>,
    id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<UploadResponse>, error::Error> {
    let viewer = get_viewer(&req);
    let upload = upload_service.view_detail(id.into_inner(), viewer.as_ref()).await?;
    Ok(success::Success::ok(Some(upload.into())))
}

#[get("/{id}/file")]
pub async fn download_file(
    upload_service: web::Data<UploadService>,
    id: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse, error::Error> {
    let viewer = get_viewer(&req);
    let (upload, bytes) = upload_service.read_file(id.into_inner(), viewer.as_ref()).await?;

    let disposition = header::ContentDisposition {
        disposition: header::DispositionType::Attachment,
        parameters: vec![header::DispositionParam::Filename(upload.original_filename)],
    };
    Ok(HttpResponse::Ok()
        .content_type(upload.mime_type)
        .insert_header(disposition)
        .body(bytes))
}

#[post("/{id}/admin_resolve")]
pub async fn admin_resolve(
    upload_service: web::Data<UploadService>,
    id: web::Path<i64>,
    body: ValidatedForm<ResolveModel>,
    req: HttpRequest,
) -> Result<success::Success<UploadResponse>, error::Error> {
    let viewer = get_viewer(&req);
    let upload = upload_service.resolve(id.into_inner(), viewer.as_ref(), &body.0.comment).await?;
    Ok(success::Success::ok(Some(upload.into())).message("Upload resolved"))
}

#[post("/{id}/change_priority")]
pub async fn change_priority(
    upload_service: web::Data<UploadService>,
    id: web::Path<i64>,
    body: ValidatedForm<ChangePriorityModel>,
    req: HttpRequest,
) -> Result<success::Success<UploadResponse>, error::Error> {
    let viewer = get_viewer(&req);
    let upload =
        upload_service.change_priority(id.into_inner(), viewer.as_ref(), body.0.priority).await?;
    Ok(success::Success::ok(Some(upload.into())).message("Priority updated"))
}

#[post("/{id}/delete")]
pub async fn delete_upload(
    upload_service: web::Data<UploadService>,
    id: web::Path<i64>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let viewer = get_viewer(&req);
    upload_service.delete(id.into_inner(), viewer.as_ref()).await?;
    Ok(success::Success::no_content())
}
