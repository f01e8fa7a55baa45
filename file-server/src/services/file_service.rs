use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, put, web, HttpRequest, HttpResponse};
use blob_storage::Filer;

use crate::errors::ServerErr;

/// Request header carrying the logical file name on upload.
pub const NAME_HEADER: &str = "Key";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload_file).service(download_file);
}

#[put("/")]
async fn upload_file(
    req: HttpRequest,
    body: web::Bytes,
    filer: web::Data<Filer>,
) -> Result<HttpResponse, ServerErr> {
    let header = req.headers().get(NAME_HEADER).ok_or(ServerErr::MissingName)?;
    // stored verbatim, so any UTF-8 is accepted rather than visible ASCII only
    let name = std::str::from_utf8(header.as_bytes()).map_err(|_| ServerErr::InvalidName)?;
    if name.is_empty() {
        return Err(ServerErr::MissingName);
    }

    let file = filer.save_file(name, &body).await?;
    Ok(HttpResponse::Ok().json(file))
}

#[get("/{id}")]
async fn download_file(
    id: web::Path<String>,
    filer: web::Data<Filer>,
) -> Result<HttpResponse, ServerErr> {
    let file = filer.read_file(&id).await.map_err(|e| {
        if !e.is_not_found() {
            tracing::error!("failed to read {}: {}", id, e);
        }
        e
    })?;

    Ok(HttpResponse::Ok()
        .content_type(file.content_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file.name)],
        })
        .body(file.data))
}
