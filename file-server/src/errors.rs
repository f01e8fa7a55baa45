use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use blob_storage::FilerErr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerErr {
    #[error("missing `Key` header naming the file")]
    MissingName,

    #[error("`Key` header is not valid UTF-8")]
    InvalidName,

    #[error(transparent)]
    Filer(#[from] FilerErr),
}

impl ResponseError for ServerErr {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerErr::MissingName | ServerErr::InvalidName => StatusCode::BAD_REQUEST,
            ServerErr::Filer(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ServerErr::Filer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
