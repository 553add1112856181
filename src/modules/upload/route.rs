use crate::modules::upload::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/upload")
            .service(create_upload)
            .service(download_file)
            .service(admin_resolve)
            .service(change_priority)
            .service(delete_upload)
            .service(upload_detail),
    );
}
