use crate::modules::page::handle::*;
use actix_web::web::ServiceConfig;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(home).service(mainpage).service(site_staff).service(logout);
}
