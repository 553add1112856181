pub mod user {
    pub mod schema;
    pub mod model;
    pub mod repository;
    pub mod repository_pg;
    pub mod handle;
    pub mod service;
    pub mod route;
}

pub mod session {
    pub mod store;
    pub mod store_redis;
}

pub mod page {
    pub mod model;
    pub mod handle;
    pub mod route;
}

pub mod upload;
