pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod runs;
pub mod series;

pub use routes::create_router;
