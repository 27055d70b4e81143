pub mod catalog;
pub mod handlers;
pub mod middleware;
pub mod movies;
pub mod routes;
pub mod searches;

pub use routes::create_router;
