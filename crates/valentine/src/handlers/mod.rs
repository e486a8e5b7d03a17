pub mod assets;
pub mod error;
pub mod health;
pub mod site;

pub use error::AppError;
