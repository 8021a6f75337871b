pub mod audit;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod request;
pub mod validate;
