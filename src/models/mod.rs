//! Data models for CarParter backend entities

mod center;
mod chat;
mod notification;
mod quote;
mod repair;
mod user;

pub use center::*;
pub use chat::*;
pub use notification::*;
pub use quote::*;
pub use repair::*;
pub use user::*;
