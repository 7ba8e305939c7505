pub mod categories;
pub mod members;
pub mod page;
pub mod portfolio;
pub mod questions;
pub mod submissions;
pub mod users;
