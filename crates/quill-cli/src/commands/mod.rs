pub mod add;
pub mod category;
pub mod common;
pub mod delete;
pub mod edit;
pub mod get;
pub mod list;
pub mod status;
pub mod sync;
