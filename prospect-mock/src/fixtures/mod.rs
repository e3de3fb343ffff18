pub mod news;
pub mod page;
pub mod records;
