pub mod cursor;
pub mod filter;
pub mod page;
pub mod token;
