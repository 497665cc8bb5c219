pub mod table;
pub mod format;
pub mod compare;
pub mod errors;
pub mod scheduler;
pub mod theme;
