pub mod common;
pub mod describe;
pub mod kinds;
pub mod run;
pub mod validate;
