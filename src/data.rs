pub mod input;
pub mod student;
