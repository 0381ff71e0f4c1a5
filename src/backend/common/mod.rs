pub mod constants;
pub mod dtos;
pub mod ids;
