pub mod advance;
pub mod bank;
pub mod company;
pub mod debt;
pub mod employee;
pub mod indicator;
pub mod permission;
pub mod tax;
