//! One module per entity; handlers call these instead of issuing SQL.

pub mod bank;
pub mod company;
pub mod debt;
pub mod employee;
pub mod indicator;
pub mod tax;
