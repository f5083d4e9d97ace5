pub mod monthly;
pub mod weekly;
