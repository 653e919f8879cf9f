pub mod dependencies;
pub mod imports;
pub mod packages;
pub mod python;
