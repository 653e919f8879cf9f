pub mod canonical;
pub mod defaults;
pub mod differ;
