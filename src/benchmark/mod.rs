pub mod cohort;
pub mod consensus;
pub mod reference;
