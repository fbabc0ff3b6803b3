pub mod approve;
pub mod status;
