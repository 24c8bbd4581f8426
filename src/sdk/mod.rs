pub mod config;
pub mod locus;
pub mod util;
