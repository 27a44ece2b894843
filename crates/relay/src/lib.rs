pub mod convert;
pub mod errors;
pub mod models;
pub mod providers;
pub mod systems;
pub mod translate;
pub mod wire;
