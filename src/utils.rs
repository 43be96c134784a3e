pub mod canonical;
pub mod errors;
pub mod key_material;
pub mod signature;
