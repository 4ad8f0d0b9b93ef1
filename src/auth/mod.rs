pub mod authorizor;
mod principal;

pub use principal::{Platform, Principal};
