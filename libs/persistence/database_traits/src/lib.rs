pub mod dao;

pub use dao::{GenericDao, PageOf};
