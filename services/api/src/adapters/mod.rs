pub mod db;
pub mod dna;

pub use db::DbAdapter;
pub use dna::DbDnaAdapter;
