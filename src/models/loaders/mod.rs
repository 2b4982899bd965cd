pub mod json_store;

pub use json_store::{finalize_and_save, load_catalog, load_descriptions, save_descriptions};
