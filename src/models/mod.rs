pub mod character;
pub mod description;
pub mod loaders;

pub use character::{CharacterRecord, UnicodeCatalog};
pub use description::{
    normalize_codepoint, Batch, BatchResult, DescriptionMap, GlyphDescription,
    GlyphDescriptionBatch,
};
pub use loaders::{finalize_and_save, load_catalog, load_descriptions, save_descriptions};
