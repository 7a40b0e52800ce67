pub mod assembler;
pub mod dedup;
pub mod game_selector;
pub mod histogram;
pub mod odds;
pub mod pipeline;
pub mod rules;
pub mod tables;

pub use pipeline::{aggregate, SlateContext, SlotDiagnostic};
pub use tables::{Crosswalk, SlateTables};
