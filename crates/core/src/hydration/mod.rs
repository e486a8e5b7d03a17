mod directive;
mod error;
mod island;
mod markup;
mod script;

pub use directive::{DirectiveKind, HydrationDirective};
pub use error::HydrationError;
pub use island::{render_island, HydrationPolicy, IslandAssets, IslandReference};
pub use markup::{escape_attr, escape_script_json};
pub use script::{DirectiveSet, HydrationScripts, IDLE_TIMEOUT_MS};
