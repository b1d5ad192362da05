//! Layered application configuration.
//!
//! - **[`ini`]**: INI files with typed getters ([`ConfigParser`])
//! - **[`convert`]**: named value converters shared by INI getters and imports
//! - **[`settings`]**: the process-wide settings registry
//! - **[`state`]**: the process-wide persisted state registry
pub mod convert;
pub mod ini;
mod record;
pub mod settings;
pub mod state;
mod value;

pub use convert::{
    Conversion, ConvertFn, Converter, as_bool, as_color, as_datetime, as_int, as_named_color,
    as_path, as_severity, as_text,
};
pub use ini::{ConfigParser, SectionView};
pub use record::{ConfigRecord, normalize_key, normalize_state_key};
pub use settings::{ImportSpec, Settings, SettingsSource};
pub use state::State;
pub use value::{Color, Value};
