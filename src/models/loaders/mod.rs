pub mod text_loader;
pub mod toml_loader;

pub use text_loader::{load_plain_text, parse_plain_text};
pub use toml_loader::{load_project, project_to_toml, save_project};
