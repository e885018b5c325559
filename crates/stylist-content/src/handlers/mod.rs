//! Format adapters and the static registry selecting them

mod ini;
mod json;
mod text;
mod toml;
mod yaml;

pub use self::ini::{IniAdapter, IniDocument};
pub use self::json::JsonAdapter;
pub use self::text::TextAdapter;
pub use self::toml::TomlAdapter;
pub use self::yaml::{YamlAdapter, YamlDocument};

use crate::format::{Format, FormatAdapter};

/// The adapter registered for `format`.
pub fn adapter(format: Format) -> &'static dyn FormatAdapter {
    match format {
        Format::Toml => &TomlAdapter,
        Format::Json => &JsonAdapter,
        Format::Yaml => &YamlAdapter,
        Format::Ini => &IniAdapter,
        Format::Text => &TextAdapter,
    }
}

/// The adapter for a target file, chosen by its name.
pub fn adapter_for_file(file_name: &str) -> Option<&'static dyn FormatAdapter> {
    Format::from_file_name(file_name).map(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_matches_format_tag() {
        for format in [Format::Toml, Format::Json, Format::Yaml, Format::Ini, Format::Text] {
            assert_eq!(adapter(format).format(), format);
        }
    }

    #[test]
    fn test_unknown_file_has_no_adapter() {
        assert!(adapter_for_file("Makefile").is_none());
        assert_eq!(
            adapter_for_file("setup.cfg").map(|a| a.format()),
            Some(Format::Ini)
        );
    }
}
