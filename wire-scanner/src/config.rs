//! Generator config file: one directive per line, `#` starts a comment,
//! blank lines are ignored. Two directives:
//!
//!   package wayland wl_
//!   import xdg-shell-server.xml xdg-shell-client.xml xdg_ xdg_shell
//!
//! `package` sets this protocol's own name and the interface-name prefix to
//! strip when deriving Rust type names. `import` names another protocol's
//! XML (once for its server-side source, once for its client-side source,
//! mirroring the reference generator's own config grammar) so that this
//! generator can parse it and know which interfaces it defines, plus the
//! wire prefix its interfaces use and an optional module alias to reference
//! them by; omitting the alias falls back to the prefix with its trailing
//! underscore stripped.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::codegen::Side;
use crate::xml::{self, Protocol, XmlError};

/// A `import` directive, resolved: the named XML file for the side being
/// generated has actually been parsed, so `module_for` can check real
/// interface membership instead of guessing from a prefix string.
#[derive(Debug)]
pub struct Import {
    pub server_xml: PathBuf,
    pub client_xml: PathBuf,
    pub prefix: String,
    pub alias: Option<String>,
    pub protocol: Protocol,
}

#[derive(Debug, Default)]
pub struct Config {
    pub package_name: String,
    pub prefix: String,
    pub imports: Vec<Import>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Xml(XmlError),
    Syntax { line: usize, text: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "reading config: {e}"),
            ConfigError::Xml(e) => write!(f, "parsing imported protocol: {e}"),
            ConfigError::Syntax { line, text } => {
                write!(f, "config line {line}: invalid directive `{text}`")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// The default config when no `-config` flag is given: no package
    /// prefix stripped, no imports.
    pub fn empty() -> Self {
        Config::default()
    }

    /// Parse `package`/`import` directives from `path`. `side` picks which
    /// of an `import` line's two XML paths gets parsed, since only one of
    /// them matches the binding currently being generated.
    pub fn load(path: &Path, side: Side) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::Io)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let mut cfg = Config::default();

        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                ["package", name] => {
                    cfg.package_name = (*name).to_owned();
                }
                ["package", name, prefix] => {
                    cfg.package_name = (*name).to_owned();
                    cfg.prefix = (*prefix).to_owned();
                }
                ["import", server_xml, client_xml, prefix] => {
                    cfg.imports.push(load_import(base, server_xml, client_xml, prefix, None, side)?);
                }
                ["import", server_xml, client_xml, prefix, alias] => {
                    cfg.imports.push(load_import(base, server_xml, client_xml, prefix, Some(alias), side)?);
                }
                _ => {
                    return Err(ConfigError::Syntax {
                        line: lineno + 1,
                        text: raw_line.to_owned(),
                    });
                }
            }
        }
        Ok(cfg)
    }

    /// Resolve which imported protocol, if any, defines `interface_name`;
    /// `None` means it belongs to the protocol currently being generated.
    /// Returns the Rust module path code referencing it should use.
    pub fn module_for(&self, interface_name: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|imp| imp.protocol.interfaces.iter().any(|i| i.name == interface_name))
            .map(|imp| imp.alias.as_deref().unwrap_or_else(|| imp.prefix.trim_end_matches('_')))
    }
}

fn load_import(
    base: &Path,
    server_xml: &str,
    client_xml: &str,
    prefix: &str,
    alias: Option<&str>,
    side: Side,
) -> Result<Import, ConfigError> {
    let xml_path = match side {
        Side::Client => base.join(client_xml),
        Side::Server => base.join(server_xml),
    };
    let file = fs::File::open(&xml_path).map_err(ConfigError::Io)?;
    let protocol = xml::parse_stream(file).map_err(ConfigError::Xml)?;
    Ok(Import {
        server_xml: base.join(server_xml),
        client_xml: base.join(client_xml),
        prefix: prefix.to_owned(),
        alias: alias.map(str::to_owned),
        protocol,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, contents: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        dir
    }

    const XDG_XML: &str = r#"
        <protocol name="xdg_shell">
          <interface name="xdg_surface" version="1">
            <request name="destroy" since="1"/>
          </interface>
        </protocol>
    "#;

    #[test]
    fn parses_package_and_prefix() {
        let dir = write_tmp("wayland.toml", "package wayland wl_\n");
        let cfg = Config::load(&dir.path().join("wayland.toml"), Side::Client).unwrap();
        assert_eq!(cfg.package_name, "wayland");
        assert_eq!(cfg.prefix, "wl_");
        assert!(cfg.imports.is_empty());
    }

    #[test]
    fn skips_blank_lines_and_comments() {
        let dir = write_tmp(
            "wayland.toml",
            "# a comment\n\npackage wayland wl_\n  # indented comment\n",
        );
        let cfg = Config::load(&dir.path().join("wayland.toml"), Side::Client).unwrap();
        assert_eq!(cfg.package_name, "wayland");
    }

    #[test]
    fn import_directive_parses_the_referenced_xml_and_resolves_interfaces() {
        let dir = write_tmp("xdg-shell-client.xml", XDG_XML);
        fs::write(dir.path().join("xdg-shell-server.xml"), XDG_XML).unwrap();
        let config_text = "package wayland wl_\nimport xdg-shell-server.xml xdg-shell-client.xml xdg_ xdg_shell\n";
        fs::write(dir.path().join("wayland.toml"), config_text).unwrap();

        let cfg = Config::load(&dir.path().join("wayland.toml"), Side::Client).unwrap();
        assert_eq!(cfg.imports.len(), 1);
        assert_eq!(cfg.module_for("xdg_surface"), Some("xdg_shell"));
        assert_eq!(cfg.module_for("wl_surface"), None);
    }

    #[test]
    fn import_without_alias_falls_back_to_prefix() {
        let dir = write_tmp("xdg-shell-client.xml", XDG_XML);
        fs::write(dir.path().join("xdg-shell-server.xml"), XDG_XML).unwrap();
        let config_text = "import xdg-shell-server.xml xdg-shell-client.xml xdg_\n";
        fs::write(dir.path().join("wayland.toml"), config_text).unwrap();

        let cfg = Config::load(&dir.path().join("wayland.toml"), Side::Client).unwrap();
        assert_eq!(cfg.module_for("xdg_surface"), Some("xdg"));
    }

    #[test]
    fn empty_config_has_no_prefix() {
        let cfg = Config::empty();
        assert_eq!(cfg.prefix, "");
        assert!(cfg.imports.is_empty());
    }

    #[test]
    fn unrecognized_directive_is_a_syntax_error() {
        let dir = write_tmp("wayland.toml", "bogus directive here\n");
        let err = Config::load(&dir.path().join("wayland.toml"), Side::Client).unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { line: 1, .. }));
    }
}
