use std::path::{Path, PathBuf};

use crate::diagnostic::Diagnostic;
use crate::span::Span;

use super::{Backend, GeneratorOptions};

pub const PROJECT_FILE: &str = "skelc.toml";

/// Generator settings from skelc.toml. Every field is optional; command
/// line flags win over file values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectConfig {
    pub root_dir: PathBuf,
    /// Output directory, relative to the project file.
    pub dir: Option<PathBuf>,
    pub name: Option<String>,
    pub backends: Vec<Backend>,
    pub fnames: Vec<String>,
    pub preserve_lines: Option<bool>,
}

/// Parse a minimal TOML string array: `["a", "b", "c"]` → `vec!["a", "b", "c"]`.
fn parse_string_array(s: &str) -> Vec<String> {
    let s = s.trim();
    if !s.starts_with('[') || !s.ends_with(']') {
        return Vec::new();
    }
    let inner = &s[1..s.len() - 1];
    inner
        .split(',')
        .map(|part| part.trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn config_error(path: &Path, message: String) -> Diagnostic {
    Diagnostic::error(message, Span::dummy()).with_note(format!("in '{}'", path.display()))
}

impl ProjectConfig {
    /// Load generator settings from a skelc.toml file.
    pub fn load(toml_path: &Path) -> Result<ProjectConfig, Diagnostic> {
        let content = std::fs::read_to_string(toml_path).map_err(|e| {
            Diagnostic::error(
                format!("cannot read '{}': {}", toml_path.display(), e),
                Span::dummy(),
            )
        })?;
        let root_dir = toml_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::parse(&content, root_dir).map_err(|msg| config_error(toml_path, msg))
    }

    fn parse(content: &str, root_dir: PathBuf) -> Result<ProjectConfig, String> {
        let mut config = ProjectConfig {
            root_dir,
            ..Default::default()
        };
        let mut current_section = String::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                current_section = trimmed[1..trimmed.len() - 1].trim().to_string();
                continue;
            }
            if current_section != "generator" {
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                continue;
            };
            let key = key.trim().trim_matches('"');
            let value = value.trim();

            match key {
                "dir" => config.dir = Some(PathBuf::from(value.trim_matches('"'))),
                "name" => config.name = Some(value.trim_matches('"').to_string()),
                "fnames" => config.fnames = parse_string_array(value),
                "backends" => {
                    for flag in parse_string_array(value) {
                        let backend = Backend::from_flag(&flag)
                            .ok_or_else(|| format!("unknown backend '{}'", flag))?;
                        config.backends.push(backend);
                    }
                }
                "preserve_lines" => {
                    config.preserve_lines = Some(match value {
                        "true" => true,
                        "false" => false,
                        other => {
                            return Err(format!("preserve_lines must be true or false, got '{}'", other))
                        }
                    })
                }
                _ => {}
            }
        }

        Ok(config)
    }

    /// Try to find a skelc.toml in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(PROJECT_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Fold file settings into `options`.
    pub fn apply(&self, options: &mut GeneratorOptions) {
        if let Some(dir) = &self.dir {
            options.output_dir = self.root_dir.join(dir);
        }
        if let Some(name) = &self.name {
            options.output_name = name.clone();
        }
        options.backends.extend(self.backends.iter().copied());
        options.allowed_calls.extend(self.fnames.iter().cloned());
        if let Some(preserve) = self.preserve_lines {
            options.preserve_lines = preserve;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_project() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join(PROJECT_FILE);
        fs::write(
            &toml_path,
            r#"[generator]
dir = "gen"
name = "nbody"
backends = ["opencl", "openmp"]
fnames = ["conj", "csqrt"]
preserve_lines = false
"#,
        )
        .unwrap();

        let config = ProjectConfig::load(&toml_path).unwrap();
        assert_eq!(config.name.as_deref(), Some("nbody"));
        assert_eq!(config.dir, Some(PathBuf::from("gen")));
        assert_eq!(config.backends, vec![Backend::OpenCl, Backend::OpenMp]);
        assert_eq!(config.fnames, vec!["conj", "csqrt"]);
        assert_eq!(config.preserve_lines, Some(false));

        let mut options = GeneratorOptions::default();
        config.apply(&mut options);
        assert_eq!(options.output_dir, dir.path().join("gen"));
        assert_eq!(options.output_name, "nbody");
        assert!(options.is_enabled(Backend::OpenCl));
        assert!(options.allowed_calls.contains("csqrt"));
        assert!(!options.preserve_lines);
    }

    #[test]
    fn test_other_sections_ignored() {
        let config = ProjectConfig::parse(
            "[project]\nname = \"other\"\n\n[generator]\nname = \"mine\"\n",
            PathBuf::from("."),
        )
        .unwrap();
        assert_eq!(config.name.as_deref(), Some("mine"));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = ProjectConfig::parse("[generator]\nbackends = [\"vulkan\"]\n", PathBuf::new())
            .unwrap_err();
        assert!(err.contains("vulkan"));
    }

    #[test]
    fn test_find_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROJECT_FILE), "[generator]\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(
            ProjectConfig::find(&nested),
            Some(dir.path().join(PROJECT_FILE))
        );
    }

    #[test]
    fn test_parse_string_array() {
        assert_eq!(
            parse_string_array(r#"["a", "b", "c"]"#),
            vec!["a", "b", "c"]
        );
        assert_eq!(parse_string_array(r#"["single"]"#), vec!["single"]);
        assert!(parse_string_array("not_an_array").is_empty());
    }
}
