//! YAML frontmatter for markdown-backed artifacts.

use crate::error::{CrudError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Split `input` into its raw YAML block and the markdown body that follows.
///
/// The first line must be `---` (an optional BOM is tolerated); the block ends
/// at the next `---` or `...` line. Returns `None` when no block is present.
pub fn split(input: &str) -> Option<(&str, &str)> {
    let text = input.strip_prefix('\u{feff}').unwrap_or(input);
    let rest = text
        .strip_prefix("---\r\n")
        .or_else(|| text.strip_prefix("---\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "---" || trimmed == "..." {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parse the frontmatter of `input` into `T` and return it with the body.
///
/// The body comes back as [`render`] was given it: only the blank separator
/// line after the block and the final newline are dropped.
pub fn parse<T: DeserializeOwned>(input: &str, path: &Path) -> Result<(T, String)> {
    let Some((yaml, body)) = split(input) else {
        return Err(CrudError::Frontmatter {
            path: path.display().to_string(),
            reason: "missing '---' frontmatter block".to_string(),
        });
    };
    if yaml.trim().is_empty() {
        return Err(CrudError::Frontmatter {
            path: path.display().to_string(),
            reason: "frontmatter block is empty".to_string(),
        });
    }
    let fm: T = serde_yaml::from_str(yaml).map_err(|e| CrudError::Frontmatter {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok((fm, body_text(body)))
}

fn body_text(body: &str) -> String {
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .unwrap_or(body);
    strip_final_newline(body).to_string()
}

/// Like [`parse`], but a file without frontmatter is all body.
pub fn parse_or_default<T: DeserializeOwned + Default>(
    input: &str,
    path: &Path,
) -> Result<(T, String)> {
    match split(input) {
        None => Ok((T::default(), strip_final_newline(input).to_string())),
        Some((yaml, body)) if yaml.trim().is_empty() => Ok((T::default(), body_text(body))),
        Some(_) => parse(input, path),
    }
}

/// A file's text minus the newline that terminates its last line.
fn strip_final_newline(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

/// Render `fm` as a frontmatter block, a blank line, then `body` verbatim.
pub fn render<T: Serialize>(fm: &T, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(fm)?;
    if body.is_empty() {
        Ok(format!("---\n{yaml}---\n"))
    } else {
        Ok(format!("---\n{yaml}---\n\n{body}\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Fm {
        name: String,
        #[serde(default)]
        tools: Vec<String>,
    }

    #[test]
    fn split_basic() {
        let (yaml, body) = split("---\nname: x\n---\n# Title\nBody").unwrap();
        assert_eq!(yaml, "name: x\n");
        assert_eq!(body, "# Title\nBody");
    }

    #[test]
    fn split_with_bom_and_crlf() {
        let (yaml, body) = split("\u{feff}---\r\nname: x\r\n---\r\nbody").unwrap();
        assert_eq!(yaml, "name: x\r\n");
        assert_eq!(body, "body");
    }

    #[test]
    fn split_requires_opening_delimiter() {
        assert!(split("# Title\n---\nname: x\n---\n").is_none());
        assert!(split("---\nname: x\n").is_none());
    }

    #[test]
    fn parse_and_render_agree() {
        let fm = Fm {
            name: "reviewer".into(),
            tools: vec!["Read".into(), "Grep".into()],
        };
        let text = render(&fm, "You review code.").unwrap();
        assert!(text.starts_with("---\nname: reviewer\n"));
        assert!(text.ends_with("---\n\nYou review code.\n"));
        let (parsed, body): (Fm, String) = parse(&text, Path::new("x.md")).unwrap();
        assert_eq!(parsed, fm);
        assert_eq!(body, "You review code.");
    }

    #[test]
    fn body_whitespace_survives_a_round_trip() {
        let fm = Fm {
            name: "x".into(),
            tools: vec![],
        };
        for body in ["\n  indented first line\n\ntrailing blank\n\n", "  ", "line\n"] {
            let text = render(&fm, body).unwrap();
            let (_, back): (Fm, String) = parse(&text, Path::new("x.md")).unwrap();
            assert_eq!(back, body);
        }
    }

    #[test]
    fn render_without_body() {
        let fm = Fm {
            name: "x".into(),
            tools: vec![],
        };
        assert_eq!(render(&fm, "").unwrap(), "---\nname: x\ntools: []\n---\n");
    }

    #[test]
    fn parse_reports_missing_fields() {
        let err = parse::<Fm>("---\ntools: []\n---\n", Path::new("a.md")).unwrap_err();
        assert!(matches!(err, CrudError::Frontmatter { ref path, .. } if path == "a.md"));
    }

    #[test]
    fn parse_or_default_accepts_plain_markdown() {
        #[derive(Debug, Default, Deserialize)]
        struct Loose {
            #[serde(default)]
            description: String,
        }
        let (fm, body): (Loose, String) =
            parse_or_default("Always run the tests.\n", Path::new("r.md")).unwrap();
        assert!(fm.description.is_empty());
        assert_eq!(body, "Always run the tests.");
    }

    #[test]
    fn parse_rejects_empty_block() {
        assert!(parse::<Fm>("---\n---\nbody", Path::new("a.md")).is_err());
    }
}
