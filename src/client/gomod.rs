//! `go.mod` parsing and module path helpers.

use serde::Serialize;

/// One `require` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub path: String,
    pub version: Option<String>,
}

/// Strip surrounding quotes and lowercase a module path.
pub fn normalize_module_path(path: &str) -> String {
    let trimmed = path.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed);
    unquoted.to_lowercase()
}

/// Extract the `require` directives of a `go.mod` file.
///
/// Both the single-line form and `require ( ... )` blocks are understood.
/// Comments and blank lines are ignored. Paths are normalized with
/// [`normalize_module_path`].
pub fn parse_requires(go_mod: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    let mut in_block = false;

    for raw in go_mod.lines() {
        let line = raw.split("//").next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if in_block {
            if line == ")" {
                in_block = false;
            } else if let Some(req) = requirement(line) {
                requirements.push(req);
            }
            continue;
        }

        let Some(rest) = line.strip_prefix("require") else {
            continue;
        };
        let rest = rest.trim_start();
        if rest == "(" {
            in_block = true;
        } else if rest.len() < line.len() - "require".len() {
            // Single-line form: the keyword must be followed by whitespace.
            if let Some(req) = requirement(rest) {
                requirements.push(req);
            }
        }
    }

    requirements
}

fn requirement(fields: &str) -> Option<Requirement> {
    let mut parts = fields.split_whitespace();
    let path = normalize_module_path(parts.next()?);
    if path.is_empty() {
        return None;
    }
    Some(Requirement {
        path,
        version: parts.next().map(str::to_string),
    })
}
