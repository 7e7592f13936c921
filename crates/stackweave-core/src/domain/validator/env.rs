//! Environment variable references and env-template entries.

/// One `${NAME}` / `${NAME:-default}` / `${NAME-default}` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvRef {
    pub name: String,
    pub default: Option<String>,
}

/// One `NAME=value` line of an env template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvEntry {
    pub name: String,
    pub value: String,
    pub line: usize,
}

/// Find every braced variable reference in `text`.
///
/// `$$` is the compose escape for a literal dollar and is skipped, along
/// with whatever follows it.
pub fn references(text: &str) -> Vec<EnvRef> {
    let bytes = text.as_bytes();
    let mut refs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        match bytes.get(i + 1) {
            Some(b'$') => {
                i += 2;
                continue;
            }
            Some(b'{') => {}
            _ => {
                i += 1;
                continue;
            }
        }

        let inner_start = i + 2;
        let Some(close) = text[inner_start..].find('}') else {
            break;
        };
        let inner = &text[inner_start..inner_start + close];
        i = inner_start + close + 1;

        let name_len = inner
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(inner.len());
        let name = &inner[..name_len];
        if !is_env_name(name) {
            continue;
        }

        let rest = &inner[name_len..];
        let default = rest
            .strip_prefix(":-")
            .or_else(|| rest.strip_prefix('-'))
            .map(str::to_string);
        refs.push(EnvRef {
            name: name.to_string(),
            default,
        });
    }
    refs
}

/// Parse an env template into its entries, in file order.
///
/// Each line is read with `dotenvy`, so comments, `export ` prefixes, quoting
/// and inline `# comments` follow the same rules the app's `.env` loader
/// applies. Lines `dotenvy` rejects are skipped.
pub fn entries(text: &str) -> Vec<EnvEntry> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let (name, value) = dotenvy::from_read_iter(line.as_bytes()).next()?.ok()?;
            is_env_name(&name).then(|| EnvEntry {
                name,
                value,
                line: idx + 1,
            })
        })
        .collect()
}

/// Names a build descriptor defines for itself with `ARG` or `ENV`.
pub fn build_local_names(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in text.lines() {
        let mut words = line.split_whitespace();
        let Some(instruction) = words.next() else {
            continue;
        };
        if !(instruction.eq_ignore_ascii_case("ARG") || instruction.eq_ignore_ascii_case("ENV")) {
            continue;
        }
        for word in words {
            let name = word.split(['=', ' ']).next().unwrap_or_default();
            if is_env_name(name) {
                names.push(name.to_string());
            }
            // `ENV KEY value` form: only the first word is a name
            if !word.contains('=') {
                break;
            }
        }
    }
    names
}

fn is_env_name(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
