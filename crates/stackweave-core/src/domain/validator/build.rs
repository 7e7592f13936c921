//! Build descriptor inspection and ignore-list matching.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Build-context paths the build descriptor copies in, normalized.
///
/// Sources of `COPY --from=...` come from another stage, not the context, and
/// are skipped. `.` (the whole context) is skipped as well.
pub fn copy_sources(text: &str) -> Vec<String> {
    let mut sources = Vec::new();
    for line in text.lines() {
        let mut words = line.split_whitespace();
        let Some(instruction) = words.next() else {
            continue;
        };
        if !(instruction.eq_ignore_ascii_case("COPY") || instruction.eq_ignore_ascii_case("ADD")) {
            continue;
        }

        let args: Vec<&str> = words.collect();
        if args.iter().any(|a| a.starts_with("--from=")) {
            continue;
        }
        let operands: Vec<&str> = args
            .into_iter()
            .filter(|a| !a.starts_with("--"))
            .collect();
        if operands.len() < 2 {
            continue;
        }

        for source in &operands[..operands.len() - 1] {
            let normalized = normalize(source);
            if !normalized.is_empty() {
                sources.push(normalized.to_string());
            }
        }
    }
    sources
}

/// Exposed container ports declared with `EXPOSE`.
pub fn exposed_ports(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let mut words = line.split_whitespace();
            let instruction = words.next()?;
            instruction
                .eq_ignore_ascii_case("EXPOSE")
                .then(|| words.map(|p| p.split('/').next().unwrap_or(p).to_string()))
        })
        .flatten()
        .collect()
}

/// Compiled `.dockerignore` rules.
///
/// `*` and `?` stay within one path segment; `**` crosses segments.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    patterns: Vec<String>,
    negated: Vec<bool>,
    set: GlobSet,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            negated: Vec::new(),
            set: GlobSet::empty(),
        }
    }
}

impl IgnoreRules {
    /// Compile ignore-list text. Lines that are not valid globs are skipped.
    pub fn parse(text: &str) -> Self {
        let mut rules = Self::default();
        let mut builder = GlobSetBuilder::new();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (pattern, negated) = match line.strip_prefix('!') {
                Some(rest) => (normalize(rest), true),
                None => (normalize(line), false),
            };
            if pattern.is_empty() {
                continue;
            }
            let Ok(glob) = GlobBuilder::new(pattern).literal_separator(true).build() else {
                continue;
            };
            builder.add(glob);
            rules.patterns.push(pattern.to_string());
            rules.negated.push(negated);
        }

        match builder.build() {
            Ok(set) => rules.set = set,
            Err(_) => {
                rules.patterns.clear();
                rules.negated.clear();
            }
        }
        rules
    }

    /// The pattern that excludes `path` from the build context, if any.
    ///
    /// Last matching rule wins; a rule matching a parent directory excludes
    /// everything below it.
    pub fn excluding_pattern(&self, path: &str) -> Option<&str> {
        let path = normalize(path);
        let parents = path
            .char_indices()
            .filter(|(_, c)| *c == '/')
            .map(|(idx, _)| &path[..idx]);

        let last = std::iter::once(path)
            .chain(parents)
            .flat_map(|candidate| self.set.matches(candidate))
            .max()?;
        (!self.negated[last]).then(|| self.patterns[last].as_str())
    }
}

fn normalize(path: &str) -> &str {
    let mut p = path.trim();
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p = p.trim_start_matches('/').trim_end_matches('/');
    if p == "." { "" } else { p }
}
