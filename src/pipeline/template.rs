// src/pipeline/template.rs

//! Command templates with `{placeholder}` substitution.

/// Placeholders understood by [`CommandTemplate::render`].
pub const PLACEHOLDERS: &[&str] = &["target", "source_dir", "dist_dir", "entry"];

/// A program plus an argument list that may contain placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
}

/// Values substituted into a template.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub target: Option<&'a str>,
    pub source_dir: &'a str,
    pub dist_dir: &'a str,
    pub entry: &'a str,
}

impl CommandTemplate {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Substitute placeholders in the argument list.
    pub fn render(&self, vars: &TemplateVars<'_>) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{target}", vars.target.unwrap_or_default())
                    .replace("{source_dir}", vars.source_dir)
                    .replace("{dist_dir}", vars.dist_dir)
                    .replace("{entry}", vars.entry)
            })
            .collect()
    }

    /// All `{name}` placeholders used in the arguments, in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        self.args.iter().flat_map(|arg| placeholders_in(arg)).collect()
    }
}

fn placeholders_in(arg: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut rest = arg;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                found.push(&after[..close]);
                rest = &after[close + 1..];
            }
            None => break,
        }
    }

    found
}
