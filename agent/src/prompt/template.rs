// Prompt template implementation
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use thiserror::Error;

// `{{` and `}}` are escapes, `{name}` is a placeholder. Anything else stays literal.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern compiles")
});

#[derive(Debug, Error, PartialEq)]
pub enum PromptError {
    #[error("template placeholders are neither inputs nor partials: {}", .0.join(", "))]
    UnresolvedPlaceholders(Vec<String>),
    #[error("missing value for input variable '{0}'")]
    MissingVariable(String),
}

/// A string template with named placeholders.
///
/// Every placeholder must be listed as an input variable or bound as a
/// partial variable; this is checked once at construction.
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    template: String,
    input_variables: Vec<String>,
    partial_variables: HashMap<String, String>,
}

impl PromptTemplate {
    pub fn new(
        template: impl Into<String>,
        input_variables: Vec<String>,
        partial_variables: HashMap<String, String>,
    ) -> Result<Self, PromptError> {
        let prompt = Self {
            template: template.into(),
            input_variables,
            partial_variables,
        };
        prompt.validate()?;
        Ok(prompt)
    }

    /// Build a template whose input variables are all of its placeholders
    pub fn from_template(template: impl Into<String>) -> Self {
        let template = template.into();
        let input_variables = scan_placeholders(&template).into_iter().collect();
        Self {
            template,
            input_variables,
            partial_variables: HashMap::new(),
        }
    }

    /// Bind an additional partial variable
    pub fn partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partial_variables.insert(name.into(), value.into());
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn input_variables(&self) -> &[String] {
        &self.input_variables
    }

    pub fn partial_variables(&self) -> &HashMap<String, String> {
        &self.partial_variables
    }

    /// Distinct placeholder names, sorted
    pub fn placeholders(&self) -> BTreeSet<String> {
        scan_placeholders(&self.template)
    }

    fn validate(&self) -> Result<(), PromptError> {
        let unresolved: Vec<String> = self
            .placeholders()
            .into_iter()
            .filter(|name| !self.input_variables.contains(name) && !self.partial_variables.contains_key(name))
            .collect();
        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(PromptError::UnresolvedPlaceholders(unresolved))
        }
    }

    fn resolve<'a>(&'a self, name: &str, inputs: &'a HashMap<String, String>) -> Result<&'a str, PromptError> {
        if self.input_variables.iter().any(|v| v == name) {
            if let Some(value) = inputs.get(name) {
                return Ok(value);
            }
        }
        self.partial_variables
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| PromptError::MissingVariable(name.to_string()))
    }

    /// Render the template. Extra keys in `inputs` are ignored.
    pub fn format(&self, inputs: &HashMap<String, String>) -> Result<String, PromptError> {
        let mut rendered = String::with_capacity(self.template.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(&self.template) {
            let whole = caps.get(0).expect("group 0 always matches");
            rendered.push_str(&self.template[last..whole.start()]);
            match caps.get(1) {
                Some(name) => rendered.push_str(self.resolve(name.as_str(), inputs)?),
                None => rendered.push_str(&whole.as_str()[..1]),
            }
            last = whole.end();
        }
        rendered.push_str(&self.template[last..]);
        Ok(rendered)
    }

    /// Render from a JSON record, see [`stringify_context`]
    pub fn format_value(&self, context: &Map<String, Value>) -> Result<String, PromptError> {
        self.format(&stringify_context(context))
    }
}

/// Flatten a JSON record into template inputs.
///
/// Strings are inserted verbatim, every other value as compact JSON.
pub fn stringify_context(context: &Map<String, Value>) -> HashMap<String, String> {
    context
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect()
}

fn scan_placeholders(template: &str) -> BTreeSet<String> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
