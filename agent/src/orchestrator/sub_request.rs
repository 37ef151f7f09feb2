// One leaf of a fan-out: label, template and parser
use std::sync::Arc;

use crate::parsers::OutputParser;
use crate::prompt::PromptTemplate;

#[derive(Clone)]
pub struct SubRequest {
    pub label: String,
    pub template: PromptTemplate,
    pub parser: Arc<dyn OutputParser>,
}

impl SubRequest {
    pub fn new(label: impl Into<String>, template: PromptTemplate, parser: impl OutputParser + 'static) -> Self {
        Self {
            label: label.into(),
            template,
            parser: Arc::new(parser),
        }
    }
}

impl std::fmt::Debug for SubRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubRequest")
            .field("label", &self.label)
            .field("input_variables", &self.template.input_variables())
            .finish()
    }
}
