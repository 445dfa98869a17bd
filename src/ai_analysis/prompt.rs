use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::AnalysisError;

/// A named instruction template plus the JSON response schema the model is
/// asked to follow. Placeholders are written `{{fieldName}}` and filled from
/// the serialized input object.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub name: &'static str,
    pub template: &'static str,
    pub response_schema: Value,
}

impl PromptConfig {
    /// Single pass over the template, so placeholder-like text inside an
    /// interpolated value is never expanded again.
    pub fn render(&self, input: &Value) -> String {
        let mut rendered = String::with_capacity(self.template.len());
        let mut rest = self.template;

        while let Some(start) = rest.find("{{") {
            rendered.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                rendered.push_str(&rest[start..]);
                return rendered;
            };

            let key = after_open[..end].trim();
            match input.get(key) {
                Some(Value::String(text)) => rendered.push_str(text),
                Some(other) => rendered.push_str(&other.to_string()),
                None => rendered.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after_open[end + 2..];
        }

        rendered.push_str(rest);
        rendered
    }
}

/// The language-model primitive behind every analysis. `Ok(None)` means the
/// model answered without any structured output.
#[async_trait]
pub trait LlmCapability: Send + Sync {
    async fn invoke(
        &self,
        prompt: &PromptConfig,
        input: &Value,
    ) -> Result<Option<Value>, anyhow::Error>;
}

/// Schema-in, schema-out analysis: serialize `I`, call the capability with
/// the configured prompt and decode the answer as `O`.
pub struct PromptAnalysis<I, O> {
    config: PromptConfig,
    _shape: PhantomData<fn(&I) -> O>,
}

impl<I, O> PromptAnalysis<I, O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    pub fn new(config: PromptConfig) -> Self {
        Self {
            config,
            _shape: PhantomData,
        }
    }

    #[cfg(test)]
    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    pub async fn run(&self, llm: &dyn LlmCapability, input: &I) -> Result<O, AnalysisError> {
        let name = self.config.name;
        let input = serde_json::to_value(input).map_err(|error| {
            AnalysisError::Upstream(anyhow::anyhow!("Failed to encode {} input: {}", name, error))
        })?;

        let output = llm
            .invoke(&self.config, &input)
            .await
            .map_err(AnalysisError::Upstream)?
            .ok_or(AnalysisError::EmptyOutput(name))?;

        serde_json::from_value(output).map_err(|error| AnalysisError::MalformedOutput {
            prompt: name,
            message: error.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai_analysis::stub::StubCapability;
    use serde::Deserialize;
    use serde_json::json;

    fn echo_config() -> PromptConfig {
        PromptConfig {
            name: "echo",
            template: "Title: {{title}}\nBody: {{ body }}\nMissing: {{nothing}}",
            response_schema: json!({ "type": "OBJECT" }),
        }
    }

    #[derive(Serialize)]
    struct EchoInput {
        title: String,
        body: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct EchoOutput {
        answer: String,
    }

    #[test]
    fn render_fills_known_placeholders_once() {
        let rendered = echo_config().render(&json!({
            "title": "A {{body}} trap",
            "body": "text",
        }));
        assert_eq!(
            rendered,
            "Title: A {{body}} trap\nBody: text\nMissing: {{nothing}}"
        );
    }

    #[test]
    fn render_keeps_unterminated_braces() {
        let config = PromptConfig {
            template: "Start {{title",
            ..echo_config()
        };
        assert_eq!(config.render(&json!({ "title": "x" })), "Start {{title");
    }

    #[tokio::test]
    async fn run_decodes_structured_output() {
        let stub = StubCapability::default().respond("echo", json!({ "answer": "ok" }));
        let analysis: PromptAnalysis<EchoInput, EchoOutput> = PromptAnalysis::new(echo_config());
        let input = EchoInput {
            title: "t".to_string(),
            body: "b".to_string(),
        };

        let output = analysis.run(&stub, &input).await.unwrap();
        assert_eq!(
            output,
            EchoOutput {
                answer: "ok".to_string()
            }
        );
        assert_eq!(stub.calls_for("echo"), 1);
        assert_eq!(stub.last_input("echo"), Some(json!({ "title": "t", "body": "b" })));
    }

    #[tokio::test]
    async fn missing_output_is_a_fault_not_a_default() {
        let stub = StubCapability::default().respond_empty("echo");
        let analysis: PromptAnalysis<EchoInput, EchoOutput> = PromptAnalysis::new(echo_config());
        let input = EchoInput {
            title: String::new(),
            body: String::new(),
        };

        let error = analysis.run(&stub, &input).await.unwrap_err();
        assert!(matches!(error, AnalysisError::EmptyOutput("echo")));
    }

    #[tokio::test]
    async fn output_of_the_wrong_shape_is_rejected() {
        let stub = StubCapability::default().respond("echo", json!({ "unexpected": true }));
        let analysis: PromptAnalysis<EchoInput, EchoOutput> = PromptAnalysis::new(echo_config());
        let input = EchoInput {
            title: String::new(),
            body: String::new(),
        };

        let error = analysis.run(&stub, &input).await.unwrap_err();
        assert!(matches!(error, AnalysisError::MalformedOutput { prompt: "echo", .. }));
    }
}
