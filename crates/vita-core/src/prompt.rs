//! Prompt assembly for the health assistant.

use crate::conversation::{HistoryWindow, PromptMessage, Turn};
use crate::error::Result;
use minijinja::{Environment, context};

/// System instruction used when no custom template is configured.
///
/// `{{ context }}` receives the retrieved document text.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "You are a dedicated health assistant tasked with providing tailored advice on nutrition, exercises, and general health. Each response should be a direct recommendation that is relevant and specific to the provided context: {{ context }}. Focus solely on delivering actionable advice without additional commentary.";

/// Static structured template: system instruction, prior turns, current input.
///
/// Rendering is a pure function of its arguments.
pub struct PromptTemplate {
    env: Environment<'static>,
    system_template: String,
    window: HistoryWindow,
}

impl PromptTemplate {
    /// Creates a template from a system instruction with a `{{ context }}` slot.
    ///
    /// # Errors
    ///
    /// Returns `VitaError::Configuration` if the instruction is not a valid
    /// template.
    pub fn new(system_template: impl Into<String>) -> Result<Self> {
        let system_template = system_template.into();
        let env = Environment::new();
        env.render_str(&system_template, context! { context => "" })?;

        Ok(Self {
            env,
            system_template,
            window: HistoryWindow::Unbounded,
        })
    }

    /// Limits how many prior turns are rendered.
    pub fn with_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> HistoryWindow {
        self.window
    }

    /// Renders only the system instruction.
    pub fn render_system(&self, retrieved: &str) -> Result<String> {
        Ok(self
            .env
            .render_str(&self.system_template, context! { context => retrieved })?)
    }

    /// Assembles the ordered message set for one model call.
    ///
    /// The system message comes first, then the windowed history in log
    /// order, then `input` as the final user message.
    pub fn render(&self, retrieved: &str, history: &[Turn], input: &str) -> Result<Vec<PromptMessage>> {
        let visible = self.window.apply(history);

        let mut messages = Vec::with_capacity(visible.len() + 2);
        messages.push(PromptMessage::system(self.render_system(retrieved)?));
        messages.extend(visible.iter().map(PromptMessage::from));
        messages.push(PromptMessage::user(input));
        Ok(messages)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            env: Environment::new(),
            system_template: DEFAULT_SYSTEM_TEMPLATE.to_string(),
            window: HistoryWindow::Unbounded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{HistoryLog, MessageRole};

    fn history(exchanges: usize) -> HistoryLog {
        let mut log = HistoryLog::new();
        for i in 0..exchanges {
            log.record_exchange(format!("question {i}"), format!("answer {i}"));
        }
        log
    }

    #[test]
    fn test_message_order() {
        let template = PromptTemplate::default();
        let log = history(2);

        let messages = template.render("oats", log.turns(), "and now?").unwrap();

        assert_eq!(messages.len(), 6);
        assert_eq!(messages[0].role, MessageRole::System);
        assert!(messages[0].content.contains("specific to the provided context: oats."));
        assert_eq!(messages[1], PromptMessage::user("question 0"));
        assert_eq!(messages[2].role, MessageRole::Assistant);
        assert_eq!(messages[4].content, "answer 1");
        assert_eq!(messages[5], PromptMessage::user("and now?"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let template = PromptTemplate::default();
        let log = history(3);

        let first = template.render("ctx", log.turns(), "input").unwrap();
        let second = template.render("ctx", log.turns(), "input").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_context_leaves_empty_slot() {
        let template = PromptTemplate::default();
        let messages = template.render("", &[], "hello").unwrap();

        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("specific to the provided context: . Focus"));
    }

    #[test]
    fn test_context_is_not_evaluated_as_template() {
        let template = PromptTemplate::default();
        let system = template.render_system("{{ 1 + 1 }}").unwrap();
        assert!(system.contains("{{ 1 + 1 }}"));
    }

    #[test]
    fn test_window_limits_rendered_history() {
        let template = PromptTemplate::default().with_window(HistoryWindow::LastTurns(2));
        let log = history(3);

        let messages = template.render("", log.turns(), "next").unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].content, "question 2");
        assert_eq!(messages[2].content, "answer 2");
    }

    #[test]
    fn test_custom_template() {
        let template = PromptTemplate::new("Context: [{{ context }}]").unwrap();
        assert_eq!(template.render_system("abc").unwrap(), "Context: [abc]");
    }

    #[test]
    fn test_invalid_template_is_configuration_error() {
        let err = PromptTemplate::new("{{ context ").err().unwrap();
        assert!(err.is_configuration());
    }
}
