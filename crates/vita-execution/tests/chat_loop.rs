use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use vita_core::conversation::{DEFAULT_SESSION_ID, SessionRegistry, TurnRole};
use vita_core::{
    ChatRunner, Completer, ContextRetriever, MetadataFilter, PromptTemplate, Result, ScoredDocument,
    VectorStore, VitaError,
};
use vita_execution::{ChatLoop, LineSource, LoopExit};
use vita_interaction::{EchoCompleter, FixedEmbedder, InMemoryVectorStore, ScriptedCompleter};

const BANANA: &str = "Eat a banana and oats 30–60 minutes before training.";

/// Line source replaying scripted lines; flags when it has been dropped.
struct ScriptedInput {
    lines: VecDeque<Result<Option<String>>>,
    released: Arc<AtomicBool>,
}

impl ScriptedInput {
    fn new(lines: &[&str]) -> (Self, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        let input = Self {
            lines: lines.iter().map(|line| Ok(Some(line.to_string()))).collect(),
            released: released.clone(),
        };
        (input, released)
    }

    fn then_fail(mut self, error: VitaError) -> Self {
        self.lines.push_back(Err(error));
        self
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        assert_eq!(prompt, "You: ");
        self.lines.pop_front().unwrap_or(Ok(None))
    }
}

impl Drop for ScriptedInput {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

struct Harness {
    chat: ChatLoop,
    embedder: Arc<FixedEmbedder>,
    sessions: Arc<SessionRegistry>,
}

/// Vector store whose every search fails.
struct UnavailableStore;

#[async_trait]
impl VectorStore for UnavailableStore {
    async fn search(
        &self,
        _vector: &[f32],
        _k: usize,
        _filter: &MetadataFilter,
    ) -> Result<Vec<ScoredDocument>> {
        Err(VitaError::provider_status("pinecone", 503, "index unavailable"))
    }
}

fn harness(store: impl VectorStore + 'static, completer: Arc<dyn Completer>) -> Harness {
    let embedder = Arc::new(FixedEmbedder::new(8));
    let retriever = Arc::new(ContextRetriever::new(
        embedder.clone(),
        Arc::new(store),
        MetadataFilter::source("./client.txt"),
    ));
    let sessions = Arc::new(SessionRegistry::new());
    let runner = Arc::new(ChatRunner::new(
        completer,
        PromptTemplate::default(),
        sessions.clone(),
    ));
    Harness {
        chat: ChatLoop::new(retriever, runner),
        embedder,
        sessions,
    }
}

fn banana_store() -> InMemoryVectorStore {
    InMemoryVectorStore::new()
        .with_document(ScoredDocument::new(BANANA, 0.91).with_metadata("source", "./client.txt"))
}

#[tokio::test]
async fn test_retrieved_text_reaches_the_model_unmodified() {
    let h = harness(banana_store(), Arc::new(EchoCompleter));
    let (input, released) = ScriptedInput::new(&["What should I eat before a workout?"]);
    let mut out = Vec::new();

    let summary = h.chat.run(input, &mut out).await.unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.starts_with("Assistant: "));
    assert!(printed.contains(BANANA));
    assert_eq!(summary.exit, LoopExit::EndOfInput);
    assert_eq!(summary.turns, 1);
    assert!(released.load(Ordering::SeqCst));
    assert_eq!(h.embedder.calls(), vec!["What should I eat before a workout?".to_string()]);
}

#[tokio::test]
async fn test_empty_store_still_calls_the_model() {
    let completer = Arc::new(ScriptedCompleter::new().reply("Stay hydrated."));
    let h = harness(InMemoryVectorStore::new(), completer.clone());
    let (input, _) = ScriptedInput::new(&["Anything for recovery?"]);
    let mut out = Vec::new();

    h.chat.run(input, &mut out).await.unwrap();

    let received = completer.received();
    assert_eq!(received.len(), 1);
    assert!(received[0][0].content.contains("specific to the provided context: . Focus"));
    assert_eq!(String::from_utf8(out).unwrap(), "Assistant: Stay hydrated.\n");
}

#[tokio::test]
async fn test_provider_error_terminates_without_printing() {
    let completer = Arc::new(
        ScriptedCompleter::new()
            .reply("First answer.")
            .fail(VitaError::provider_status("chat", 500, "internal error")),
    );
    let h = harness(banana_store(), completer.clone());
    let (input, released) = ScriptedInput::new(&["first", "second", "never read"]);
    let mut out = Vec::new();

    let err = h.chat.run(input, &mut out).await.unwrap_err();

    assert_eq!(err, VitaError::provider_status("chat", 500, "internal error"));
    assert_eq!(String::from_utf8(out).unwrap(), "Assistant: First answer.\n");
    assert!(released.load(Ordering::SeqCst));
    // the failed turn left no trace in the history
    assert_eq!(h.sessions.snapshot(DEFAULT_SESSION_ID).await.len(), 2);
    assert_eq!(completer.received().len(), 2);
}

#[tokio::test]
async fn test_retrieval_error_terminates_without_calling_the_model() {
    let completer = Arc::new(ScriptedCompleter::new());
    let h = harness(UnavailableStore, completer.clone());
    let (input, released) = ScriptedInput::new(&["What should I eat before a workout?", "never read"]);
    let mut out = Vec::new();

    let err = h.chat.run(input, &mut out).await.unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(err.is_provider());
    assert!(out.is_empty());
    assert!(completer.received().is_empty());
    assert!(released.load(Ordering::SeqCst));
    assert!(h.sessions.snapshot(DEFAULT_SESSION_ID).await.is_empty());
    assert_eq!(h.embedder.calls().len(), 1);
}

#[tokio::test]
async fn test_history_grows_by_two_turns_per_answer() {
    let h = harness(banana_store(), Arc::new(ScriptedCompleter::new()));
    let (input, _) = ScriptedInput::new(&["one", "two", "three", "four"]);
    let mut out = Vec::new();

    let summary = h.chat.run(input, &mut out).await.unwrap();

    let log = h.sessions.snapshot(DEFAULT_SESSION_ID).await;
    assert_eq!(summary.turns, 4);
    assert_eq!(log.len(), 8);
    let user_texts: Vec<&str> = log
        .turns()
        .iter()
        .filter(|turn| turn.role() == TurnRole::User)
        .map(|turn| turn.text())
        .collect();
    assert_eq!(user_texts, vec!["one", "two", "three", "four"]);
    for pair in log.turns().chunks(2) {
        assert_eq!(pair[0].role(), TurnRole::User);
        assert_eq!(pair[1].role(), TurnRole::Assistant);
    }
}

#[tokio::test]
async fn test_quit_command_stops_reading() {
    let completer = Arc::new(ScriptedCompleter::new());
    let h = harness(banana_store(), completer.clone());
    let (input, released) = ScriptedInput::new(&["hello", "  Quit ", "ignored"]);
    let mut out = Vec::new();

    let summary = h.chat.run(input, &mut out).await.unwrap();

    assert_eq!(summary.exit, LoopExit::Quit);
    assert_eq!(summary.turns, 1);
    assert_eq!(completer.received().len(), 1);
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_blank_lines_are_skipped() {
    let h = harness(banana_store(), Arc::new(ScriptedCompleter::new()));
    let (input, _) = ScriptedInput::new(&["", "   ", "real question"]);
    let mut out = Vec::new();

    let summary = h.chat.run(input, &mut out).await.unwrap();

    assert_eq!(summary.turns, 1);
    assert_eq!(h.embedder.calls(), vec!["real question".to_string()]);
}

#[tokio::test]
async fn test_input_stream_error_propagates() {
    let h = harness(banana_store(), Arc::new(ScriptedCompleter::new()));
    let (input, released) = ScriptedInput::new(&["first"]);
    let input = input.then_fail(VitaError::input_stream("interrupted"));
    let mut out = Vec::new();

    let err = h.chat.run(input, &mut out).await.unwrap_err();

    assert!(err.is_input_stream());
    assert!(released.load(Ordering::SeqCst));
    assert_eq!(String::from_utf8(out).unwrap(), "Assistant: OK\n");
}

#[tokio::test]
async fn test_custom_session_and_label() {
    let h = harness(banana_store(), Arc::new(ScriptedCompleter::new().reply("Sure.")));
    assert_eq!(h.chat.session_id(), DEFAULT_SESSION_ID);
    let chat = h.chat.with_session_id("clinic-42").with_assistant_label(">>");
    assert_eq!(chat.session_id(), "clinic-42");
    let (input, _) = ScriptedInput::new(&["hi"]);
    let mut out = Vec::new();

    chat.run(input, &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), ">> Sure.\n");
    assert_eq!(h.sessions.snapshot("clinic-42").await.len(), 2);
    assert!(h.sessions.get(DEFAULT_SESSION_ID).await.is_none());
}
