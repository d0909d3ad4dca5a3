//! The pipeline context object and its ingestion queue.
//!
//! A [`Pipeline`] owns every piece of mutable domain state: the compiled
//! category table, the classifier, the dispatch table, the exclusion
//! filter, the last-known context and the per-session edit logs. The
//! ingestion side only ever touches the queue, through cloneable
//! [`LineSender`] handles; all classification, dispatch and extraction runs
//! on whichever single context calls [`Pipeline::drain`], so the domain
//! state is single-writer by construction and needs no locking.

use crate::{
    classifier::LineClassifier,
    dispatch::{DispatchTable, DisplaySink, ExtractCtx, LineHandler},
    edit_log::{EditLog, EditLogs},
    error::{Result, SiftError},
    exclusion::ExclusionFilter,
    extract::{EditExtractor, ExtractionRules},
    subjects::SubjectRegistry,
    table::CategoryTable,
};
use chatsift_types::{EditRecord, LastContext, LineEvent, SessionKey};
use std::collections::HashSet;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::TryRecvError};
use tracing::trace;

/// Handle for the ingestion context. Cloneable; enqueueing never blocks and
/// never touches domain state. The queue is unbounded: sustained ingestion
/// outpacing processing grows it without backpressure, an accepted and
/// documented resource risk.
#[derive(Clone)]
pub struct LineSender {
    tx: UnboundedSender<String>,
}

impl LineSender {
    pub fn send(&self, line: impl Into<String>) -> Result<()> {
        self.tx
            .send(line.into())
            .map_err(|_| SiftError::ChannelClosed)
    }
}

pub struct Pipeline {
    table: CategoryTable,
    classifier: LineClassifier,
    dispatch: DispatchTable,
    exclusion: ExclusionFilter,
    registry: Box<dyn SubjectRegistry>,
    display: Box<dyn DisplaySink>,
    last: LastContext,
    logs: EditLogs,
    session: SessionKey,
    tx: UnboundedSender<String>,
    rx: UnboundedReceiver<String>,
}

impl Pipeline {
    pub fn new(
        table: CategoryTable,
        registry: Box<dyn SubjectRegistry>,
        display: Box<dyn DisplaySink>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            table,
            classifier: LineClassifier::new(),
            dispatch: DispatchTable::new(),
            exclusion: ExclusionFilter::default(),
            registry,
            display,
            last: LastContext::default(),
            logs: EditLogs::new(),
            session: SessionKey::local(0),
            tx,
            rx,
        }
    }

    /// A new ingestion handle.
    pub fn sender(&self) -> LineSender {
        LineSender {
            tx: self.tx.clone(),
        }
    }

    /// Register a handler for explicit tags.
    pub fn register(&mut self, handler: Box<dyn LineHandler>, tags: impl IntoIterator<Item = String>) {
        self.dispatch.register(handler, tags);
    }

    /// Register the edit extraction module for every tag its rules cover.
    pub fn register_edit_extractor(&mut self, rules: ExtractionRules) {
        let extractor = EditExtractor::new(rules);
        let tags = extractor.interests(&self.table);
        self.dispatch.register(Box::new(extractor), tags);
    }

    /// Seed the exclusion set (typically from persisted state).
    pub fn set_excluded_tags(&mut self, tags: HashSet<String>) {
        self.exclusion = ExclusionFilter::new(tags);
    }

    pub fn set_excluded(&mut self, tag: &str, excluded: bool) -> bool {
        self.exclusion.set_excluded(tag, excluded)
    }

    pub fn is_excluded(&self, tag: &str) -> bool {
        self.exclusion.is_excluded(tag)
    }

    pub fn excluded_tags(&self) -> &HashSet<String> {
        self.exclusion.tags()
    }

    /// Switch the active session. Edit logs for previous sessions are
    /// retained for the process lifetime.
    pub fn set_session(&mut self, session: SessionKey) {
        self.session = session;
    }

    pub fn session(&self) -> &SessionKey {
        &self.session
    }

    pub fn last_context(&self) -> &LastContext {
        &self.last
    }

    /// The active session's edit log, if it has been created.
    pub fn edit_log(&self) -> Option<&EditLog> {
        self.logs.log(&self.session)
    }

    /// Oldest matching record in the active session's log.
    pub fn find_first(&self, x: i32, y: i32, z: i32, actor: Option<&str>) -> Option<&EditRecord> {
        self.edit_log().and_then(|log| log.find_first(x, y, z, actor))
    }

    /// Empty the active session's log only.
    pub fn clear_session_log(&mut self) {
        self.logs.log_mut(&self.session).clear();
    }

    /// Drain the ingestion queue completely, in arrival order, feeding each
    /// line through classify, dispatch and extract synchronously. Nothing a
    /// handler does can abort the drain; extraction failures are contained
    /// inside the extractor, so forward progress is guaranteed. Returns the
    /// number of lines processed.
    pub fn drain(&mut self) -> usize {
        let mut processed = 0;
        loop {
            match self.rx.try_recv() {
                Ok(line) => {
                    self.process_line(&line);
                    processed += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if processed > 0 {
            trace!(target: "chatsift::ingest", processed, "drained queue");
        }
        processed
    }

    /// Feed one line through the pipeline immediately, bypassing the queue.
    /// Must only be called from the processing context.
    pub fn process_line(&mut self, raw: &str) {
        for event in self.classifier.classify(&self.table, raw) {
            self.handle_event(&event);
        }
    }

    /// Resolve a pending split-line continuation that never completed, so a
    /// buffered fragment cannot be withheld forever.
    pub fn flush_pending(&mut self) {
        if let Some(event) = self.classifier.flush(&self.table) {
            self.handle_event(&event);
        }
    }

    /// Whether a split-line continuation is currently buffered.
    pub fn has_pending(&self) -> bool {
        self.classifier.has_pending()
    }

    fn handle_event(&mut self, event: &LineEvent) {
        let mut ctx = ExtractCtx {
            table: &self.table,
            registry: self.registry.as_ref(),
            session: &self.session,
            last: &mut self.last,
            logs: &mut self.logs,
        };
        self.dispatch.dispatch(event, &mut ctx);

        // Display path: exclusion suppresses user-visible echo only, never
        // extraction. Unmatched lines always reach display.
        let line = event.line();
        let excluded = line
            .tag
            .as_deref()
            .is_some_and(|tag| self.exclusion.is_excluded(tag));
        if !excluded {
            self.display.display(&line.raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subjects::StaticRegistry;
    use chatsift_types::Category;
    use std::sync::{Arc, Mutex};

    struct CollectSink(Arc<Mutex<Vec<String>>>);

    impl DisplaySink for CollectSink {
        fn display(&mut self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    fn pipeline() -> (Pipeline, Arc<Mutex<Vec<String>>>) {
        let (table, errors) = CategoryTable::compile(vec![
            Category::new("greeting", "chat.greeting", r"hello .*"),
            Category::new("noise", "chat.noise", r"\*{3}.*"),
        ]);
        assert!(errors.is_empty());
        let shown = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(
            table,
            Box::new(StaticRegistry::default()),
            Box::new(CollectSink(shown.clone())),
        );
        (pipeline, shown)
    }

    #[test]
    fn test_drain_processes_in_arrival_order() {
        let (mut pipeline, shown) = pipeline();
        let sender = pipeline.sender();
        sender.send("hello one").unwrap();
        sender.send("hello two").unwrap();
        sender.send("unmatched").unwrap();

        assert_eq!(pipeline.drain(), 3);
        assert_eq!(*shown.lock().unwrap(), ["hello one", "hello two", "unmatched"]);
        assert_eq!(pipeline.drain(), 0);
    }

    #[test]
    fn test_exclusion_suppresses_display_only() {
        let (mut pipeline, shown) = pipeline();
        pipeline.set_excluded("chat.noise", true);
        let sender = pipeline.sender();
        sender.send("*** server restart").unwrap();
        sender.send("hello world").unwrap();

        pipeline.drain();
        assert_eq!(*shown.lock().unwrap(), ["hello world"]);
    }

    #[test]
    fn test_cloned_senders_share_the_queue() {
        let (mut pipeline, shown) = pipeline();
        let a = pipeline.sender();
        let b = a.clone();
        a.send("hello a1").unwrap();
        b.send("hello b1").unwrap();
        b.send("hello b2").unwrap();
        a.send("hello a2").unwrap();

        // One queue: the drain preserves the interleaved send order, not
        // per-sender grouping.
        assert_eq!(pipeline.drain(), 4);
        assert_eq!(
            *shown.lock().unwrap(),
            ["hello a1", "hello b1", "hello b2", "hello a2"]
        );
    }

    #[test]
    fn test_session_log_isolation() {
        let (mut pipeline, _) = pipeline();
        pipeline.set_session(SessionKey::new("a", 0));
        pipeline.clear_session_log();
        assert!(pipeline.edit_log().is_some());
        pipeline.set_session(SessionKey::new("b", 0));
        assert!(pipeline.edit_log().is_none(), "logs are lazily created per session");
    }
}
