//! Tag-based dispatch of classified lines to extraction handlers.

use crate::{edit_log::EditLogs, subjects::SubjectRegistry, table::CategoryTable};
use chatsift_types::{ClassifiedLine, LastContext, LineEvent, SessionKey};
use std::collections::HashMap;
use tracing::warn;

/// Mutable domain state handed to a handler for the duration of one event.
///
/// Everything here is owned by the processing context and mutated only from
/// it, so handlers run strictly one at a time with no locking.
pub struct ExtractCtx<'a> {
    pub table: &'a CategoryTable,
    pub registry: &'a dyn SubjectRegistry,
    pub session: &'a SessionKey,
    pub last: &'a mut LastContext,
    pub logs: &'a mut EditLogs,
}

/// A handler bound to one or more tags.
pub trait LineHandler: Send {
    fn on_classified(&mut self, line: &ClassifiedLine, ctx: &mut ExtractCtx<'_>);

    /// A previously buffered partial line was superseded by `new`. Since
    /// pending lines are withheld from dispatch, the default treats this as
    /// a plain classification of the reassembled line; handlers that did
    /// derive state from `old` override this to retract it.
    fn on_revised(
        &mut self,
        old: &ClassifiedLine,
        new: &ClassifiedLine,
        ctx: &mut ExtractCtx<'_>,
    ) {
        let _ = old;
        self.on_classified(new, ctx);
    }
}

/// Consumer of the user-visible echo of lines; implemented by the display
/// collaborator (stdout in the bundled binary, a recording sink in tests).
pub trait DisplaySink: Send {
    fn display(&mut self, text: &str);
}

/// Maps each tag to exactly one handler. One handler instance may cover
/// several tags; binding a tag that is already bound replaces the previous
/// binding (last registration wins, so late-loaded modules can override
/// defaults, but can also trample each other, which is why re-binding is
/// logged).
#[derive(Default)]
pub struct DispatchTable {
    handlers: Vec<Box<dyn LineHandler>>,
    by_tag: HashMap<String, usize>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for the given tags.
    pub fn register(
        &mut self,
        handler: Box<dyn LineHandler>,
        tags: impl IntoIterator<Item = String>,
    ) {
        let index = self.handlers.len();
        self.handlers.push(handler);
        for tag in tags {
            if self.by_tag.insert(tag.clone(), index).is_some() {
                warn!(
                    target: "chatsift::dispatch",
                    tag,
                    "tag already bound, replacing handler (last registration wins)"
                );
            }
        }
    }

    /// Whether any handler is bound to this tag.
    pub fn is_bound(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    /// Route an event to the handler bound to its line's tag, if any.
    /// Lines without a tag, or with an unbound tag, take only the display
    /// path (handled by the pipeline).
    pub fn dispatch(&mut self, event: &LineEvent, ctx: &mut ExtractCtx<'_>) {
        let Some(tag) = event.line().tag.as_deref() else {
            return;
        };
        let Some(&index) = self.by_tag.get(tag) else {
            return;
        };
        let handler = &mut self.handlers[index];
        match event {
            LineEvent::Classified(line) => handler.on_classified(line, ctx),
            LineEvent::Revised { old, new } => handler.on_revised(old, new, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subjects::StaticRegistry;
    use std::sync::{Arc, Mutex};

    struct Recording {
        label: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl LineHandler for Recording {
        fn on_classified(&mut self, line: &ClassifiedLine, _ctx: &mut ExtractCtx<'_>) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, line.canonical));
        }
    }

    fn classified(tag: Option<&str>, text: &str) -> LineEvent {
        let mut line = ClassifiedLine::unmatched(text, text, 0);
        line.tag = tag.map(String::from);
        line.category_id = tag.map(|t| format!("cat.{t}"));
        LineEvent::Classified(line)
    }

    fn with_ctx(f: impl FnOnce(&mut DispatchTable, &mut ExtractCtx<'_>)) {
        let (table, _) = CategoryTable::compile(Vec::new());
        let registry = StaticRegistry::default();
        let session = SessionKey::local(0);
        let mut last = LastContext::default();
        let mut logs = EditLogs::default();
        let mut ctx = ExtractCtx {
            table: &table,
            registry: &registry,
            session: &session,
            last: &mut last,
            logs: &mut logs,
        };
        f(&mut DispatchTable::new(), &mut ctx);
    }

    #[test]
    fn test_routes_to_bound_tag_only() {
        with_ctx(|dispatch, ctx| {
            let seen = Arc::new(Mutex::new(Vec::new()));
            dispatch.register(
                Box::new(Recording { label: "a", seen: seen.clone() }),
                ["tag.a".to_string()],
            );

            dispatch.dispatch(&classified(Some("tag.a"), "one"), ctx);
            dispatch.dispatch(&classified(Some("tag.b"), "two"), ctx);
            dispatch.dispatch(&classified(None, "three"), ctx);

            assert_eq!(*seen.lock().unwrap(), ["a:one"]);
        });
    }

    #[test]
    fn test_one_handler_many_tags() {
        with_ctx(|dispatch, ctx| {
            let seen = Arc::new(Mutex::new(Vec::new()));
            dispatch.register(
                Box::new(Recording { label: "m", seen: seen.clone() }),
                ["tag.a".to_string(), "tag.b".to_string()],
            );

            dispatch.dispatch(&classified(Some("tag.a"), "one"), ctx);
            dispatch.dispatch(&classified(Some("tag.b"), "two"), ctx);

            assert_eq!(*seen.lock().unwrap(), ["m:one", "m:two"]);
        });
    }

    #[test]
    fn test_last_registration_wins() {
        with_ctx(|dispatch, ctx| {
            let seen = Arc::new(Mutex::new(Vec::new()));
            dispatch.register(
                Box::new(Recording { label: "first", seen: seen.clone() }),
                ["tag.a".to_string()],
            );
            dispatch.register(
                Box::new(Recording { label: "second", seen: seen.clone() }),
                ["tag.a".to_string()],
            );

            dispatch.dispatch(&classified(Some("tag.a"), "one"), ctx);
            assert_eq!(*seen.lock().unwrap(), ["second:one"]);
        });
    }

    #[test]
    fn test_revise_default_delivers_new_line() {
        with_ctx(|dispatch, ctx| {
            let seen = Arc::new(Mutex::new(Vec::new()));
            dispatch.register(
                Box::new(Recording { label: "h", seen: seen.clone() }),
                ["tag.a".to_string()],
            );

            let old = ClassifiedLine::unmatched("par", "par", 0);
            let mut new = ClassifiedLine::unmatched("partial done", "partial done", 0);
            new.tag = Some("tag.a".into());
            new.category_id = Some("cat".into());
            dispatch.dispatch(&LineEvent::Revised { old, new }, ctx);

            assert_eq!(*seen.lock().unwrap(), ["h:partial done"]);
        });
    }
}
