//! Structured log events emitted by tree edits and drag gestures.

use std::sync::{Arc, Mutex};

use pagecraft_core::{CancelReason, DragEvent, DragSource, DropTarget, NodeKind};
use pagecraft_tree::Editor;
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Default)]
struct TraceState {
    messages: Vec<String>,
    kind_rejected_levels: Vec<tracing::Level>,
    load_hash_recorded: bool,
}

impl TraceState {
    fn count(&self, message: &str) -> usize {
        self.messages.iter().filter(|m| m.as_str() == message).count()
    }
}

struct TraceCapture {
    state: Arc<Mutex<TraceState>>,
}

impl<S> Layer<S> for TraceCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        struct MessageVisitor {
            message: Option<String>,
            saw_hash: bool,
        }
        impl tracing::field::Visit for MessageVisitor {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = Some(value.to_owned());
                }
            }

            fn record_u64(&mut self, field: &tracing::field::Field, _value: u64) {
                if field.name() == "hash" {
                    self.saw_hash = true;
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = Some(format!("{value:?}").trim_matches('"').to_owned());
                }
            }
        }

        let mut visitor = MessageVisitor {
            message: None,
            saw_hash: false,
        };
        event.record(&mut visitor);
        let Some(message) = visitor.message else {
            return;
        };
        let mut state = self.state.lock().expect("trace state lock");
        if message == "tree.kind_rejected" {
            state.kind_rejected_levels.push(*event.metadata().level());
        }
        if message == "tree.load" && visitor.saw_hash {
            state.load_hash_recorded = true;
        }
        state.messages.push(message);
    }
}

fn capture<F: FnOnce()>(body: F) -> Arc<Mutex<TraceState>> {
    let state = Arc::new(Mutex::new(TraceState::default()));
    let subscriber = tracing_subscriber::registry().with(TraceCapture {
        state: Arc::clone(&state),
    });
    let _guard = tracing::subscriber::set_default(subscriber);
    tracing::callsite::rebuild_interest_cache();
    body();
    tracing::callsite::rebuild_interest_cache();
    state
}

#[test]
fn tree_edits_emit_named_events() {
    let state = capture(|| {
        let mut editor = Editor::default();
        let row = editor.append_from_palette(NodeKind::Row).expect("row");
        let column = editor
            .add_from_palette(NodeKind::Column, row.into(), 0)
            .expect("column");
        let field = editor
            .append_from_palette(NodeKind::TextField)
            .expect("field");
        editor.move_node(field, column.into(), 0).expect("move");
        let _ = editor
            .update_attributes(field, pagecraft_core::Attributes::new().with("label", "Email"))
            .expect("patch");
        let _ = editor.remove_node(row).expect("remove");
        assert!(editor.move_node(row, column.into(), 0).is_err());
    });

    let state = state.lock().expect("trace state lock");
    assert_eq!(state.count("tree.add"), 3);
    assert_eq!(state.count("tree.move"), 1);
    assert_eq!(state.count("tree.update_attributes"), 1);
    assert_eq!(state.count("tree.remove"), 1);
}

#[test]
fn rejected_drops_log_below_warn() {
    let state = capture(|| {
        let mut editor = Editor::default();
        let row = editor.append_from_palette(NodeKind::Row).expect("row");
        let field = editor
            .append_from_palette(NodeKind::TextField)
            .expect("field");
        assert!(editor.move_node(field, row.into(), 0).is_err());

        let source = DragSource::node(field);
        let _ = editor
            .handle_drag_event(&DragEvent::Start { active: source })
            .expect("start");
        let _ = editor
            .handle_drag_event(&DragEvent::End {
                active: source,
                over: Some(DropTarget::node(row)),
                fraction: 0.5,
            })
            .expect("end");
    });

    let state = state.lock().expect("trace state lock");
    assert!(!state.kind_rejected_levels.is_empty());
    assert!(
        state
            .kind_rejected_levels
            .iter()
            .all(|level| *level == tracing::Level::TRACE)
    );
    assert_eq!(state.count("drag.kind_rejected"), 1);
    assert_eq!(state.count("drag.commit_failed"), 0);
}

#[test]
fn drag_lifecycle_emits_transitions() {
    let state = capture(|| {
        let mut editor = Editor::default();
        let source = DragSource::palette(NodeKind::Container);
        let _ = editor
            .handle_drag_event(&DragEvent::Start { active: source })
            .expect("start");
        let _ = editor
            .handle_drag_event(&DragEvent::Over {
                active: source,
                over: Some(DropTarget::Canvas),
                fraction: 0.5,
            })
            .expect("over");
        let _ = editor
            .handle_drag_event(&DragEvent::End {
                active: source,
                over: Some(DropTarget::Canvas),
                fraction: 0.5,
            })
            .expect("end");

        let _ = editor
            .handle_drag_event(&DragEvent::Start { active: source })
            .expect("restart");
        let _ = editor
            .handle_drag_event(&DragEvent::Cancel {
                active: source,
                reason: CancelReason::EscapeKey,
            })
            .expect("cancel");
    });

    let state = state.lock().expect("trace state lock");
    assert_eq!(state.count("drag.committed"), 1);
    assert_eq!(state.count("drag.hovered"), 1);
    // Two starts and one cancel.
    assert_eq!(state.count("drag.transition"), 3);
}

#[test]
fn snapshot_load_logs_state_hash() {
    let state = capture(|| {
        let mut source = Editor::default();
        let _ = source.append_from_palette(NodeKind::Column).expect("column");
        let mut editor = Editor::default();
        editor.load_snapshot(source.snapshot()).expect("load");
    });

    let state = state.lock().expect("trace state lock");
    assert_eq!(state.count("tree.load"), 1);
    assert!(state.load_hash_recorded);
}
