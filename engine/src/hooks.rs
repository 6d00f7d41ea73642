//! Stock [`HostHooks`] for documents where each slot is one form field.

use std::fmt;

use slotedit_types::{FieldMap, SlotId, SlotSpec};

use crate::capabilities::{DocumentDraft, HostHooks};
use crate::error::HookError;

type PreviewFn = Box<dyn Fn(&SlotId, &str)>;

/// Maps each slot to the server field named by [`SlotSpec::field`].
pub struct FieldMappedHooks {
    specs: Vec<SlotSpec>,
    preview: Option<PreviewFn>,
}

impl fmt::Debug for FieldMappedHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMappedHooks")
            .field("specs", &self.specs)
            .field("preview", &self.preview.is_some())
            .finish()
    }
}

impl FieldMappedHooks {
    #[must_use]
    pub fn new(specs: Vec<SlotSpec>) -> Self {
        Self {
            specs,
            preview: None,
        }
    }

    /// Called with the new text whenever a slot's content changes.
    #[must_use]
    pub fn with_preview(mut self, preview: impl Fn(&SlotId, &str) + 'static) -> Self {
        self.preview = Some(Box::new(preview));
        self
    }

    fn payload(&self, hook: &'static str, document: &DocumentDraft) -> Result<FieldMap, HookError> {
        let mut fields = FieldMap::new();
        for spec in &self.specs {
            let text = document.get(spec.id()).ok_or_else(|| {
                HookError::new(hook, format!("document has no entry for slot {}", spec.id()))
            })?;
            if fields.insert(spec.field().to_string(), text.clone()).is_some() {
                return Err(HookError::new(
                    hook,
                    format!("field {} is mapped to more than one slot", spec.field()),
                ));
            }
        }
        Ok(fields)
    }
}

impl HostHooks for FieldMappedHooks {
    fn build_payload_for_slot(
        &self,
        _slot: &SlotId,
        document: &DocumentDraft,
    ) -> Result<FieldMap, HookError> {
        self.payload("build_payload_for_slot", document)
    }

    fn build_payload_for_all(&self, document: &DocumentDraft) -> Result<FieldMap, HookError> {
        self.payload("build_payload_for_all", document)
    }

    fn slot_contents(&self, fields: &FieldMap) -> DocumentDraft {
        self.specs
            .iter()
            .filter_map(|spec| {
                fields
                    .get(spec.field())
                    .map(|text| (spec.id().clone(), text.clone()))
            })
            .collect()
    }

    fn on_content_changed(&self, slot: &SlotId, content: &str) {
        if let Some(preview) = &self.preview {
            preview(slot, content);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use slotedit_types::{FieldMap, SlotId, SlotSpec};

    use super::FieldMappedHooks;
    use crate::capabilities::{DocumentDraft, HostHooks};

    fn id(raw: &str) -> SlotId {
        SlotId::new(raw).expect("slot id")
    }

    fn hooks() -> FieldMappedHooks {
        FieldMappedHooks::new(vec![
            SlotSpec::new(id("head"), "Head", "page_head"),
            SlotSpec::new(id("tail"), "Tail", "page_tail"),
        ])
    }

    #[test]
    fn payload_maps_every_slot_to_its_field() {
        let document: DocumentDraft =
            [(id("head"), "<meta>".to_string()), (id("tail"), String::new())].into();

        let fields = hooks()
            .build_payload_for_slot(&id("head"), &document)
            .expect("payload");

        assert_eq!(fields.get("page_head").map(String::as_str), Some("<meta>"));
        assert_eq!(fields.get("page_tail").map(String::as_str), Some(""));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn payload_missing_slot_is_hook_error() {
        let document: DocumentDraft = [(id("head"), "x".to_string())].into();

        let err = hooks().build_payload_for_all(&document).expect_err("missing tail");
        assert_eq!(err.hook, "build_payload_for_all");
        assert!(err.message.contains("tail"));
    }

    #[test]
    fn payload_refuses_shared_field() {
        let hooks = FieldMappedHooks::new(vec![
            SlotSpec::new(id("head"), "Head", "page"),
            SlotSpec::new(id("tail"), "Tail", "page"),
        ]);
        let document: DocumentDraft = [
            (id("head"), "edited head".to_string()),
            (id("tail"), "tail baseline".to_string()),
        ]
        .into();

        let err = hooks
            .build_payload_for_slot(&id("head"), &document)
            .expect_err("shared field");
        assert!(err.message.contains("page"));
    }

    #[test]
    fn slot_contents_ignores_unrelated_fields() {
        let fields: FieldMap = [
            ("page_head".to_string(), "h".to_string()),
            ("title".to_string(), "t".to_string()),
        ]
        .into();

        let contents = hooks().slot_contents(&fields);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents.get(&id("head")).map(String::as_str), Some("h"));
    }

    #[test]
    fn preview_receives_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let hooks = hooks().with_preview(move |slot, text| {
            sink.borrow_mut().push(format!("{slot}={text}"));
        });

        hooks.on_content_changed(&id("tail"), "<script>");
        assert_eq!(*seen.borrow(), vec!["tail=<script>".to_string()]);
    }
}
