//! Per-kind audit summaries.
//!
//! Only kinds present in the [`TemplateRegistry`] are audited. Templates use
//! two placeholders: `{kind}` (the kind's human label) and `{name}` (the
//! entity's display name).

use std::collections::BTreeMap;

use warden_core::normalize_slug;

use crate::event::MutationAction;

/// Summary templates for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindTemplates {
    /// Human label substituted for `{kind}`.
    pub label: String,
    /// Template for creates.
    pub create: String,
    /// Template for updates.
    pub update: String,
    /// Template for deletes.
    pub delete: String,
}

impl KindTemplates {
    /// The standard phrasing with `label` as the kind:
    /// `New {kind} "{name}" created`, `Updated {kind} "{name}"`,
    /// `Deleted {kind} "{name}"`.
    pub fn standard(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            create: r#"New {kind} "{name}" created"#.to_string(),
            update: r#"Updated {kind} "{name}""#.to_string(),
            delete: r#"Deleted {kind} "{name}""#.to_string(),
        }
    }

    /// Render the template for `action` with `name`.
    pub fn render(&self, action: MutationAction, name: &str) -> String {
        let template = match action {
            MutationAction::Created => &self.create,
            MutationAction::Updated => &self.update,
            MutationAction::Deleted => &self.delete,
        };
        template
            .replace("{kind}", &self.label)
            .replace("{name}", name)
    }
}

/// Entity kind tag to [`KindTemplates`].
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    kinds: BTreeMap<String, KindTemplates>,
}

impl TemplateRegistry {
    /// Registry with nothing audited.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry covering the application's audited kinds.
    pub fn with_defaults() -> Self {
        Self::new()
            .with("user", KindTemplates::standard("user"))
            .with("role", KindTemplates::standard("role"))
            .with(
                "compliance_requirement",
                KindTemplates::standard("compliance framework"),
            )
            .with("audit", KindTemplates::standard("audit"))
            .with("audit_item", KindTemplates::standard("audit item"))
            .with("location", KindTemplates::standard("location"))
            .with("document", KindTemplates::standard("document"))
    }

    /// Builder form of [`TemplateRegistry::register`].
    pub fn with(mut self, kind: &str, templates: KindTemplates) -> Self {
        self.register(kind, templates);
        self
    }

    /// Audit `kind` with `templates`, replacing any previous entry.
    pub fn register(&mut self, kind: &str, templates: KindTemplates) {
        self.kinds.insert(normalize_slug(kind), templates);
    }

    /// Stop auditing `kind`.
    pub fn unregister(&mut self, kind: &str) -> Option<KindTemplates> {
        self.kinds.remove(&normalize_slug(kind))
    }

    /// Templates for `kind`, if it is audited.
    pub fn get(&self, kind: &str) -> Option<&KindTemplates> {
        self.kinds.get(&normalize_slug(kind))
    }

    /// Whether `kind` is audited.
    pub fn is_audited(&self, kind: &str) -> bool {
        self.get(kind).is_some()
    }

    /// Audited kinds, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Summary for `(kind, action)`, or `None` for unaudited kinds.
    pub fn render(&self, kind: &str, action: MutationAction, name: &str) -> Option<String> {
        self.get(kind).map(|t| t.render(action, name))
    }
}
