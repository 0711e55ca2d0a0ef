//! Content versions produced by the improvement pipeline.
//!
//! Each rule the backend applies to a page yields a new [`ContentVersion`].
//! Versions are kept in an append-only [`VersionHistory`]; version 0 is the
//! original page and never changes once recorded.
//!
//! [`VersionDiff`] pairs a version with its baseline and diffs the body and
//! every meta field independently.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::diff::{DiffSegment, WordDiff};
use crate::error::{PageMagicError, Result};

/// One snapshot of a page after zero or more improvement rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ContentVersion {
    /// 0 for the original page, then one per applied rule
    pub version: u32,
    /// Plain or structured text of the page
    #[serde(default)]
    pub content: String,
    /// Markdown form of the content, preferred when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_markdown: Option<String>,
    /// Page title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Meta description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    /// Other meta tags, in document order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metas: Option<IndexMap<String, String>>,
    /// Label of the rule that produced this version (absent for the original)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_processed: Option<String>,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl ContentVersion {
    /// The original page.
    pub fn original(content: impl Into<String>) -> Self {
        Self {
            version: 0,
            content: content.into(),
            content_markdown: None,
            title: None,
            meta_description: None,
            metas: None,
            rule_processed: None,
            timestamp: Utc::now(),
        }
    }

    /// A version produced by `rule`.
    pub fn derived(version: u32, rule: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            version,
            rule_processed: Some(rule.into()),
            ..Self::original(content)
        }
    }

    /// Set the markdown body.
    pub fn with_markdown(mut self, markdown: impl Into<String>) -> Self {
        self.content_markdown = Some(markdown.into());
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the meta description.
    pub fn with_meta_description(mut self, description: impl Into<String>) -> Self {
        self.meta_description = Some(description.into());
        self
    }

    /// Add one meta tag.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metas
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Body text used for diffing and rendering: markdown when present.
    pub fn body(&self) -> &str {
        self.content_markdown.as_deref().unwrap_or(&self.content)
    }

    /// Value of a field, if the version carries it.
    pub fn field(&self, key: &FieldKey) -> Option<&str> {
        match key {
            FieldKey::Title => self.title.as_deref(),
            FieldKey::MetaDescription => self.meta_description.as_deref(),
            FieldKey::Meta(name) => self
                .metas
                .as_ref()
                .and_then(|m| m.get(name))
                .map(String::as_str),
            FieldKey::Body => Some(self.body()),
        }
    }
}

/// Which version a diff compares against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselinePolicy {
    /// Always version 0: the viewer shows cumulative change from the original
    #[default]
    Original,
    /// The immediately preceding version
    Previous,
}

impl BaselinePolicy {
    /// Index of the baseline for the version at `index`.
    pub fn baseline_index(self, index: usize) -> usize {
        match self {
            BaselinePolicy::Original => 0,
            BaselinePolicy::Previous => index.saturating_sub(1),
        }
    }
}

/// Append-only list of content versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VersionHistory {
    versions: Vec<ContentVersion>,
}

impl VersionHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from versions, validating their numbering.
    pub fn from_versions(versions: impl IntoIterator<Item = ContentVersion>) -> Result<Self> {
        let mut history = Self::new();
        for version in versions {
            history.push(version)?;
        }
        Ok(history)
    }

    /// Append the next version. Its number must equal the current length.
    pub fn push(&mut self, version: ContentVersion) -> Result<()> {
        let expected = self.versions.len() as u32;
        if version.version != expected {
            return Err(PageMagicError::VersionOutOfOrder {
                expected,
                found: version.version,
            });
        }
        log::debug!(
            "Recorded version {} ({})",
            version.version,
            version.rule_processed.as_deref().unwrap_or("original")
        );
        self.versions.push(version);
        Ok(())
    }

    /// Number of versions.
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether no version has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// The version at `index`.
    pub fn get(&self, index: usize) -> Option<&ContentVersion> {
        self.versions.get(index)
    }

    /// The original page.
    pub fn original(&self) -> Result<&ContentVersion> {
        self.versions.first().ok_or(PageMagicError::EmptyHistory)
    }

    /// The newest version.
    pub fn latest(&self) -> Option<&ContentVersion> {
        self.versions.last()
    }

    /// All versions, oldest first.
    pub fn versions(&self) -> &[ContentVersion] {
        &self.versions
    }

    /// Diff the version at `index` against its baseline.
    pub fn diff(&self, index: usize, policy: BaselinePolicy) -> Result<VersionDiff> {
        let current = self.get(index).ok_or(PageMagicError::VersionNotFound(index))?;
        let baseline_index = policy.baseline_index(index);
        let baseline = self
            .get(baseline_index)
            .ok_or(PageMagicError::VersionNotFound(baseline_index))?;
        Ok(VersionDiff::compute(baseline, current))
    }
}

/// A diffable field of a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub enum FieldKey {
    /// Page title
    Title,
    /// Meta description
    MetaDescription,
    /// Named meta tag
    Meta(String),
    /// Page body
    Body,
}

impl FieldKey {
    /// Whether this is one of the auxiliary (non-body) fields.
    pub fn is_meta(&self) -> bool {
        !matches!(self, FieldKey::Body)
    }

    /// Short label for display.
    pub fn label(&self) -> String {
        match self {
            FieldKey::Title => "title".to_string(),
            FieldKey::MetaDescription => "meta description".to_string(),
            FieldKey::Meta(name) => format!("meta {}", name),
            FieldKey::Body => "content".to_string(),
        }
    }
}

/// Segments for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    /// The field diffed
    pub field: FieldKey,
    /// Segments in document order
    pub segments: Vec<DiffSegment>,
}

/// Every field of a version diffed against its baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    /// Baseline version number
    pub baseline_version: u32,
    /// Current version number
    pub version: u32,
    /// Rule that produced the current version
    pub rule_processed: Option<String>,
    /// Meta field diffs: title, meta description, then metas
    pub meta: Vec<FieldDiff>,
    /// Body diff
    pub body: FieldDiff,
}

impl VersionDiff {
    /// Diff `current` against `baseline`, field by field.
    ///
    /// Fields absent on both sides are skipped. A field only on the baseline
    /// side diffs as fully removed.
    pub fn compute(baseline: &ContentVersion, current: &ContentVersion) -> Self {
        let engine = WordDiff::new();

        let mut keys = vec![FieldKey::Title, FieldKey::MetaDescription];
        let mut meta_names: Vec<&String> = Vec::new();
        for metas in [current.metas.as_ref(), baseline.metas.as_ref()]
            .into_iter()
            .flatten()
        {
            for name in metas.keys() {
                if !meta_names.contains(&name) {
                    meta_names.push(name);
                }
            }
        }
        keys.extend(meta_names.into_iter().map(|n| FieldKey::Meta(n.clone())));

        let meta = keys
            .into_iter()
            .filter_map(|field| {
                let before = baseline.field(&field);
                let after = current.field(&field);
                if before.is_none() && after.is_none() {
                    return None;
                }
                let segments = engine.diff(before.unwrap_or(""), after.unwrap_or(""));
                Some(FieldDiff { field, segments })
            })
            .collect();

        let body = FieldDiff {
            field: FieldKey::Body,
            segments: engine.diff(baseline.body(), current.body()),
        };

        Self {
            baseline_version: baseline.version,
            version: current.version,
            rule_processed: current.rule_processed.clone(),
            meta,
            body,
        }
    }

    /// Meta fields followed by the body, in animation order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDiff> {
        self.meta.iter().chain(std::iter::once(&self.body))
    }
}
