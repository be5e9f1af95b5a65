//! Tiered template resolution
//!
//! ```text
//! <platform>/<doc_type>/<tech_stack>   tech-specific
//! <platform>/<doc_type>/generic        platform-generic
//! custom/defaults/<doc_type>           custom-default
//! builtin/<doc_type | ticket>          built-in (always present)
//! ```

use crate::builtin::{builtin_location, builtin_source, load_builtin};
use crate::definition::TemplateDefinition;
use crate::error::TemplateResult;
use crate::renderer::Program;
use crate::source::TemplateSource;
use crate::store::TemplateStore;
use dashmap::DashMap;
use dgen_model::{ResolutionPath, ResolutionTier, Template, TemplateKey, GENERIC_SEGMENT};
use std::sync::Arc;
use tracing::debug;

/// A resolved template together with its compiled body
#[derive(Debug, Clone)]
pub struct ResolvedTemplate {
    pub template: Template,
    definition: Arc<TemplateDefinition>,
}

impl ResolvedTemplate {
    fn new(key: &TemplateKey, path: ResolutionPath, definition: Arc<TemplateDefinition>) -> Self {
        let template = Template {
            key: key.clone(),
            resolution_path: path,
            body: definition.body.clone(),
            required_fields: definition.front_matter.required_fields.clone(),
            description: definition.front_matter.description.clone(),
            version: definition.front_matter.version.clone(),
        };
        Self {
            template,
            definition,
        }
    }

    /// Compiled body
    #[inline]
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.definition.program
    }

    /// Tier the template was found at
    #[inline]
    #[must_use]
    pub fn tier(&self) -> ResolutionTier {
        self.template.tier()
    }
}

/// Resolves a key to the most specific available template
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    store: TemplateStore,
    builtins: Arc<DashMap<&'static str, Arc<TemplateDefinition>>>,
}

impl TemplateResolver {
    /// Create resolver over a store
    #[must_use]
    pub fn new(store: TemplateStore) -> Self {
        Self {
            store,
            builtins: Arc::new(DashMap::new()),
        }
    }

    /// Create resolver over a fresh store for `source`
    #[must_use]
    pub fn from_source(source: Arc<dyn TemplateSource>) -> Self {
        Self::new(TemplateStore::new(source))
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    /// Namespace locations tried before the built-in tier, in order
    #[must_use]
    pub fn candidate_locations(key: &TemplateKey) -> Vec<ResolutionPath> {
        let mut out = Vec::with_capacity(3);
        if key.tech_stack() != GENERIC_SEGMENT {
            out.push(ResolutionPath::new(
                ResolutionTier::TechSpecific,
                format!("{}/{}/{}", key.platform(), key.document_type(), key.tech_stack()),
            ));
        }
        out.push(ResolutionPath::new(
            ResolutionTier::PlatformGeneric,
            format!("{}/{}/{GENERIC_SEGMENT}", key.platform(), key.document_type()),
        ));
        out.push(ResolutionPath::new(
            ResolutionTier::CustomDefault,
            format!("custom/defaults/{}", key.document_type()),
        ));
        out
    }

    /// Resolve from raw key components
    ///
    /// # Errors
    /// Only `TemplateError::BuiltInCorrupted`.
    pub async fn resolve(
        &self,
        platform: &str,
        document_type: &str,
        tech_stack: &str,
    ) -> TemplateResult<ResolvedTemplate> {
        self.resolve_key(&TemplateKey::new(platform, document_type, tech_stack))
            .await
    }

    /// Resolve a normalized key
    ///
    /// # Errors
    /// Only `TemplateError::BuiltInCorrupted`.
    pub async fn resolve_key(&self, key: &TemplateKey) -> TemplateResult<ResolvedTemplate> {
        for path in Self::candidate_locations(key) {
            if let Some(definition) = self.store.get(&path.location).await {
                debug!(key = %key, tier = %path.tier, location = %path.location, "template resolved");
                return Ok(ResolvedTemplate::new(key, path, definition));
            }
        }
        let resolved = self.builtin(key)?;
        debug!(key = %key, location = %resolved.template.resolution_path.location, "template resolved to built-in");
        Ok(resolved)
    }

    /// The built-in tier for a key, bypassing the store
    ///
    /// # Errors
    /// `TemplateError::BuiltInCorrupted` if the embedded template is invalid.
    pub fn builtin(&self, key: &TemplateKey) -> TemplateResult<ResolvedTemplate> {
        let (name, _) = builtin_source(key.document_type());
        let definition = match self.builtins.get(name) {
            Some(def) => Arc::clone(def.value()),
            None => {
                let def = Arc::new(load_builtin(name)?);
                self.builtins.insert(name, Arc::clone(&def));
                def
            }
        };
        let path = ResolutionPath::new(ResolutionTier::BuiltIn, builtin_location(name));
        Ok(ResolvedTemplate::new(key, path, definition))
    }

    /// Warm the store for a set of keys; returns how many locations exist
    pub async fn preload(&self, keys: &[TemplateKey]) -> usize {
        let locations: Vec<String> = keys
            .iter()
            .flat_map(Self::candidate_locations)
            .map(|p| p.location)
            .collect();
        self.store.preload(locations).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryTemplateSource;

    fn resolver(entries: &[(&str, &str)]) -> TemplateResolver {
        let source = MemoryTemplateSource::new();
        for (location, body) in entries {
            source.insert(*location, *body);
        }
        TemplateResolver::from_source(Arc::new(source))
    }

    #[tokio::test]
    async fn most_specific_tier_wins() {
        let r = resolver(&[
            ("jira/ticket/react", "react"),
            ("jira/ticket/generic", "generic"),
            ("custom/defaults/ticket", "custom"),
        ]);
        let t = r.resolve("jira", "ticket", "react").await.unwrap();
        assert_eq!(t.tier(), ResolutionTier::TechSpecific);
        assert_eq!(t.template.body, "react");

        let t = r.resolve("jira", "ticket", "vue").await.unwrap();
        assert_eq!(t.tier(), ResolutionTier::PlatformGeneric);

        let t = r.resolve("linear", "ticket", "vue").await.unwrap();
        assert_eq!(t.tier(), ResolutionTier::CustomDefault);
        assert_eq!(t.template.resolution_path.location, "custom/defaults/ticket");
    }

    #[tokio::test]
    async fn falls_back_to_builtin() {
        let r = resolver(&[]);
        let t = r.resolve("jira", "release-notes", "cobol").await.unwrap();
        assert_eq!(t.tier(), ResolutionTier::BuiltIn);
        assert_eq!(t.template.resolution_path.location, "builtin/ticket");
        assert_eq!(t.template.document_type(), "release-notes");
    }

    #[tokio::test]
    async fn broken_tier_is_skipped() {
        let r = resolver(&[
            ("jira/ticket/react", "{% for %}"),
            ("jira/ticket/generic", "ok"),
        ]);
        let t = r.resolve("jira", "ticket", "react").await.unwrap();
        assert_eq!(t.tier(), ResolutionTier::PlatformGeneric);
    }

    #[test]
    fn generic_tech_stack_skips_duplicate_tier() {
        let key = TemplateKey::new("jira", "ticket", "");
        let tiers: Vec<_> = TemplateResolver::candidate_locations(&key)
            .into_iter()
            .map(|p| p.tier)
            .collect();
        assert_eq!(
            tiers,
            vec![ResolutionTier::PlatformGeneric, ResolutionTier::CustomDefault]
        );
    }

    #[tokio::test]
    async fn preload_warms_store() {
        let r = resolver(&[("jira/story/generic", "x")]);
        let found = r.preload(&[TemplateKey::new("jira", "story", "react")]).await;
        assert_eq!(found, 1);
        assert_eq!(r.store().len(), 3);
    }
}
