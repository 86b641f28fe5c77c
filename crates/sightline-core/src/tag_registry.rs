//! Hierarchical tag interning.
//!
//! Each tag stores one path segment and a link to its parent, so
//! `project:sightline` and `project:home` share the `project` entry. A
//! `(parent, name)` pair maps to exactly one id; interning it again returns
//! the existing id.

use std::collections::HashMap;

use sightline_types::{Tag, TagId, TagSuggestion, color_for};
use tracing::warn;

/// Lowercase, trimmed, without a leading `#`.
pub fn normalize_query(query: &str) -> String {
    query.trim().trim_start_matches('#').to_lowercase()
}

#[derive(Clone, Debug, Default)]
pub struct TagRegistry {
    tags: HashMap<TagId, Tag>,
    /// parent → segment name → id
    index: HashMap<Option<TagId>, HashMap<String, TagId>>,
    next_id: TagId,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn get(&self, id: TagId) -> Option<&Tag> {
        self.tags.get(&id)
    }

    /// Tags in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn find_id(&self, parent_id: Option<TagId>, name: &str) -> Option<TagId> {
        self.index
            .get(&parent_id)
            .and_then(|by_name| by_name.get(name))
            .copied()
    }

    /// Resolve a colon path to an existing id without interning anything.
    pub fn lookup_colon_path(&self, path: &str) -> Option<TagId> {
        let mut parent = None;
        for segment in path.split(':').map(str::trim).filter(|s| !s.is_empty()) {
            parent = Some(self.find_id(parent, segment)?);
        }
        parent
    }

    // ========================================================================
    // Interning
    // ========================================================================

    pub fn intern_segment(&mut self, parent_id: Option<TagId>, name: &str) -> TagId {
        self.intern_segment_with_id(parent_id, name, None)
    }

    /// Intern each segment under the previous one. Blank segments are skipped;
    /// returns `None` when nothing was left to intern.
    pub fn intern_path<'a, I>(&mut self, segments: I) -> Option<TagId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut parent = None;
        for segment in segments {
            let name = segment.trim();
            if name.is_empty() {
                continue;
            }
            parent = Some(self.intern_segment(parent, name));
        }
        parent
    }

    pub fn intern_colon_path(&mut self, path: &str) -> Option<TagId> {
        self.intern_path(path.split(':'))
    }

    fn intern_segment_with_id(
        &mut self,
        parent_id: Option<TagId>,
        name: &str,
        desired_id: Option<TagId>,
    ) -> TagId {
        if let Some(existing) = self.find_id(parent_id, name) {
            return existing;
        }

        let id = match desired_id {
            Some(id) if !self.tags.contains_key(&id) => id,
            Some(id) => {
                warn!(id, name, "tag id already taken, allocating a fresh one");
                self.next_available_id()
            }
            None => self.next_available_id(),
        };

        self.tags.insert(
            id,
            Tag {
                id,
                name: name.to_string(),
                parent_id,
                color: Some(color_for(id).to_string()),
            },
        );
        self.index
            .entry(parent_id)
            .or_default()
            .insert(name.to_string(), id);
        if self.next_id <= id {
            self.next_id = id.saturating_add(1);
        }
        id
    }

    fn next_available_id(&mut self) -> TagId {
        let mut id = self.next_id;
        while self.tags.contains_key(&id) {
            id = id.wrapping_add(1);
        }
        self.next_id = id.wrapping_add(1);
        id
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Colon-joined path from the root ancestor down to `id`.
    ///
    /// `None` for unknown ids and for parent chains that loop.
    pub fn full_name(&self, id: TagId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(id);

        while let Some(tag_id) = current {
            if segments.len() > self.tags.len() {
                return None;
            }
            let tag = self.tags.get(&tag_id)?;
            segments.push(tag.name.as_str());
            current = tag.parent_id;
        }

        segments.reverse();
        Some(segments.join(":"))
    }

    /// Every tag's id with its full name.
    pub fn tag_names(&self) -> Vec<(TagId, String)> {
        self.tags
            .keys()
            .filter_map(|id| self.full_name(*id).map(|name| (*id, name)))
            .collect()
    }

    pub fn color(&self, id: TagId) -> String {
        self.tags
            .get(&id)
            .and_then(|tag| tag.color.clone())
            .unwrap_or_else(|| color_for(id).to_string())
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Ids whose full name starts with the query (case-insensitive).
    pub fn tag_ids_with_prefix(&self, query: &str) -> Vec<TagId> {
        self.filter_tag_ids(query, |name, needle| name.starts_with(needle))
    }

    /// Ids whose full name contains the query (case-insensitive).
    pub fn tag_ids_with_infix(&self, query: &str) -> Vec<TagId> {
        self.filter_tag_ids(query, |name, needle| name.contains(needle))
    }

    fn filter_tag_ids<F>(&self, query: &str, predicate: F) -> Vec<TagId>
    where
        F: Fn(&str, &str) -> bool,
    {
        let needle = normalize_query(query);
        if needle.is_empty() {
            return Vec::new();
        }

        let mut ids: Vec<TagId> = self
            .tag_names()
            .into_iter()
            .filter(|(_, name)| predicate(&name.to_lowercase(), &needle))
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// `#`-prefixed suggestions for tags starting with `partial`.
    ///
    /// When no existing tag matches the typed text exactly, a create-new
    /// suggestion is appended last.
    pub fn autocomplete(&self, partial: &str) -> Vec<TagSuggestion> {
        let needle = normalize_query(partial)
            .split(':')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join(":");
        if needle.is_empty() {
            return Vec::new();
        }

        let typed: Vec<&str> = partial
            .trim()
            .trim_start_matches('#')
            .split(':')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect();
        let typed_path = typed.join(":");
        let typed_lower = typed_path.to_lowercase();

        let mut exact = false;
        let mut suggestions: Vec<TagSuggestion> = self
            .tag_names()
            .into_iter()
            .filter_map(|(id, name)| {
                let lower = name.to_lowercase();
                if !lower.starts_with(&needle) {
                    return None;
                }
                exact |= lower == typed_lower;
                Some(TagSuggestion::existing(format!("#{name}"), Some(self.color(id))))
            })
            .collect();

        suggestions.sort_by(|a, b| a.name.cmp(&b.name));
        suggestions.dedup_by(|a, b| a.name == b.name);

        if !exact && !typed.is_empty() {
            suggestions.push(TagSuggestion::create(format!("#{typed_path}")));
        }
        suggestions
    }

    // ========================================================================
    // Snapshot conversion
    // ========================================================================

    /// Rebuild from hierarchical snapshot entries.
    pub fn from_tags(tags: Vec<Tag>) -> Self {
        let mut registry = Self {
            tags: tags.into_iter().map(|tag| (tag.id, tag)).collect(),
            index: HashMap::new(),
            next_id: 0,
        };
        registry.rebuild_indexes();
        registry
    }

    /// Rebuild from a legacy flat `id → "a:b:c"` map.
    ///
    /// Each stored id is attached to the leaf segment of its path so blocks
    /// referring to it keep resolving. Intermediate segments get ids above
    /// every stored one.
    pub fn from_map(id_to_path: HashMap<TagId, String>) -> Self {
        let mut registry = Self::new();
        registry.next_id = id_to_path
            .keys()
            .max()
            .map(|max| max.saturating_add(1))
            .unwrap_or(0);

        let mut entries: Vec<(TagId, String)> = id_to_path.into_iter().collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        for (id, path) in entries {
            let segments: Vec<&str> = path
                .split(':')
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .collect();
            let Some((leaf, ancestors)) = segments.split_last() else {
                warn!(id, "dropping legacy tag with empty path");
                continue;
            };

            let mut parent = None;
            for segment in ancestors {
                parent = Some(registry.intern_segment(parent, segment));
            }
            let interned = registry.intern_segment_with_id(parent, leaf, Some(id));
            if interned != id {
                warn!(id, interned, path = %path, "legacy tag merged into an existing id");
            }
        }

        registry
    }

    /// Entries sorted by id, for persistence.
    pub fn export(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self.tags.values().cloned().collect();
        tags.sort_by_key(|tag| tag.id);
        tags
    }

    fn rebuild_indexes(&mut self) {
        self.index.clear();
        for tag in self.tags.values() {
            self.index
                .entry(tag.parent_id)
                .or_default()
                .insert(tag.name.clone(), tag.id);
        }
        self.next_id = self
            .tags
            .keys()
            .max()
            .map(|max| max.saturating_add(1))
            .unwrap_or(0);
        self.ensure_tag_colors();
    }

    fn ensure_tag_colors(&mut self) {
        for (id, tag) in self.tags.iter_mut() {
            if tag.color.is_none() {
                tag.color = Some(color_for(*id).to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_assigns_unique_ids() {
        let mut registry = TagRegistry::new();
        let a = registry.intern_segment(None, "project");
        let b = registry.intern_segment(None, "type");
        let c = registry.intern_segment(Some(a), "sightline");
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(c).unwrap().parent_id, Some(a));
    }

    #[test]
    fn test_intern_reuses_existing_id() {
        let mut registry = TagRegistry::new();
        let first = registry.intern_colon_path("project:sightline").unwrap();
        let second = registry.intern_colon_path("project:sightline").unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_shared_parent_and_full_names() {
        let mut registry = TagRegistry::new();
        let sightline = registry.intern_colon_path("project:sightline").unwrap();
        let home = registry.intern_colon_path("project:home").unwrap();

        let sightline_parent = registry.get(sightline).unwrap().parent_id;
        assert_eq!(sightline_parent, registry.get(home).unwrap().parent_id);
        assert_eq!(registry.full_name(sightline).as_deref(), Some("project:sightline"));
        assert_eq!(registry.full_name(home).as_deref(), Some("project:home"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_colon_path_trims_and_skips_blank_segments() {
        let mut registry = TagRegistry::new();
        let id = registry.intern_colon_path("  work :: meetings ").unwrap();
        assert_eq!(registry.full_name(id).as_deref(), Some("work:meetings"));
        assert_eq!(registry.intern_colon_path(" : : "), None);
        assert_eq!(registry.lookup_colon_path("work:meetings"), Some(id));
        assert_eq!(registry.lookup_colon_path("work:other"), None);
    }

    #[test]
    fn test_full_name_unknown_and_cyclic() {
        let registry = TagRegistry::new();
        assert_eq!(registry.full_name(99), None);

        let cyclic = TagRegistry::from_tags(vec![
            Tag { id: 0, name: "a".into(), parent_id: Some(1), color: None },
            Tag { id: 1, name: "b".into(), parent_id: Some(0), color: None },
        ]);
        assert_eq!(cyclic.full_name(0), None);
    }

    #[test]
    fn test_prefix_and_infix_are_case_insensitive() {
        let mut registry = TagRegistry::new();
        let sightline = registry.intern_colon_path("Project:Sightline").unwrap();
        let journal = registry.intern_colon_path("type:journal").unwrap();
        let project = registry.lookup_colon_path("Project").unwrap();

        assert_eq!(registry.tag_ids_with_prefix("#project"), {
            let mut ids = vec![project, sightline];
            ids.sort_unstable();
            ids
        });
        assert_eq!(registry.tag_ids_with_infix("JOURN"), vec![journal]);
        assert!(registry.tag_ids_with_prefix("   ").is_empty());
    }

    #[test]
    fn test_autocomplete_sorted_with_create_suggestion_last() {
        let mut registry = TagRegistry::new();
        registry.intern_colon_path("project:sightline");
        registry.intern_colon_path("project:home");

        let suggestions = registry.autocomplete("#proj");
        let names: Vec<&str> = suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["#project", "#project:home", "#project:sightline", "#proj"]
        );
        assert!(suggestions[..3].iter().all(|s| !s.is_new && s.color.is_some()));
        let created = suggestions.last().unwrap();
        assert!(created.is_new);
        assert!(created.color.is_none());
    }

    #[test]
    fn test_autocomplete_exact_match_has_no_create_suggestion() {
        let mut registry = TagRegistry::new();
        registry.intern_colon_path("project:home");
        let suggestions = registry.autocomplete("Project:Home");
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name, "#project:home");
        assert!(registry.autocomplete("#").is_empty());
    }

    #[test]
    fn test_autocomplete_spaced_segments_match_exactly() {
        let mut registry = TagRegistry::new();
        registry.intern_colon_path("project:home");

        let suggestions = registry.autocomplete("# project : home ");
        assert!(suggestions.iter().all(|s| !s.is_new));
        let names: Vec<&str> = suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["#project:home"]);

        let partial = registry.autocomplete("project : ho");
        let names: Vec<&str> = partial.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["#project:home", "#project:ho"]);
        assert!(partial[1].is_new);
    }

    #[test]
    fn test_from_map_keeps_leaf_ids() {
        let map = HashMap::from([
            (5, "project:sightline".to_string()),
            (2, "project".to_string()),
            (7, "type:journal".to_string()),
        ]);
        let registry = TagRegistry::from_map(map);

        assert_eq!(registry.full_name(5).as_deref(), Some("project:sightline"));
        assert_eq!(registry.full_name(2).as_deref(), Some("project"));
        assert_eq!(registry.full_name(7).as_deref(), Some("type:journal"));
        assert_eq!(registry.get(5).unwrap().parent_id, Some(2));
        // "type" was never stored on its own, so it gets an id above the map.
        let type_id = registry.lookup_colon_path("type").unwrap();
        assert!(type_id > 7);
    }

    #[test]
    fn test_from_tags_fills_colors_and_next_id() {
        let mut registry = TagRegistry::from_tags(vec![
            Tag { id: 3, name: "work".into(), parent_id: None, color: None },
        ]);
        assert_eq!(registry.color(3), color_for(3));
        assert_eq!(registry.get(3).unwrap().color.as_deref(), Some(color_for(3)));
        let next = registry.intern_colon_path("home").unwrap();
        assert_eq!(next, 4);
        assert_eq!(registry.intern_colon_path("work"), Some(3));
    }

    #[test]
    fn test_export_sorted_by_id() {
        let mut registry = TagRegistry::new();
        registry.intern_colon_path("b:c");
        registry.intern_colon_path("a");
        let ids: Vec<TagId> = registry.export().iter().map(|tag| tag.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
