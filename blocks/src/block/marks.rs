string_key! {
    /// Identifier of a mark definition, unique within its block.
    MarkKey
}

impl MarkKey {
    /// The key for the `index`-th link definition of a block.
    pub fn link(index: usize) -> Self {
        MarkKey(format!("link-{}", index))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    Link,
}

impl MarkKind {
    pub fn name(self) -> &'static str {
        match self {
            MarkKind::Link => "link",
        }
    }
}

/// An annotation defined once per block and referenced by key from its runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkDefinition {
    pub key: MarkKey,
    pub kind: MarkKind,
    pub href: String,
}

/// Block-scoped registry of mark definitions.
///
/// Link definitions added through [`MarkRegistry::intern_link`] are
/// deduplicated by target, so a block never holds two definitions for the same
/// href.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkRegistry {
    definitions: Vec<MarkDefinition>,
}

impl MarkRegistry {
    pub fn new() -> Self {
        MarkRegistry {
            definitions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkDefinition> {
        self.definitions.iter()
    }

    pub fn get(&self, key: &MarkKey) -> Option<&MarkDefinition> {
        self.definitions.iter().find(|def| &def.key == key)
    }

    pub fn contains_key(&self, key: &MarkKey) -> bool {
        self.get(key).is_some()
    }

    /// Find the key of an existing link definition with exactly this target.
    pub fn find_link(&self, href: &str) -> Option<&MarkKey> {
        self.definitions
            .iter()
            .find(|def| def.kind == MarkKind::Link && def.href == href)
            .map(|def| &def.key)
    }

    /// Return the key for `href`, adding a definition when the block has none
    /// for this exact target. The flag is true when a definition was added.
    pub fn intern_link(&mut self, href: &str) -> (MarkKey, bool) {
        if let Some(key) = self.find_link(href) {
            return (key.clone(), false);
        }
        let key = self.next_link_key();
        self.definitions.push(MarkDefinition {
            key: key.clone(),
            kind: MarkKind::Link,
            href: href.to_string(),
        });
        (key, true)
    }

    /// Add a definition as-is. Returns it back if its key is already taken or
    /// another link definition already points at the same href.
    pub fn insert(&mut self, definition: MarkDefinition) -> Result<(), MarkDefinition> {
        if self.contains_key(&definition.key) || self.find_link(&definition.href).is_some() {
            return Err(definition);
        }
        self.definitions.push(definition);
        Ok(())
    }

    /// Keep only the definitions for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&MarkDefinition) -> bool) {
        self.definitions.retain(keep);
    }

    /// Smallest `link-{n}` key not yet used in this block.
    fn next_link_key(&self) -> MarkKey {
        (0..)
            .map(MarkKey::link)
            .find(|key| !self.contains_key(key))
            .unwrap_or_else(|| MarkKey::link(self.definitions.len()))
    }
}
