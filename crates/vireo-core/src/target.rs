#![forbid(unsafe_code)]

//! Output targets: where rendered markup ends up.
//!
//! The runtime only ever asks two things of its surroundings: find the
//! target for a selector ([`TargetLocator`]) and replace that target's whole
//! content ([`OutputTarget`]). Lookup happens at publish time, so a target
//! may be attached after the component that renders into it was mounted.
//!
//! [`Document`] is a selector registry implementing [`TargetLocator`];
//! [`MemoryTarget`] records every replacement and is what tests and headless
//! runs attach.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

/// Something that displays a string and can have it replaced wholesale.
pub trait OutputTarget {
    /// Replace the entire content with `content`.
    fn replace_content(&self, content: &str);
}

/// Resolves a selector to an output target.
pub trait TargetLocator {
    /// Look up the target for `selector`. `None` if nothing is attached.
    fn locate(&self, selector: &str) -> Option<Rc<dyn OutputTarget>>;
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Selector → target registry.
///
/// Cloning creates a new handle to the **same** registry.
#[derive(Clone, Default)]
pub struct Document {
    targets: Rc<RefCell<AHashMap<String, Rc<dyn OutputTarget>>>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets = self.targets.borrow();
        let mut selectors: Vec<&str> = targets.keys().map(String::as_str).collect();
        selectors.sort_unstable();
        f.debug_struct("Document")
            .field("selectors", &selectors)
            .finish()
    }
}

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `target` under `selector`, returning whatever was there before.
    pub fn attach(
        &self,
        selector: impl Into<String>,
        target: Rc<dyn OutputTarget>,
    ) -> Option<Rc<dyn OutputTarget>> {
        self.targets.borrow_mut().insert(selector.into(), target)
    }

    /// Detach the target under `selector`.
    pub fn detach(&self, selector: &str) -> Option<Rc<dyn OutputTarget>> {
        self.targets.borrow_mut().remove(selector)
    }

    /// Whether a target is attached under `selector`.
    #[must_use]
    pub fn contains(&self, selector: &str) -> bool {
        self.targets.borrow().contains_key(selector)
    }
}

impl TargetLocator for Document {
    fn locate(&self, selector: &str) -> Option<Rc<dyn OutputTarget>> {
        self.targets.borrow().get(selector).cloned()
    }
}

// ---------------------------------------------------------------------------
// MemoryTarget
// ---------------------------------------------------------------------------

/// In-memory target that keeps every content it was given.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    history: RefCell<Vec<String>>,
}

impl MemoryTarget {
    /// Create an empty target.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content (the latest replacement).
    #[must_use]
    pub fn content(&self) -> Option<String> {
        self.history.borrow().last().cloned()
    }

    /// Number of replacements so far.
    #[must_use]
    pub fn replacements(&self) -> usize {
        self.history.borrow().len()
    }

    /// Every content received, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }
}

impl OutputTarget for MemoryTarget {
    fn replace_content(&self, content: &str) {
        self.history.borrow_mut().push(content.to_owned());
    }
}
