//! Capability identity extraction.
//!
//! A capability is identified without any registration key: the compiler
//! already spells out its fully qualified path in
//! [`std::any::type_name`]. For `dyn modula_project::cloud::CloudService`
//! the identifier is `CloudService` and the owning module is `cloud`, the
//! first path segment below the crate.
//!
//! Two families of rules operate on that text:
//!
//! - [`capability_name`] and [`module_name_by_capability`] read a capability
//!   type (`dyn path::Trait + auto-traits`).
//! - [`module_name_by_signature`] reads a plain qualified path or method
//!   signature (`fn crate::module::Type::method(&self)`), used for factory
//!   objects and consumer module paths.
//!
//! All rules are pure. Text missing an expected delimiter is rejected with
//! [`Error::MalformedSignature`] instead of being passed through.

use std::any::type_name;
use std::fmt;

use serde::Serialize;

use crate::{Error, Result};

const DYN_PREFIX: &str = "dyn ";
const BOUND_SEPARATOR: &str = " + ";
const SEPARATOR: &str = "::";
const GENERIC_OPEN: char = '<';
const GENERIC_CLOSE: char = '>';
const ARGS_OPEN: char = '(';
const ARROW_HEAD: char = '-';

// ============================================================================
// CapabilityInfo
// ============================================================================

/// Identity of a capability type.
///
/// Produced by [`CapabilityInfo::of`]; cheap to recompute, so callers rarely
/// cache it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct CapabilityInfo {
    identifier: String,
    owning_module: String,
    internal: bool,
}

impl CapabilityInfo {
    /// Create an identity from its parts.
    pub fn new(
        identifier: impl Into<String>,
        owning_module: impl Into<String>,
        internal: bool,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            owning_module: owning_module.into(),
            internal,
        }
    }

    /// Derive the identity of capability type `I`.
    ///
    /// `I` is normally a trait object type such as `dyn FileSystem`.
    ///
    /// # Example
    ///
    /// ```
    /// use modula_core::CapabilityInfo;
    ///
    /// let info = CapabilityInfo::of::<dyn std::fmt::Debug>().unwrap();
    /// assert_eq!(info.identifier(), "Debug");
    /// assert_eq!(info.owning_module(), "fmt");
    /// assert!(!info.is_internal());
    /// ```
    pub fn of<I: ?Sized + 'static>() -> Result<Self> {
        Self::from_signature(type_name::<I>())
    }

    /// Derive an identity from capability type text.
    pub fn from_signature(signature: &str) -> Result<Self> {
        Ok(Self::new(
            capability_name(signature)?,
            module_name_by_capability(signature)?,
            false,
        ))
    }

    /// Mark this capability as internal to its owning module.
    pub fn into_internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// The capability identifier, used as the registry key.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The module whose namespace defines the capability.
    pub fn owning_module(&self) -> &str {
        &self.owning_module
    }

    /// Whether only the owning module may resolve this capability.
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// Whether a requester declaring `module` may resolve this capability.
    pub fn is_visible_to(&self, module: &str) -> bool {
        !self.internal || self.owning_module == module
    }
}

impl fmt::Display for CapabilityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owning_module, self.identifier)
    }
}

// ============================================================================
// Capability type rules
// ============================================================================

/// Reduce capability type text to its bare path.
///
/// Strips a leading `dyn ` and any top-level `+ Bound` suffixes; bounds
/// nested inside generic arguments are kept.
fn capability_path(signature: &str) -> &str {
    let sig = signature.trim();
    let sig = sig.strip_prefix(DYN_PREFIX).unwrap_or(sig);

    let mut depth = 0usize;
    for (idx, ch) in sig.char_indices() {
        match ch {
            GENERIC_OPEN => depth += 1,
            GENERIC_CLOSE if !sig[..idx].ends_with(ARROW_HEAD) => {
                depth = depth.saturating_sub(1)
            }
            _ if depth == 0 && sig[idx..].starts_with(BOUND_SEPARATOR) => {
                return &sig[..idx];
            }
            _ => {}
        }
    }
    sig
}

/// Extract the capability identifier from capability type text.
///
/// Takes the text after the last `::` of the path. Generic arguments stay
/// attached so that `Repo<A>` and `Repo<B>` remain distinct.
///
/// # Errors
///
/// Returns [`Error::MalformedSignature`] if the path has no separator or the
/// name is empty.
pub fn capability_name(signature: &str) -> Result<&str> {
    let path = capability_path(signature);
    let end = path.find(GENERIC_OPEN).unwrap_or(path.len());

    let begin = path[..end]
        .rfind(SEPARATOR)
        .ok_or_else(|| Error::malformed(signature, "no path separator before capability name"))?
        + SEPARATOR.len();

    if begin == end {
        return Err(Error::malformed(signature, "empty capability name"));
    }
    Ok(&path[begin..])
}

/// Extract the owning module from capability type text.
///
/// The module is the segment after the first `::`. A path with a single
/// separator (`krate::Trait`) yields the trait name itself.
///
/// # Errors
///
/// Returns [`Error::MalformedSignature`] if the path has no separator or the
/// segment is empty.
pub fn module_name_by_capability(signature: &str) -> Result<&str> {
    let path = capability_path(signature);
    let end = path.find(GENERIC_OPEN).unwrap_or(path.len());
    module_segment(&path[..end]).ok_or_else(|| Error::malformed(signature, "no module segment"))
}

// ============================================================================
// Plain signature rule
// ============================================================================

/// Extract the module from a qualified path or method signature.
///
/// Accepts `crate::module::Type`, `crate::module::function` and
/// `fn crate::module::Type::method(&self)`: the path ends at the argument
/// list and starts after the preceding whitespace. Both are only looked for
/// outside generic arguments, so `Creator<dyn other::Trait>` still reads
/// as the module of `Creator`.
///
/// # Errors
///
/// Returns [`Error::MalformedSignature`] if the path has no separator.
///
/// # Example
///
/// ```
/// use modula_core::identity::module_name_by_signature;
///
/// let sig = "fn modula_project::cloud::CloudFactory::create(&self)";
/// assert_eq!(module_name_by_signature(sig).unwrap(), "cloud");
/// assert_eq!(module_name_by_signature("modula_project::io").unwrap(), "io");
/// ```
pub fn module_name_by_signature(signature: &str) -> Result<&str> {
    // Whitespace and parentheses inside generic arguments belong to the
    // arguments, not to the signature.
    let mut depth = 0usize;
    let mut begin = 0;
    let mut end = signature.len();
    let mut prev = None;
    for (idx, ch) in signature.char_indices() {
        match ch {
            GENERIC_OPEN => depth += 1,
            GENERIC_CLOSE if prev != Some(ARROW_HEAD) => depth = depth.saturating_sub(1),
            ARGS_OPEN if depth == 0 => {
                end = idx;
                break;
            }
            _ if depth == 0 && ch.is_whitespace() => begin = idx + ch.len_utf8(),
            _ => {}
        }
        prev = Some(ch);
    }

    let path = &signature[begin..end];
    let path_end = path.find(GENERIC_OPEN).unwrap_or(path.len());
    module_segment(&path[..path_end])
        .ok_or_else(|| Error::malformed(signature, "no module segment in qualified path"))
}

/// Module name of an arbitrary type, read from its qualified path.
pub fn module_of<T: ?Sized>() -> Result<&'static str> {
    module_name_by_signature(type_name::<T>())
}

/// Segment after the first separator, up to the next one.
fn module_segment(path: &str) -> Option<&str> {
    let begin = path.find(SEPARATOR)? + SEPARATOR.len();
    let rest = &path[begin..];
    let module = match rest.find(SEPARATOR) {
        Some(end) => &rest[..end],
        None => rest,
    };
    (!module.is_empty()).then_some(module)
}

// ============================================================================
// Tests
// ============================================================================
