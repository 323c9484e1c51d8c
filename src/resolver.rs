//! Name Resolution
//!
//! Type names drift between schema sources: a codec asks for `account`, a
//! document defines `Account`; a pallet says `<T as Config>::Balance`, the
//! registry says `Balance`. A [`ResolverChain`] maps such names onto a known
//! canonical name.
//!
//! Strategies run in a fixed order and the first one to answer wins:
//! 1. [`CaseInsensitiveResolver`]
//! 2. [`RenameTableResolver`]
//! 3. [`NormalizingResolver`]
//!
//! Every strategy only ever answers with a member of the known-name set.

use std::collections::{BTreeSet, HashMap, HashSet};

use regex::Regex;

use crate::error::{CatalogError, Result};

// =============================================================================
// Known names
// =============================================================================

/// The set of canonical names a resolver may answer with
pub trait KnownNames {
    fn contains_name(&self, name: &str) -> bool;

    fn known_names(&self) -> Box<dyn Iterator<Item = &str> + '_>;
}

impl KnownNames for BTreeSet<String> {
    fn contains_name(&self, name: &str) -> bool {
        self.contains(name)
    }

    fn known_names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.iter().map(String::as_str))
    }
}

impl KnownNames for HashSet<String> {
    fn contains_name(&self, name: &str) -> bool {
        self.contains(name)
    }

    fn known_names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.iter().map(String::as_str))
    }
}

// =============================================================================
// Strategies
// =============================================================================

/// A naming-drift strategy
pub trait NameResolver: Send + Sync {
    /// Map `name` to a member of `known`, or give up
    fn resolve(&self, name: &str, known: &dyn KnownNames) -> Option<String>;

    /// Short label used in trace output
    fn label(&self) -> &'static str;
}

/// Matches names that differ only in letter case. ASCII names take the fast
/// path; anything else is compared by its full Unicode lowercase form.
///
/// When several known names match, the lexically smallest one is chosen so
/// the answer does not depend on set iteration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitiveResolver;

impl NameResolver for CaseInsensitiveResolver {
    fn resolve(&self, name: &str, known: &dyn KnownNames) -> Option<String> {
        known
            .known_names()
            .filter(|candidate| same_ignoring_case(candidate, name))
            .min()
            .map(str::to_string)
    }

    fn label(&self) -> &'static str {
        "case-insensitive"
    }
}

fn same_ignoring_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        a.eq_ignore_ascii_case(b)
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}

/// Historical type names renamed in later schema revisions
const DEFAULT_RENAMES: &[(&str, &str)] = &[
    ("Address", "MultiAddress"),
    ("LookupSource", "MultiAddress"),
    ("GenericMultiAddress", "MultiAddress"),
    ("AccountInfoWithRefCount", "AccountInfo"),
    ("AccountInfoWithDualRefCount", "AccountInfo"),
    ("AccountInfoWithProviders", "AccountInfo"),
    ("AccountInfoWithTripleRefCount", "AccountInfo"),
    ("ValidatorPrefsWithCommission", "ValidatorPrefs"),
    ("ValidatorPrefsWithBlocked", "ValidatorPrefs"),
    ("BlockNumberFor", "BlockNumber"),
    ("BalanceOf", "Balance"),
];

/// Static alias → canonical name table
#[derive(Debug, Clone)]
pub struct RenameTableResolver {
    renames: HashMap<String, String>,
}

impl RenameTableResolver {
    /// The built-in rename table
    pub fn standard() -> Self {
        Self::with_aliases(std::iter::empty::<(String, String)>())
    }

    /// The built-in table extended with `aliases`; extra aliases replace
    /// built-in entries with the same key.
    pub fn with_aliases<I, K, V>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut renames: HashMap<String, String> = DEFAULT_RENAMES
            .iter()
            .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
            .collect();
        renames.extend(aliases.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self { renames }
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

impl Default for RenameTableResolver {
    fn default() -> Self {
        Self::standard()
    }
}

impl NameResolver for RenameTableResolver {
    fn resolve(&self, name: &str, known: &dyn KnownNames) -> Option<String> {
        self.renames
            .get(name)
            .filter(|canonical| known.contains_name(canonical))
            .cloned()
    }

    fn label(&self) -> &'static str {
        "rename-table"
    }
}

/// A single rewrite applied during normalization
#[derive(Debug, Clone)]
pub struct NormalizationRule {
    pattern: Regex,
    replacement: String,
}

impl NormalizationRule {
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        let compiled = Regex::new(pattern).map_err(|source| CatalogError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: compiled,
            replacement: replacement.into(),
        })
    }

    /// Apply the rewrite; `None` if the pattern did not change anything
    pub fn apply(&self, name: &str) -> Option<String> {
        let rewritten = self.pattern.replace_all(name, self.replacement.as_str());
        (rewritten != name).then(|| rewritten.into_owned())
    }
}

/// Built-in noise patterns, applied in order
const DEFAULT_RULES: &[(&str, &str)] = &[
    // Associated type projections: `<T as frame_system::Config>::AccountId`
    (r"^<[^<>]+ as [^<>]+>::", ""),
    // Module paths: `pallet_balances::AccountData`, `T::Balance`
    (r"^(?:[A-Za-z_][A-Za-z0-9_]*::)+", ""),
    // Generic parameters: `AccountData<Balance>`
    (r"^([A-Za-z_][A-Za-z0-9_]*)<.*>$", "$1"),
    // References, lifetimes and whitespace: `&'static [u8]`, `Vec< u8 >`
    (r"&(?:'[A-Za-z_]+)?\s*|\s+", ""),
];

/// Strips known noise from a name and re-checks membership after each
/// effective rewrite. Rewrites accumulate: the path rule sees the output of
/// the projection rule.
#[derive(Debug, Clone)]
pub struct NormalizingResolver {
    rules: Vec<NormalizationRule>,
}

impl NormalizingResolver {
    /// The built-in rule set
    pub fn standard() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(pattern, replacement)| NormalizationRule {
                pattern: Regex::new(pattern).expect("built-in normalization pattern"),
                replacement: replacement.to_string(),
            })
            .collect();
        Self { rules }
    }

    /// Built-in rules followed by `extra`
    pub fn with_rules(extra: impl IntoIterator<Item = NormalizationRule>) -> Self {
        let mut resolver = Self::standard();
        resolver.rules.extend(extra);
        resolver
    }

    pub fn rules(&self) -> &[NormalizationRule] {
        &self.rules
    }
}

impl Default for NormalizingResolver {
    fn default() -> Self {
        Self::standard()
    }
}

impl NameResolver for NormalizingResolver {
    fn resolve(&self, name: &str, known: &dyn KnownNames) -> Option<String> {
        let mut current = name.to_string();
        for rule in &self.rules {
            if let Some(rewritten) = rule.apply(&current) {
                if known.contains_name(&rewritten) {
                    return Some(rewritten);
                }
                current = rewritten;
            }
        }
        None
    }

    fn label(&self) -> &'static str {
        "normalize"
    }
}

// =============================================================================
// Chain
// =============================================================================

/// Ordered list of strategies; the first non-empty answer is authoritative.
pub struct ResolverChain {
    resolvers: Vec<Box<dyn NameResolver>>,
}

impl ResolverChain {
    /// A chain with no strategies (never resolves anything)
    pub fn empty() -> Self {
        Self {
            resolvers: Vec::new(),
        }
    }

    /// Case-insensitive, rename table, normalization
    pub fn standard() -> Self {
        Self::from_parts(RenameTableResolver::standard(), NormalizingResolver::standard())
    }

    /// The standard order with customized table and normalization strategies
    pub fn from_parts(renames: RenameTableResolver, normalizer: NormalizingResolver) -> Self {
        Self::empty()
            .with(CaseInsensitiveResolver)
            .with(renames)
            .with(normalizer)
    }

    /// Append a strategy at the end of the chain
    pub fn with(mut self, resolver: impl NameResolver + 'static) -> Self {
        self.push(resolver);
        self
    }

    pub fn push(&mut self, resolver: impl NameResolver + 'static) {
        self.resolvers.push(Box::new(resolver));
    }

    /// Run the strategies in order
    pub fn resolve(&self, name: &str, known: &dyn KnownNames) -> Option<String> {
        self.resolvers.iter().find_map(|resolver| {
            let resolved = resolver.resolve(name, known)?;
            tracing::trace!(name, resolved = %resolved, strategy = resolver.label(), "resolved type name");
            Some(resolved)
        })
    }

    /// Strategy labels in order
    pub fn labels(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.label()).collect()
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl Default for ResolverChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverChain")
            .field("strategies", &self.labels())
            .finish()
    }
}
