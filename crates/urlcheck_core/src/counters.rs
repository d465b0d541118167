use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::PatternError;

/// Known analytics and tracking-pixel signatures as `(name, pattern)` pairs.
/// A name may appear more than once when a counter has several endpoints.
pub const BUILTIN_COUNTERS: &[(&str, &str)] = &[
    ("GOOGLE_ANALYTICS", r"google-analytics\.com/ga\.js"),
    ("YA_METRICA", r"mc\.yandex\.ru/metrika/watch\.js"),
    ("TOP_MAIL_RU", r"top-fwz1\.mail\.ru/counter"),
    ("TOP_MAIL_RU", r"top\.mail\.ru/jump\?from"),
    (
        "DOUBLECLICK",
        r"//googleads\.g\.doubleclick\.net/pagead/viewthroughconversion",
    ),
    ("VK_COUNTER", r"vk\.com/rtrg"),
    (
        "GOOGLE_REMARKETING",
        r"www\.googleadservices\.com/pagead/conversion\.js",
    ),
    ("LI_RU", r"/counter\.yadro\.ru/hit"),
    ("LI_RU", r"cnt\.rambler\.ru/top100"),
];

static DEFAULT_REGISTRY: LazyLock<Result<CounterRegistry, PatternError>> =
    LazyLock::new(CounterRegistry::builtin);

#[derive(Debug, Clone)]
pub struct CounterSignature {
    pub name: String,
    pub pattern: Regex,
}

impl CounterSignature {
    /// Compile a case-insensitive signature.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, PatternError> {
        let name = name.into();
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| PatternError {
                name: name.clone(),
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self { name, pattern })
    }
}

/// Read-only set of counter signatures matched against page content.
#[derive(Debug, Clone, Default)]
pub struct CounterRegistry {
    signatures: Vec<CounterSignature>,
}

impl CounterRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile [`BUILTIN_COUNTERS`].
    pub fn builtin() -> Result<Self, PatternError> {
        let signatures = BUILTIN_COUNTERS
            .iter()
            .map(|(name, pattern)| CounterSignature::new(*name, pattern))
            .collect::<Result<_, _>>()?;
        Ok(Self { signatures })
    }

    /// Append a signature; later entries never shadow earlier ones.
    pub fn with_signature(mut self, name: &str, pattern: &str) -> Result<Self, PatternError> {
        self.signatures.push(CounterSignature::new(name, pattern)?);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn names(&self) -> BTreeSet<&str> {
        self.signatures.iter().map(|sig| sig.name.as_str()).collect()
    }

    /// Names of every signature found anywhere in `content`.
    pub fn get_counters(&self, content: &str) -> BTreeSet<String> {
        if content.is_empty() {
            return BTreeSet::new();
        }
        self.signatures
            .iter()
            .filter(|sig| sig.pattern.is_match(content))
            .map(|sig| sig.name.clone())
            .collect()
    }
}

/// Match `content` against the builtin registry. Finds nothing if the
/// builtin patterns failed to compile; [`CounterRegistry::builtin`] reports
/// that error to callers that need it.
pub fn get_counters(content: &str) -> BTreeSet<String> {
    match DEFAULT_REGISTRY.as_ref() {
        Ok(registry) => registry.get_counters(content),
        Err(_) => BTreeSet::new(),
    }
}
