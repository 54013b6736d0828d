/// Disallowed substrings checked against the combined listing text before any
/// model call. Matching is case-insensitive substring containment, not token
/// matching: a term inside a longer word still triggers.
const DEFAULT_TERMS: &[&str] = &[
    "alcohol",
    "weed",
    "marijuana",
    "cannabis",
    "vodka",
    "whiskey",
    "beer",
    "tobacco",
    "cigarettes",
    "vape",
    "e-cigarettes",
    "smoking",
    "heroin",
    "cocaine",
    "meth",
    "opioids",
    "ecstasy",
    "narcotics",
    "gambling",
    "casino",
    "betting",
    "poker",
    "lottery",
    "nudity",
    "porn",
    "nsfw",
    "prostitution",
    "sex",
    "fetish",
    "lingerie",
    "stripper",
    "naked",
    "drugs",
    "hashish",
    "amphetamine",
    "explosives",
    "terrorism",
    "extremism",
    "illegal",
    "sutta",
    "daaru",
    "maal",
    "charsi",
    "ganja",
    "nashe",
    "chirkut",
    "tharki",
    "kamina",
    "behenchod",
    "madarchod",
    "chutiya",
    "harami",
    "bhosad",
    "bakchodi",
    "gaand",
    "suar",
    "hijra",
    "bastard",
    "rape",
    "molest",
    "dalali",
    "nanga",
    "lauda",
    "kidnap",
    "dacoit",
    "firangi",
    "dhamki",
    "suicide",
    "murders",
    "lootera",
    "darinda",
    "lafanga",
    "sadakchap",
    "gunda",
    "nashedi",
    "bawali",
    "opium",
    "hookah",
];

/// Immutable set of disallowed substrings, built once at startup and shared
/// read-only across requests.
#[derive(Debug, Clone)]
pub struct Denylist {
    terms: Vec<String>,
}

impl Denylist {
    /// Entries are normalized to lowercase; matching assumes it.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|term| term.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn default_terms() -> Self {
        Self::new(DEFAULT_TERMS.iter().copied())
    }

    pub fn contains_denylisted_term(&self, text: &str) -> bool {
        let normalized = text.to_lowercase();
        self.terms
            .iter()
            .any(|term| normalized.contains(term.as_str()))
    }
}
