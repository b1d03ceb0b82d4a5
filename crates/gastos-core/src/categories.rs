//! Category taxonomy and keyword rules
//!
//! A `CategoryProfile` maps a category name to keyword lists, subcategory
//! keyword lists, an optional set of regex rules, a budget bucket, and a
//! recommended share of income. The catalog is loaded once at engine startup
//! and is immutable for the run.

use regex::Regex;

use crate::error::Result;
use crate::models::Bucket;

/// How a rule-pass match was made, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// A regex rule on the profile matched
    Rule,
    /// A plain keyword substring matched
    Keyword,
}

/// A subcategory and the keywords that select it
#[derive(Debug, Clone)]
pub struct SubcategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Static configuration for one category
#[derive(Debug, Clone)]
pub struct CategoryProfile {
    pub name: String,
    /// Lower-case substrings tested against the lower-cased description
    pub keywords: Vec<String>,
    pub subcategories: Vec<SubcategoryRule>,
    /// Optional regex rules, checked before keywords
    pub patterns: Vec<Regex>,
    /// Recommended fraction of monthly income
    pub budget_ratio: f64,
    pub bucket: Bucket,
}

impl CategoryProfile {
    fn new(name: &str, bucket: Bucket, budget_ratio: f64, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            subcategories: Vec::new(),
            patterns: Vec::new(),
            budget_ratio,
            bucket,
        }
    }

    fn with_subcategory(mut self, name: &str, keywords: &[&str]) -> Self {
        self.subcategories.push(SubcategoryRule {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        });
        self
    }

    /// Test a lower-cased description against this profile's rules.
    /// Returns the matched subcategory (if any) and how the match was made.
    fn matches(&self, description: &str) -> Option<(Option<String>, MatchKind)> {
        for pattern in &self.patterns {
            if pattern.is_match(description) {
                return Some((self.match_subcategory(description), MatchKind::Rule));
            }
        }
        for keyword in &self.keywords {
            if description.contains(keyword.as_str()) {
                return Some((self.match_subcategory(description), MatchKind::Keyword));
            }
        }
        None
    }

    fn match_subcategory(&self, description: &str) -> Option<String> {
        for sub in &self.subcategories {
            if sub.keywords.iter().any(|k| description.contains(k.as_str())) {
                return Some(sub.name.clone());
            }
        }
        None
    }
}

/// A successful rule-pass match
#[derive(Debug, Clone)]
pub struct CategoryMatch {
    pub category: String,
    pub subcategory: Option<String>,
    pub kind: MatchKind,
}

/// The full category vocabulary for a run
#[derive(Debug, Clone)]
pub struct CategoryCatalog {
    profiles: Vec<CategoryProfile>,
    fallback: String,
}

/// Terminal fallback category; the categorizer guarantees every transaction
/// ends up here when nothing else matches.
pub const FALLBACK_CATEGORY: &str = "Other";

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryCatalog {
    /// Build a catalog from explicit profiles
    pub fn new(profiles: Vec<CategoryProfile>) -> Self {
        Self {
            profiles,
            fallback: FALLBACK_CATEGORY.to_string(),
        }
    }

    /// The built-in taxonomy tuned for Philippine merchants
    pub fn builtin() -> Self {
        let profiles = vec![
            CategoryProfile::new(
                "Food",
                Bucket::Needs,
                0.20,
                &[
                    "jollibee", "mcdo", "mcdonald", "kfc", "chowking", "mang inasal",
                    "restaurant", "grabfood", "foodpanda", "grocery", "supermarket",
                    "puregold", "sm hypermarket", "cafe", "coffee", "starbucks", "food",
                ],
            )
            .with_subcategory(
                "Groceries",
                &["grocery", "supermarket", "puregold", "sm hypermarket", "sari-sari"],
            )
            .with_subcategory(
                "Dining",
                &[
                    "jollibee", "mcdo", "mcdonald", "kfc", "chowking", "mang inasal",
                    "restaurant", "grabfood", "foodpanda", "cafe", "coffee", "starbucks",
                ],
            ),
            CategoryProfile::new(
                "Transport",
                Bucket::Needs,
                0.10,
                &[
                    "grab", "angkas", "taxi", "jeep", "bus", "mrt", "lrt", "beep",
                    "petron", "shell", "caltex", "gas", "fuel", "toll", "autosweep",
                    "easytrip", "parking",
                ],
            )
            .with_subcategory("Fuel", &["petron", "shell", "caltex", "gas", "fuel"])
            .with_subcategory("Commute", &["grab", "angkas", "taxi", "jeep", "bus", "mrt", "lrt"]),
            CategoryProfile::new(
                "Utilities",
                Bucket::Needs,
                0.10,
                &[
                    "meralco", "electric", "maynilad", "manila water", "water", "pldt",
                    "globe", "smart", "converge", "internet", "prepaid load", "postpaid",
                ],
            )
            .with_subcategory("Power", &["meralco", "electric"])
            .with_subcategory("Telco", &["pldt", "globe", "smart", "converge", "internet"]),
            CategoryProfile::new(
                "Housing",
                Bucket::Needs,
                0.10,
                &["rent", "condo dues", "association dues", "mortgage", "dorm", "landlord"],
            ),
            CategoryProfile::new(
                "Healthcare",
                Bucket::Needs,
                0.05,
                &[
                    "mercury drug", "watsons", "pharmacy", "drugstore", "hospital",
                    "clinic", "doctor", "dental", "medicine", "lab test",
                ],
            ),
            CategoryProfile::new(
                "Education",
                Bucket::Needs,
                0.05,
                &["tuition", "school", "university", "books", "course", "udemy", "review center"],
            ),
            CategoryProfile::new(
                "Entertainment",
                Bucket::Wants,
                0.10,
                &[
                    "netflix", "spotify", "youtube premium", "disney", "hbo", "cinema",
                    "movie", "steam", "playstation", "game", "concert", "ticket",
                ],
            )
            .with_subcategory("Streaming", &["netflix", "spotify", "youtube premium", "disney", "hbo"])
            .with_subcategory("Gaming", &["steam", "playstation", "game"]),
            CategoryProfile::new(
                "Shopping",
                Bucket::Wants,
                0.10,
                &[
                    "shopee", "lazada", "zalora", "sm store", "uniqlo", "mall",
                    "department store", "hardware", "ikea", "apparel",
                ],
            )
            .with_subcategory("Online", &["shopee", "lazada", "zalora"]),
            CategoryProfile::new(
                "Savings",
                Bucket::Savings,
                0.20,
                &[
                    "savings", "seabank", "maya savings", "gsave", "time deposit",
                    "invest", "stock", "mutual fund", "uitf", "pag-ibig mp2",
                ],
            ),
            // Catch-all wants bucket; no keywords, reached only as fallback
            CategoryProfile::new(FALLBACK_CATEGORY, Bucket::Wants, 0.10, &[]),
        ];

        Self::new(profiles)
    }

    /// First profile whose rules match wins; deterministic across runs
    pub fn match_description(&self, description: &str) -> Option<CategoryMatch> {
        let lowered = description.to_lowercase();
        for profile in &self.profiles {
            if let Some((subcategory, kind)) = profile.matches(&lowered) {
                return Some(CategoryMatch {
                    category: profile.name.clone(),
                    subcategory,
                    kind,
                });
            }
        }
        None
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn profiles(&self) -> &[CategoryProfile] {
        &self.profiles
    }

    pub fn profile(&self, name: &str) -> Option<&CategoryProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Category names, used as the fixed vocabulary in AI prompts
    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    /// Whether a name (from an AI response) is part of the vocabulary
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.iter().any(|p| p.name == name)
    }

    /// Categories assigned to a bucket
    pub fn categories_in_bucket(&self, bucket: Bucket) -> Vec<String> {
        self.profiles
            .iter()
            .filter(|p| p.bucket == bucket)
            .map(|p| p.name.clone())
            .collect()
    }

    /// Attach a regex rule to an existing profile
    pub fn add_pattern(&mut self, category: &str, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern)?;
        if let Some(profile) = self.profiles.iter_mut().find(|p| p.name == category) {
            profile.patterns.push(regex);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_match_with_subcategory() {
        let catalog = CategoryCatalog::builtin();
        let m = catalog.match_description("JOLLIBEE BGC CORP").unwrap();
        assert_eq!(m.category, "Food");
        assert_eq!(m.subcategory.as_deref(), Some("Dining"));
        assert_eq!(m.kind, MatchKind::Keyword);
    }

    #[test]
    fn test_first_match_wins_is_deterministic() {
        let catalog = CategoryCatalog::builtin();
        for _ in 0..3 {
            let m = catalog.match_description("GRAB *RIDE MANILA").unwrap();
            assert_eq!(m.category, "Transport");
        }
    }

    #[test]
    fn test_no_match_returns_none() {
        let catalog = CategoryCatalog::builtin();
        assert!(catalog.match_description("ZZQX 00912").is_none());
    }

    #[test]
    fn test_regex_rule_takes_priority() {
        let mut catalog = CategoryCatalog::builtin();
        catalog.add_pattern("Healthcare", r"^dr\.\s").unwrap();
        let m = catalog.match_description("Dr. Santos consultation").unwrap();
        assert_eq!(m.category, "Healthcare");
        assert_eq!(m.kind, MatchKind::Rule);
    }

    #[test]
    fn test_bucket_membership() {
        let catalog = CategoryCatalog::builtin();
        let needs = catalog.categories_in_bucket(Bucket::Needs);
        assert!(needs.contains(&"Food".to_string()));
        assert!(needs.contains(&"Utilities".to_string()));
        assert!(!needs.contains(&"Entertainment".to_string()));
    }
}
