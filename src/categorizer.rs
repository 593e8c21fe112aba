//! Categorization engine.
//!
//! Expenses are classified in batches of five. Each batch is keyed by a
//! content hash and served from the result store when possible; otherwise
//! the remote classifier is asked, and any item it cannot answer for falls
//! back to keyword rules. The engine itself never fails: every expense
//! comes back with some catalog category, worst case the catch-all.

use rusqlite::Connection;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::classifier::{Availability, ClassifierClient};
use crate::db;
use crate::models::{CategorizedExpense, Expense};
use crate::progress::ProgressSink;

pub const BATCH_SIZE: usize = 5;

// Built-in fallback keywords per category, merged with whatever the catalog
// descriptions mention. First matching category in catalog order wins.
const COMMON_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Food",
        &[
            "restaurant", "food", "cafe", "pizza", "burger", "meal", "lunch", "dinner",
            "breakfast", "bakery", "grocery", "swiggy", "zomato",
        ],
    ),
    (
        "Transport",
        &[
            "uber", "ola", "taxi", "cab", "auto", "bus", "train", "metro", "petrol", "diesel",
            "fuel", "parking",
        ],
    ),
    (
        "Shopping",
        &["amazon", "flipkart", "myntra", "store", "mall", "shop", "purchase", "buy"],
    ),
    (
        "Bills",
        &[
            "bill", "payment", "electricity", "water", "gas", "internet", "wifi", "broadband",
            "recharge", "mobile",
        ],
    ),
    (
        "Entertainment",
        &[
            "movie", "theatre", "cinema", "concert", "show", "game", "netflix", "prime",
            "hotstar", "subscription",
        ],
    ),
    (
        "Health",
        &[
            "hospital", "doctor", "medicine", "medical", "pharmacy", "health", "clinic",
            "dental", "fitness",
        ],
    ),
    (
        "Education",
        &["school", "college", "university", "course", "class", "tuition", "book", "stationery"],
    ),
    (
        "Home & Tax",
        &[
            "rent", "maintenance", "repair", "furniture", "appliance", "tax", "insurance",
            "emi", "loan",
        ],
    ),
    ("Extra", &["gift", "donation", "charity", "other", "miscellaneous"]),
];

pub struct CategorizeOutcome {
    pub expenses: Vec<CategorizedExpense>,
    pub cached_batches: usize,
    pub degraded: bool,
}

pub struct Categorizer<'a> {
    conn: &'a Connection,
    client: ClassifierClient,
    catalog: &'a Catalog,
    availability: Availability,
}

impl<'a> Categorizer<'a> {
    pub fn new(conn: &'a Connection, client: ClassifierClient, catalog: &'a Catalog) -> Self {
        Self {
            conn,
            client,
            catalog,
            availability: Availability::Untested,
        }
    }

    /// Probe the classifier on first use; later batches reuse the verdict
    /// so an unreachable server costs one slow call per run, not one per
    /// batch.
    fn availability(&mut self) -> Availability {
        if self.availability == Availability::Untested {
            self.availability = if self.client.probe() {
                Availability::Available
            } else {
                info!("classifier unavailable, using keyword fallback");
                Availability::Unavailable
            };
        }
        self.availability
    }

    /// Categorize every expense, order-preserving. Never fails.
    pub fn categorize(
        &mut self,
        expenses: &[Expense],
        force_recategorize: bool,
        progress: &dyn ProgressSink,
    ) -> CategorizeOutcome {
        let mut outcome = CategorizeOutcome {
            expenses: Vec::with_capacity(expenses.len()),
            cached_batches: 0,
            degraded: false,
        };
        if expenses.is_empty() {
            return outcome;
        }

        let batches: Vec<&[Expense]> = expenses.chunks(BATCH_SIZE).collect();
        let total = batches.len();
        for (index, batch) in batches.iter().enumerate() {
            progress.update(
                &format!("Categorizing expenses ({}/{total} batches)", index + 1),
                index as f64 / total as f64 * 100.0,
            );

            let key = batch_key(batch);
            if !force_recategorize {
                if let Some(cached) = db::get_cached(self.conn, &key) {
                    if cached.len() == batch.len() {
                        debug!("batch {} served from cache ({})", index + 1, &key[..8]);
                        outcome.expenses.extend(cached);
                        outcome.cached_batches += 1;
                        continue;
                    }
                    warn!("cache entry {} has wrong arity, reclassifying", &key[..8]);
                }
            }

            let result = match self.availability() {
                Availability::Available => match self.classify_batch(batch) {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("classifier gave up on batch {}: {e:#}", index + 1);
                        outcome.degraded = true;
                        self.fallback_batch(batch)
                    }
                },
                _ => {
                    outcome.degraded = true;
                    self.fallback_batch(batch)
                }
            };

            if let Err(e) = db::save_cached(self.conn, &key, &result) {
                warn!("could not cache batch result: {e}");
            }
            outcome.expenses.extend(result);
        }

        progress.update(
            &format!("Categorized {} expenses", outcome.expenses.len()),
            100.0,
        );
        outcome
    }

    fn classify_batch(&self, batch: &[Expense]) -> anyhow::Result<Vec<CategorizedExpense>> {
        let prompt = build_prompt(batch, self.catalog);
        let items = self.client.classify(&prompt)?;

        // Replies align positionally with the batch. Anything missing or
        // outside the catalog is reassigned by keyword rules, per item.
        let mut out = Vec::with_capacity(batch.len());
        for (i, expense) in batch.iter().enumerate() {
            let category = items
                .get(i)
                .and_then(|item| self.catalog.resolve(&item.category))
                .map(str::to_string)
                .unwrap_or_else(|| {
                    debug!("classifier reply unusable for '{}'", expense.description);
                    self.fallback_category(expense)
                });
            out.push(CategorizedExpense {
                description: expense.description.clone(),
                category,
                amount: expense.amount,
            });
        }
        Ok(out)
    }

    fn fallback_batch(&self, batch: &[Expense]) -> Vec<CategorizedExpense> {
        batch
            .iter()
            .map(|expense| CategorizedExpense {
                description: expense.description.clone(),
                category: self.fallback_category(expense),
                amount: expense.amount,
            })
            .collect()
    }

    /// First catalog category with a keyword hit, else the catch-all.
    fn fallback_category(&self, expense: &Expense) -> String {
        let description = expense.description.to_lowercase();
        for category in self.catalog.categories() {
            let derived = category
                .description
                .to_lowercase()
                .split(',')
                .map(|k| k.trim().to_string())
                .collect::<Vec<_>>();
            let builtin = COMMON_KEYWORDS
                .iter()
                .find(|(name, _)| *name == category.name)
                .map(|(_, kws)| *kws)
                .unwrap_or(&[]);
            let hit = derived
                .iter()
                .map(String::as_str)
                .chain(builtin.iter().copied())
                .any(|kw| !kw.is_empty() && description.contains(kw));
            if hit {
                return category.name.clone();
            }
        }
        self.catalog.catch_all().to_string()
    }
}

/// Deterministic content hash of a batch: canonical serialization with
/// alphabetical field order, SHA-256, hex.
pub fn batch_key(batch: &[Expense]) -> String {
    #[derive(Serialize)]
    struct CanonicalItem<'a> {
        amount: f64,
        description: &'a str,
    }

    let canonical: Vec<CanonicalItem> = batch
        .iter()
        .map(|e| CanonicalItem {
            amount: e.amount,
            description: &e.description,
        })
        .collect();
    // In-memory serialization of plain data cannot fail
    let json = serde_json::to_string(&canonical).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    hex::encode(hasher.finalize())
}

fn build_prompt(batch: &[Expense], catalog: &Catalog) -> String {
    #[derive(Serialize)]
    struct PromptItem<'a> {
        description: &'a str,
        amount: f64,
    }

    let items: Vec<PromptItem> = batch
        .iter()
        .map(|e| PromptItem {
            description: &e.description,
            amount: e.amount,
        })
        .collect();
    let expenses = serde_json::to_string(&items).unwrap_or_default();
    let categories = catalog
        .categories()
        .iter()
        .map(|c| format!("- {}: {}", c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Please categorize the following expenses into appropriate categories:\n\n\
         Expenses:\n{expenses}\n\n\
         Available categories:\n{categories}\n\n\
         Return the results in JSON format where each expense has a \
         'description' and 'category' field."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::RetryPolicy;
    use crate::progress::NoopProgress;
    use std::time::Duration;

    fn test_conn() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = db::get_connection(&dir.path().join("test.db")).unwrap();
        db::init_db(&conn).unwrap();
        (dir, conn)
    }

    fn dead_client() -> ClassifierClient {
        // Port 1 refuses immediately; zero-delay retry keeps tests fast
        ClassifierClient::new("http://127.0.0.1:1", "llama3").with_retry(RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(0),
        })
    }

    fn expense(description: &str, amount: f64) -> Expense {
        Expense {
            description: description.to_string(),
            amount,
        }
    }

    #[test]
    fn test_unavailable_classifier_falls_back_for_every_item() {
        let (_dir, conn) = test_conn();
        let catalog = Catalog::default_catalog();
        let mut engine = Categorizer::new(&conn, dead_client(), &catalog);

        let expenses = vec![
            expense("Swiggy order", 240.0),
            expense("Uber trip", 180.0),
            expense("Mystery vendor", 99.0),
        ];
        let outcome = engine.categorize(&expenses, false, &NoopProgress);
        assert_eq!(outcome.expenses.len(), 3);
        assert!(outcome.degraded);
        assert_eq!(outcome.expenses[0].category, "Food");
        assert_eq!(outcome.expenses[1].category, "Transport");
        assert_eq!(outcome.expenses[2].category, "Extra");
    }

    #[test]
    fn test_totality_on_awkward_inputs() {
        let (_dir, conn) = test_conn();
        let catalog = Catalog::default_catalog();
        let mut engine = Categorizer::new(&conn, dead_client(), &catalog);

        let expenses = vec![
            expense("", 0.0),
            expense("कैफ़े कॉफ़ी डे", -15.0),
            expense("🍕🍕🍕", 1.0e9),
        ];
        let outcome = engine.categorize(&expenses, false, &NoopProgress);
        assert_eq!(outcome.expenses.len(), expenses.len());
        for (i, categorized) in outcome.expenses.iter().enumerate() {
            assert_eq!(categorized.description, expenses[i].description);
            assert!(catalog.resolve(&categorized.category).is_some());
        }
    }

    #[test]
    fn test_warm_cache_makes_no_remote_calls() {
        let (_dir, conn) = test_conn();
        let catalog = Catalog::default_catalog();

        let expenses = vec![expense("Amazon", 450.0), expense("Zomato", 250.0)];
        let key = batch_key(&expenses);
        let cached = vec![
            CategorizedExpense {
                description: "Amazon".to_string(),
                category: "Shopping".to_string(),
                amount: 450.0,
            },
            CategorizedExpense {
                description: "Zomato".to_string(),
                category: "Food".to_string(),
                amount: 250.0,
            },
        ];
        db::save_cached(&conn, &key, &cached).unwrap();

        let mut engine = Categorizer::new(&conn, dead_client(), &catalog);
        let outcome = engine.categorize(&expenses, false, &NoopProgress);
        assert_eq!(outcome.expenses, cached);
        assert_eq!(outcome.cached_batches, 1);
        assert!(!outcome.degraded);
        // The probe never ran: the cache satisfied the whole run
        assert_eq!(engine.availability, Availability::Untested);
    }

    #[test]
    fn test_force_recategorize_bypasses_cache() {
        let (_dir, conn) = test_conn();
        let catalog = Catalog::default_catalog();

        let expenses = vec![expense("Swiggy order", 240.0)];
        let key = batch_key(&expenses);
        db::save_cached(
            &conn,
            &key,
            &[CategorizedExpense {
                description: "Swiggy order".to_string(),
                category: "Extra".to_string(),
                amount: 240.0,
            }],
        )
        .unwrap();

        let mut engine = Categorizer::new(&conn, dead_client(), &catalog);
        let outcome = engine.categorize(&expenses, true, &NoopProgress);
        // Recomputed by keyword fallback, not read from the stale entry
        assert_eq!(outcome.expenses[0].category, "Food");
    }

    #[test]
    fn test_results_are_cached_for_next_run() {
        let (_dir, conn) = test_conn();
        let catalog = Catalog::default_catalog();

        let expenses = vec![expense("Uber trip", 180.0)];
        {
            let mut engine = Categorizer::new(&conn, dead_client(), &catalog);
            engine.categorize(&expenses, false, &NoopProgress);
        }
        let cached = db::get_cached(&conn, &batch_key(&expenses)).unwrap();
        assert_eq!(cached[0].category, "Transport");
    }

    #[test]
    fn test_order_preserved_across_batches() {
        let (_dir, conn) = test_conn();
        let catalog = Catalog::default_catalog();
        let mut engine = Categorizer::new(&conn, dead_client(), &catalog);

        let expenses: Vec<Expense> = (0..12).map(|i| expense(&format!("vendor {i}"), i as f64 + 1.0)).collect();
        let outcome = engine.categorize(&expenses, false, &NoopProgress);
        assert_eq!(outcome.expenses.len(), 12);
        for (i, categorized) in outcome.expenses.iter().enumerate() {
            assert_eq!(categorized.description, format!("vendor {i}"));
        }
    }

    #[test]
    fn test_progress_reported_per_batch() {
        use crate::progress::testing::RecordingProgress;

        let (_dir, conn) = test_conn();
        let catalog = Catalog::default_catalog();
        let mut engine = Categorizer::new(&conn, dead_client(), &catalog);

        let expenses: Vec<Expense> = (0..7).map(|i| expense(&format!("v{i}"), 1.0)).collect();
        let progress = RecordingProgress::default();
        engine.categorize(&expenses, false, &progress);

        let updates = progress.updates.lock().unwrap();
        // Two batches plus the completion update
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].1, 0.0);
        assert_eq!(updates[1].1, 50.0);
        assert_eq!(updates[2].1, 100.0);
    }

    #[test]
    fn test_batch_key_is_content_sensitive() {
        let a = vec![expense("Amazon", 450.0)];
        let b = vec![expense("Amazon", 451.0)];
        let c = vec![expense("Amazon", 450.0)];
        assert_ne!(batch_key(&a), batch_key(&b));
        assert_eq!(batch_key(&a), batch_key(&c));
    }

    #[test]
    fn test_fallback_prefers_catalog_order() {
        let (_dir, conn) = test_conn();
        let catalog = Catalog::default_catalog();
        let engine = Categorizer::new(&conn, dead_client(), &catalog);
        // "food court parking" hits Food before Transport
        assert_eq!(engine.fallback_category(&expense("food court parking", 50.0)), "Food");
    }

    #[test]
    fn test_fallback_uses_catalog_derived_keywords() {
        use crate::catalog::Category;

        let (_dir, conn) = test_conn();
        let catalog = Catalog::from_categories(vec![Category {
            name: "Pets".to_string(),
            description: "vet, kennel, pet food".to_string(),
        }]);
        let engine = Categorizer::new(&conn, dead_client(), &catalog);
        assert_eq!(engine.fallback_category(&expense("City Kennel Club", 400.0)), "Pets");
        assert_eq!(engine.fallback_category(&expense("Unrelated", 10.0)), "Extra");
    }
}
