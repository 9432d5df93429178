//! Credit package catalog.
//!
//! Packages are static reference data, not ledger state. The catalog ships
//! with a default set and can be replaced wholesale from configuration.

use serde::{Deserialize, Serialize};

/// A purchasable credit package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditPackage {
    /// Catalog identifier, e.g. `"starter"`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Credits granted on confirmed purchase.
    pub credits_amount: u64,
    /// Price in euro cents.
    pub price_cents: u64,
    /// Highlighted in the storefront.
    pub featured: bool,
    /// Whether the package can currently be bought.
    pub active: bool,
}

/// The set of packages on offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageCatalog {
    /// All catalog entries, including inactive ones.
    pub packages: Vec<CreditPackage>,
}

impl PackageCatalog {
    /// Look up a package by id, active or not.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CreditPackage> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// Look up a package that can currently be bought.
    #[must_use]
    pub fn get_active(&self, id: &str) -> Option<&CreditPackage> {
        self.get(id).filter(|p| p.active)
    }

    /// All packages currently on offer.
    pub fn active(&self) -> impl Iterator<Item = &CreditPackage> {
        self.packages.iter().filter(|p| p.active)
    }
}

impl Default for PackageCatalog {
    fn default() -> Self {
        Self {
            packages: vec![
                CreditPackage {
                    id: "starter".into(),
                    name: "Starter".into(),
                    credits_amount: 500,
                    price_cents: 499,
                    featured: false,
                    active: true,
                },
                CreditPackage {
                    id: "popular".into(),
                    name: "Popular".into(),
                    credits_amount: 1200,
                    price_cents: 999,
                    featured: true,
                    active: true,
                },
                CreditPackage {
                    id: "pro".into(),
                    name: "Pro".into(),
                    credits_amount: 3000,
                    price_cents: 2199,
                    featured: false,
                    active: true,
                },
                CreditPackage {
                    id: "whale".into(),
                    name: "VIP".into(),
                    credits_amount: 10_000,
                    price_cents: 5999,
                    featured: false,
                    active: true,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_lookup() {
        let catalog = PackageCatalog::default();
        let starter = catalog.get("starter").unwrap();
        assert_eq!(starter.credits_amount, 500);
        assert!(catalog.get("nonexistent").is_none());
    }

    #[test]
    fn inactive_packages_are_not_buyable() {
        let mut catalog = PackageCatalog::default();
        catalog.packages[0].active = false;

        let id = catalog.packages[0].id.clone();
        assert!(catalog.get(&id).is_some());
        assert!(catalog.get_active(&id).is_none());
    }

    #[test]
    fn active_iterates_buyable_only() {
        let mut catalog = PackageCatalog::default();
        let total = catalog.packages.len();
        catalog.packages[1].active = false;

        assert_eq!(catalog.active().count(), total - 1);
    }
}
