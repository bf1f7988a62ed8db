//! First-run resource directory.
//!
//! The entries are Kenya-focused demo contacts.  Real deployments replace
//! them with verified partners via a remote refresh.

use protectme_shared::ResourceCategory;

use crate::database::Database;
use crate::error::Result;
use crate::models::Resource;

/// The fixed default directory (ids are assigned on insert).
pub fn default_resources() -> Vec<Resource> {
    let entry = |name: &str,
                 category: ResourceCategory,
                 phone: &str,
                 address: &str,
                 coords: Option<(f64, f64)>| Resource {
        id: 0,
        name: name.to_string(),
        category,
        phone: phone.to_string(),
        address: address.to_string(),
        latitude: coords.map(|c| c.0),
        longitude: coords.map(|c| c.1),
        is_open_24h: true,
    };

    vec![
        entry(
            "Nairobi Women's Hospital GVRC – Adams",
            ResourceCategory::GbvCentre,
            "+254 709 667 000",
            "Ngong Rd, Adams Arcade, Nairobi, Kenya",
            Some((-1.2987, 36.7819)),
        ),
        entry(
            "Kenyatta National Hospital – GBV Recovery Centre",
            ResourceCategory::GbvCentre,
            "+254 20 2726300",
            "Hospital Rd, Upper Hill, Nairobi, Kenya",
            Some((-1.3009, 36.8066)),
        ),
        entry(
            "Nairobi Central Police Station",
            ResourceCategory::Police,
            "+254 20 2222222",
            "Moi Avenue, Nairobi, Kenya",
            Some((-1.2841, 36.8252)),
        ),
        entry(
            "Mombasa Rescue Safe House",
            ResourceCategory::SafeHouse,
            "+254 703 000 000",
            "Mombasa Island, Mombasa, Kenya",
            Some((-4.0435, 39.6682)),
        ),
        entry(
            "Kenya National GBV Helpline 1195",
            ResourceCategory::Helpline,
            "+254 780 119 500",
            "24/7 toll-free helpline within Kenya",
            None,
        ),
    ]
}

/// Insert [`default_resources`] when the table is empty.  Returns how many
/// rows were written (zero on every run after the first).
///
/// All rows go in one transaction so an interrupted seed leaves the table
/// empty and the next start seeds again.
pub fn seed_default_resources(db: &Database) -> Result<usize> {
    if db.count_resources()? > 0 {
        return Ok(0);
    }

    let defaults = default_resources();
    let tx = db.conn().unchecked_transaction()?;
    for resource in &defaults {
        db.insert_resource(resource)?;
    }
    tx.commit()?;
    Ok(defaults.len())
}
