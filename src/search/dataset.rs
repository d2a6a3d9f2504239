//! Local directory dataset / 本地目录数据集
//!
//! The instant local results are filtered from this list. It is loaded once
//! at start-up from `dataset.path`, falling back to the built-in seed entries.

use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::models::{retain_identified, DirectoryEntry};

static SEED: Lazy<Vec<DirectoryEntry>> = Lazy::new(|| {
    vec![
        DirectoryEntry {
            url: "https://www.2merkato.com/directory/41254-midea".to_string(),
            company_name: "K.MIKEDEM GENERAL IMPORT & EXPORT".to_string(),
            logo_url: Some("https://www.2merkato.com/images/mtree/listings/m/38481.jpg".to_string()),
            phone_main: Some("+251 99 0171 211".to_string()),
            location: Some("Bole Medhanialem, Addis Ababa".to_string()),
            primary_category: Some("Electro-Mechanical Appliances".to_string()),
            website: Some("https://kmikedem.com".to_string()),
            email: Some("MideaB2B@outlook.com".to_string()),
            description_full: Some(
                "Established in 1995, K.Mikedem is an Ethiopian company engaged in export, import, \
                 real estate, and food processing."
                    .to_string(),
            ),
            products_and_services: vec![
                "https://www.2merkato.com/images/mtree/listings/s/38483.png".to_string(),
                "https://www.2merkato.com/images/mtree/listings/s/38484.jpg".to_string(),
            ],
        },
        DirectoryEntry {
            url: "https://www.2merkato.com/directory/41278-lubaba-granite-marble-and-art-stone".to_string(),
            company_name: "LUBABA GRANITE MARBLE & ART STONE".to_string(),
            logo_url: Some("https://www.2merkato.com/images/mtree/listings/m/38830.jpg".to_string()),
            phone_main: Some("09 66 702 367".to_string()),
            location: Some("Tulu dimtu alem bank, Addis Ababa".to_string()),
            primary_category: Some("Building Materials".to_string()),
            website: Some("N/A".to_string()),
            email: Some("Lubabaeibre2367@Gmail.com".to_string()),
            description_full: Some(
                "Lubaba Granite Marble and Art Stone is a client-focused company in Addis Ababa, \
                 specializing in finishing work and construction materials."
                    .to_string(),
            ),
            products_and_services: vec![
                "https://www.2merkato.com/images/mtree/listings/s/38831.jpg".to_string(),
                "https://www.2merkato.com/images/mtree/listings/s/38832.jpg".to_string(),
            ],
        },
        DirectoryEntry {
            url: "https://www.2merkato.com/directory/41049-eureka-consulting-services-pvtltdco".to_string(),
            company_name: "EUREKA CONSULTING SERVICES".to_string(),
            logo_url: Some("https://www.2merkato.com/images/mtree/listings/m/35667.png".to_string()),
            phone_main: Some("(+251)-911-51-62-62".to_string()),
            location: Some("Gullele Sub City, Addis Ababa".to_string()),
            primary_category: Some("Consultancy".to_string()),
            website: Some("N/A".to_string()),
            email: Some("N/A".to_string()),
            description_full: Some(
                "Eureka Consulting Services Pvt.Ltd.Co. was established in 2010 according to the \
                 Ethiopian trade law."
                    .to_string(),
            ),
            products_and_services: Vec::new(),
        },
    ]
});

/// Built-in seed entries / 内置示例数据
pub fn seed_entries() -> Vec<DirectoryEntry> {
    SEED.clone()
}

/// Load the dataset from a JSON array file, or the seed entries / 加载数据集
pub fn load_dataset(path: &Path) -> Arc<Vec<DirectoryEntry>> {
    if !path.exists() {
        tracing::info!("Dataset file {:?} not found, using {} seed entries", path, SEED.len());
        return Arc::new(seed_entries());
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| {
            serde_json::from_str::<Vec<DirectoryEntry>>(&content).map_err(|e| e.to_string())
        });

    match parsed {
        Ok(entries) => {
            let (entries, dropped) = retain_identified(entries);
            if dropped > 0 {
                tracing::warn!("Dropped {} dataset entries without a unique url", dropped);
            }
            tracing::info!("Loaded {} directory entries from {:?}", entries.len(), path);
            Arc::new(entries)
        }
        Err(e) => {
            tracing::warn!("Failed to load dataset {:?}: {}, using seed entries", path, e);
            Arc::new(seed_entries())
        }
    }
}
