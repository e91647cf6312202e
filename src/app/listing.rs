//! Document listing extraction
//!
//! The portal's search-result page embeds its data as a JavaScript model
//! rather than exposing a JSON endpoint. Extraction is kept behind a trait so
//! a portal with a different page format only needs a new extractor, not a
//! new pipeline.

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::app::client::PortalClient;
use crate::app::models::DocumentDescriptor;
use crate::constants::portal;
use crate::errors::{ListingError, ListingResult};

/// Fetch the listing page and extract its document descriptors
///
/// A listing that cannot be fetched after retries is fatal for the run;
/// there is nothing to download without it.
pub async fn fetch_listing(
    client: &PortalClient,
    listing_url: &str,
    extractor: &dyn ListingExtractor,
) -> ListingResult<Vec<DocumentDescriptor>> {
    info!("Fetching listing page: {}", listing_url);
    let body = client.get_text(listing_url).await?;
    let documents = extractor.extract(&body)?;
    info!("Found {} documents in listing", documents.len());
    Ok(documents)
}

/// Turns a listing page body into document descriptors
pub trait ListingExtractor: Send + Sync {
    /// Extract all document descriptors from the page body
    fn extract(&self, body: &str) -> ListingResult<Vec<DocumentDescriptor>>;
}

/// Extractor for listings embedded as a JavaScript `var model = {...};` blob
///
/// The model carries an array of row objects; the field names of interest
/// vary between portal deployments and are configurable.
#[derive(Debug)]
pub struct EmbeddedModelExtractor {
    pattern: Regex,
    rows_key: String,
    id_field: String,
    reference_field: String,
    type_field: String,
}

impl Default for EmbeddedModelExtractor {
    fn default() -> Self {
        Self::new(
            portal::ROWS_KEY,
            portal::ID_FIELD,
            portal::REFERENCE_FIELD,
            portal::TYPE_FIELD,
        )
    }
}

impl EmbeddedModelExtractor {
    /// Create an extractor with portal-specific field names
    pub fn new(rows_key: &str, id_field: &str, reference_field: &str, type_field: &str) -> Self {
        Self {
            // The pattern is a compile-time constant; a bad one is a bug,
            // not a runtime condition.
            pattern: Regex::new(portal::MODEL_PATTERN).expect("model pattern must compile"),
            rows_key: rows_key.to_string(),
            id_field: id_field.to_string(),
            reference_field: reference_field.to_string(),
            type_field: type_field.to_string(),
        }
    }

    fn descriptor_from_row(&self, row: &Value) -> Option<DocumentDescriptor> {
        let id = row.get(&self.id_field)?.as_str()?;
        let reference = row.get(&self.reference_field)?.as_str()?;
        let doc_type = row
            .get(&self.type_field)
            .and_then(Value::as_str)
            .unwrap_or_default();

        Some(DocumentDescriptor::new(id, reference, doc_type))
    }
}

impl ListingExtractor for EmbeddedModelExtractor {
    fn extract(&self, body: &str) -> ListingResult<Vec<DocumentDescriptor>> {
        let captures = self
            .pattern
            .captures(body)
            .ok_or(ListingError::ModelNotFound)?;

        let model: Value = serde_json::from_str(&captures[1])?;

        let rows = model
            .get(&self.rows_key)
            .and_then(Value::as_array)
            .ok_or_else(|| ListingError::MissingRows {
                key: self.rows_key.clone(),
            })?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            match self.descriptor_from_row(row) {
                Some(descriptor) => documents.push(descriptor),
                None => warn!(
                    "Skipping listing row without '{}'/'{}' fields",
                    self.id_field, self.reference_field
                ),
            }
        }

        debug!("Extracted {} documents from listing page", documents.len());
        Ok(documents)
    }
}
