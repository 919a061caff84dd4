//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::domain::ports::{
    validate_object_path, BulkParcelResult, Consignment, CourierClient, ObjectStorage,
    ParcelRequest, StoredObject,
};
use crate::error::{CourierError, StorageError};

// ============================================================================
// Mock Courier Client
// ============================================================================

/// Courier double: books every parcel and reports configurable statuses.
///
/// Status lookups by consignment id, invoice or tracking code all read the
/// same table and default to `in_review`.
pub struct MockCourierClient {
    statuses: RwLock<HashMap<String, String>>,
    unknown: RwLock<HashSet<String>>,
    sent: RwLock<Vec<ParcelRequest>>,
    next_id: AtomicU64,
    balance: f64,
    fail: bool,
}

impl Default for MockCourierClient {
    fn default() -> Self {
        Self {
            statuses: RwLock::new(HashMap::new()),
            unknown: RwLock::new(HashSet::new()),
            sent: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1000),
            balance: 1250.5,
            fail: false,
        }
    }
}

impl MockCourierClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A courier whose every call fails with a 500
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn set_status(&self, key: &str, status: &str) {
        self.statuses
            .write()
            .unwrap()
            .insert(key.to_string(), status.to_string());
    }

    /// Make lookups for `key` answer 404, as Steadfast does for unknown ids
    pub fn forget(&self, key: &str) {
        self.unknown.write().unwrap().insert(key.to_string());
    }

    /// Parcels booked so far, single and bulk
    pub fn sent_parcels(&self) -> Vec<ParcelRequest> {
        self.sent.read().unwrap().clone()
    }

    fn check(&self) -> Result<(), CourierError> {
        if self.fail {
            Err(CourierError::Api {
                status: 500,
                message: "courier unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn status_of(&self, key: &str) -> Result<String, CourierError> {
        self.check()?;
        if self.unknown.read().unwrap().contains(key) {
            return Err(CourierError::Api {
                status: 404,
                message: format!("{} not found", key),
            });
        }
        Ok(self
            .statuses
            .read()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| "in_review".to_string()))
    }

    fn book(&self, parcel: &ParcelRequest) -> (String, String) {
        self.sent.write().unwrap().push(parcel.clone());
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        (id.to_string(), format!("TRK{}", id))
    }
}

#[async_trait]
impl CourierClient for MockCourierClient {
    async fn create_order(&self, parcel: &ParcelRequest) -> Result<Consignment, CourierError> {
        self.check()?;
        let (consignment_id, tracking_code) = self.book(parcel);
        Ok(Consignment {
            consignment_id: Some(consignment_id),
            invoice: parcel.invoice.clone(),
            tracking_code,
            recipient_name: Some(parcel.recipient_name.clone()),
            recipient_phone: Some(parcel.recipient_phone.clone()),
            recipient_address: Some(parcel.recipient_address.clone()),
            cod_amount: Some(parcel.cod_amount),
            status: "in_review".to_string(),
            note: parcel.note.clone(),
        })
    }

    async fn bulk_create_orders(
        &self,
        parcels: &[ParcelRequest],
    ) -> Result<Vec<BulkParcelResult>, CourierError> {
        self.check()?;
        Ok(parcels
            .iter()
            .map(|parcel| {
                let (consignment_id, tracking_code) = self.book(parcel);
                BulkParcelResult {
                    invoice: parcel.invoice.clone(),
                    consignment_id: Some(consignment_id),
                    tracking_code: Some(tracking_code),
                    status: "success".to_string(),
                    error: None,
                }
            })
            .collect())
    }

    async fn status_by_consignment_id(
        &self,
        consignment_id: &str,
    ) -> Result<String, CourierError> {
        self.status_of(consignment_id)
    }

    async fn status_by_invoice(&self, invoice: &str) -> Result<String, CourierError> {
        self.status_of(invoice)
    }

    async fn status_by_tracking_code(&self, tracking_code: &str) -> Result<String, CourierError> {
        self.status_of(tracking_code)
    }

    async fn current_balance(&self) -> Result<f64, CourierError> {
        self.check()?;
        Ok(self.balance)
    }
}

// ============================================================================
// In-Memory Object Storage
// ============================================================================

pub struct InMemoryObjectStorage {
    public_base_url: String,
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl InMemoryObjectStorage {
    pub fn new(public_base_url: &str) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.read().unwrap().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_object_path(path)?;
        let size = bytes.len();
        self.objects
            .write()
            .unwrap()
            .insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(StoredObject {
            path: path.to_string(),
            url: format!("{}/uploads/{}", self.public_base_url, path),
            content_type: content_type.to_string(),
            size,
        })
    }
}
