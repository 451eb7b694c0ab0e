//! Integration tests for the Atelier storefront.
//!
//! Every test builds a [`Storefront`] over an [`InMemoryGateway`] seeded with
//! a small catalog, so the suite runs without network access.
//! [`ContendedGateway`] wraps it to make conditional writes lose races on
//! demand.
//!
//! # Running Tests
//!
//! ```bash
//! RUST_LOG=atelier_storefront=debug cargo test -p atelier-integration-tests
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use atelier_core::{Price, ProductId, RecordId};
use atelier_storefront::config::PaymentConfig;
use atelier_storefront::gateway::{
    CreateResult, FetchQuery, GatewayError, InMemoryGateway, Record, RecordGateway, UniqueCreate,
};
use atelier_storefront::mapper::product::{TABLE, product_record};
use atelier_storefront::models::{Product, ShippingAddress};
use atelier_storefront::Storefront;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A product with sensible defaults for the given name, category and price.
#[must_use]
pub fn product(name: &str, category: &str, cents: i64) -> Product {
    Product {
        id: ProductId::new(0),
        name: name.to_string(),
        description: format!("{name} in washed cotton"),
        price: Price::from_cents(cents),
        category: category.to_string(),
        subcategory: String::new(),
        images: vec![format!("https://cdn.atelier.test/{}.jpg", name.to_lowercase())],
        sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
        colors: vec!["Black".to_string(), "Sand".to_string()],
        stock: 12,
        featured: false,
    }
}

/// The default catalog. Seeded in order, so IDs run 1 through 7.
#[must_use]
pub fn catalog() -> Vec<Product> {
    let mut tee = product("Boxy Tee", "Tops", 2900);
    tee.sizes = vec!["XS".to_string(), "S".to_string()];
    let mut shirt = product("Linen Shirt", "Tops", 6400);
    shirt.featured = true;
    shirt.colors = vec!["White".to_string()];
    let mut slip = product("Slip Dress", "Dresses", 11000);
    slip.featured = true;

    vec![
        tee,
        shirt,
        product("Wrap Dress", "Dresses", 8950),
        product("alpine Knit", "Knitwear", 12500),
        slip,
        product("Cropped Cardigan", "Knitwear", 7800),
        product("Pleated Skirt", "Bottoms", 5600),
    ]
}

/// A storefront over a fresh in-memory gateway with payments that always
/// succeed immediately.
pub struct TestStore {
    pub gateway: Arc<InMemoryGateway>,
    pub store: Storefront,
    pub products: Vec<ProductId>,
    payment: PaymentConfig,
}

impl TestStore {
    /// Seed [`catalog`] and build the services.
    pub async fn new() -> Self {
        Self::with_payments(PaymentConfig {
            delay: Duration::ZERO,
            success_rate: 1.0,
        })
        .await
    }

    /// Seed [`catalog`] and build the services with custom payment settings.
    pub async fn with_payments(payment: PaymentConfig) -> Self {
        init_tracing();
        let gateway = Arc::new(InMemoryGateway::new());
        let records = catalog().iter().map(product_record).collect();
        let products = gateway
            .seed(TABLE, records)
            .await
            .into_iter()
            .map(|id| id.typed::<ProductId>())
            .collect();
        let store = Storefront::new(gateway.clone(), payment);
        Self {
            gateway,
            store,
            products,
            payment,
        }
    }

    /// A second storefront over `gateway`, typically a wrapper of
    /// [`TestStore::gateway`], with the same payment settings.
    #[must_use]
    pub fn over(&self, gateway: Arc<dyn RecordGateway>) -> Storefront {
        Storefront::new(gateway, self.payment)
    }
}

/// Builds the competing write for the row a conditional update targets.
type Interference = Box<dyn Fn(RecordId) -> Record + Send + Sync>;

/// Gateway whose next `losses` conditional updates lose their race.
///
/// Without interference a lost race just reports "not applied". With it, the
/// competing write is stored first and the real conditional update then runs
/// against the changed row, so the caller must re-read to succeed.
pub struct ContendedGateway {
    inner: Arc<InMemoryGateway>,
    losses: AtomicUsize,
    attempts: AtomicUsize,
    interference: Option<Interference>,
}

impl ContendedGateway {
    #[must_use]
    pub fn new(inner: Arc<InMemoryGateway>, losses: usize) -> Self {
        Self {
            inner,
            losses: AtomicUsize::new(losses),
            attempts: AtomicUsize::new(0),
            interference: None,
        }
    }

    /// Land `competing(id)` on the target row before each lost update.
    #[must_use]
    pub fn with_interference(
        mut self,
        competing: impl Fn(RecordId) -> Record + Send + Sync + 'static,
    ) -> Self {
        self.interference = Some(Box::new(competing));
        self
    }

    /// Conditional updates attempted so far, lost or not.
    pub fn conditional_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn take_loss(&self) -> bool {
        self.losses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RecordGateway for ContendedGateway {
    async fn fetch_records(
        &self,
        table: &str,
        query: &FetchQuery,
    ) -> Result<Vec<Record>, GatewayError> {
        self.inner.fetch_records(table, query).await
    }

    async fn get_record_by_id(
        &self,
        table: &str,
        id: RecordId,
        fields: &[String],
    ) -> Result<Option<Record>, GatewayError> {
        self.inner.get_record_by_id(table, id, fields).await
    }

    async fn create_records(
        &self,
        table: &str,
        records: Vec<Record>,
    ) -> Result<Vec<CreateResult>, GatewayError> {
        self.inner.create_records(table, records).await
    }

    async fn create_unique(
        &self,
        table: &str,
        record: Record,
        key_fields: &[&str],
    ) -> Result<UniqueCreate, GatewayError> {
        self.inner.create_unique(table, record, key_fields).await
    }

    async fn update_records(&self, table: &str, records: Vec<Record>) -> Result<(), GatewayError> {
        self.inner.update_records(table, records).await
    }

    async fn update_if(
        &self,
        table: &str,
        record: Record,
        expected: Record,
    ) -> Result<bool, GatewayError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.take_loss() {
            let (Some(competing), Some(id)) = (&self.interference, record.id()) else {
                return Ok(false);
            };
            let mut write = competing(id);
            write.set_id(id);
            self.inner.update_records(table, vec![write]).await?;
        }
        self.inner.update_if(table, record, expected).await
    }

    async fn delete_records(&self, table: &str, ids: &[RecordId]) -> Result<(), GatewayError> {
        self.inner.delete_records(table, ids).await
    }
}

/// A complete shipping address.
#[must_use]
pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Noor Haddad".to_string(),
        email: "noor@atelier.test".to_string(),
        phone: Some("+1 555 0142".to_string()),
        address_line1: "18 Orchard Lane".to_string(),
        address_line2: None,
        city: "Portland".to_string(),
        state: "OR".to_string(),
        postal_code: "97205".to_string(),
        country: "US".to_string(),
    }
}
