use std::sync::Arc;

use stockward_alerts::{Alert, AlertEngine};
use stockward_catalog::{InMemoryProductCatalog, ProductCatalog};
use stockward_core::{OrderId, ProductId, PurchaseId, StockError, StockResult, UserId};
use stockward_ledger::{
    AdjustmentGateway, AdjustmentType, InMemoryMovementStore, Movement, MovementCursor,
    MovementFilter, MovementPage, StockLedger, StockProjection,
};
use stockward_orders::{FulfillmentService, InMemoryOrderStore, Order, OrderLine, OrderStatus};

type Store = Arc<InMemoryMovementStore>;
type Catalog = Arc<InMemoryProductCatalog>;

/// One stock row as served by `GET /stock`: projection joined with the
/// catalog name.
#[derive(Debug, Clone)]
pub struct StockLevel {
    pub projection: StockProjection,
    pub name: Option<String>,
}

/// Aggregate totals for `GET /stock/summary`.
#[derive(Debug, Clone)]
pub struct StockSummary {
    pub product_count: usize,
    pub total_quantity: i64,
    pub low_stock_count: usize,
}

/// Shared service wiring for the HTTP layer.
///
/// All components take the stores as explicit dependencies (no process-wide
/// handles), so tests can stand up a fully isolated instance per case.
pub struct AppServices {
    catalog: Catalog,
    ledger: Arc<StockLedger<Store>>,
    adjustments: AdjustmentGateway<Store>,
    fulfillment: FulfillmentService<Store, Arc<InMemoryOrderStore>>,
    alerts: AlertEngine<Store, Catalog>,
}

impl AppServices {
    pub fn new(catalog: Catalog) -> Self {
        let store: Store = Arc::new(InMemoryMovementStore::new());
        let ledger = Arc::new(StockLedger::new(Arc::clone(&store)));
        let adjustments = AdjustmentGateway::new(Arc::clone(&ledger));
        let fulfillment =
            FulfillmentService::new(Arc::clone(&ledger), Arc::new(InMemoryOrderStore::new()));
        let alerts = AlertEngine::new(Arc::clone(&store), Arc::clone(&catalog));

        Self {
            catalog,
            ledger,
            adjustments,
            fulfillment,
            alerts,
        }
    }

    // --- stock views ---

    pub fn stock_levels(&self) -> Vec<StockLevel> {
        self.ledger
            .projections()
            .into_iter()
            .map(|projection| StockLevel {
                name: self.catalog.get(projection.product_id).map(|p| p.name),
                projection,
            })
            .collect()
    }

    pub fn summary(&self) -> StockSummary {
        let projections = self.ledger.projections();
        StockSummary {
            product_count: projections.len(),
            total_quantity: projections.iter().map(|p| p.quantity).sum(),
            low_stock_count: self.alerts.compute().len(),
        }
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.compute()
    }

    pub fn movements(
        &self,
        product_id: Option<ProductId>,
        limit: usize,
        cursor: Option<MovementCursor>,
    ) -> MovementPage {
        let filter = match product_id {
            Some(id) => MovementFilter::Product(id),
            None => MovementFilter::All,
        };
        self.ledger.movements(filter, limit, cursor)
    }

    pub fn audit(&self) -> Vec<(ProductId, StockError)> {
        self.ledger.verify_all()
    }

    // --- stock writes ---

    pub fn adjust(
        &self,
        product_id: ProductId,
        quantity: i64,
        adjustment_type: AdjustmentType,
        notes: String,
        user_id: UserId,
    ) -> StockResult<Movement> {
        self.require_product(product_id)?;
        self.adjustments
            .adjust(product_id, quantity, adjustment_type, notes, user_id)
    }

    pub fn initialize(
        &self,
        product_id: ProductId,
        quantity: i64,
        user_id: UserId,
    ) -> StockResult<Movement> {
        self.require_product(product_id)?;
        self.ledger.initialize(product_id, quantity, user_id)
    }

    pub fn receive(
        &self,
        product_id: ProductId,
        quantity: i64,
        purchase_id: PurchaseId,
        notes: String,
        user_id: UserId,
    ) -> StockResult<Movement> {
        self.require_product(product_id)?;
        self.ledger
            .receive(product_id, quantity, purchase_id, notes, user_id)
    }

    // --- orders ---

    pub fn create_order(
        &self,
        buyer: String,
        lines: Vec<OrderLine>,
        user_id: UserId,
    ) -> StockResult<Order> {
        for line in &lines {
            self.require_product(line.product_id)?;
        }
        self.fulfillment.create_order(buyer, lines, user_id)
    }

    pub fn update_order_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        user_id: UserId,
    ) -> StockResult<Order> {
        self.fulfillment.update_status(order_id, status, user_id)
    }

    pub fn get_order(&self, order_id: OrderId) -> StockResult<Order> {
        self.fulfillment.get(order_id)
    }

    pub fn list_orders(&self) -> Vec<Order> {
        self.fulfillment.list()
    }

    fn require_product(&self, product_id: ProductId) -> StockResult<()> {
        if self.catalog.get(product_id).is_none() {
            return Err(StockError::not_found(format!(
                "product {product_id} not in catalog"
            )));
        }
        Ok(())
    }
}
