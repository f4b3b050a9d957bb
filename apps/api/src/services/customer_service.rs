//! Customer management.

use tracing::info;
use ventas_core::validation::{
    validate_customer_update, validate_new_customer, validate_pagination, validate_search_query,
};
use ventas_core::{CoreError, Customer, CustomerUpdate, NewCustomer, Order};
use ventas_db::{CustomerFilter, CustomerRepository, OrderFilter};

use crate::error::ServiceResult;
use crate::services::OrderService;

#[derive(Clone)]
pub struct CustomerService {
    customers: CustomerRepository,
    orders: OrderService,
}

impl CustomerService {
    pub fn new(customers: CustomerRepository, orders: OrderService) -> Self {
        CustomerService { customers, orders }
    }

    pub async fn create(&self, input: &NewCustomer) -> ServiceResult<Customer> {
        validate_new_customer(input)?;
        let customer = self.customers.insert(input).await?;
        info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Customer> {
        self.customers
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Customer", id).into())
    }

    pub async fn list(&self, mut filter: CustomerFilter) -> ServiceResult<Vec<Customer>> {
        validate_pagination(filter.limit, filter.offset)?;
        filter.search = match filter.search.as_deref() {
            Some(query) => Some(validate_search_query(query)?).filter(|q| !q.is_empty()),
            None => None,
        };
        Ok(self.customers.list(&filter).await?)
    }

    pub async fn update(&self, id: i64, changes: &CustomerUpdate) -> ServiceResult<Customer> {
        validate_customer_update(changes)?;
        let customer = self.customers.update(id, changes).await?;
        info!(customer_id = %id, "Customer updated");
        Ok(customer)
    }

    /// Soft delete. Existing orders keep their customer.
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.customers.soft_delete(id).await?;
        info!(customer_id = %id, "Customer deactivated");
        Ok(())
    }

    /// Orders of one customer, newest first.
    pub async fn orders(&self, id: i64, limit: i64, offset: i64) -> ServiceResult<Vec<Order>> {
        self.get(id).await?;
        self.orders
            .list(&OrderFilter {
                customer_id: Some(id),
                limit,
                offset,
                ..Default::default()
            })
            .await
    }
}
