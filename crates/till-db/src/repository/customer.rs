//! # Customer Repository
//!
//! Customers are kept as one JSON array under the `customers` key of the
//! state table. Every write loads the list, changes it and saves it back.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::state::StateRepository;
use till_core::validation::validate_customer;
use till_core::{Customer, CustomerInput, CUSTOMERS_KEY};

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    state: StateRepository,
}

impl CustomerRepository {
    pub fn new(state: StateRepository) -> Self {
        CustomerRepository { state }
    }

    /// All customers in insertion order.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        Ok(self
            .state
            .get_as::<Vec<Customer>>(CUSTOMERS_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        Ok(self.list().await?.into_iter().find(|c| c.id == id))
    }

    pub async fn create(&self, input: &CustomerInput) -> DbResult<Customer> {
        validate_customer(input)?;

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            email: non_blank(&input.email),
            phone: non_blank(&input.phone),
            document: non_blank(&input.document),
            address: non_blank(&input.address),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, "Creating customer");

        let mut customers = self.list().await?;
        customers.push(customer.clone());
        self.state.put_as(CUSTOMERS_KEY, &customers).await?;

        Ok(customer)
    }

    pub async fn update(&self, id: &str, input: &CustomerInput) -> DbResult<Customer> {
        validate_customer(input)?;

        let mut customers = self.list().await?;
        let customer = customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        customer.name = input.name.trim().to_string();
        customer.email = non_blank(&input.email);
        customer.phone = non_blank(&input.phone);
        customer.document = non_blank(&input.document);
        customer.address = non_blank(&input.address);
        customer.updated_at = Utc::now();
        let updated = customer.clone();

        debug!(id = %id, "Updating customer");
        self.state.put_as(CUSTOMERS_KEY, &customers).await?;

        Ok(updated)
    }

    /// Removes a customer. Sales keep their copy of the customer's name.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut customers = self.list().await?;
        let before = customers.len();
        customers.retain(|c| c.id != id);

        if customers.len() == before {
            return Err(DbError::not_found("Customer", id));
        }

        debug!(id = %id, "Deleting customer");
        self.state.put_as(CUSTOMERS_KEY, &customers).await
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
