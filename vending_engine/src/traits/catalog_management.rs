use crate::{
    db_types::{Member, Product},
    traits::{NewMember, NewProduct, StoreError},
};

/// The member and product rows the engine needs for existence checks and pricing.
///
/// Member registration itself (OAuth onboarding etc.) happens outside the engine; these methods
/// exist for provisioning flows and tests.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_member(&self, member: NewMember) -> Result<Member, StoreError>;

    async fn fetch_member(&self, id: i64) -> Result<Option<Member>, StoreError>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product, StoreError>;

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, StoreError>;
}
