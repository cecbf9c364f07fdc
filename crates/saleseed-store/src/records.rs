use saleseed_core::Money;

/// Identifier and username of a stored seed account.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AccountRef {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ResellerRef {
    pub id: i64,
    pub account_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

/// Product identifier with the base price needed to price sale items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRef {
    pub id: i64,
    pub sku: String,
    pub base_price: Money,
}
