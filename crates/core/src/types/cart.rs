//! Cart line items and the ordered cart collection.
//!
//! [`Cart`] is a plain value: every mutation happens on an owned copy, so a
//! caller can validate, persist and only then publish the new snapshot.
//!
//! The serialized form is a flat JSON array where each element is the
//! product metadata plus an `amount`:
//!
//! ```json
//! [{"id":5,"title":"Shoe","price":"179.9","image":"","amount":1}]
//! ```

use core::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;

/// Errors raised when a cart would violate its invariants.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartIntegrityError {
    /// More than one line item refers to the same product.
    #[error("product {0} appears more than once in the cart")]
    DuplicateProduct(ProductId),
}

/// A product in the cart together with the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(flatten)]
    pub product: Product,
    pub amount: NonZeroU32,
}

impl LineItem {
    /// A fresh line item with amount 1.
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self {
            product,
            amount: NonZeroU32::MIN,
        }
    }

    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product.id
    }

    /// Unit price times amount, saturating at the `Decimal` bounds.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product
            .price
            .saturating_mul(Decimal::from(self.amount.get()))
    }
}

/// Ordered sequence of line items, at most one per product.
///
/// Insertion order is add order and is preserved by every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LineItem>", into = "Vec<LineItem>")]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from line items, rejecting duplicate products.
    ///
    /// # Errors
    ///
    /// Returns `CartIntegrityError::DuplicateProduct` if two items share a
    /// product id.
    pub fn from_items(items: Vec<LineItem>) -> Result<Self, CartIntegrityError> {
        let mut cart = Self::new();
        for item in items {
            if cart.contains(item.product_id()) {
                return Err(CartIntegrityError::DuplicateProduct(item.product_id()));
            }
            cart.items.push(item);
        }
        Ok(cart)
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn iter(&self) -> core::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Number of distinct products.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.get(id).is_some()
    }

    /// Current amount for a product, if it is in the cart.
    #[must_use]
    pub fn amount_of(&self, id: ProductId) -> Option<NonZeroU32> {
        self.get(id).map(|item| item.amount)
    }

    /// Append a product with amount 1.
    ///
    /// # Errors
    ///
    /// Returns `CartIntegrityError::DuplicateProduct` if the product is
    /// already in the cart; the cart is left untouched.
    pub fn push_product(&mut self, product: Product) -> Result<(), CartIntegrityError> {
        if self.contains(product.id) {
            return Err(CartIntegrityError::DuplicateProduct(product.id));
        }
        self.items.push(LineItem::new(product));
        Ok(())
    }

    /// Remove a product, keeping the order of the remaining items.
    pub fn remove(&mut self, id: ProductId) -> Option<LineItem> {
        let index = self.items.iter().position(|item| item.product_id() == id)?;
        Some(self.items.remove(index))
    }

    /// Replace the amount of a product in place.
    ///
    /// Returns `false` (and changes nothing) if the product is not in the cart.
    pub fn set_amount(&mut self, id: ProductId, amount: NonZeroU32) -> bool {
        match self.items.iter_mut().find(|item| item.product_id() == id) {
            Some(item) => {
                item.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.amount.get()))
            .sum()
    }

    /// Sum of all line totals, saturating at the `Decimal` bounds.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(LineItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }
}

impl TryFrom<Vec<LineItem>> for Cart {
    type Error = CartIntegrityError;

    fn try_from(items: Vec<LineItem>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<LineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = core::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn shoe(id: i64) -> Product {
        Product::new(ProductId::new(id), format!("Shoe {id}"))
    }

    fn amount(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn test_push_product_appends_with_amount_one() {
        let mut cart = Cart::new();
        cart.push_product(shoe(5)).unwrap();
        cart.push_product(shoe(2)).unwrap();

        let ids: Vec<_> = cart.iter().map(LineItem::product_id).collect();
        assert_eq!(ids, vec![ProductId::new(5), ProductId::new(2)]);
        assert_eq!(cart.amount_of(ProductId::new(5)), Some(amount(1)));
    }

    #[test]
    fn test_push_product_rejects_duplicate() {
        let mut cart = Cart::new();
        cart.push_product(shoe(5)).unwrap();
        let before = cart.clone();

        let err = cart.push_product(shoe(5)).unwrap_err();
        assert_eq!(err, CartIntegrityError::DuplicateProduct(ProductId::new(5)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut cart = Cart::new();
        for id in [1, 2, 3] {
            cart.push_product(shoe(id)).unwrap();
        }

        let removed = cart.remove(ProductId::new(2)).unwrap();
        assert_eq!(removed.product_id(), ProductId::new(2));

        let ids: Vec<_> = cart.iter().map(|i| i.product_id().as_i64()).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(cart.remove(ProductId::new(2)).is_none());
    }

    #[test]
    fn test_set_amount_only_touches_matching_item() {
        let mut cart = Cart::new();
        for id in [1, 2, 3] {
            cart.push_product(shoe(id)).unwrap();
        }

        assert!(cart.set_amount(ProductId::new(2), amount(4)));
        assert_eq!(cart.items()[0].amount, amount(1));
        assert_eq!(cart.items()[1].amount, amount(4));
        assert_eq!(cart.items()[2].amount, amount(1));
        assert_eq!(cart.items()[1].product_id(), ProductId::new(2));
    }

    #[test]
    fn test_set_amount_unknown_product_is_noop() {
        let mut cart = Cart::new();
        cart.push_product(shoe(1)).unwrap();
        let before = cart.clone();

        assert!(!cart.set_amount(ProductId::new(9), amount(3)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::new();
        cart.push_product(shoe(1).with_price(Decimal::new(1799, 1)))
            .unwrap();
        cart.push_product(shoe(2).with_price(Decimal::new(5000, 2)))
            .unwrap();
        cart.set_amount(ProductId::new(1), amount(2));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Decimal::new(40980, 2));
    }

    #[test]
    fn test_totals_saturate_on_huge_prices() {
        let mut cart = Cart::new();
        cart.push_product(shoe(1).with_price(Decimal::MAX)).unwrap();
        cart.push_product(shoe(2).with_price(Decimal::ONE)).unwrap();
        cart.set_amount(ProductId::new(1), amount(2));

        assert_eq!(cart.items()[0].line_total(), Decimal::MAX);
        assert_eq!(cart.subtotal(), Decimal::MAX);
    }

    #[test]
    fn test_serialized_form_is_flat_array() {
        let mut cart = Cart::new();
        cart.push_product(Product::new(ProductId::new(5), "Shoe"))
            .unwrap();

        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(value[0]["id"], 5);
        assert_eq!(value[0]["title"], "Shoe");
        assert_eq!(value[0]["amount"], 1);
    }

    #[test]
    fn test_reload_reproduces_identical_sequence() {
        let mut cart = Cart::new();
        for id in [3, 1, 2] {
            cart.push_product(shoe(id).with_price(Decimal::new(12345, 2)))
                .unwrap();
        }
        cart.set_amount(ProductId::new(1), amount(7));

        let json = serde_json::to_string(&cart).unwrap();
        let reloaded: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, cart);
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let json = r#"[{"id":1,"title":"a","amount":1},{"id":1,"title":"a","amount":2}]"#;
        assert!(serde_json::from_str::<Cart>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_zero_amount() {
        let json = r#"[{"id":1,"title":"a","amount":0}]"#;
        assert!(serde_json::from_str::<Cart>(json).is_err());
    }
}
