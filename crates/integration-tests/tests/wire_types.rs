//! JSON shapes shared between the API and its clients.
//!
//! These need no server and always run.

use kanak_core::{
    MetalType, OrderId, OrderStatus, PaymentFrequency, PaymentMethod, Purity, ReviewStatus,
};
use rust_decimal::Decimal;
use serde_json::json;

#[test]
fn test_enums_use_snake_case() {
    assert_eq!(json!(MetalType::Gold), json!("gold"));
    assert_eq!(json!(Purity::K22), json!("k22"));
    assert_eq!(json!(PaymentMethod::BankTransfer), json!("bank_transfer"));
    assert_eq!(json!(PaymentFrequency::Weekly), json!("weekly"));
    assert_eq!(json!(OrderStatus::Cancelled), json!("cancelled"));
}

#[test]
fn test_ids_are_bare_numbers() {
    assert_eq!(json!(OrderId::new(42)), json!(42));
    let id: OrderId = serde_json::from_value(json!(7)).expect("id parses");
    assert_eq!(id, OrderId::new(7));
}

#[test]
fn test_money_is_a_string() {
    let amount: Decimal = serde_json::from_value(json!("6650.00")).expect("decimal parses");
    assert_eq!(json!(amount), json!("6650.00"));
}

#[test]
fn test_review_leaves_pending_once() {
    let approved = ReviewStatus::Pending
        .transition(ReviewStatus::Approved)
        .expect("pending can be approved");
    assert!(approved.transition(ReviewStatus::Rejected).is_err());
}

#[test]
fn test_terminal_order_states() {
    assert!(OrderStatus::Delivered.is_terminal());
    assert!(OrderStatus::Cancelled.is_terminal());
    assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
}

#[test]
fn test_purity_belongs_to_one_metal() {
    assert_eq!(Purity::Silver925.metal(), MetalType::Silver);
    assert!(!Purity::K18.is_valid_for(MetalType::Platinum));
}
