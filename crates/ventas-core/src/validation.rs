//! # Validation Module
//!
//! Input validation rules for Ventas.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum Json / Query)                          │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services                                                     │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (price > 0, stock >= 0, quantity > 0)           │
//! │  ├── UNIQUE constraints (code, document, email)                        │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use ventas_core::validation::{validate_product_code, validate_quantity};
//!
//! validate_product_code("LAP-001").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{CustomerUpdate, NewCustomer, NewProduct, ProductUpdate};
use crate::{MAX_LINE_QUANTITY, MAX_ORDER_LINES, MAX_PRICE_CENTS, MAX_STOCK, MIN_PASSWORD_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LENGTH: usize = 200;
const MAX_CODE_LENGTH: usize = 50;
const MIN_DOCUMENT_LENGTH: usize = 5;
const MAX_DOCUMENT_LENGTH: usize = 20;
const MAX_EMAIL_LENGTH: usize = 254;
const MAX_NOTES_LENGTH: usize = 1000;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use ventas_core::validation::validate_product_code;
///
/// assert!(validate_product_code("LAP-001").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("LAP 001").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }

    if code.chars().count() > MAX_CODE_LENGTH {
        return Err(ValidationError::too_long("code", MAX_CODE_LENGTH));
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "code",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates a display name (products, customers, users).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::too_long(field, MAX_NAME_LENGTH));
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot and does not start or end with one
/// - No whitespace
///
/// This is a shape check only; deliverability is not verified.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::too_long("email", MAX_EMAIL_LENGTH));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid_format("email", "must not contain spaces"));
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => {
            return Err(ValidationError::invalid_format(
                "email",
                "must contain exactly one @",
            ))
        }
    };

    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(ValidationError::invalid_format(
            "email",
            "must look like name@domain.tld",
        ));
    }

    Ok(())
}

/// Validates a customer identity document number.
///
/// ## Rules
/// - Between 5 and 20 characters
/// - ASCII letters and digits only
pub fn validate_document(document: &str) -> ValidationResult<()> {
    let document = document.trim();

    if document.is_empty() {
        return Err(ValidationError::required("document"));
    }

    let len = document.chars().count();
    if len < MIN_DOCUMENT_LENGTH {
        return Err(ValidationError::TooShort {
            field: "document".to_string(),
            min: MIN_DOCUMENT_LENGTH,
        });
    }
    if len > MAX_DOCUMENT_LENGTH {
        return Err(ValidationError::too_long("document", MAX_DOCUMENT_LENGTH));
    }

    if !document.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::invalid_format(
            "document",
            "must contain only letters and numbers",
        ));
    }

    Ok(())
}

/// Validates a new password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }

    Ok(())
}

/// Validates free-text order notes.
pub fn validate_notes(notes: &str) -> ValidationResult<()> {
    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(ValidationError::too_long("notes", MAX_NOTES_LENGTH));
    }
    Ok(())
}

/// Validates a search query and returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::too_long("query", 100));
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Create Order                                                           │
/// │                                                                         │
/// │  Line: product 7, quantity 0                                            │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       └── OK → Resolve products                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock adjustment quantity.
pub fn validate_stock_delta(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_STOCK {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_STOCK,
        });
    }
    Ok(())
}

/// Validates a price in cents. Zero is not a valid price.
pub fn validate_price(price_cents: i64) -> ValidationResult<()> {
    if price_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price_cents".to_string(),
        });
    }
    if price_cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price_cents".to_string(),
            min: 1,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates an initial stock level.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK).contains(&stock) {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }
    Ok(())
}

/// Validates the number of lines in an order.
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::required("items"));
    }

    if count > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_LINES as i64,
        });
    }

    Ok(())
}

/// Validates pagination parameters.
pub fn validate_pagination(limit: i64, offset: i64) -> ValidationResult<()> {
    if !(1..=500).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: 500,
        });
    }
    if offset < 0 {
        return Err(ValidationError::OutOfRange {
            field: "offset".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every field of a product about to be created.
pub fn validate_new_product(input: &NewProduct) -> ValidationResult<()> {
    validate_product_code(&input.code)?;
    validate_name("name", &input.name)?;
    validate_price(input.price_cents)?;
    validate_stock(input.stock)?;
    Ok(())
}

/// Validates the fields present in a product update.
pub fn validate_product_update(input: &ProductUpdate) -> ValidationResult<()> {
    if let Some(code) = &input.code {
        validate_product_code(code)?;
    }
    if let Some(name) = &input.name {
        validate_name("name", name)?;
    }
    if let Some(price) = input.price_cents {
        validate_price(price)?;
    }
    Ok(())
}

/// Validates every field of a customer about to be created.
pub fn validate_new_customer(input: &NewCustomer) -> ValidationResult<()> {
    validate_document(&input.document)?;
    validate_name("name", &input.name)?;
    validate_email(&input.email)?;
    Ok(())
}

/// Validates the fields present in a customer update.
pub fn validate_customer_update(input: &CustomerUpdate) -> ValidationResult<()> {
    if let Some(document) = &input.document {
        validate_document(document)?;
    }
    if let Some(name) = &input.name {
        validate_name("name", name)?;
    }
    if let Some(email) = &input.email {
        validate_email(email)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentType;

    #[test]
    fn test_product_code() {
        assert!(validate_product_code("LAP-001").is_ok());
        assert!(validate_product_code("mouse_02").is_ok());
        assert!(matches!(
            validate_product_code("   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_product_code(&"A".repeat(51)),
            Err(ValidationError::TooLong { max: 50, .. })
        ));
        assert!(validate_product_code("LAP/001").is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("ana.example.com").is_err());
        assert!(validate_email("ana@@example.com").is_err());
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("ana @example.com").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_document() {
        assert!(validate_document("1020304050").is_ok());
        assert!(validate_document("AB123").is_ok());
        assert!(matches!(
            validate_document("1234"),
            Err(ValidationError::TooShort { min: 5, .. })
        ));
        assert!(validate_document(&"9".repeat(21)).is_err());
        assert!(validate_document("123-456").is_err());
    }

    #[test]
    fn test_password() {
        assert!(validate_password("s3cret-pass").is_ok());
        assert!(matches!(
            validate_password("short"),
            Err(ValidationError::TooShort { min: 8, .. })
        ));
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-3).is_err());
        assert!(matches!(
            validate_quantity(MAX_LINE_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_price_and_stock() {
        assert!(validate_price(1).is_ok());
        assert!(validate_price(0).is_err());
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
        assert!(validate_stock_delta(1_000_000).is_ok());
        assert!(validate_stock_delta(0).is_err());
    }

    #[test]
    fn test_amount_upper_bounds() {
        assert!(validate_price(MAX_PRICE_CENTS).is_ok());
        assert!(matches!(
            validate_price(MAX_PRICE_CENTS + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_price(i64::MAX / 2).is_err());

        assert!(validate_stock(MAX_STOCK).is_ok());
        assert!(validate_stock(MAX_STOCK + 1).is_err());

        assert!(validate_stock_delta(MAX_STOCK).is_ok());
        assert!(validate_stock_delta(i64::MAX).is_err());
    }

    #[test]
    fn test_line_count() {
        assert!(validate_line_count(1).is_ok());
        assert!(matches!(
            validate_line_count(0),
            Err(ValidationError::Required { .. })
        ));
        assert!(validate_line_count(MAX_ORDER_LINES + 1).is_err());
    }

    #[test]
    fn test_pagination() {
        assert!(validate_pagination(50, 0).is_ok());
        assert!(validate_pagination(0, 0).is_err());
        assert!(validate_pagination(501, 0).is_err());
        assert!(validate_pagination(10, -1).is_err());
    }

    #[test]
    fn test_new_product() {
        let input = NewProduct {
            code: "LAP-001".to_string(),
            name: "Laptop".to_string(),
            description: None,
            price_cents: 250_000,
            stock: 5,
            category: Some("computo".to_string()),
        };
        assert!(validate_new_product(&input).is_ok());

        let free = NewProduct {
            price_cents: 0,
            ..input
        };
        assert!(validate_new_product(&free).is_err());
    }

    #[test]
    fn test_new_customer() {
        let input = NewCustomer {
            document: "1020304050".to_string(),
            document_type: DocumentType::Cedula,
            name: "Carlos Ruiz".to_string(),
            email: "carlos@example.com".to_string(),
            phone: None,
            address: None,
        };
        assert!(validate_new_customer(&input).is_ok());

        let bad_email = NewCustomer {
            email: "carlos".to_string(),
            ..input
        };
        assert!(validate_new_customer(&bad_email).is_err());
    }

    #[test]
    fn test_partial_updates_only_check_present_fields() {
        assert!(validate_product_update(&ProductUpdate::default()).is_ok());
        let update = ProductUpdate {
            price_cents: Some(-5),
            ..Default::default()
        };
        assert!(validate_product_update(&update).is_err());

        let update = CustomerUpdate {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(validate_customer_update(&update).is_err());
    }
}
