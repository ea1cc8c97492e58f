//! Request payload validation
//!
//! Each failure is a 400 `ValidationFailed` naming the offending field.
//! Lengths count characters, after trimming.

use rust_decimal::Decimal;
use shared::error::{AppError, AppResult};
use shared::models::{ChangePasswordRequest, PlanCreate, PlanUpdate, UserCreate, UserUpdate};

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 100;
pub const PHONE_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 6;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 500;
/// Matches the `NUMERIC(12, 2)` price column
pub const PRICE_SCALE: u32 = 2;

/// Largest price the column holds: 9999999999.99
pub fn price_max() -> Decimal {
    Decimal::new(999_999_999_999, PRICE_SCALE)
}

fn length(field: &str, value: &str, min: usize, max: usize) -> AppResult<()> {
    let len = value.trim().chars().count();
    if len < min || len > max {
        return Err(AppError::validation(
            field,
            format!("{field} must be between {min} and {max} characters"),
        ));
    }
    Ok(())
}

fn email(value: &str) -> AppResult<()> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(AppError::validation("email", "email must be a valid address"));
    }
    Ok(())
}

fn phone(value: &str) -> AppResult<()> {
    if value.trim().chars().count() > PHONE_MAX {
        return Err(AppError::validation(
            "phone",
            format!("phone must be at most {PHONE_MAX} characters"),
        ));
    }
    Ok(())
}

fn password(field: &str, value: &str) -> AppResult<()> {
    if value.chars().count() < PASSWORD_MIN {
        return Err(AppError::validation(
            field,
            format!("{field} must be at least {PASSWORD_MIN} characters"),
        ));
    }
    Ok(())
}

fn price(value: Decimal) -> AppResult<()> {
    if value <= Decimal::ZERO {
        return Err(AppError::validation("price", "price must be greater than 0"));
    }
    if value.normalize().scale() > PRICE_SCALE {
        return Err(AppError::validation(
            "price",
            format!("price must have at most {PRICE_SCALE} decimal places"),
        ));
    }
    let max = price_max();
    if value > max {
        return Err(AppError::validation(
            "price",
            format!("price must be at most {max}"),
        ));
    }
    Ok(())
}

pub fn user_create(req: &UserCreate) -> AppResult<()> {
    length("name", &req.name, NAME_MIN, NAME_MAX)?;
    email(&req.email)?;
    if let Some(p) = &req.phone {
        phone(p)?;
    }
    password("password", &req.password)
}

pub fn user_update(req: &UserUpdate) -> AppResult<()> {
    if let Some(name) = &req.name {
        length("name", name, NAME_MIN, NAME_MAX)?;
    }
    if let Some(p) = &req.phone {
        phone(p)?;
    }
    if let Some(p) = &req.password {
        password("password", p)?;
    }
    Ok(())
}

pub fn change_password(req: &ChangePasswordRequest) -> AppResult<()> {
    if req.current_password.is_empty() {
        return Err(AppError::validation(
            "current_password",
            "current_password is required",
        ));
    }
    password("new_password", &req.new_password)
}

pub fn plan_create(req: &PlanCreate) -> AppResult<()> {
    length("name", &req.name, NAME_MIN, NAME_MAX)?;
    length("description", &req.description, DESCRIPTION_MIN, DESCRIPTION_MAX)?;
    price(req.price)
}

pub fn plan_update(req: &PlanUpdate) -> AppResult<()> {
    if let Some(name) = &req.name {
        length("name", name, NAME_MIN, NAME_MAX)?;
    }
    if let Some(description) = &req.description {
        length("description", description, DESCRIPTION_MIN, DESCRIPTION_MAX)?;
    }
    if let Some(p) = req.price {
        price(p)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    fn field(err: AppError) -> String {
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        err.details.unwrap()["field"].as_str().unwrap().to_string()
    }

    fn register(name: &str, email: &str, password: &str) -> UserCreate {
        UserCreate {
            name: name.into(),
            email: email.into(),
            phone: None,
            password: password.into(),
        }
    }

    #[test]
    fn test_user_create_rules() {
        assert!(user_create(&register("Ana", "ana@x.com", "secret")).is_ok());
        assert_eq!(
            field(user_create(&register("A", "ana@x.com", "secret")).unwrap_err()),
            "name"
        );
        assert_eq!(
            field(user_create(&register("Ana", "ana.x.com", "secret")).unwrap_err()),
            "email"
        );
        assert_eq!(
            field(user_create(&register("Ana", "@x.com", "secret")).unwrap_err()),
            "email"
        );
        assert_eq!(
            field(user_create(&register("Ana", "ana@", "secret")).unwrap_err()),
            "email"
        );
        assert_eq!(
            field(user_create(&register("Ana", "ana@x.com", "12345")).unwrap_err()),
            "password"
        );

        let mut long_phone = register("Ana", "ana@x.com", "secret");
        long_phone.phone = Some("1".repeat(21));
        assert_eq!(field(user_create(&long_phone).unwrap_err()), "phone");
    }

    #[test]
    fn test_name_bounds_count_chars() {
        assert!(length("name", "Zoë", NAME_MIN, NAME_MAX).is_ok());
        assert!(length("name", &"é".repeat(100), NAME_MIN, NAME_MAX).is_ok());
        assert!(length("name", &"é".repeat(101), NAME_MIN, NAME_MAX).is_err());
        assert!(length("name", "  a  ", NAME_MIN, NAME_MAX).is_err());
    }

    #[test]
    fn test_plan_rules() {
        let ok = PlanCreate {
            name: "Basic".into(),
            description: "Entry level plan".into(),
            price: Decimal::new(999, 2),
        };
        assert!(plan_create(&ok).is_ok());

        let short = PlanCreate {
            description: "too short".into(),
            ..ok.clone()
        };
        assert_eq!(field(plan_create(&short).unwrap_err()), "description");

        let free = PlanCreate {
            price: Decimal::ZERO,
            ..ok
        };
        assert_eq!(field(plan_create(&free).unwrap_err()), "price");

        let negative = PlanUpdate {
            price: Some(Decimal::new(-1, 0)),
            ..Default::default()
        };
        assert_eq!(field(plan_update(&negative).unwrap_err()), "price");
        assert!(plan_update(&PlanUpdate::default()).is_ok());
    }

    #[test]
    fn test_price_fits_column() {
        assert_eq!(price_max().to_string(), "9999999999.99");
        assert!(price(Decimal::new(999, 2)).is_ok());
        assert!(price(Decimal::new(9990, 3)).is_ok());
        assert!(price(price_max()).is_ok());

        let err = price(Decimal::new(9999, 3)).unwrap_err();
        assert_eq!(field(err), "price");
        let err = price(Decimal::new(10_000_000_000, 0)).unwrap_err();
        assert_eq!(field(err), "price");
    }

    #[test]
    fn test_change_password_rules() {
        let req = ChangePasswordRequest {
            current_password: "old".into(),
            new_password: "short".into(),
        };
        assert_eq!(field(change_password(&req).unwrap_err()), "new_password");
    }
}
