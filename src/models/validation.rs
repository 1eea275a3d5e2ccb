use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::referrals::Referral;

/// Field name to the messages raised against it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

/// One line for log output, entries joined by `; `. Clients render the
/// serialized map themselves.
impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

const OPTIONAL_FIELDS: [(&str, &str); 7] = [
    ("home_name", "Home name"),
    ("street", "Street"),
    ("suburb", "Suburb"),
    ("state", "State"),
    ("postcode", "Postcode"),
    ("country", "Country"),
    ("avatar", "Avatar"),
];

/// Checks an untyped request body and turns it into a `Referral`.
///
/// Every rule runs, so the error map names all offending fields at once.
pub fn validate_referral(input: &Value) -> Result<Referral, FieldErrors> {
    let mut errors = FieldErrors::default();

    let Some(body) = input.as_object() else {
        errors.add("_body", "Request body must be a JSON object");
        return Err(errors);
    };

    let first_name = required_text(body, "first_name", "First name is required", &mut errors);
    let last_name = required_text(body, "last_name", "Last name is required", &mut errors);
    let email = email(body, &mut errors);
    let prefix = required_text(body, "prefix", "Prefix is required", &mut errors);
    let phone = phone(body, &mut errors);

    let [home_name, street, suburb, state, postcode, country, avatar] =
        OPTIONAL_FIELDS.map(|(field, label)| optional_text(body, field, label, &mut errors));

    match (first_name, last_name, email, prefix, phone) {
        (Some(first_name), Some(last_name), Some(email), Some(prefix), Some(phone))
            if errors.is_empty() =>
        {
            Ok(Referral {
                first_name,
                last_name,
                email,
                prefix,
                phone,
                home_name,
                street,
                suburb,
                state,
                postcode,
                country,
                avatar,
            })
        }
        _ => Err(errors),
    }
}

fn required_text(
    body: &Map<String, Value>,
    field: &str,
    message: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match body.get(field).and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Some(text.to_string()),
        _ => {
            errors.add(field, message);
            None
        }
    }
}

fn optional_text(
    body: &Map<String, Value>,
    field: &str,
    label: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match body.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(_) => {
            errors.add(field, &format!("{label} must be text"));
            None
        }
    }
}

fn email(body: &Map<String, Value>, errors: &mut FieldErrors) -> Option<String> {
    match body.get("email").and_then(Value::as_str) {
        Some(email) if is_plausible_email(email) => Some(email.to_string()),
        _ => {
            errors.add("email", "Invalid email format");
            None
        }
    }
}

pub fn is_plausible_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

fn phone(body: &Map<String, Value>, errors: &mut FieldErrors) -> Option<u64> {
    let value = match body.get("phone") {
        None | Some(Value::Null) => {
            errors.add("phone", "Phone is required");
            return None;
        }
        Some(Value::Number(number)) => number,
        Some(_) => {
            errors.add("phone", "Phone must be a number");
            return None;
        }
    };

    // 1234567890.0 is still ten digits, so whole floats are accepted.
    let whole = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f < 1e15)
            .map(|f| f as u64)
    });

    match whole {
        Some(phone) if (10..=11).contains(&phone.to_string().len()) => Some(phone),
        _ => {
            errors.add("phone", "Phone must be 10-11 digits long");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "first_name": "John",
            "last_name": "Doe",
            "email": "john@example.com",
            "prefix": "+1",
            "phone": 1234567890u64,
        })
    }

    #[test]
    fn accepts_complete_body() {
        let mut body = valid_body();
        body["suburb"] = json!("Richmond");
        body["avatar"] = json!("file-1-abc.png");
        body["country"] = Value::Null;

        let referral = validate_referral(&body).unwrap();

        assert_eq!(referral.first_name, "John");
        assert_eq!(referral.phone, 1234567890);
        assert_eq!(referral.suburb.as_deref(), Some("Richmond"));
        assert_eq!(referral.avatar.as_deref(), Some("file-1-abc.png"));
        assert_eq!(referral.country, None);
    }

    #[test]
    fn collects_every_missing_field() {
        let body = json!({
            "first_name": "",
            "last_name": "",
            "email": "",
            "prefix": "+1",
        });

        let errors = validate_referral(&body).unwrap_err();

        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["email", "first_name", "last_name", "phone"]);
        assert_eq!(errors.messages("first_name"), ["First name is required"]);
        assert_eq!(errors.messages("last_name"), ["Last name is required"]);
        assert_eq!(errors.messages("email"), ["Invalid email format"]);
        assert_eq!(errors.messages("phone"), ["Phone is required"]);
    }

    #[test]
    fn missing_prefix_is_reported() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("prefix");

        let errors = validate_referral(&body).unwrap_err();

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["prefix"]);
        assert_eq!(errors.messages("prefix"), ["Prefix is required"]);
    }

    #[test]
    fn phone_as_string_is_rejected() {
        let mut body = valid_body();
        body["phone"] = json!("1234567890");

        let errors = validate_referral(&body).unwrap_err();

        assert_eq!(errors.messages("phone"), ["Phone must be a number"]);
    }

    #[rstest]
    #[case(json!(1234567890u64), true)]
    #[case(json!(12345678901u64), true)]
    #[case(json!(1234567890.0), true)]
    #[case(json!(123456789u64), false)]
    #[case(json!(123456789012u64), false)]
    #[case(json!(-1234567890i64), false)]
    #[case(json!(1234567890.5), false)]
    fn phone_digit_count(#[case] phone: Value, #[case] accepted: bool) {
        let mut body = valid_body();
        body["phone"] = phone;

        match validate_referral(&body) {
            Ok(_) => assert!(accepted),
            Err(errors) => {
                assert!(!accepted);
                assert_eq!(errors.messages("phone"), ["Phone must be 10-11 digits long"]);
            }
        }
    }

    #[rstest]
    #[case("john@example.com", true)]
    #[case("j.doe+tag@mail.example.co", true)]
    #[case("john@example", false)]
    #[case("john@@example.com", false)]
    #[case("@example.com", false)]
    #[case("john@.com", false)]
    #[case("john @example.com", false)]
    #[case("john.example.com", false)]
    fn email_shape(#[case] email: &str, #[case] plausible: bool) {
        assert_eq!(is_plausible_email(email), plausible);
    }

    #[test]
    fn non_text_optional_field_is_reported() {
        let mut body = valid_body();
        body["postcode"] = json!(3121);

        let errors = validate_referral(&body).unwrap_err();

        assert_eq!(errors.messages("postcode"), ["Postcode must be text"]);
    }

    #[test]
    fn non_object_body_is_rejected() {
        let errors = validate_referral(&json!(["John"])).unwrap_err();

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["_body"]);
    }

    #[test]
    fn errors_display_as_field_lines() {
        let mut errors = FieldErrors::default();
        errors.add("email", "Invalid email format");
        errors.add("phone", "Phone is required");

        assert_eq!(
            errors.to_string(),
            "email: Invalid email format; phone: Phone is required"
        );
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"email": ["Invalid email format"], "phone": ["Phone is required"]})
        );
    }
}
