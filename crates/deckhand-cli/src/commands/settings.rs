//! `deckhand settings`

use anyhow::Result;
use deckhand_config::Value;
use deckhand_config::schema::is_sensitive;

const MASK: &str = "********";

pub fn show(json: bool, show_secrets: bool) -> Result<()> {
    let (_, settings) = super::resolve()?;
    let values = settings.values();

    if json {
        let map = values
            .iter()
            .map(|(name, value)| {
                let value = if hide(name, value, show_secrets) {
                    serde_json::Value::from(MASK)
                } else {
                    serde_json::to_value(value)?
                };
                Ok((name.to_string(), value))
            })
            .collect::<serde_json::Result<serde_json::Map<_, _>>>()?;
        println!("{}", serde_json::to_string_pretty(&map)?);
    } else {
        for (name, value) in &values {
            println!("{name}={}", render(name, value, show_secrets));
        }
    }

    Ok(())
}

fn hide(name: &str, value: &Value, show_secrets: bool) -> bool {
    !show_secrets && is_sensitive(name) && !is_blank(value)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Credentials(users) => users.is_empty(),
        Value::Bool(_) | Value::Int(_) => false,
    }
}

/// One line of `KEY=value` output.
fn render(name: &str, value: &Value, show_secrets: bool) -> String {
    if hide(name, value, show_secrets) {
        return MASK.to_string();
    }
    match value {
        Value::Null => String::new(),
        Value::Text(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::List(items) => items.join(","),
        Value::Credentials(users) => users
            .iter()
            .map(|user| format!("{}:{}", user.username, user.password))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_core::BasicAuthUser;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sensitive_values_are_masked() {
        let password = Value::Text("hunter2".into());
        assert_eq!(render("DATABASE_PASSWORD", &password, false), MASK);
        assert_eq!(render("DATABASE_PASSWORD", &password, true), "hunter2");
    }

    #[test]
    fn test_empty_secrets_are_not_masked() {
        assert_eq!(render("VAULT_JWT", &Value::Text(String::new()), false), "");
    }

    #[test]
    fn test_plain_values() {
        assert_eq!(render("SERVICE_PORT", &Value::Int(8000), false), "8000");
        assert_eq!(
            render(
                "K8S_ADDITIONAL_HOSTNAMES",
                &Value::List(vec!["a.example.com".into(), "b.example.com".into()]),
                false
            ),
            "a.example.com,b.example.com"
        );
        assert_eq!(render("DOCKER_IMAGE_NAME", &Value::Null, false), "");
    }

    #[test]
    fn test_credentials_are_revealed_only_on_request() {
        let users = Value::Credentials(vec![
            BasicAuthUser::new("alice", "one"),
            BasicAuthUser::new("bob", "two"),
        ]);
        assert_eq!(render("K8S_INGRESS_BASIC_AUTH", &users, false), MASK);
        assert_eq!(
            render("K8S_INGRESS_BASIC_AUTH", &users, true),
            "alice:one bob:two"
        );
    }
}
