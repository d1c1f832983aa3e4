//! Authentication and authorization tests
//!
//! Tests for permission string matching and JWT verification behaviour.

use proptest::prelude::*;
use uuid::Uuid;

use stock_backend::middleware::AuthUser;

/// Token claims as issued by the back-office auth service
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct TestClaims {
    sub: String,
    permissions: Vec<String>,
    exp: i64,
    iat: i64,
}

fn make_token(claims: &TestClaims, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn verify_token(token: &str, secret: &str) -> Result<TestClaims, jsonwebtoken::errors::Error> {
    use jsonwebtoken::{decode, DecodingKey, Validation};
    decode::<TestClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn user_with(permissions: &[&str]) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_exact_permission_granted() {
        let user = user_with(&["stock:write", "audit:manage"]);
        assert!(user.has_permission("stock", "write"));
        assert!(user.has_permission("audit", "manage"));
    }

    #[test]
    fn test_missing_permission_denied() {
        let user = user_with(&["stock:read"]);
        assert!(!user.has_permission("stock", "write"));
        assert!(!user.has_permission("audit", "manage"));
    }

    #[test]
    fn test_permission_is_not_prefix_matched() {
        let user = user_with(&["stock:write_extra"]);
        assert!(!user.has_permission("stock", "write"));
    }

    #[test]
    fn test_token_round_trip() {
        let now = chrono::Utc::now().timestamp();
        let claims = TestClaims {
            sub: Uuid::new_v4().to_string(),
            permissions: vec!["stock:write".to_string()],
            exp: now + 3600,
            iat: now,
        };

        let token = make_token(&claims, "test-secret");
        let decoded = verify_token(&token, "test-secret").unwrap();

        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.permissions, claims.permissions);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = chrono::Utc::now().timestamp();
        let claims = TestClaims {
            sub: Uuid::new_v4().to_string(),
            permissions: vec![],
            exp: now + 3600,
            iat: now,
        };

        let token = make_token(&claims, "test-secret");
        assert!(verify_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let now = chrono::Utc::now().timestamp();
        let claims = TestClaims {
            sub: Uuid::new_v4().to_string(),
            permissions: vec![],
            exp: now - 3600,
            iat: now - 7200,
        };

        let token = make_token(&claims, "test-secret");
        assert!(verify_token(&token, "test-secret").is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Generate valid permission strings
    fn permission_strategy() -> impl Strategy<Value = (String, String)> {
        let resources = prop_oneof![
            Just("stock"),
            Just("audit"),
            Just("item"),
            Just("warehouse"),
            Just("report"),
        ];
        let actions = prop_oneof![
            Just("read"),
            Just("write"),
            Just("manage"),
            Just("delete"),
        ];
        (resources, actions).prop_map(|(r, a)| (r.to_string(), a.to_string()))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A permission is granted exactly when the resource:action string
        /// is present in the user's grant list.
        #[test]
        fn prop_permission_iff_granted(
            granted in prop::collection::vec(permission_strategy(), 0..6),
            checked in permission_strategy()
        ) {
            let user = AuthUser {
                user_id: Uuid::new_v4(),
                permissions: granted
                    .iter()
                    .map(|(r, a)| format!("{}:{}", r, a))
                    .collect(),
            };

            let expected = granted.contains(&checked);
            prop_assert_eq!(user.has_permission(&checked.0, &checked.1), expected);
        }

        /// Any token signed with one secret never verifies under another.
        #[test]
        fn prop_cross_secret_never_verifies(
            secret_a in "[a-z0-9]{16,32}",
            secret_b in "[a-z0-9]{16,32}"
        ) {
            prop_assume!(secret_a != secret_b);

            let now = chrono::Utc::now().timestamp();
            let claims = TestClaims {
                sub: Uuid::new_v4().to_string(),
                permissions: vec![],
                exp: now + 3600,
                iat: now,
            };

            let token = make_token(&claims, &secret_a);
            prop_assert!(verify_token(&token, &secret_b).is_err());
        }
    }
}
