//! Test fixtures and constants.

use super::Person;

pub const ALICE: Person = Person {
    id: "8f6d6c1e-0d7a-4d0b-9a51-4b8a7c1f0a01",
    name: "Alice",
    email: "alice@example.com",
};

pub const BOB: Person = Person {
    id: "2c3b1f55-9e0e-4a6c-8f4e-6d2b9a7e0b02",
    name: "Bob",
    email: "bob@example.com",
};

/// A valid age public key nobody in the tests holds the private half of.
pub const OUTSIDER_PUBLIC_KEY: &str =
    "age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p";

/// An invalid public key for negative tests.
pub const INVALID_PUBLIC_KEY: &str = "not-a-valid-age-key";

/// Typical plaintext secret files.
pub const STANDARD_SECRETS: &[(&str, &str)] = &[
    (".env", "DATABASE_URL=postgres://localhost/mydb\nAPI_KEY=sk-test-12345\n"),
    ("config/prod.env", "JWT_SECRET=super-secret-jwt-token\n"),
    ("config/staging.env", "REDIS_URL=redis://localhost:6379\n"),
];
